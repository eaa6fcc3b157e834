//! Static description of the floating-base parameterization.
//!
//! [`ModelInfo`] records how many contacts of each kind a robot exposes and
//! how many actuated joints it has. Every dimension of the state and input
//! vectors is derived from these three counts.

use crate::ModelError;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Number of base velocity entries at the head of the state vector.
pub const BASE_VELOCITY_DIM: usize = 6;

/// Number of base pose entries (position + ZYX Euler angles).
pub const BASE_POSE_DIM: usize = 6;

/// Kind of contact frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ContactKind {
    /// Point contact exerting a pure force (3 input entries).
    Point,
    /// Surface contact exerting a force and a torque (6 input entries).
    Wrench,
}

impl ContactKind {
    /// Number of input entries a contact of this kind occupies.
    #[must_use]
    pub fn input_size(self) -> usize {
        match self {
            Self::Point => 3,
            Self::Wrench => 6,
        }
    }
}

/// Contact and joint counts of a floating-base robot, plus derived dimensions.
///
/// Immutable once constructed. The derived dimensions are always recomputed
/// from the counts and cannot be set independently.
///
/// # Layout
///
/// ```text
/// state = [ v_B (3) | ω_B (3) | p_W (3) | euler_zyx (3) | joint angles (nj) ]
/// input = [ point forces (3·np) | wrenches (6·nw) | joint velocities (nj) ]
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(try_from = "ModelCounts", into = "ModelCounts")
)]
pub struct ModelInfo {
    num_point_contacts: usize,
    num_wrench_contacts: usize,
    actuated_dof_num: usize,
    generalized_coordinates_num: usize,
    state_dim: usize,
    input_dim: usize,
}

/// Serialized form of [`ModelInfo`]: counts only.
#[cfg(feature = "serde")]
#[derive(Serialize, Deserialize)]
struct ModelCounts {
    num_point_contacts: usize,
    num_wrench_contacts: usize,
    actuated_dof_num: usize,
}

#[cfg(feature = "serde")]
impl TryFrom<ModelCounts> for ModelInfo {
    type Error = ModelError;

    fn try_from(counts: ModelCounts) -> Result<Self, Self::Error> {
        Self::new(
            counts.num_point_contacts,
            counts.num_wrench_contacts,
            counts.actuated_dof_num,
        )
    }
}

#[cfg(feature = "serde")]
impl From<ModelInfo> for ModelCounts {
    fn from(info: ModelInfo) -> Self {
        Self {
            num_point_contacts: info.num_point_contacts,
            num_wrench_contacts: info.num_wrench_contacts,
            actuated_dof_num: info.actuated_dof_num,
        }
    }
}

impl ModelInfo {
    /// Create model info from contact and joint counts.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidConfiguration`] if the derived dimensions
    /// overflow `usize`.
    pub fn new(num_point_contacts: usize, num_wrench_contacts: usize, actuated_dof_num: usize) -> Result<Self, ModelError> {
        let input_dim = num_point_contacts
            .checked_mul(ContactKind::Point.input_size())
            .zip(num_wrench_contacts.checked_mul(ContactKind::Wrench.input_size()))
            .and_then(|(a, b)| a.checked_add(b))
            .and_then(|n| n.checked_add(actuated_dof_num));
        let state_dim = actuated_dof_num.checked_add(BASE_VELOCITY_DIM + BASE_POSE_DIM);
        let (Some(input_dim), Some(state_dim)) = (input_dim, state_dim) else {
            return Err(ModelError::invalid_config(format!(
                "counts ({num_point_contacts} point, {num_wrench_contacts} wrench, {actuated_dof_num} joints) \
                 overflow the vector dimensions"
            )));
        };

        Ok(Self {
            num_point_contacts,
            num_wrench_contacts,
            actuated_dof_num,
            // bounded by state_dim
            generalized_coordinates_num: BASE_VELOCITY_DIM + actuated_dof_num,
            state_dim,
            input_dim,
        })
    }

    /// Create model info from raw signed counts, as delivered by a description loader.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidConfiguration`] if any count is negative or
    /// the derived dimensions would overflow.
    pub fn from_counts(
        num_point_contacts: i64,
        num_wrench_contacts: i64,
        actuated_dof_num: i64,
    ) -> Result<Self, ModelError> {
        let convert = |name: &str, value: i64| {
            usize::try_from(value)
                .map_err(|_| ModelError::invalid_config(format!("{name} must be non-negative, got {value}")))
        };
        Self::new(
            convert("number of point contacts", num_point_contacts)?,
            convert("number of wrench contacts", num_wrench_contacts)?,
            convert("number of actuated joints", actuated_dof_num)?,
        )
    }

    /// Number of point (3-DoF) contacts.
    #[must_use]
    pub fn num_point_contacts(&self) -> usize {
        self.num_point_contacts
    }

    /// Number of wrench (6-DoF) contacts.
    #[must_use]
    pub fn num_wrench_contacts(&self) -> usize {
        self.num_wrench_contacts
    }

    /// Total number of contacts of either kind.
    #[must_use]
    pub fn num_contacts(&self) -> usize {
        self.num_point_contacts + self.num_wrench_contacts
    }

    /// Number of actuated joints.
    #[must_use]
    pub fn actuated_dof_num(&self) -> usize {
        self.actuated_dof_num
    }

    /// Number of generalized coordinates in tangent space (`6 + nj`).
    ///
    /// Equals the solver's velocity dimension `nv`.
    #[must_use]
    pub fn generalized_coordinates_num(&self) -> usize {
        self.generalized_coordinates_num
    }

    /// Solver position dimension `nq` (`7 + nj`, quaternion orientation).
    #[must_use]
    pub fn generalized_position_num(&self) -> usize {
        self.generalized_coordinates_num + 1
    }

    /// Length of the state vector (`12 + nj`).
    #[must_use]
    pub fn state_dim(&self) -> usize {
        self.state_dim
    }

    /// Length of the input vector (`3·np + 6·nw + nj`).
    #[must_use]
    pub fn input_dim(&self) -> usize {
        self.input_dim
    }

    /// Offset of the joint velocities in the input vector.
    #[must_use]
    pub fn joint_velocity_offset(&self) -> usize {
        self.input_dim - self.actuated_dof_num
    }

    /// Kind of the contact at a unified contact index (point contacts first).
    #[must_use]
    pub fn contact_kind(&self, contact_index: usize) -> Option<ContactKind> {
        if contact_index < self.num_point_contacts {
            Some(ContactKind::Point)
        } else if contact_index < self.num_contacts() {
            Some(ContactKind::Wrench)
        } else {
            None
        }
    }

    /// Offset of a contact's block in the input vector.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::IndexOutOfRange`] for an undeclared contact.
    pub fn contact_offset(&self, contact_index: usize) -> Result<usize, ModelError> {
        match self.contact_kind(contact_index) {
            Some(ContactKind::Point) => Ok(3 * contact_index),
            Some(ContactKind::Wrench) => {
                Ok(3 * self.num_point_contacts + 6 * (contact_index - self.num_point_contacts))
            }
            None => Err(ModelError::IndexOutOfRange {
                what: "contact",
                index: contact_index,
                lower: 0,
                upper: self.num_contacts(),
            }),
        }
    }
}
