//! Static description of a floating-base kinematic tree.
//!
//! [`Model`] follows the flat-array layout: every `body_*` array is indexed by
//! body id, body 0 is the floating base, and every other body is attached to
//! its parent through exactly one revolute joint. Joint `j` belongs to body
//! `j + 1`, so joint angles and rates line up with body order.

use fbm_types::{ContactKind, ModelError, ModelInfo};
use nalgebra::{Matrix3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

/// Tolerance for unit-axis and symmetry checks.
const VALIDATION_TOL: f64 = 1e-9;

/// A contact frame rigidly attached to a body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactFrame {
    /// Unique frame name.
    pub name: String,
    /// Body the frame is attached to.
    pub body: usize,
    /// Frame origin in body coordinates.
    pub pos: Vector3<f64>,
    /// Point (force only) or wrench (force and torque).
    pub kind: ContactKind,
}

/// Parameters of a body attached through a revolute joint.
///
/// The joint sits at the body origin. `pos` and `quat` place the joint frame
/// relative to the parent body; the joint then rotates about `axis`
/// (expressed in the joint frame).
#[derive(Debug, Clone, PartialEq)]
pub struct RevoluteBody {
    /// Body name.
    pub name: String,
    /// Parent body id.
    pub parent: usize,
    /// Joint origin in parent coordinates.
    pub pos: Vector3<f64>,
    /// Fixed rotation from parent to joint frame.
    pub quat: UnitQuaternion<f64>,
    /// Joint axis; normalized when the body is added.
    pub axis: Vector3<f64>,
    /// Body mass.
    pub mass: f64,
    /// Center of mass in body coordinates.
    pub ipos: Vector3<f64>,
    /// Rotational inertia about the center of mass.
    pub inertia: Matrix3<f64>,
}

impl RevoluteBody {
    /// A massless body on `parent`, rotating about `axis`.
    #[must_use]
    pub fn new(name: impl Into<String>, parent: usize, axis: Vector3<f64>) -> Self {
        Self {
            name: name.into(),
            parent,
            pos: Vector3::zeros(),
            quat: UnitQuaternion::identity(),
            axis,
            mass: 0.0,
            ipos: Vector3::zeros(),
            inertia: Matrix3::zeros(),
        }
    }

    /// Set the joint origin in parent coordinates.
    #[must_use]
    pub fn at(mut self, pos: Vector3<f64>) -> Self {
        self.pos = pos;
        self
    }

    /// Set the fixed parent-to-joint rotation.
    #[must_use]
    pub fn rotated(mut self, quat: UnitQuaternion<f64>) -> Self {
        self.quat = quat;
        self
    }

    /// Set the mass properties.
    #[must_use]
    pub fn inertial(mut self, mass: f64, ipos: Vector3<f64>, inertia: Matrix3<f64>) -> Self {
        self.mass = mass;
        self.ipos = ipos;
        self.inertia = inertia;
        self
    }
}

/// Static robot description (immutable once built).
///
/// # Memory Layout
///
/// - `body_*` arrays indexed by body id (0 = floating base)
/// - `jnt_axis[i]` is the axis of the joint on body `i` (unused for the base)
/// - `contacts` ordered point contacts first, then wrench contacts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    /// Model name.
    pub name: String,

    // ==================== Bodies ====================
    /// Parent body id (`body_parent[0] == 0`).
    pub body_parent: Vec<usize>,
    /// Joint origin in parent coordinates.
    pub body_pos: Vec<Vector3<f64>>,
    /// Fixed rotation from parent to joint frame.
    pub body_quat: Vec<UnitQuaternion<f64>>,
    /// Joint axis in the joint frame.
    pub jnt_axis: Vec<Vector3<f64>>,
    /// Body mass.
    pub body_mass: Vec<f64>,
    /// Center of mass in body coordinates.
    pub body_ipos: Vec<Vector3<f64>>,
    /// Rotational inertia about the center of mass, body coordinates.
    pub body_inertia: Vec<Matrix3<f64>>,
    /// Body names.
    pub body_name: Vec<String>,

    // ==================== Contacts ====================
    /// Contact frames.
    pub contacts: Vec<ContactFrame>,

    // ==================== Options ====================
    /// Gravitational acceleration in the world frame.
    pub gravity: Vector3<f64>,
}

impl Model {
    /// A model with only the floating base.
    #[must_use]
    pub fn floating_base(name: impl Into<String>, mass: f64, ipos: Vector3<f64>, inertia: Matrix3<f64>) -> Self {
        let name = name.into();
        Self {
            body_parent: vec![0],
            body_pos: vec![Vector3::zeros()],
            body_quat: vec![UnitQuaternion::identity()],
            jnt_axis: vec![Vector3::zeros()],
            body_mass: vec![mass],
            body_ipos: vec![ipos],
            body_inertia: vec![inertia],
            body_name: vec![format!("{name}_base")],
            contacts: Vec::new(),
            gravity: Vector3::new(0.0, 0.0, -9.81),
            name,
        }
    }

    /// Attach a body through a revolute joint and return its id.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidConfiguration`] for an unknown parent, a
    /// zero or non-finite axis, or invalid mass properties.
    pub fn add_revolute_body(&mut self, body: RevoluteBody) -> Result<usize, ModelError> {
        if body.parent >= self.nbody() {
            return Err(ModelError::invalid_config(format!(
                "body '{}': parent {} does not exist",
                body.name, body.parent
            )));
        }
        let norm = body.axis.norm();
        if !norm.is_finite() || norm < VALIDATION_TOL {
            return Err(ModelError::invalid_config(format!(
                "body '{}': joint axis must be non-zero",
                body.name
            )));
        }
        check_inertial(&body.name, body.mass, &body.ipos, &body.inertia)?;

        let axis = body.axis / norm;
        Ok(self.push_body(RevoluteBody { axis, ..body }))
    }

    /// Append a body without checks. The axis must already be unit length.
    pub(crate) fn push_body(&mut self, body: RevoluteBody) -> usize {
        let id = self.nbody();
        self.body_parent.push(body.parent);
        self.body_pos.push(body.pos);
        self.body_quat.push(body.quat);
        self.jnt_axis.push(body.axis);
        self.body_mass.push(body.mass);
        self.body_ipos.push(body.ipos);
        self.body_inertia.push(body.inertia);
        self.body_name.push(body.name);
        id
    }

    /// Attach a contact frame and return its contact index.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidConfiguration`] for an unknown body, a
    /// duplicate name, or a point contact added after a wrench contact.
    pub fn add_contact(
        &mut self,
        name: impl Into<String>,
        body: usize,
        pos: Vector3<f64>,
        kind: ContactKind,
    ) -> Result<usize, ModelError> {
        let name = name.into();
        if body >= self.nbody() {
            return Err(ModelError::invalid_config(format!(
                "contact '{name}': body {body} does not exist"
            )));
        }
        if self.contact_by_name(&name).is_some() {
            return Err(ModelError::invalid_config(format!("duplicate contact name '{name}'")));
        }
        if kind == ContactKind::Point && self.num_wrench_contacts() > 0 {
            return Err(ModelError::invalid_config(format!(
                "contact '{name}': point contacts must precede wrench contacts"
            )));
        }
        self.contacts.push(ContactFrame { name, body, pos, kind });
        Ok(self.contacts.len() - 1)
    }

    /// Set gravity.
    #[must_use]
    pub fn with_gravity(mut self, gravity: Vector3<f64>) -> Self {
        self.gravity = gravity;
        self
    }

    /// Number of bodies including the base.
    #[must_use]
    pub fn nbody(&self) -> usize {
        self.body_parent.len()
    }

    /// Number of revolute joints.
    #[must_use]
    pub fn njnt(&self) -> usize {
        self.nbody().saturating_sub(1)
    }

    /// Generalized position dimension (`7 + njnt`).
    #[must_use]
    pub fn nq(&self) -> usize {
        7 + self.njnt()
    }

    /// Generalized velocity dimension (`6 + njnt`).
    #[must_use]
    pub fn nv(&self) -> usize {
        6 + self.njnt()
    }

    /// Number of point contacts.
    #[must_use]
    pub fn num_point_contacts(&self) -> usize {
        self.contacts.iter().filter(|c| c.kind == ContactKind::Point).count()
    }

    /// Number of wrench contacts.
    #[must_use]
    pub fn num_wrench_contacts(&self) -> usize {
        self.contacts.iter().filter(|c| c.kind == ContactKind::Wrench).count()
    }

    /// Contact and joint counts of this model.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidConfiguration`] if the counts overflow the
    /// state or input dimension.
    pub fn model_info(&self) -> Result<ModelInfo, ModelError> {
        ModelInfo::new(self.num_point_contacts(), self.num_wrench_contacts(), self.njnt())
    }

    /// Index of the contact called `name`.
    #[must_use]
    pub fn contact_by_name(&self, name: &str) -> Option<usize> {
        self.contacts.iter().position(|c| c.name == name)
    }

    /// Id of the body called `name`.
    #[must_use]
    pub fn body_by_name(&self, name: &str) -> Option<usize> {
        self.body_name.iter().position(|n| n == name)
    }

    /// Sum of all body masses.
    #[must_use]
    pub fn total_mass(&self) -> f64 {
        self.body_mass.iter().sum()
    }

    /// Neutral generalized position: origin, identity orientation, zero joints.
    #[must_use]
    pub fn qpos0(&self) -> nalgebra::DVector<f64> {
        let mut q = nalgebra::DVector::zeros(self.nq());
        q[6] = 1.0;
        q
    }

    /// Check structural consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidConfiguration`] describing the first problem found.
    pub fn validate(&self) -> Result<(), ModelError> {
        let n = self.nbody();
        if n == 0 {
            return Err(ModelError::invalid_config("model has no bodies"));
        }
        let lengths = [
            ("body_pos", self.body_pos.len()),
            ("body_quat", self.body_quat.len()),
            ("jnt_axis", self.jnt_axis.len()),
            ("body_mass", self.body_mass.len()),
            ("body_ipos", self.body_ipos.len()),
            ("body_inertia", self.body_inertia.len()),
            ("body_name", self.body_name.len()),
        ];
        if let Some((field, len)) = lengths.iter().find(|(_, len)| *len != n) {
            return Err(ModelError::invalid_config(format!(
                "{field} has {len} entries for {n} bodies"
            )));
        }

        if self.body_parent[0] != 0 {
            return Err(ModelError::invalid_config("base body must be its own parent"));
        }
        for i in 1..n {
            if self.body_parent[i] >= i {
                return Err(ModelError::invalid_config(format!(
                    "body {i} has parent {} (parents must precede children)",
                    self.body_parent[i]
                )));
            }
            if (self.jnt_axis[i].norm() - 1.0).abs() > VALIDATION_TOL {
                return Err(ModelError::invalid_config(format!("joint axis of body {i} is not unit length")));
            }
            if !self.body_pos[i].iter().all(|x| x.is_finite()) {
                return Err(ModelError::invalid_config(format!("body {i} has a non-finite position")));
            }
        }

        for i in 0..n {
            check_inertial(&self.body_name[i], self.body_mass[i], &self.body_ipos[i], &self.body_inertia[i])?;
        }
        if self.body_mass[0] <= 0.0 {
            return Err(ModelError::invalid_config("base mass must be positive"));
        }

        let mut seen_wrench = false;
        for contact in &self.contacts {
            if contact.body >= n {
                return Err(ModelError::invalid_config(format!(
                    "contact '{}' references body {}",
                    contact.name, contact.body
                )));
            }
            if !contact.pos.iter().all(|x| x.is_finite()) {
                return Err(ModelError::invalid_config(format!(
                    "contact '{}' has a non-finite offset",
                    contact.name
                )));
            }
            match contact.kind {
                ContactKind::Wrench => seen_wrench = true,
                ContactKind::Point if seen_wrench => {
                    return Err(ModelError::invalid_config(format!(
                        "contact '{}': point contacts must precede wrench contacts",
                        contact.name
                    )));
                }
                ContactKind::Point => {}
            }
        }

        if !self.gravity.iter().all(|x| x.is_finite()) {
            return Err(ModelError::invalid_config("gravity must be finite"));
        }
        Ok(())
    }
}

fn check_inertial(name: &str, mass: f64, ipos: &Vector3<f64>, inertia: &Matrix3<f64>) -> Result<(), ModelError> {
    if !mass.is_finite() || mass < 0.0 {
        return Err(ModelError::invalid_config(format!(
            "body '{name}': mass must be finite and non-negative, got {mass}"
        )));
    }
    if !ipos.iter().chain(inertia.iter()).all(|x| x.is_finite()) {
        return Err(ModelError::invalid_config(format!("body '{name}': non-finite inertial")));
    }
    if (inertia - inertia.transpose()).abs().max() > VALIDATION_TOL {
        return Err(ModelError::invalid_config(format!("body '{name}': inertia is not symmetric")));
    }
    if inertia.diagonal().iter().any(|&d| d < 0.0) {
        return Err(ModelError::invalid_config(format!(
            "body '{name}': inertia has a negative diagonal"
        )));
    }
    Ok(())
}
