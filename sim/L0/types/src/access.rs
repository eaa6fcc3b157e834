//! Zero-copy views into state and input vectors.
//!
//! Every accessor comes in a read-only and a mutable flavor. The views borrow
//! the caller's storage, so writes through a `*_mut` view update the vector
//! in place. Offsets are computed purely from [`ModelInfo`].
//!
//! The length contract is checked in every build profile: a vector whose
//! length differs from [`ModelInfo::state_dim`] (or
//! [`ModelInfo::input_dim`]) is rejected with
//! [`ModelError::DimensionMismatch`] instead of producing a truncated view.
//! Contact accessors return [`ModelError::IndexOutOfRange`] for an index past
//! the declared contacts, and torque accessors for any non-wrench contact.
//!
//! ```
//! use fbm_types::{ModelInfo, access};
//! use nalgebra::DVector;
//!
//! let info = ModelInfo::new(4, 0, 12)?;
//! let mut state = DVector::<f64>::zeros(info.state_dim());
//! access::base_position_mut(&info, &mut state)?.fill(1.0);
//! assert_eq!(state[6], 1.0);
//! # Ok::<(), fbm_types::ModelError>(())
//! ```

use nalgebra::{DVector, DVectorView, DVectorViewMut, Scalar};

use crate::info::{BASE_POSE_DIM, BASE_VELOCITY_DIM};
use crate::{ContactKind, ModelError, ModelInfo, check_dimension};

/// Result type for accessors.
pub type AccessResult<T> = Result<T, ModelError>;

fn state_view<'a, T: Scalar>(
    info: &ModelInfo,
    state: &'a DVector<T>,
    start: usize,
    len: usize,
) -> AccessResult<DVectorView<'a, T>> {
    check_dimension("state", info.state_dim(), state.len())?;
    Ok(state.rows(start, len))
}

fn state_view_mut<'a, T: Scalar>(
    info: &ModelInfo,
    state: &'a mut DVector<T>,
    start: usize,
    len: usize,
) -> AccessResult<DVectorViewMut<'a, T>> {
    check_dimension("state", info.state_dim(), state.len())?;
    Ok(state.rows_mut(start, len))
}

fn input_view<'a, T: Scalar>(
    info: &ModelInfo,
    input: &'a DVector<T>,
    start: usize,
    len: usize,
) -> AccessResult<DVectorView<'a, T>> {
    check_dimension("input", info.input_dim(), input.len())?;
    Ok(input.rows(start, len))
}

fn input_view_mut<'a, T: Scalar>(
    info: &ModelInfo,
    input: &'a mut DVector<T>,
    start: usize,
    len: usize,
) -> AccessResult<DVectorViewMut<'a, T>> {
    check_dimension("input", info.input_dim(), input.len())?;
    Ok(input.rows_mut(start, len))
}

/// Base linear and angular velocity in the base frame (6).
pub fn base_velocity<'a, T: Scalar>(info: &ModelInfo, state: &'a DVector<T>) -> AccessResult<DVectorView<'a, T>> {
    state_view(info, state, 0, BASE_VELOCITY_DIM)
}

/// Mutable base velocity.
pub fn base_velocity_mut<'a, T: Scalar>(
    info: &ModelInfo,
    state: &'a mut DVector<T>,
) -> AccessResult<DVectorViewMut<'a, T>> {
    state_view_mut(info, state, 0, BASE_VELOCITY_DIM)
}

/// Base linear velocity in the base frame (3).
pub fn base_linear_velocity<'a, T: Scalar>(
    info: &ModelInfo,
    state: &'a DVector<T>,
) -> AccessResult<DVectorView<'a, T>> {
    state_view(info, state, 0, 3)
}

/// Mutable base linear velocity.
pub fn base_linear_velocity_mut<'a, T: Scalar>(
    info: &ModelInfo,
    state: &'a mut DVector<T>,
) -> AccessResult<DVectorViewMut<'a, T>> {
    state_view_mut(info, state, 0, 3)
}

/// Base angular velocity in the base frame (3).
pub fn base_angular_velocity<'a, T: Scalar>(
    info: &ModelInfo,
    state: &'a DVector<T>,
) -> AccessResult<DVectorView<'a, T>> {
    state_view(info, state, 3, 3)
}

/// Mutable base angular velocity.
pub fn base_angular_velocity_mut<'a, T: Scalar>(
    info: &ModelInfo,
    state: &'a mut DVector<T>,
) -> AccessResult<DVectorViewMut<'a, T>> {
    state_view_mut(info, state, 3, 3)
}

/// Base pose: world position followed by ZYX Euler angles (6).
pub fn base_pose<'a, T: Scalar>(info: &ModelInfo, state: &'a DVector<T>) -> AccessResult<DVectorView<'a, T>> {
    state_view(info, state, BASE_VELOCITY_DIM, BASE_POSE_DIM)
}

/// Mutable base pose.
pub fn base_pose_mut<'a, T: Scalar>(
    info: &ModelInfo,
    state: &'a mut DVector<T>,
) -> AccessResult<DVectorViewMut<'a, T>> {
    state_view_mut(info, state, BASE_VELOCITY_DIM, BASE_POSE_DIM)
}

/// Base position in the world frame (3).
pub fn base_position<'a, T: Scalar>(info: &ModelInfo, state: &'a DVector<T>) -> AccessResult<DVectorView<'a, T>> {
    state_view(info, state, BASE_VELOCITY_DIM, 3)
}

/// Mutable base position.
pub fn base_position_mut<'a, T: Scalar>(
    info: &ModelInfo,
    state: &'a mut DVector<T>,
) -> AccessResult<DVectorViewMut<'a, T>> {
    state_view_mut(info, state, BASE_VELOCITY_DIM, 3)
}

/// Base orientation as ZYX Euler angles `[yaw, pitch, roll]` (3).
pub fn base_orientation_zyx<'a, T: Scalar>(
    info: &ModelInfo,
    state: &'a DVector<T>,
) -> AccessResult<DVectorView<'a, T>> {
    state_view(info, state, BASE_VELOCITY_DIM + 3, 3)
}

/// Mutable base orientation.
pub fn base_orientation_zyx_mut<'a, T: Scalar>(
    info: &ModelInfo,
    state: &'a mut DVector<T>,
) -> AccessResult<DVectorViewMut<'a, T>> {
    state_view_mut(info, state, BASE_VELOCITY_DIM + 3, 3)
}

/// Base pose followed by the joint angles (`6 + nj`).
pub fn generalized_coordinates<'a, T: Scalar>(
    info: &ModelInfo,
    state: &'a DVector<T>,
) -> AccessResult<DVectorView<'a, T>> {
    state_view(info, state, BASE_VELOCITY_DIM, info.generalized_coordinates_num())
}

/// Mutable generalized coordinates.
pub fn generalized_coordinates_mut<'a, T: Scalar>(
    info: &ModelInfo,
    state: &'a mut DVector<T>,
) -> AccessResult<DVectorViewMut<'a, T>> {
    let len = info.generalized_coordinates_num();
    state_view_mut(info, state, BASE_VELOCITY_DIM, len)
}

/// Actuated joint angles (`nj`).
pub fn joint_angles<'a, T: Scalar>(info: &ModelInfo, state: &'a DVector<T>) -> AccessResult<DVectorView<'a, T>> {
    state_view(info, state, BASE_VELOCITY_DIM + BASE_POSE_DIM, info.actuated_dof_num())
}

/// Mutable joint angles.
pub fn joint_angles_mut<'a, T: Scalar>(
    info: &ModelInfo,
    state: &'a mut DVector<T>,
) -> AccessResult<DVectorViewMut<'a, T>> {
    let len = info.actuated_dof_num();
    state_view_mut(info, state, BASE_VELOCITY_DIM + BASE_POSE_DIM, len)
}

/// Actuated joint velocities at the tail of the input (`nj`).
pub fn joint_velocities<'a, T: Scalar>(
    info: &ModelInfo,
    input: &'a DVector<T>,
) -> AccessResult<DVectorView<'a, T>> {
    input_view(info, input, info.joint_velocity_offset(), info.actuated_dof_num())
}

/// Mutable joint velocities.
pub fn joint_velocities_mut<'a, T: Scalar>(
    info: &ModelInfo,
    input: &'a mut DVector<T>,
) -> AccessResult<DVectorViewMut<'a, T>> {
    let (start, len) = (info.joint_velocity_offset(), info.actuated_dof_num());
    input_view_mut(info, input, start, len)
}

/// Force of a contact, world frame (3).
///
/// `contact_index` is unified over all contacts, point contacts first.
pub fn contact_force<'a, T: Scalar>(
    info: &ModelInfo,
    input: &'a DVector<T>,
    contact_index: usize,
) -> AccessResult<DVectorView<'a, T>> {
    check_dimension("input", info.input_dim(), input.len())?;
    let start = force_offset(info, contact_index)?;
    input_view(info, input, start, 3)
}

/// Mutable contact force.
pub fn contact_force_mut<'a, T: Scalar>(
    info: &ModelInfo,
    input: &'a mut DVector<T>,
    contact_index: usize,
) -> AccessResult<DVectorViewMut<'a, T>> {
    check_dimension("input", info.input_dim(), input.len())?;
    let start = force_offset(info, contact_index)?;
    input_view_mut(info, input, start, 3)
}

/// Torque of a wrench contact, world frame (3).
///
/// Only wrench contacts carry a torque, so `contact_index` must lie in
/// `np..np + nw`.
pub fn contact_torque<'a, T: Scalar>(
    info: &ModelInfo,
    input: &'a DVector<T>,
    contact_index: usize,
) -> AccessResult<DVectorView<'a, T>> {
    check_dimension("input", info.input_dim(), input.len())?;
    let start = torque_offset(info, contact_index)?;
    input_view(info, input, start, 3)
}

/// Mutable contact torque.
pub fn contact_torque_mut<'a, T: Scalar>(
    info: &ModelInfo,
    input: &'a mut DVector<T>,
    contact_index: usize,
) -> AccessResult<DVectorViewMut<'a, T>> {
    check_dimension("input", info.input_dim(), input.len())?;
    let start = torque_offset(info, contact_index)?;
    input_view_mut(info, input, start, 3)
}

fn force_offset(info: &ModelInfo, contact_index: usize) -> AccessResult<usize> {
    info.contact_offset(contact_index)
        .map_err(|_| ModelError::IndexOutOfRange {
            what: "contact force",
            index: contact_index,
            lower: 0,
            upper: info.num_contacts(),
        })
}

fn torque_offset(info: &ModelInfo, contact_index: usize) -> AccessResult<usize> {
    match info.contact_kind(contact_index) {
        Some(ContactKind::Wrench) => Ok(info.contact_offset(contact_index)? + 3),
        _ => Err(ModelError::IndexOutOfRange {
            what: "contact torque",
            index: contact_index,
            lower: info.num_point_contacts(),
            upper: info.num_contacts(),
        }),
    }
}
