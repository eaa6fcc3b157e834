//! Per-evaluation solver workspace.

use fbm_ad::Real;
use nalgebra::{Matrix3, Vector3};

use super::Model;
use crate::spatial::SpatialVector;

/// Dynamic solver state for one [`Model`] (like mjData).
///
/// Holds the results of each pipeline stage so later stages and callers can
/// inspect them. Body quantities are expressed in the base frame; the world
/// pose of the base is kept separately. A `Data` is owned by one user at a
/// time and is never shared between concurrent evaluations.
#[derive(Debug, Clone)]
pub struct Data<T: Real> {
    /// Generalized position dimension of the model this data was made for.
    pub nq: usize,
    /// Generalized velocity dimension.
    pub nv: usize,

    // ==================== Kinematics ====================
    /// Base orientation (base → world).
    pub base_rot: Matrix3<T>,
    /// Base position in the world frame.
    pub base_pos: Vector3<T>,
    /// Joint frame rotation of each body relative to its parent.
    pub joint_rot: Vec<Matrix3<T>>,
    /// Body orientation (body → base).
    pub body_rot: Vec<Matrix3<T>>,
    /// Body origin in base coordinates.
    pub body_pos: Vec<Vector3<T>>,

    // ==================== Dynamics ====================
    /// Body spatial velocity in body coordinates.
    pub body_vel: Vec<SpatialVector<T>>,
    /// Body spatial acceleration (gravity as fictitious base acceleration).
    pub body_acc: Vec<SpatialVector<T>>,
    /// Net spatial force transmitted into each body, body coordinates.
    pub body_force: Vec<SpatialVector<T>>,
    /// Bias wrench on the base `h_B(q, v)`, base coordinates.
    pub base_bias: SpatialVector<T>,

    // ==================== Composite inertia ====================
    /// Total mass.
    pub crb_mass: T,
    /// First mass moment `Σ mᵢ cᵢ` about the base origin, base coordinates.
    pub crb_moment: Vector3<T>,
    /// Rotational inertia about the base origin, base coordinates.
    pub crb_inertia: Matrix3<T>,

    // ==================== Contacts and output ====================
    /// Net contact wrench on the base, base coordinates.
    pub contact_wrench: SpatialVector<T>,
    /// Base spatial acceleration, base coordinates.
    pub base_acc: SpatialVector<T>,
}

impl Model {
    /// Allocate a workspace for this model.
    #[must_use]
    pub fn make_data<T: Real>(&self) -> Data<T> {
        let n = self.nbody();
        Data {
            nq: self.nq(),
            nv: self.nv(),
            base_rot: Matrix3::identity(),
            base_pos: Vector3::zeros(),
            joint_rot: vec![Matrix3::identity(); n],
            body_rot: vec![Matrix3::identity(); n],
            body_pos: vec![Vector3::zeros(); n],
            body_vel: vec![SpatialVector::zeros(); n],
            body_acc: vec![SpatialVector::zeros(); n],
            body_force: vec![SpatialVector::zeros(); n],
            base_bias: SpatialVector::zeros(),
            crb_mass: T::zero(),
            crb_moment: Vector3::zeros(),
            crb_inertia: Matrix3::zeros(),
            contact_wrench: SpatialVector::zeros(),
            base_acc: SpatialVector::zeros(),
        }
    }
}
