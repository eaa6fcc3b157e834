//! Forward kinematics.

use fbm_ad::Real;
use fbm_types::{ModelError, check_dimension};
use nalgebra::{DVector, Vector3, Vector4};

use super::{Data, Model};
use crate::rotation::{axis_angle_rotation, rotation_from_quaternion};

impl<T: Real> Data<T> {
    /// Compute body poses from a generalized position `[p, quat (x,y,z,w), joints]`.
    ///
    /// Fills [`base_rot`](Data::base_rot), [`base_pos`](Data::base_pos),
    /// [`joint_rot`](Data::joint_rot), [`body_rot`](Data::body_rot) and
    /// [`body_pos`](Data::body_pos).
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::DimensionMismatch`] if `qpos` is not `nq` long.
    pub fn forward_kinematics(&mut self, model: &Model, qpos: &DVector<T>) -> Result<(), ModelError> {
        check_dimension("generalized position", model.nq(), qpos.len())?;

        self.base_pos = Vector3::new(qpos[0], qpos[1], qpos[2]);
        self.base_rot = rotation_from_quaternion(&Vector4::new(qpos[3], qpos[4], qpos[5], qpos[6]));

        for i in 1..model.nbody() {
            let parent = model.body_parent[i];
            let fixed = model.body_quat[i].to_rotation_matrix().into_inner().map(T::from_f64);
            let joint = axis_angle_rotation(&model.jnt_axis[i], qpos[7 + i - 1]);
            self.joint_rot[i] = fixed * joint;

            let offset = model.body_pos[i].map(T::from_f64);
            self.body_pos[i] = self.body_pos[parent] + self.body_rot[parent] * offset;
            self.body_rot[i] = self.body_rot[parent] * self.joint_rot[i];
        }
        Ok(())
    }

    /// World position of a point given in body coordinates.
    ///
    /// Requires [`forward_kinematics`](Data::forward_kinematics) to have run.
    #[must_use]
    pub fn world_point(&self, body: usize, local: &Vector3<T>) -> Vector3<T> {
        self.base_pos + self.base_rot * (self.body_pos[body] + self.body_rot[body] * local)
    }
}
