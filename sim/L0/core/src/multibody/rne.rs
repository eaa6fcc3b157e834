//! Recursive Newton-Euler bias wrench on the floating base.
//!
//! Computes `h_B(q, v)`: the wrench the base would have to receive to keep
//! every generalized acceleration at zero. Gravity enters as a fictitious
//! upward acceleration of the base, so `h_B` carries gravity, Coriolis and
//! centrifugal effects of the whole tree.
//!
//! Reference: Featherstone, "Rigid Body Dynamics Algorithms", Chapter 5

use fbm_ad::Real;
use fbm_types::{ModelError, check_dimension};
use nalgebra::{DVector, Vector3};

use super::{Data, Model};
use crate::spatial::{SpatialInertia, SpatialVector, spatial_cross_force, spatial_cross_motion};

impl<T: Real> Data<T> {
    /// Run RNE with zero generalized acceleration and return the base bias wrench.
    ///
    /// `qvel` is `[v_B, ω_B, joint rates]` with the base twist in base
    /// coordinates. Requires [`forward_kinematics`](Data::forward_kinematics)
    /// for the same configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::DimensionMismatch`] if `qvel` is not `nv` long.
    #[allow(clippy::similar_names)]
    pub fn rne_bias(&mut self, model: &Model, qvel: &DVector<T>) -> Result<SpatialVector<T>, ModelError> {
        check_dimension("generalized velocity", model.nv(), qvel.len())?;

        let gravity = model.gravity.map(T::from_f64);
        self.body_vel[0] = SpatialVector::new(
            Vector3::new(qvel[0], qvel[1], qvel[2]),
            Vector3::new(qvel[3], qvel[4], qvel[5]),
        );
        self.body_acc[0] = SpatialVector::new(-(self.base_rot.transpose() * gravity), Vector3::zeros());

        // Forward pass: velocities and accelerations
        for i in 1..model.nbody() {
            let parent = model.body_parent[i];
            let e_t = self.joint_rot[i].transpose();
            let r = model.body_pos[i].map(T::from_f64);
            let axis = model.jnt_axis[i].map(T::from_f64);
            let joint_twist = SpatialVector::new(Vector3::zeros(), axis * qvel[6 + i - 1]);

            let vp = self.body_vel[parent];
            let ap = self.body_acc[parent];
            let v = SpatialVector::new(
                e_t * (vp.linear + vp.angular.cross(&r)),
                e_t * vp.angular,
            ) + joint_twist;
            let a = SpatialVector::new(
                e_t * (ap.linear + ap.angular.cross(&r)),
                e_t * ap.angular,
            ) + spatial_cross_motion(&v, &joint_twist);

            self.body_vel[i] = v;
            self.body_acc[i] = a;
        }

        for i in 0..model.nbody() {
            let inertia = SpatialInertia::from_f64(model.body_mass[i], &model.body_ipos[i], &model.body_inertia[i]);
            let v = self.body_vel[i];
            self.body_force[i] = inertia.apply(&self.body_acc[i]) + spatial_cross_force(&v, &inertia.apply(&v));
        }

        // Backward pass: accumulate child forces into parents
        for i in (1..model.nbody()).rev() {
            let parent = model.body_parent[i];
            let e = self.joint_rot[i];
            let r = model.body_pos[i].map(T::from_f64);
            let f = self.body_force[i];
            let force = e * f.linear;
            let moment = e * f.angular + r.cross(&force);
            self.body_force[parent] = self.body_force[parent] + SpatialVector::new(force, moment);
        }

        self.base_bias = self.body_force[0];
        Ok(self.base_bias)
    }
}
