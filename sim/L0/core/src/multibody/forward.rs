//! Contact wrench and base acceleration.
//!
//! The base rows of the equations of motion with zero joint accelerations:
//!
//! ```text
//! Ic · a_B = Σ_c X_cᵀ f_c − h_B(q, v)
//! ```
//!
//! solved through the Schur complement on the center of mass, which needs
//! only a closed-form 3×3 inverse and no branching.

use fbm_ad::Real;
use fbm_types::{ContactKind, ModelError, ModelInfo, access, check_dimension};
use nalgebra::{DVector, Matrix3, Vector3};

use super::{Data, Model};
use crate::spatial::{SpatialVector, inverse_3x3};

impl<T: Real> Data<T> {
    /// Sum the contact forces (and wrench torques) of `input` into one base wrench.
    ///
    /// Forces and torques in `input` are in world coordinates; the result is in
    /// base coordinates about the base origin. Requires
    /// [`forward_kinematics`](Data::forward_kinematics).
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::DimensionMismatch`] if `input` does not match
    /// `info`, or [`ModelError::InvalidConfiguration`] if `info` disagrees with
    /// the model's contact list.
    pub fn contact_wrench(
        &mut self,
        model: &Model,
        info: &ModelInfo,
        input: &DVector<T>,
    ) -> Result<SpatialVector<T>, ModelError> {
        check_dimension("input", info.input_dim(), input.len())?;
        if model.model_info()? != *info {
            return Err(ModelError::invalid_config("model info does not match the model's contacts"));
        }

        let world_to_base = self.base_rot.transpose();
        let mut total = SpatialVector::zeros();
        for (index, contact) in model.contacts.iter().enumerate() {
            let r = self.body_pos[contact.body] + self.body_rot[contact.body] * contact.pos.map(T::from_f64);
            let force = world_to_base * access::contact_force(info, input, index)?.into_owned();
            let mut moment = r.cross(&force);
            if contact.kind == ContactKind::Wrench {
                moment += world_to_base * access::contact_torque(info, input, index)?.into_owned();
            }
            total = total + SpatialVector::new(force, moment);
        }

        self.contact_wrench = total;
        Ok(total)
    }

    /// Solve for the base spatial acceleration (base coordinates).
    ///
    /// Runs the whole pipeline: forward kinematics, RNE bias, composite
    /// inertia and contact wrench, then the 6×6 base solve.
    ///
    /// # Errors
    ///
    /// Propagates the dimension and consistency checks of each stage.
    pub fn base_acceleration(
        &mut self,
        model: &Model,
        info: &ModelInfo,
        qpos: &DVector<T>,
        qvel: &DVector<T>,
        input: &DVector<T>,
    ) -> Result<SpatialVector<T>, ModelError> {
        self.forward_kinematics(model, qpos)?;
        let bias = self.rne_bias(model, qvel)?;
        self.composite_inertia(model);
        let external = self.contact_wrench(model, info, input)?;

        let net = external - bias;
        self.base_acc = solve_base(self.crb_mass, &self.crb_moment, &self.crb_inertia, &net);
        Ok(self.base_acc)
    }
}

/// Solve `[[M·1, −[h]×], [[h]×, I_o]] · (v̇, ω̇) = (F, N)`.
///
/// `M` is the total mass, `h = Σ mᵢ cᵢ` the first mass moment and `I_o` the
/// rotational inertia about the frame origin.
fn solve_base<T: Real>(mass: T, moment: &Vector3<T>, inertia: &Matrix3<T>, net: &SpatialVector<T>) -> SpatialVector<T> {
    let inv_mass = T::one() / mass;
    let h = moment;
    let h_outer = h * h.transpose();
    let h_sq = h.dot(h);
    let schur = inertia - (Matrix3::identity() * h_sq - h_outer) * inv_mass;

    let rhs = net.angular - h.cross(&net.linear) * inv_mass;
    let omega_dot = inverse_3x3(&schur) * rhs;
    let v_dot = (net.linear + h.cross(&omega_dot)) * inv_mass;
    SpatialVector::new(v_dot, omega_dot)
}
