//! Conversion between the minimal state/input layout and solver coordinates.
//!
//! The state stores the base orientation as ZYX Euler angles and the base
//! twist in the base frame; the solver works with a unit quaternion and a
//! tangent-space velocity. [`FloatingBaseMapping`] converts vectors one way
//! and lifts tangent-space Jacobians the other way.
//!
//! # Tangent convention
//!
//! A solver configuration is perturbed as
//!
//! ```text
//! q ⊕ δ = (p + R·δ_v, R·exp(δ_ω), θ + δ_θ)
//! ```
//!
//! so the chain-rule blocks from state to tangent displacement are
//! `∂δ_v/∂p = Rᵀ`, `∂δ_ω/∂euler = T(euler)` and the identity on joints.

use fbm_ad::Real;
use fbm_types::{ModelError, ModelInfo, access, check_dimension};
use nalgebra::{DMatrix, DVector};

use crate::multibody::Data;
use crate::rotation::{euler_rates_to_local_angular_velocity, quaternion_from_zyx, rotation_zyx};

/// Maps state and input vectors to generalized coordinates of one robot.
///
/// Optionally bound to a solver workspace, which the mapping borrows but never
/// owns. Cloning produces an unbound mapping for the same [`ModelInfo`].
#[derive(Debug)]
pub struct FloatingBaseMapping<'ctx, T: Real> {
    info: ModelInfo,
    data: Option<&'ctx Data<T>>,
}

impl<T: Real> Clone for FloatingBaseMapping<'_, T> {
    fn clone(&self) -> Self {
        Self::new(self.info)
    }
}

impl<'ctx, T: Real> FloatingBaseMapping<'ctx, T> {
    /// Unbound mapping for `info`.
    #[must_use]
    pub fn new(info: ModelInfo) -> Self {
        Self { info, data: None }
    }

    /// Bind a solver workspace. Replaces any previous binding.
    pub fn bind(&mut self, data: &'ctx Data<T>) {
        self.data = Some(data);
    }

    /// Whether a workspace is bound.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.data.is_some()
    }

    /// Model info this mapping was made for.
    #[must_use]
    pub fn info(&self) -> &ModelInfo {
        &self.info
    }

    /// Generalized position `[p, quat (x, y, z, w), joint angles]` of a state.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::DimensionMismatch`] if `state` is not `state_dim` long.
    pub fn to_generalized_position(&self, state: &DVector<T>) -> Result<DVector<T>, ModelError> {
        let info = &self.info;
        let position = access::base_position(info, state)?;
        let euler = access::base_orientation_zyx(info, state)?.fixed_rows::<3>(0).into_owned();
        let joints = access::joint_angles(info, state)?;
        let quat = quaternion_from_zyx(&euler);

        let mut q = DVector::from_element(info.generalized_position_num(), T::zero());
        q.fixed_rows_mut::<3>(0).copy_from(&position);
        q.fixed_rows_mut::<4>(3).copy_from(&quat);
        q.rows_mut(7, info.actuated_dof_num()).copy_from(&joints);
        Ok(q)
    }

    /// Generalized velocity `[v_B, ω_B, joint velocities]` of a state and input.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::DimensionMismatch`] if `state` or `input` has the
    /// wrong length.
    pub fn to_generalized_velocity(&self, state: &DVector<T>, input: &DVector<T>) -> Result<DVector<T>, ModelError> {
        let info = &self.info;
        let base = access::base_velocity(info, state)?;
        let joints = access::joint_velocities(info, input)?;

        let mut v = DVector::from_element(info.generalized_coordinates_num(), T::zero());
        v.fixed_rows_mut::<6>(0).copy_from(&base);
        v.rows_mut(6, info.actuated_dof_num()).copy_from(&joints);
        Ok(v)
    }

    fn check_bound_dimensions(&self) -> Result<(), ModelError> {
        if let Some(data) = self.data {
            check_dimension("bound workspace nv", self.info.generalized_coordinates_num(), data.nv)?;
            check_dimension("bound workspace nq", self.info.generalized_position_num(), data.nq)?;
        }
        Ok(())
    }
}

impl FloatingBaseMapping<'_, f64> {
    /// Lift tangent-space Jacobians to state/input Jacobians.
    ///
    /// `jq` and `jv` are derivatives of some quantity with respect to the
    /// tangent displacement of the configuration and the generalized velocity
    /// (`rows × nv` each). Returns `(dfdx, dfdu)` with
    ///
    /// ```text
    /// dfdx = jq · ∂δq/∂x + jv · ∂v/∂x
    /// dfdu = jv · ∂v/∂u
    /// ```
    ///
    /// Contact-force columns of `dfdu` are zero.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::DimensionMismatch`] if `state` has the wrong
    /// length, either Jacobian does not have `nv` columns, their row counts
    /// differ, or a bound workspace belongs to a different model.
    pub fn lift_jacobians(
        &self,
        state: &DVector<f64>,
        jq: &DMatrix<f64>,
        jv: &DMatrix<f64>,
    ) -> Result<(DMatrix<f64>, DMatrix<f64>), ModelError> {
        let info = &self.info;
        let nv = info.generalized_coordinates_num();
        let nj = info.actuated_dof_num();
        check_dimension("state", info.state_dim(), state.len())?;
        check_dimension("jq columns", nv, jq.ncols())?;
        check_dimension("jv columns", nv, jv.ncols())?;
        check_dimension("jv rows", jq.nrows(), jv.nrows())?;
        self.check_bound_dimensions()?;

        let euler = access::base_orientation_zyx(info, state)?.fixed_rows::<3>(0).into_owned();

        let mut dqdx = DMatrix::zeros(nv, info.state_dim());
        dqdx.fixed_view_mut::<3, 3>(0, 6).copy_from(&rotation_zyx(&euler).transpose());
        dqdx.fixed_view_mut::<3, 3>(3, 9).copy_from(&euler_rates_to_local_angular_velocity(&euler));
        let mut dvdx = DMatrix::zeros(nv, info.state_dim());
        dvdx.fixed_view_mut::<6, 6>(0, 0).fill_with_identity();
        let mut dvdu = DMatrix::zeros(nv, info.input_dim());
        let joint_input = info.joint_velocity_offset();
        for k in 0..nj {
            dqdx[(6 + k, 12 + k)] = 1.0;
            dvdu[(6 + k, joint_input + k)] = 1.0;
        }

        let dfdx = jq * dqdx + jv * dvdx;
        let dfdu = jv * dvdu;
        Ok((dfdx, dfdu))
    }
}
