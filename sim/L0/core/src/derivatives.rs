//! Finite-difference linearization and derivative validation.
//!
//! The compiled tape gives exact Jacobians; these utilities produce the
//! black-box finite-difference counterpart of any flow map and compare the
//! two. Perturbations are taken directly in state and input coordinates.
//!
//! # Quick start
//!
//! ```ignore
//! use fbm_core::{FdConfig, FloatingBaseDynamicsAd, Model, validate_against_fd};
//!
//! let model = Model::quadruped();
//! let dynamics = FloatingBaseDynamicsAd::new(&model, model.model_info()?, &config)?;
//! let err = validate_against_fd(&dynamics, 0.0, &x, &u, &FdConfig::default())?;
//! assert!(err < 1e-5);
//! ```

use fbm_types::{ModelError, check_dimension};
use nalgebra::{DMatrix, DVector};

use crate::dynamics::{FloatingBaseDynamicsAd, LinearApproximation};
use crate::error::DynamicsError;

/// Configuration for finite-difference derivatives.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FdConfig {
    /// Perturbation magnitude.
    /// Default: `1e-6`. Must be in `(0, 1e-2]`.
    pub eps: f64,

    /// Use centered differences (O(ε²) error, 2x cost) vs forward differences.
    /// Default: `true`.
    pub centered: bool,

    /// Magnitude below which [`max_relative_error`] measures absolute error.
    /// Default: `1e-2`.
    pub floor: f64,
}

impl Default for FdConfig {
    fn default() -> Self {
        Self {
            eps: 1e-6,
            centered: true,
            floor: 1e-2,
        }
    }
}

impl FdConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidConfiguration`] for an out-of-range `eps`
    /// or a negative `floor`.
    pub fn validate(&self) -> Result<(), ModelError> {
        if !(self.eps > 0.0 && self.eps <= 1e-2) {
            return Err(ModelError::invalid_config(format!(
                "finite-difference eps must be in (0, 1e-2], got {}",
                self.eps
            )));
        }
        if !(self.floor >= 0.0) {
            return Err(ModelError::invalid_config(format!(
                "relative error floor must be non-negative, got {}",
                self.floor
            )));
        }
        Ok(())
    }
}

/// Finite-difference linearization of `f(state, input)`.
///
/// Every state and input entry is perturbed in turn, so `f` runs
/// `state_dim + input_dim` times (twice that when centered) plus once at the
/// nominal point.
///
/// # Errors
///
/// Returns an invalid-configuration error for a bad `config`, and propagates
/// any error of `f`.
pub fn fd_linear_approximation<F, E>(
    mut f: F,
    state: &DVector<f64>,
    input: &DVector<f64>,
    config: &FdConfig,
) -> Result<LinearApproximation, E>
where
    F: FnMut(&DVector<f64>, &DVector<f64>) -> Result<DVector<f64>, E>,
    E: From<ModelError>,
{
    config.validate()?;
    let eps = config.eps;
    let f0 = f(state, input)?;
    let n = f0.len();

    let mut dfdx = DMatrix::zeros(n, state.len());
    let mut x = state.clone();
    for i in 0..state.len() {
        x[i] = state[i] + eps;
        let plus = f(&x, input)?;
        let column = if config.centered {
            x[i] = state[i] - eps;
            let minus = f(&x, input)?;
            (plus - minus) / (2.0 * eps)
        } else {
            (plus - &f0) / eps
        };
        x[i] = state[i];
        dfdx.set_column(i, &column);
    }

    let mut dfdu = DMatrix::zeros(n, input.len());
    let mut u = input.clone();
    for i in 0..input.len() {
        u[i] = input[i] + eps;
        let plus = f(state, &u)?;
        let column = if config.centered {
            u[i] = input[i] - eps;
            let minus = f(state, &u)?;
            (plus - minus) / (2.0 * eps)
        } else {
            (plus - &f0) / eps
        };
        u[i] = input[i];
        dfdu.set_column(i, &column);
    }

    Ok(LinearApproximation { f: f0, dfdx, dfdu })
}

/// Compare matrices element-wise, returning max relative error and location.
///
/// Uses `floor` to prevent division-by-zero for near-zero entries:
/// `rel_error(i,j) = |a(i,j) − b(i,j)| / max(|a(i,j)|, |b(i,j)|, floor)`
///
/// # Errors
///
/// Returns [`ModelError::DimensionMismatch`] if `a` and `b` have different shapes.
pub fn max_relative_error(a: &DMatrix<f64>, b: &DMatrix<f64>, floor: f64) -> Result<(f64, (usize, usize)), ModelError> {
    check_dimension("matrix rows", a.nrows(), b.nrows())?;
    check_dimension("matrix columns", a.ncols(), b.ncols())?;
    let mut max_err = 0.0_f64;
    let mut max_loc = (0, 0);
    for r in 0..a.nrows() {
        for c in 0..a.ncols() {
            let va = a[(r, c)];
            let vb = b[(r, c)];
            let denom = va.abs().max(vb.abs()).max(floor);
            let err = (va - vb).abs() / denom;
            if err > max_err {
                max_err = err;
                max_loc = (r, c);
            }
        }
    }
    Ok((max_err, max_loc))
}

/// Compare the compiled Jacobians against finite differences of the compiled value.
///
/// Returns the larger of the max relative errors of `dfdx` and `dfdu`.
///
/// # Errors
///
/// Returns [`DynamicsError`] for wrong vector lengths or a bad `config`.
pub fn validate_against_fd(
    dynamics: &FloatingBaseDynamicsAd,
    time: f64,
    state: &DVector<f64>,
    input: &DVector<f64>,
    config: &FdConfig,
) -> Result<f64, DynamicsError> {
    let exact = dynamics.linear_approximation(time, state, input)?;
    let fd = fd_linear_approximation(|x, u| dynamics.value(time, x, u), state, input, config)?;

    let (err_x, loc_x) = max_relative_error(&exact.dfdx, &fd.dfdx, config.floor)?;
    let (err_u, loc_u) = max_relative_error(&exact.dfdu, &fd.dfdu, config.floor)?;
    tracing::debug!(err_x, ?loc_x, err_u, ?loc_u, "AD vs FD");
    Ok(err_x.max(err_u))
}
