//! Continuous-time flow map and its compiled, differentiated form.
//!
//! [`flow_map`] is the generic `state_dot = f(state, input)` of a floating-base
//! robot whose joints are velocity-controlled through the input. It runs on
//! `f64` directly, and on [`AdScalar`] to record the tape behind
//! [`FloatingBaseDynamicsAd`].
//!
//! # State derivative
//!
//! ```text
//! state_dot = [ a_B (6) | R(euler)·v_B | T(euler)⁻¹·ω_B | joint velocities ]
//! ```

use std::sync::Arc;

use fbm_ad::{AdError, AdScalar, ArtifactCache, ArtifactKey, ArtifactSource, CompiledFunction, Real, record};
use fbm_types::{DynamicsBuildConfig, ModelError, ModelInfo, access, check_dimension};
use nalgebra::{DMatrix, DVector};
use tracing::{debug, info};

use crate::error::{DynamicsError, Result};
use crate::mapping::FloatingBaseMapping;
use crate::multibody::{Data, Model};
use crate::rotation::{local_angular_velocity_to_euler_rates, rotation_zyx};

/// Evaluate the state derivative of `state` under `input`.
///
/// `data` is the solver workspace for `model`; `mapping` provides the
/// conversion to solver coordinates and the layout. The time argument of the
/// flow map does not enter the dynamics and is omitted here.
///
/// # Errors
///
/// Returns [`ModelError::DimensionMismatch`] for wrong vector lengths and
/// [`ModelError::InvalidConfiguration`] if the mapping's info does not
/// describe `model`.
pub fn flow_map<T: Real>(
    model: &Model,
    data: &mut Data<T>,
    mapping: &FloatingBaseMapping<'_, T>,
    state: &DVector<T>,
    input: &DVector<T>,
) -> std::result::Result<DVector<T>, ModelError> {
    let info = mapping.info();
    check_dimension("state", info.state_dim(), state.len())?;
    check_dimension("input", info.input_dim(), input.len())?;

    let qpos = mapping.to_generalized_position(state)?;
    let qvel = mapping.to_generalized_velocity(state, input)?;
    let acc = data.base_acceleration(model, info, &qpos, &qvel, input)?;

    let euler = access::base_orientation_zyx(info, state)?.fixed_rows::<3>(0).into_owned();
    let linear = access::base_linear_velocity(info, state)?.fixed_rows::<3>(0).into_owned();
    let angular = access::base_angular_velocity(info, state)?.fixed_rows::<3>(0).into_owned();

    let mut state_dot = DVector::from_element(info.state_dim(), T::zero());
    state_dot.fixed_rows_mut::<3>(0).copy_from(&acc.linear);
    state_dot.fixed_rows_mut::<3>(3).copy_from(&acc.angular);
    state_dot.fixed_rows_mut::<3>(6).copy_from(&(rotation_zyx(&euler) * linear));
    state_dot
        .fixed_rows_mut::<3>(9)
        .copy_from(&local_angular_velocity_to_euler_rates(&euler, &angular));
    state_dot
        .rows_mut(12, info.actuated_dof_num())
        .copy_from(&access::joint_velocities(info, input)?);
    Ok(state_dot)
}

/// First-order approximation of the flow map at one point.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearApproximation {
    /// Flow map value (`state_dim`).
    pub f: DVector<f64>,
    /// Derivative with respect to the state (`state_dim × state_dim`).
    pub dfdx: DMatrix<f64>,
    /// Derivative with respect to the input (`state_dim × input_dim`).
    pub dfdu: DMatrix<f64>,
}

/// Differentiated floating-base dynamics backed by a compiled tape.
///
/// The tape has inputs `[time, state, input]` and outputs `state_dot`. It is
/// built once (or loaded from its artifact) and shared by clones; evaluation
/// takes `&self` and touches no shared mutable state.
#[derive(Debug, Clone)]
pub struct FloatingBaseDynamicsAd {
    function: Arc<CompiledFunction>,
    info: ModelInfo,
    source: ArtifactSource,
}

impl FloatingBaseDynamicsAd {
    /// Build or load the differentiated dynamics of `model`.
    ///
    /// The artifact is `<model_folder>/<model_name>.fbad`, keyed by the model
    /// and its contact/joint counts, so an artifact of a different robot is
    /// never reused.
    ///
    /// # Errors
    ///
    /// - [`DynamicsError::Model`] for an invalid config or model, or if `info`
    ///   does not match the model.
    /// - [`DynamicsError::ArtifactLoad`] if an artifact exists but cannot be
    ///   used and `recompile` is false.
    /// - [`DynamicsError::Compilation`] if recording, compiling or storing fails.
    pub fn new(model: &Model, info: ModelInfo, config: &DynamicsBuildConfig) -> Result<Self> {
        config.validate()?;
        model.validate()?;
        let model_info = model.model_info()?;
        if model_info != info {
            return Err(ModelError::invalid_config(format!(
                "model info {info:?} does not match model '{}' ({model_info:?})",
                model.name
            ))
            .into());
        }

        let name = config.model_name.clone();
        let compilation = |source: AdError| DynamicsError::Compilation {
            name: name.clone(),
            source,
        };
        let signature =
            bincode::serialize(&(model, &info)).map_err(|e| compilation(AdError::compile(e.to_string())))?;
        let key = ArtifactKey::new(name.clone(), signature);
        let cache = ArtifactCache::new(&config.model_folder);
        let n_inputs = 1 + info.state_dim() + info.input_dim();

        let (function, source) = cache
            .load_or_build(&key, config.recompile, || record_flow_map(model, info))
            .map_err(|e| {
                if e.is_load_error() {
                    DynamicsError::ArtifactLoad {
                        path: cache.path_for(&name),
                        source: e,
                    }
                } else {
                    compilation(e)
                }
            })?;

        if function.n_inputs() != n_inputs || function.n_outputs() != info.state_dim() {
            let source_err = AdError::ArtifactMismatch {
                path: source.path().to_path_buf(),
                reason: format!(
                    "function maps {} -> {}, expected {} -> {}",
                    function.n_inputs(),
                    function.n_outputs(),
                    n_inputs,
                    info.state_dim()
                ),
            };
            return Err(if source.is_loaded() {
                DynamicsError::ArtifactLoad {
                    path: source.path().to_path_buf(),
                    source: source_err,
                }
            } else {
                compilation(source_err)
            });
        }

        let path = source.path().display();
        if config.verbose {
            info!(model = %name, %path, loaded = source.is_loaded(), nodes = function.n_nodes(), "dynamics ready");
        } else {
            debug!(model = %name, %path, loaded = source.is_loaded(), nodes = function.n_nodes(), "dynamics ready");
        }

        Ok(Self {
            function: Arc::new(function),
            info,
            source,
        })
    }

    /// Model info of the robot.
    #[must_use]
    pub fn info(&self) -> &ModelInfo {
        &self.info
    }

    /// Whether the function was loaded or freshly compiled, and from where.
    #[must_use]
    pub fn artifact_source(&self) -> &ArtifactSource {
        &self.source
    }

    /// Evaluate the flow map.
    ///
    /// # Errors
    ///
    /// Returns [`DynamicsError::Model`] with a dimension mismatch for wrong
    /// state or input lengths.
    pub fn value(&self, time: f64, state: &DVector<f64>, input: &DVector<f64>) -> Result<DVector<f64>> {
        let x = self.pack(time, state, input)?;
        let y = self
            .function
            .evaluate(&x)
            .map_err(|source| DynamicsError::Evaluation { source })?;
        Ok(DVector::from_vec(y))
    }

    /// Evaluate the flow map and its exact Jacobians.
    ///
    /// # Errors
    ///
    /// Returns [`DynamicsError::Model`] with a dimension mismatch for wrong
    /// state or input lengths.
    pub fn linear_approximation(
        &self,
        time: f64,
        state: &DVector<f64>,
        input: &DVector<f64>,
    ) -> Result<LinearApproximation> {
        let x = self.pack(time, state, input)?;
        let (y, jac) = self
            .function
            .jacobian(&x)
            .map_err(|source| DynamicsError::Evaluation { source })?;

        let sd = self.info.state_dim();
        let id = self.info.input_dim();
        Ok(LinearApproximation {
            f: DVector::from_vec(y),
            dfdx: jac.columns(1, sd).into_owned(),
            dfdu: jac.columns(1 + sd, id).into_owned(),
        })
    }

    fn pack(&self, time: f64, state: &DVector<f64>, input: &DVector<f64>) -> Result<Vec<f64>> {
        check_dimension("state", self.info.state_dim(), state.len())?;
        check_dimension("input", self.info.input_dim(), input.len())?;
        let mut x = Vec::with_capacity(1 + state.len() + input.len());
        x.push(time);
        x.extend(state.iter());
        x.extend(input.iter());
        Ok(x)
    }
}

/// Record the flow map of `model` on the AD scalar and compile it.
fn record_flow_map(model: &Model, info: ModelInfo) -> fbm_ad::Result<CompiledFunction> {
    let sd = info.state_dim();
    let id = info.input_dim();
    let tape = record(1 + sd + id, |x| {
        let mut data = model.make_data::<AdScalar>();
        let mapping = FloatingBaseMapping::new(info);
        let state = DVector::from_column_slice(&x[1..=sd]);
        let input = DVector::from_column_slice(&x[1 + sd..]);
        flow_map(model, &mut data, &mapping, &state, &input).map(|y| y.iter().copied().collect())
    })?;
    CompiledFunction::compile(&tape)
}
