//! Floating-base robot dynamics with compiled automatic differentiation.
//!
//! This crate turns a static robot description into a differentiable
//! continuous-time flow map `state_dot = f(time, state, input)`:
//!
//! - [`Model`] is static (immutable once built)
//! - [`Data`] is the per-evaluation solver workspace
//! - [`FloatingBaseMapping`] converts the minimal state/input layout to
//!   solver coordinates and lifts tangent-space Jacobians back
//! - [`FloatingBaseDynamicsAd`] records [`flow_map`] once, compiles it, and
//!   caches the result as an artifact on disk
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Model                               │
//! │  Static: kinematic tree, mass properties, contact frames    │
//! └─────────────────────────┬───────────────────────────────────┘
//!                           │ model_info()
//!                           ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  FloatingBaseMapping                        │
//! │  state (euler, body twist) → qpos (quaternion), qvel        │
//! └─────────────────────────┬───────────────────────────────────┘
//!                           │
//!                           ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Data                                │
//! │  FK → RNE bias → composite inertia → contacts → base solve  │
//! └─────────────────────────┬───────────────────────────────────┘
//!                           │ recorded on AdScalar
//!                           ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │               FloatingBaseDynamicsAd                        │
//! │  value / linear_approximation from the compiled tape        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```no_run
//! use fbm_core::{DynamicsBuildConfig, FloatingBaseDynamicsAd, Model};
//! use nalgebra::DVector;
//!
//! let model = Model::quadruped();
//! let info = model.model_info()?;
//! let config = DynamicsBuildConfig::new("quadruped").recompile(false);
//! let dynamics = FloatingBaseDynamicsAd::new(&model, info, &config)?;
//!
//! let x = DVector::zeros(info.state_dim());
//! let u = DVector::zeros(info.input_dim());
//! let lin = dynamics.linear_approximation(0.0, &x, &u)?;
//! assert_eq!(lin.dfdx.nrows(), info.state_dim());
//! # Ok::<(), fbm_core::DynamicsError>(())
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,       // Many methods can't be const due to nalgebra
    clippy::suboptimal_flops,           // mul_add style changes aren't always clearer
    clippy::neg_cmp_op_on_partial_ord,  // !(x > 0.0) is intentional for NaN rejection
    clippy::many_single_char_names,     // Rotation formulas use x, y, z, w
    clippy::doc_markdown,               // Not all technical terms need backticks
)]

// Rotation parameterizations (ZYX Euler, quaternion, axis-angle)
pub mod rotation;

// Spatial algebra
pub mod spatial;

// Multibody solver (Model/Data, FK, RNE, composite inertia, Jacobians)
pub mod multibody;

// State/input ↔ generalized coordinates
pub mod mapping;

// Flow map and compiled dynamics
pub mod dynamics;

// Finite-difference validation
pub mod derivatives;

mod error;

pub use derivatives::{FdConfig, fd_linear_approximation, max_relative_error, validate_against_fd};
pub use dynamics::{FloatingBaseDynamicsAd, LinearApproximation, flow_map};
pub use error::{DynamicsError, Result};
pub use mapping::FloatingBaseMapping;
pub use multibody::{ContactFrame, Data, Model, RevoluteBody};
pub use spatial::SpatialVector;

// Re-export the layout and backend types callers need
pub use fbm_ad::{ArtifactSource, Real};
pub use fbm_types::{ContactKind, DynamicsBuildConfig, ModelError, ModelInfo, access};
