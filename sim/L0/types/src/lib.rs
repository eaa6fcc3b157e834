//! State/input layout for floating-base robot dynamics.
//!
//! This crate defines the minimal parameterization shared by every other
//! crate in the workspace:
//!
//! - [`ModelInfo`]: contact and joint counts and the dimensions derived from them
//! - [`access`]: zero-copy views into flat state and input vectors
//! - [`DynamicsBuildConfig`]: how a differentiated dynamics model is built and cached
//!
//! # Layout
//!
//! ```text
//! state = [ v_B | ω_B | p_W | yaw pitch roll | q_joints ]      (12 + nj)
//! input = [ f_point... | (f, τ)_wrench... | qd_joints ]         (3np + 6nw + nj)
//! ```
//!
//! Base velocities are expressed in the base frame, contact forces and torques
//! in the world frame.
//!
//! # Layer 0 Crate
//!
//! No solver, no AD, no I/O. Only layout and validation.

#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn, // nalgebra views can't be built in const fns
    clippy::doc_markdown,         // Greek symbols in layout docs
    clippy::missing_errors_doc,   // accessor errors are described once in the `access` module docs
)]

pub mod access;
mod config;
mod error;
mod info;

pub use config::DynamicsBuildConfig;
pub use error::{ModelError, check_dimension};
pub use info::{BASE_POSE_DIM, BASE_VELOCITY_DIM, ContactKind, ModelInfo};

/// Result type for layout operations.
pub type Result<T> = std::result::Result<T, ModelError>;
