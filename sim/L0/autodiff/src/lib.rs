//! Record-once automatic differentiation with persistent artifacts.
//!
//! Generic numerical code written against [`Real`] is traced on [`AdScalar`]
//! into a [`Tape`], compiled into a [`CompiledFunction`], and evaluated with
//! exact reverse-mode Jacobians. Compiled functions can be stored in an
//! [`ArtifactCache`] and reloaded by later processes.
//!
//! ```
//! use fbm_ad::{AdError, CompiledFunction, Real, record};
//!
//! let tape = record(2, |x| Ok::<_, AdError>(vec![x[0] * x[1].sin()]))?;
//! let f = CompiledFunction::compile(&tape)?;
//! let (value, jac) = f.jacobian(&[2.0, 0.0])?;
//! assert_eq!(value[0], 0.0);
//! assert_eq!(jac[(0, 1)], 2.0);
//! # Ok::<(), AdError>(())
//! ```
//!
//! # Layer 0 Crate
//!
//! Independent of the rigid-body code. The only I/O is the artifact cache.

#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,      // Accessors may grow non-const logic
    clippy::float_cmp,                 // Exact zero checks skip dead adjoints
    clippy::cast_possible_truncation,  // Node indices are range-checked when created
)]

mod artifact;
mod compiled;
mod error;
mod scalar;
mod tape;

pub use artifact::{
    ARTIFACT_EXTENSION, ARTIFACT_HEADER_SIZE, ARTIFACT_MAGIC, ARTIFACT_VERSION, ArtifactCache,
    ArtifactHeader, ArtifactKey, ArtifactSource, load_artifact, save_artifact,
};
pub use compiled::CompiledFunction;
pub use error::{AdError, Result};
pub use scalar::{AdScalar, Real};
pub use tape::{Op, Tape, is_recording, record};
