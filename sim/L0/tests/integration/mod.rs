//! Integration tests for the fbm-* crate ecosystem.
//!
//! These tests verify end-to-end behavior across crates:
//! - Compiled Jacobians against finite differences of the compiled value
//! - Artifact reuse, corruption and recovery
//! - Jacobian lifting against independently differentiated quantities
//! - Physical sanity of the flow map
//! - Layout contracts of the access helpers
//! - Sharing one compiled model across threads

#![allow(clippy::float_cmp, clippy::similar_names, clippy::cast_precision_loss)]

pub mod artifact_cache;
pub mod concurrency;
pub mod fixtures;
pub mod flow_map_derivatives;
pub mod layout;
pub mod mapping_jacobians;
pub mod physics_sanity;
