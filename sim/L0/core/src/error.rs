//! Error types for building and evaluating the differentiated dynamics.

use std::path::PathBuf;

use fbm_ad::AdError;
use fbm_types::ModelError;
use thiserror::Error;

/// Errors raised by [`FloatingBaseDynamicsAd`](crate::FloatingBaseDynamicsAd).
#[derive(Debug, Error)]
pub enum DynamicsError {
    /// Invalid configuration, wrong vector length, or bad contact index.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Recording, compiling or storing the flow map failed.
    #[error("failed to build dynamics '{name}': {source}")]
    Compilation {
        /// Artifact name of the model being built.
        name: String,
        /// Backend failure.
        #[source]
        source: AdError,
    },

    /// An artifact exists but cannot be used, and recompilation was not requested.
    #[error("failed to load dynamics artifact {path}: {source}")]
    ArtifactLoad {
        /// Artifact path.
        path: PathBuf,
        /// Backend failure.
        #[source]
        source: AdError,
    },

    /// The compiled function rejected an evaluation.
    #[error("evaluation failed: {source}")]
    Evaluation {
        /// Backend failure.
        #[source]
        source: AdError,
    },
}

impl DynamicsError {
    /// Check if this is a configuration error.
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::Model(e) if e.is_config_error())
    }

    /// Check if this is a dimension mismatch.
    #[must_use]
    pub fn is_dimension_mismatch(&self) -> bool {
        matches!(self, Self::Model(e) if e.is_dimension_mismatch())
    }

    /// Check if this is an out-of-range index.
    #[must_use]
    pub fn is_index_out_of_range(&self) -> bool {
        matches!(self, Self::Model(e) if e.is_index_out_of_range())
    }

    /// Check if building the function failed.
    #[must_use]
    pub fn is_compilation_error(&self) -> bool {
        matches!(self, Self::Compilation { .. })
    }

    /// Check if an existing artifact could not be used.
    #[must_use]
    pub fn is_artifact_load_error(&self) -> bool {
        matches!(self, Self::ArtifactLoad { .. })
    }
}

/// Result type for dynamics operations.
pub type Result<T> = std::result::Result<T, DynamicsError>;
