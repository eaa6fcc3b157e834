//! Error types for recording, compiling and persisting differentiated functions.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the AD backend.
#[derive(Debug, Error)]
pub enum AdError {
    /// A recording was started while another one is active on this thread.
    #[error("a recording is already active on this thread")]
    NestedRecording,

    /// The recorded function failed or produced an unusable tape.
    #[error("recording failed: {reason}")]
    Recording {
        /// What went wrong.
        reason: String,
    },

    /// The tape could not be compiled.
    #[error("compilation failed: {reason}")]
    Compile {
        /// What went wrong.
        reason: String,
    },

    /// The artifact could not be written.
    #[error("failed to store artifact {path}: {source}")]
    ArtifactStore {
        /// Target path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The artifact could not be read.
    #[error("failed to read artifact {path}: {source}")]
    ArtifactRead {
        /// Source path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The artifact is truncated, corrupt, or of an unsupported version.
    #[error("malformed artifact {path}: {reason}")]
    ArtifactFormat {
        /// Source path.
        path: PathBuf,
        /// What is wrong with the file.
        reason: String,
    },

    /// The artifact is well-formed but was built for a different function.
    #[error("incompatible artifact {path}: {reason}")]
    ArtifactMismatch {
        /// Source path.
        path: PathBuf,
        /// Which part of the key differs.
        reason: String,
    },

    /// Evaluation input has the wrong length.
    #[error("input dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Number of inputs of the compiled function.
        expected: usize,
        /// Number of values provided.
        actual: usize,
    },
}

impl AdError {
    /// Create a recording error.
    #[must_use]
    pub fn recording(reason: impl Into<String>) -> Self {
        Self::Recording {
            reason: reason.into(),
        }
    }

    /// Create a compile error.
    #[must_use]
    pub fn compile(reason: impl Into<String>) -> Self {
        Self::Compile {
            reason: reason.into(),
        }
    }

    /// Check if this error came from reading an existing artifact.
    #[must_use]
    pub fn is_load_error(&self) -> bool {
        matches!(
            self,
            Self::ArtifactRead { .. } | Self::ArtifactFormat { .. } | Self::ArtifactMismatch { .. }
        )
    }

    /// Check if this error came from recording, compiling, or storing.
    #[must_use]
    pub fn is_compilation_error(&self) -> bool {
        matches!(
            self,
            Self::NestedRecording
                | Self::Recording { .. }
                | Self::Compile { .. }
                | Self::ArtifactStore { .. }
        )
    }

    /// Check if this is a read error caused by a missing file.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ArtifactRead { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }
}

/// Result type for AD operations.
pub type Result<T> = std::result::Result<T, AdError>;
