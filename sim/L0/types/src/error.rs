//! Error types for model layout operations.

use thiserror::Error;

/// Errors raised at the boundary of the state/input layout.
///
/// These are precondition violations: they are detected before any
/// computation happens and are never retried or recovered internally.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// Invalid model or build configuration.
    #[error("invalid configuration: {reason}")]
    InvalidConfiguration {
        /// Description of the configuration error.
        reason: String,
    },

    /// A vector or matrix does not have the dimension dictated by the model info.
    #[error("dimension mismatch for {what}: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// The quantity whose dimension was checked.
        what: &'static str,
        /// Dimension required by the model info.
        expected: usize,
        /// Dimension that was provided.
        actual: usize,
    },

    /// A contact index outside the declared contacts of that kind.
    #[error("{what} index {index} out of range (valid range {lower}..{upper})")]
    IndexOutOfRange {
        /// The indexed quantity.
        what: &'static str,
        /// The offending index.
        index: usize,
        /// First valid index.
        lower: usize,
        /// One past the last valid index.
        upper: usize,
    },
}

impl ModelError {
    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            reason: reason.into(),
        }
    }

    /// Create a dimension mismatch error.
    #[must_use]
    pub fn dimension(what: &'static str, expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch {
            what,
            expected,
            actual,
        }
    }

    /// Check if this is a configuration error.
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::InvalidConfiguration { .. })
    }

    /// Check if this is a dimension mismatch.
    #[must_use]
    pub fn is_dimension_mismatch(&self) -> bool {
        matches!(self, Self::DimensionMismatch { .. })
    }

    /// Check if this is an out-of-range index.
    #[must_use]
    pub fn is_index_out_of_range(&self) -> bool {
        matches!(self, Self::IndexOutOfRange { .. })
    }
}

/// Check that `actual` equals `expected`, reporting `what` on mismatch.
///
/// # Errors
///
/// Returns [`ModelError::DimensionMismatch`] when the lengths differ.
pub fn check_dimension(what: &'static str, expected: usize, actual: usize) -> Result<(), ModelError> {
    if expected == actual {
        Ok(())
    } else {
        Err(ModelError::dimension(what, expected, actual))
    }
}
