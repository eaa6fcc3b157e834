//! Build configuration for the differentiated dynamics.
//!
//! The configuration names the compiled artifact, the folder it lives in, and
//! whether an existing artifact may be reused.

use std::path::PathBuf;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::ModelError;

/// Configuration for building a differentiated dynamics model.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DynamicsBuildConfig {
    /// Artifact name, unique within `model_folder`.
    pub model_name: String,
    /// Folder holding compiled artifacts.
    pub model_folder: PathBuf,
    /// Rebuild even when a valid artifact exists.
    pub recompile: bool,
    /// Report build/load outcomes at `info` instead of `debug` level.
    pub verbose: bool,
}

impl Default for DynamicsBuildConfig {
    fn default() -> Self {
        Self {
            model_name: "floating_base_dynamics".to_string(),
            model_folder: std::env::temp_dir().join("fbm"),
            recompile: true,
            verbose: false,
        }
    }
}

impl DynamicsBuildConfig {
    /// Create a configuration with the given artifact name.
    #[must_use]
    pub fn new(model_name: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
            ..Default::default()
        }
    }

    /// Set the artifact folder.
    #[must_use]
    pub fn folder(mut self, folder: impl Into<PathBuf>) -> Self {
        self.model_folder = folder.into();
        self
    }

    /// Set whether an existing artifact is ignored and rebuilt.
    #[must_use]
    pub fn recompile(mut self, recompile: bool) -> Self {
        self.recompile = recompile;
        self
    }

    /// Set verbose reporting.
    #[must_use]
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidConfiguration`] if the name is empty or
    /// contains a path separator, or if the folder is empty.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.model_name.trim().is_empty() {
            return Err(ModelError::invalid_config("model_name must not be empty"));
        }

        if self.model_name.contains(['/', '\\']) || self.model_name == ".." {
            return Err(ModelError::invalid_config(format!(
                "model_name '{}' must not contain path separators",
                self.model_name
            )));
        }

        if self.model_folder.as_os_str().is_empty() {
            return Err(ModelError::invalid_config("model_folder must not be empty"));
        }

        Ok(())
    }
}
