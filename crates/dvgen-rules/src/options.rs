//! # Compiler Options
//!
//! Loaded from YAML; every field has a default, so an empty document is a
//! valid configuration.
//!
//! ```yaml
//! namespace: k8s
//! allow_unknown_tags: false
//! feature_gates: [FeatureA, FeatureB]
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use dvgen_core::FeatureGateRegistry;

use crate::error::ConfigError;

/// Namespace compiled when none is configured.
pub const DEFAULT_NAMESPACE: &str = "k8s";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerOptions {
    /// Only tags in this namespace are compiled. `None` accepts every tag.
    pub namespace: Option<String>,
    /// Skip unknown tag names with a warning instead of rejecting the type.
    pub allow_unknown_tags: bool,
    /// Known gate names. When set, conditions naming other gates are
    /// rejected.
    pub feature_gates: Option<FeatureGateRegistry>,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            namespace: Some(DEFAULT_NAMESPACE.to_string()),
            allow_unknown_tags: false,
            feature_gates: None,
        }
    }
}

impl CompilerOptions {
    /// Parse options from a YAML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] on malformed YAML or unknown value types.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Read and parse an options file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the file cannot be read.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let yaml = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&yaml)
    }
}
