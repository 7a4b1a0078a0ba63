//! # Path Normalization
//!
//! Declarative validation sometimes reports an error at a different path
//! than the reference validation it replaces, typically after an API
//! restructuring. A [`NormalizationRule`] rewrites rendered declarative
//! paths before matching:
//!
//! ```yaml
//! - pattern: '^requests\[(\d+)\]\.selectors'
//!   replacement: 'requests[$1].exactly.selectors'
//! ```
//!
//! Rules apply in order; each one sees the output of the previous.

use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};

use dvgen_core::FieldPath;

use crate::error::EquivError;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawRule {
    pattern: String,
    replacement: String,
}

/// A compiled regex with its replacement template (`$1`, `${name}`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawRule", into = "RawRule")]
pub struct NormalizationRule {
    pattern: Regex,
    replacement: String,
}

impl NormalizationRule {
    /// # Errors
    ///
    /// Returns [`EquivError::InvalidPattern`] when `pattern` is not a valid
    /// regular expression.
    pub fn new(pattern: &str, replacement: impl Into<String>) -> Result<Self, EquivError> {
        let compiled = Regex::new(pattern).map_err(|source| EquivError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self {
            pattern: compiled,
            replacement: replacement.into(),
        })
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn replacement(&self) -> &str {
        &self.replacement
    }

    /// Rewrite every match in `path`.
    pub fn apply(&self, path: &str) -> String {
        self.pattern
            .replace_all(path, self.replacement.as_str())
            .into_owned()
    }
}

impl TryFrom<RawRule> for NormalizationRule {
    type Error = EquivError;

    fn try_from(raw: RawRule) -> Result<Self, Self::Error> {
        Self::new(&raw.pattern, raw.replacement)
    }
}

impl From<NormalizationRule> for RawRule {
    fn from(rule: NormalizationRule) -> Self {
        Self {
            pattern: rule.pattern.as_str().to_string(),
            replacement: rule.replacement,
        }
    }
}

/// An ordered list of normalization rules.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Normalizer {
    rules: Vec<NormalizationRule>,
}

impl Normalizer {
    pub fn new(rules: Vec<NormalizationRule>) -> Self {
        Self { rules }
    }

    /// # Errors
    ///
    /// Returns [`EquivError::Yaml`] for malformed documents and
    /// [`EquivError::InvalidPattern`] for bad regular expressions.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, EquivError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// # Errors
    ///
    /// Returns [`EquivError::Io`] when the file cannot be read, otherwise
    /// as [`Normalizer::from_yaml_str`].
    pub fn load(path: &Path) -> Result<Self, EquivError> {
        let yaml = std::fs::read_to_string(path).map_err(|source| EquivError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&yaml)
    }

    pub fn rules(&self) -> &[NormalizationRule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Apply every rule in order to a rendered path.
    pub fn apply(&self, rendered: &str) -> String {
        self.rules
            .iter()
            .fold(rendered.to_string(), |path, rule| rule.apply(&path))
    }

    /// Normalize a path. A rewrite that no longer parses as a path is
    /// discarded with a warning and the original path is kept.
    pub fn normalize(&self, path: &FieldPath) -> FieldPath {
        if self.rules.is_empty() {
            return path.clone();
        }
        let rendered = path.to_string();
        let rewritten = self.apply(&rendered);
        if rewritten == rendered {
            return path.clone();
        }
        match FieldPath::parse(&rewritten) {
            Ok(normalized) => {
                tracing::trace!(from = %rendered, to = %rewritten, "normalized path");
                normalized
            }
            Err(e) => {
                tracing::warn!(from = %rendered, to = %rewritten, error = %e, "normalized path does not parse; keeping original");
                path.clone()
            }
        }
    }
}
