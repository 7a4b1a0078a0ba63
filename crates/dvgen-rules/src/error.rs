//! # Error Types
//!
//! Build errors reject one tag; a [`CompileError`] wraps the first build
//! error of a type and names where it occurred. Compile errors are fatal for
//! the offending type only.

use std::path::PathBuf;

use thiserror::Error;

use dvgen_core::TypeError;
use dvgen_tags::{ParseError, Scope};

use crate::kind::Stability;

/// A tag could not be turned into a rule.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BuildError {
    /// The tag is not valid where it is attached.
    #[error("tag '{tag}' may not be used on a {scope}")]
    ScopeMismatch { tag: String, scope: Scope },

    /// The target's value domain does not fit the tag.
    #[error("tag '{tag}' requires {expected}, found {found}")]
    IncompatibleType {
        tag: String,
        expected: String,
        found: String,
    },

    /// A field validated natively carries a rule that is not stable.
    #[error("tag '{tag}' is {actual}; declarative-native fields accept only stable rules")]
    StabilityViolation { tag: String, actual: Stability },

    /// Two unconditional rules of the same kind on one field.
    #[error("duplicate rule '{tag}'")]
    DuplicateRule { tag: String },

    /// Two unconditional rules that cannot both hold.
    #[error("conflicting rules '{first}' and '{second}'")]
    ConflictingRules { first: String, second: String },

    #[error("unknown tag '{tag}'")]
    UnknownTag { tag: String },

    /// A condition names a gate missing from the configured registry.
    #[error("tag '{tag}' names unknown feature gate '{gate}'")]
    UnknownFeatureGate { tag: String, gate: String },

    #[error("tag '{tag}' has an invalid payload: {reason}")]
    InvalidPayload { tag: String, reason: String },

    #[error("tag '{tag}' has invalid arguments: {reason}")]
    InvalidArguments { tag: String, reason: String },

    /// Tags that are individually valid but cannot be combined.
    #[error("tag '{tag}': {reason}")]
    InvalidComposition { tag: String, reason: String },

    #[error("tag '{tag}' names field '{field}' which does not exist in '{type_name}'")]
    UnknownField {
        tag: String,
        field: String,
        type_name: String,
    },

    #[error("failed to parse tag: {0}")]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Type(#[from] TypeError),
}

/// A type was rejected by the compiler.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("type '{type_name}'{}: {source}", field_suffix(.field))]
pub struct CompileError {
    pub type_name: String,
    /// Go name of the offending field, when the error is field-level.
    pub field: Option<String>,
    #[source]
    pub source: BuildError,
}

fn field_suffix(field: &Option<String>) -> String {
    field
        .as_deref()
        .map(|f| format!(" field '{f}'"))
        .unwrap_or_default()
}

/// Compiler configuration could not be loaded.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid compiler config: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compile_error_names_type_and_field() {
        let err = CompileError {
            type_name: "Struct".into(),
            field: Some("Max0Field".into()),
            source: BuildError::UnknownTag {
                tag: "+k8s:bogus".into(),
            },
        };
        assert_eq!(
            err.to_string(),
            "type 'Struct' field 'Max0Field': unknown tag '+k8s:bogus'"
        );
    }

    #[test]
    fn type_level_compile_error() {
        let err = CompileError {
            type_name: "Mode".into(),
            field: None,
            source: BuildError::DuplicateRule {
                tag: "+k8s:required".into(),
            },
        };
        assert_eq!(err.to_string(), "type 'Mode': duplicate rule '+k8s:required'");
    }

    #[test]
    fn stability_violation_display() {
        let err = BuildError::StabilityViolation {
            tag: "+k8s:update=NoSet".into(),
            actual: Stability::Alpha,
        };
        assert!(err.to_string().contains("alpha"));
    }
}
