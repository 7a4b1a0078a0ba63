//! # Validation Errors
//!
//! The runtime error model. Every constraint violation found by the rule
//! executor becomes exactly one [`ValidationError`] appended to an
//! [`ErrorList`]; nothing is thrown and no run is aborted.
//!
//! ## Immutability
//!
//! A `ValidationError` has private fields. Marking flags
//! (`covered_by_declarative`, `declarative_native`) are set by
//! value-consuming methods while the error is being constructed, so an
//! error already pushed into a list can never be re-marked through an
//! alias.
//!
//! ## Rendering
//!
//! ```text
//! spec.replicas: Invalid value: -1: must be greater than or equal to 0
//! metadata.labels: Too many: 11: must have at most 10 items
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::path::FieldPath;

/// The category of a validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ErrorKind {
    /// A required value is missing.
    Required,
    /// A value is malformed or out of range.
    Invalid,
    /// A string is longer than allowed.
    TooLong,
    /// A collection has more entries than allowed.
    TooMany,
    /// A value appears more than once where uniqueness is required.
    Duplicate,
    /// A value is not one of the supported values.
    NotSupported,
    /// A value may not be specified (or changed) in this context.
    Forbidden,
}

impl ErrorKind {
    /// Human-readable label used when rendering errors.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Required => "Required value",
            Self::Invalid => "Invalid value",
            Self::TooLong => "Too long",
            Self::TooMany => "Too many",
            Self::Duplicate => "Duplicate value",
            Self::NotSupported => "Unsupported value",
            Self::Forbidden => "Forbidden",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One constraint violation, addressed by path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationError {
    path: FieldPath,
    kind: ErrorKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    bad_value: Option<Value>,
    #[serde(default)]
    detail: String,
    #[serde(default)]
    origin: String,
    #[serde(default)]
    covered_by_declarative: bool,
    #[serde(default)]
    declarative_native: bool,
}

impl ValidationError {
    /// Construct an error of the given kind.
    pub fn new(kind: ErrorKind, path: FieldPath, origin: impl Into<String>) -> Self {
        Self {
            path,
            kind,
            bad_value: None,
            detail: String::new(),
            origin: origin.into(),
            covered_by_declarative: false,
            declarative_native: false,
        }
    }

    /// A required value is missing.
    pub fn required(path: FieldPath, origin: impl Into<String>) -> Self {
        Self::new(ErrorKind::Required, path, origin)
    }

    /// A value may not be specified or changed.
    pub fn forbidden(path: FieldPath, detail: impl Into<String>, origin: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden, path, origin).with_detail(detail)
    }

    /// A value is malformed or out of range.
    pub fn invalid(
        path: FieldPath,
        bad_value: Value,
        detail: impl Into<String>,
        origin: impl Into<String>,
    ) -> Self {
        Self::new(ErrorKind::Invalid, path, origin)
            .with_bad_value(bad_value)
            .with_detail(detail)
    }

    /// A string exceeds `max` bytes.
    pub fn too_long(path: FieldPath, actual: usize, max: usize, origin: impl Into<String>) -> Self {
        Self::new(ErrorKind::TooLong, path, origin)
            .with_bad_value(Value::from(actual))
            .with_detail(format!("may not be more than {max} bytes"))
    }

    /// A collection holds `actual` entries where at most `max` are allowed.
    pub fn too_many(path: FieldPath, actual: usize, max: usize, origin: impl Into<String>) -> Self {
        Self::new(ErrorKind::TooMany, path, origin)
            .with_bad_value(Value::from(actual))
            .with_detail(format!("must have at most {max} items"))
    }

    /// A value appears more than once.
    pub fn duplicate(path: FieldPath, bad_value: Value, origin: impl Into<String>) -> Self {
        Self::new(ErrorKind::Duplicate, path, origin).with_bad_value(bad_value)
    }

    /// A value is not among `supported`, which is rendered in the given order.
    pub fn not_supported(
        path: FieldPath,
        bad_value: Value,
        supported: &[&str],
        origin: impl Into<String>,
    ) -> Self {
        let quoted: Vec<String> = supported.iter().map(|s| format!("{s:?}")).collect();
        Self::new(ErrorKind::NotSupported, path, origin)
            .with_bad_value(bad_value)
            .with_detail(format!("supported values: {}", quoted.join(", ")))
    }

    /// Replace the detail message.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = detail.into();
        self
    }

    /// Attach the offending value.
    pub fn with_bad_value(mut self, value: Value) -> Self {
        self.bad_value = Some(value);
        self
    }

    /// Mark a hand-written error as now covered by declarative validation.
    pub fn mark_covered_by_declarative(mut self) -> Self {
        self.covered_by_declarative = true;
        self
    }

    /// Mark an error as produced by a field validated only declaratively.
    pub fn mark_declarative_native(mut self) -> Self {
        self.declarative_native = true;
        self
    }

    /// Apply the native marking when `native` is true.
    pub fn native_if(self, native: bool) -> Self {
        if native {
            self.mark_declarative_native()
        } else {
            self
        }
    }

    /// Return a copy at a different path. Used by path normalization.
    pub fn relocated(&self, path: FieldPath) -> Self {
        Self {
            path,
            ..self.clone()
        }
    }

    pub fn path(&self) -> &FieldPath {
        &self.path
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn bad_value(&self) -> Option<&Value> {
        self.bad_value.as_ref()
    }

    pub fn detail(&self) -> &str {
        &self.detail
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn is_covered_by_declarative(&self) -> bool {
        self.covered_by_declarative
    }

    pub fn is_declarative_native(&self) -> bool {
        self.declarative_native
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.kind)?;
        if let Some(value) = &self.bad_value {
            write!(f, ": {value}")?;
        }
        if !self.detail.is_empty() {
            write!(f, ": {}", self.detail)?;
        }
        Ok(())
    }
}

/// Ordered collection of [`ValidationError`]s produced by one call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorList {
    errors: Vec<ValidationError>,
}

impl ErrorList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one error.
    pub fn push(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Returns the number of errors.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Returns true if validation passed.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Iterate in emission order.
    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.errors.iter()
    }

    /// Returns a slice of all errors.
    pub fn as_slice(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Consumes self and returns the inner Vec.
    pub fn into_inner(self) -> Vec<ValidationError> {
        self.errors
    }

    /// Errors whose path starts with `prefix`.
    pub fn under<'a>(&'a self, prefix: &'a FieldPath) -> impl Iterator<Item = &'a ValidationError> {
        self.errors.iter().filter(move |e| e.path.starts_with(prefix))
    }
}

impl fmt::Display for ErrorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{e}")?;
        }
        Ok(())
    }
}

impl Extend<ValidationError> for ErrorList {
    fn extend<I: IntoIterator<Item = ValidationError>>(&mut self, iter: I) {
        self.errors.extend(iter);
    }
}

impl FromIterator<ValidationError> for ErrorList {
    fn from_iter<I: IntoIterator<Item = ValidationError>>(iter: I) -> Self {
        Self {
            errors: iter.into_iter().collect(),
        }
    }
}

impl From<Vec<ValidationError>> for ErrorList {
    fn from(errors: Vec<ValidationError>) -> Self {
        Self { errors }
    }
}

impl IntoIterator for ErrorList {
    type Item = ValidationError;
    type IntoIter = std::vec::IntoIter<ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl<'a> IntoIterator for &'a ErrorList {
    type Item = &'a ValidationError;
    type IntoIter = std::slice::Iter<'a, ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}
