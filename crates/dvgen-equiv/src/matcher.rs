//! Pairing criteria for declarative and reference errors.

use serde::{Deserialize, Serialize};

use dvgen_core::ValidationError;

/// Two errors match when their canonical paths and kinds are equal. Each
/// flag adds one more field to the comparison.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErrorMatcher {
    pub by_origin: bool,
    pub by_value: bool,
    pub by_detail: bool,
}

impl ErrorMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn by_origin(mut self) -> Self {
        self.by_origin = true;
        self
    }

    pub fn by_value(mut self) -> Self {
        self.by_value = true;
        self
    }

    pub fn by_detail(mut self) -> Self {
        self.by_detail = true;
        self
    }

    pub fn matches(&self, declarative: &ValidationError, reference: &ValidationError) -> bool {
        declarative.kind() == reference.kind()
            && declarative.path().canonical() == reference.path().canonical()
            && (!self.by_origin || declarative.origin() == reference.origin())
            && (!self.by_value || declarative.bad_value() == reference.bad_value())
            && (!self.by_detail || declarative.detail() == reference.detail())
    }

    /// The fields compared, rendered for diffs.
    pub fn describe(&self, error: &ValidationError) -> String {
        let mut out = format!("{}: {}", error.path(), error.kind());
        if self.by_origin {
            out.push_str(&format!(" [origin={}]", error.origin()));
        }
        if self.by_value {
            if let Some(value) = error.bad_value() {
                out.push_str(&format!(" [value={value}]"));
            }
        }
        if self.by_detail && !error.detail().is_empty() {
            out.push_str(&format!(" [detail={}]", error.detail()));
        }
        out
    }
}
