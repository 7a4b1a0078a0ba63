//! # Error Types
//!
//! Errors raised while parsing the textual forms of core types or while
//! resolving type references against a [`TypeUniverse`](crate::TypeUniverse).
//! Runtime validation failures are not errors in this sense; they are
//! [`ValidationError`](crate::ValidationError) values collected in an
//! [`ErrorList`](crate::ErrorList).

use thiserror::Error;

/// A rendered field path could not be parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid field path '{input}' at byte {position}: {reason}")]
pub struct PathParseError {
    /// The full input that failed to parse.
    pub input: String,
    /// Byte offset of the offending character.
    pub position: usize,
    /// What was wrong.
    pub reason: String,
}

/// A Go-like type reference (`[]*Foo`, `map[string]int`) could not be parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid type reference '{input}': {reason}")]
pub struct TypeRefParseError {
    /// The full input that failed to parse.
    pub input: String,
    /// What was wrong.
    pub reason: String,
}

/// A type reference could not be resolved to a shape.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TypeError {
    /// A named type is not present in the universe.
    #[error("unknown type '{0}'")]
    UnknownType(String),

    /// An alias chain loops back onto itself.
    #[error("alias cycle through type '{0}'")]
    AliasCycle(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_parse_error_display() {
        let err = PathParseError {
            input: "a[".to_string(),
            position: 1,
            reason: "unclosed '['".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("a["));
        assert!(msg.contains("byte 1"));
    }

    #[test]
    fn type_error_display() {
        assert_eq!(
            TypeError::UnknownType("Widget".into()).to_string(),
            "unknown type 'Widget'"
        );
        assert!(TypeError::AliasCycle("A".into()).to_string().contains("cycle"));
    }
}
