//! # Error Types

use thiserror::Error;

/// The executor was asked for something the schema cannot provide.
///
/// Constraint violations are never reported through this type; they are
/// collected into a [`dvgen_core::ErrorList`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecError {
    /// The type is absent from the schema, either never declared or
    /// rejected at compile time.
    #[error("type '{0}' is not in the compiled schema")]
    UnknownType(String),
}
