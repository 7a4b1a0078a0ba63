//! # Error Types

use std::path::PathBuf;

use thiserror::Error;

/// Normalization rules could not be built or loaded.
#[derive(Error, Debug)]
pub enum EquivError {
    #[error("invalid normalization pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("failed to read normalization rules {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid normalization rules: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// The declarative and reference error lists are not equivalent.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("error lists differ ({unmatched} unmatched):\n{diff}")]
pub struct EquivalenceMismatch {
    /// Unmatched errors on both sides.
    pub unmatched: usize,
    pub diff: String,
}
