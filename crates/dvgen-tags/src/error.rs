//! # Parse Errors

use thiserror::Error;

/// What went wrong while parsing a tag.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    #[error("empty tag name")]
    EmptyName,

    #[error("unexpected token")]
    UnexpectedToken,

    #[error("unterminated string literal")]
    UnterminatedString,

    #[error("unclosed '('")]
    UnclosedParen,

    #[error("unexpected ')'")]
    UnexpectedCloseParen,

    /// Anything other than `literal` or `key: literal` inside `(...)`.
    #[error("invalid argument syntax")]
    InvalidArgument,

    #[error("empty payload after '='")]
    EmptyPayload,

    #[error("trailing input")]
    TrailingInput,
}

/// A tag line failed to parse.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} at byte {position} (near '{token}')")]
pub struct ParseError {
    /// Byte offset of the offending token.
    pub position: usize,
    /// The offending token, or `<end of input>`.
    pub token: String,
    pub kind: ParseErrorKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_position_and_token() {
        let err = ParseError {
            position: 7,
            token: ")".into(),
            kind: ParseErrorKind::UnexpectedCloseParen,
        };
        assert_eq!(err.to_string(), "unexpected ')' at byte 7 (near ')')");
    }
}
