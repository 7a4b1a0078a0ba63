//! # dvgen-tags: Tag Grammar
//!
//! Parses declarative validation annotations such as
//!
//! ```text
//! +k8s:required
//! +k8s:maxLength=63
//! +k8s:unionMember(union: "source", memberName: Git)
//! +k8s:ifEnabled(FeatureX)=+k8s:eachVal=+k8s:format=k8s-uuid
//! ```
//!
//! into [`Tag`] values. The parser is purely syntactic: it knows nothing
//! about which tag names exist or where they may be used. That is the rule
//! builder's job in `dvgen-rules`.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `dvgen-*` crates.
//! - Every malformed input is a [`ParseError`] carrying the byte position
//!   and the offending token; the parser never panics.

mod cursor;
pub mod error;
pub mod parser;
pub mod tag;

pub use error::{ParseError, ParseErrorKind};
pub use parser::{parse_tag, parse_tags};
pub use tag::{Literal, Payload, Scope, Tag, TagArg};
