//! # Field Paths
//!
//! A [`FieldPath`] addresses a value inside an object instance. Segments are
//! field names, numeric list indices, or keys (map keys and list identity
//! keys).
//!
//! ## Rendering
//!
//! ```text
//! spec.devices.requests[0].selectors
//! metadata.labels[app]
//! spec.ports[name=http,protocol=TCP]
//! ```
//!
//! The empty path renders as `<root>`. Rendering and [`FieldPath::parse`]
//! round-trip for every path whose keys contain no `]` and are not made only
//! of digits; a digits-only key re-parses as an index. Structural equality
//! across independently produced paths is therefore defined on the
//! [`canonical`](FieldPath::canonical) form.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::PathParseError;

const ROOT: &str = "<root>";

/// A single path segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PathSegment {
    /// A struct field, by JSON name.
    Field(String),
    /// A list position.
    Index(usize),
    /// A map key or a list-map identity key.
    Key(String),
}

/// Ordered sequence of [`PathSegment`]s.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldPath {
    segments: Vec<PathSegment>,
}

impl FieldPath {
    /// The empty path, addressing the validated object itself.
    pub fn root() -> Self {
        Self::default()
    }

    /// A path with a single field segment.
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            segments: vec![PathSegment::Field(field.into())],
        }
    }

    /// Build a path from explicit segments.
    pub fn from_segments(segments: Vec<PathSegment>) -> Self {
        Self { segments }
    }

    /// Extend with a field segment.
    pub fn child(&self, field: impl Into<String>) -> Self {
        self.with(PathSegment::Field(field.into()))
    }

    /// Extend with an index segment.
    pub fn index(&self, index: usize) -> Self {
        self.with(PathSegment::Index(index))
    }

    /// Extend with a key segment.
    pub fn key(&self, key: impl Into<String>) -> Self {
        self.with(PathSegment::Key(key.into()))
    }

    /// Extend with an arbitrary segment.
    pub fn with(&self, segment: PathSegment) -> Self {
        let mut segments = Vec::with_capacity(self.segments.len() + 1);
        segments.extend(self.segments.iter().cloned());
        segments.push(segment);
        Self { segments }
    }

    /// The segments, outermost first.
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Whether this is the root path.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Returns true for the root path.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Whether `self` starts with every segment of `prefix`.
    pub fn starts_with(&self, prefix: &FieldPath) -> bool {
        self.segments.starts_with(&prefix.segments)
    }

    /// Render then re-parse, collapsing digit-only keys into indices.
    ///
    /// Two paths produced by different validators address the same value
    /// iff their canonical forms are equal.
    pub fn canonical(&self) -> Self {
        Self::parse(&self.to_string()).unwrap_or_else(|_| self.clone())
    }

    /// Parse the rendered form.
    ///
    /// # Errors
    ///
    /// Returns [`PathParseError`] on empty field names, unclosed or empty
    /// brackets, and characters following `]` other than `.` or `[`.
    pub fn parse(input: &str) -> Result<Self, PathParseError> {
        let trimmed = input.trim();
        if trimmed.is_empty() || trimmed == ROOT {
            return Ok(Self::root());
        }

        let err = |position: usize, reason: &str| PathParseError {
            input: input.to_string(),
            position,
            reason: reason.to_string(),
        };

        let bytes = trimmed.as_bytes();
        let mut segments = Vec::new();
        let mut pos = 0usize;
        let mut expect_field = bytes[0] != b'[';

        while pos < bytes.len() {
            match bytes[pos] {
                b'[' => {
                    let close = trimmed[pos + 1..]
                        .find(']')
                        .map(|off| pos + 1 + off)
                        .ok_or_else(|| err(pos, "unclosed '['"))?;
                    let inner = &trimmed[pos + 1..close];
                    if inner.is_empty() {
                        return Err(err(pos, "empty brackets"));
                    }
                    let segment = if inner.bytes().all(|b| b.is_ascii_digit()) {
                        inner
                            .parse::<usize>()
                            .map(PathSegment::Index)
                            .map_err(|_| err(pos + 1, "index out of range"))?
                    } else {
                        PathSegment::Key(inner.to_string())
                    };
                    segments.push(segment);
                    pos = close + 1;
                    expect_field = false;
                    if pos < bytes.len() && bytes[pos] != b'.' && bytes[pos] != b'[' {
                        return Err(err(pos, "expected '.' or '[' after ']'"));
                    }
                }
                b'.' => {
                    if expect_field {
                        return Err(err(pos, "empty field name"));
                    }
                    pos += 1;
                    expect_field = true;
                    if pos == bytes.len() {
                        return Err(err(pos, "trailing '.'"));
                    }
                }
                _ => {
                    if !expect_field {
                        return Err(err(pos, "expected '.' before field name"));
                    }
                    let end = trimmed[pos..]
                        .find(['.', '['])
                        .map(|off| pos + off)
                        .unwrap_or(bytes.len());
                    let name = &trimmed[pos..end];
                    if name.contains(']') {
                        return Err(err(pos, "unexpected ']'"));
                    }
                    segments.push(PathSegment::Field(name.to_string()));
                    pos = end;
                    expect_field = false;
                }
            }
        }

        Ok(Self { segments })
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str(ROOT);
        }
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                PathSegment::Field(name) if i == 0 => f.write_str(name)?,
                PathSegment::Field(name) => write!(f, ".{name}")?,
                PathSegment::Index(idx) => write!(f, "[{idx}]")?,
                PathSegment::Key(key) => write!(f, "[{key}]")?,
            }
        }
        Ok(())
    }
}

impl FromStr for FieldPath {
    type Err = PathParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for FieldPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FieldPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_mixed_path() {
        let path = FieldPath::new("spec")
            .child("devices")
            .child("requests")
            .index(0)
            .child("selectors");
        assert_eq!(path.to_string(), "spec.devices.requests[0].selectors");
    }

    #[test]
    fn render_root_and_leading_index() {
        assert_eq!(FieldPath::root().to_string(), "<root>");
        assert_eq!(FieldPath::root().index(3).child("a").to_string(), "[3].a");
    }

    #[test]
    fn parse_keys_and_indices() {
        let path = FieldPath::parse("spec.ports[name=http].port").unwrap();
        assert_eq!(
            path.segments(),
            &[
                PathSegment::Field("spec".into()),
                PathSegment::Field("ports".into()),
                PathSegment::Key("name=http".into()),
                PathSegment::Field("port".into()),
            ]
        );
        let path = FieldPath::parse("items[12]").unwrap();
        assert_eq!(path.segments()[1], PathSegment::Index(12));
    }

    #[test]
    fn parse_root_forms() {
        assert!(FieldPath::parse("<root>").unwrap().is_root());
        assert!(FieldPath::parse("").unwrap().is_root());
    }

    #[test]
    fn parse_rejects_malformed_paths() {
        for bad in ["a..b", "a.", ".a", "a[", "a[]", "a[0]b", "a]"] {
            assert!(FieldPath::parse(bad).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn canonical_collapses_numeric_keys() {
        let keyed = FieldPath::new("m").key("0");
        let indexed = FieldPath::new("m").index(0);
        assert_ne!(keyed, indexed);
        assert_eq!(keyed.canonical(), indexed.canonical());
    }

    #[test]
    fn serde_uses_rendered_form() {
        let path = FieldPath::new("a").index(1).key("k");
        let json = serde_json::to_string(&path).unwrap();
        assert_eq!(json, "\"a[1][k]\"");
        let back: FieldPath = serde_json::from_str(&json).unwrap();
        assert_eq!(back, path);
    }

    #[test]
    fn starts_with_prefix() {
        let base = FieldPath::new("spec").child("items");
        assert!(base.index(0).starts_with(&base));
        assert!(!FieldPath::new("status").starts_with(&base));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn segment() -> impl Strategy<Value = PathSegment> {
        prop_oneof![
            "[a-zA-Z][a-zA-Z0-9_]{0,8}".prop_map(PathSegment::Field),
            (0usize..1000).prop_map(PathSegment::Index),
            "[a-z][a-z0-9=,.-]{0,8}".prop_map(PathSegment::Key),
        ]
    }

    proptest! {
        /// Rendering then parsing reproduces the path when the first
        /// segment is a field.
        #[test]
        fn render_parse_round_trip(
            head in "[a-z][a-zA-Z0-9]{0,6}",
            rest in prop::collection::vec(segment(), 0..6),
        ) {
            let mut segments = vec![PathSegment::Field(head)];
            segments.extend(rest);
            let path = FieldPath::from_segments(segments);
            let parsed = FieldPath::parse(&path.to_string()).unwrap();
            prop_assert_eq!(parsed, path);
        }
    }
}
