//! # Parsed Tags
//!
//! A [`Tag`] is the structured form of one annotation line. Tags are plain
//! immutable data: the parser produces them, the rule builder reads them.
//! No semantic checking happens at this layer.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Where a tag is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scope {
    /// A struct field.
    Field,
    /// A named type definition.
    Type,
    /// Every element of a list.
    ListValue,
    /// Every key of a map.
    MapKey,
    /// Every value of a map.
    MapValue,
    /// An enum constant.
    Const,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Field => "field",
            Self::Type => "type",
            Self::ListValue => "list value",
            Self::MapKey => "map key",
            Self::MapValue => "map value",
            Self::Const => "constant",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A literal argument or payload value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Literal {
    /// A `"quoted"` or `` `raw` `` string.
    String(String),
    Int(i64),
    Bool(bool),
    /// An unquoted word such as `k8s-uuid` or `NoModify`.
    Word(String),
}

impl Literal {
    /// Classify an unquoted word.
    pub fn from_word(word: &str) -> Self {
        match word {
            "true" => Self::Bool(true),
            "false" => Self::Bool(false),
            _ => word
                .parse::<i64>()
                .map(Self::Int)
                .unwrap_or_else(|_| Self::Word(word.to_string())),
        }
    }

    /// The text of a string or word literal.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) | Self::Word(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "{s:?}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Word(w) => f.write_str(w),
        }
    }
}

/// One argument inside `(...)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagArg {
    /// `Some` for `key: value` arguments.
    pub name: Option<String>,
    pub value: Literal,
}

impl fmt::Display for TagArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{name}: {}", self.value),
            None => write!(f, "{}", self.value),
        }
    }
}

/// The value after `=`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Payload {
    Literal(Literal),
    Tag(Box<Tag>),
}

/// A parsed annotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub namespace: Option<String>,
    pub name: String,
    pub scope: Scope,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<TagArg>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Payload>,
    /// The source text this tag was parsed from.
    pub raw: String,
}

impl Tag {
    /// `namespace:name`, or just `name` when unqualified.
    pub fn qualified_name(&self) -> String {
        match &self.namespace {
            Some(ns) => format!("{ns}:{}", self.name),
            None => self.name.clone(),
        }
    }

    /// Whether the tag belongs to `namespace`. Unqualified tags belong to
    /// every namespace.
    pub fn in_namespace(&self, namespace: &str) -> bool {
        self.namespace.as_deref().map_or(true, |ns| ns == namespace)
    }

    /// A named argument's value.
    pub fn arg(&self, name: &str) -> Option<&Literal> {
        self.args
            .iter()
            .find(|a| a.name.as_deref() == Some(name))
            .map(|a| &a.value)
    }

    /// The `index`-th positional argument.
    pub fn positional(&self, index: usize) -> Option<&Literal> {
        self.args
            .iter()
            .filter(|a| a.name.is_none())
            .nth(index)
            .map(|a| &a.value)
    }

    /// The nested tag, if the payload is one.
    pub fn nested(&self) -> Option<&Tag> {
        match &self.payload {
            Some(Payload::Tag(tag)) => Some(tag),
            _ => None,
        }
    }

    /// The literal payload, if the payload is one.
    pub fn literal(&self) -> Option<&Literal> {
        match &self.payload {
            Some(Payload::Literal(lit)) => Some(lit),
            _ => None,
        }
    }

    /// Return the tag with its scope (but not its nested tags' scopes)
    /// replaced. The builder uses this to assign the effective scope of a
    /// composed payload.
    pub fn in_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "+{}", self.qualified_name())?;
        if !self.args.is_empty() {
            f.write_str("(")?;
            for (i, arg) in self.args.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{arg}")?;
            }
            f.write_str(")")?;
        }
        match &self.payload {
            Some(Payload::Literal(lit)) => write!(f, "={lit}"),
            Some(Payload::Tag(tag)) => write!(f, "={tag}"),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_classification() {
        assert_eq!(Literal::from_word("10"), Literal::Int(10));
        assert_eq!(Literal::from_word("-3"), Literal::Int(-3));
        assert_eq!(Literal::from_word("true"), Literal::Bool(true));
        assert_eq!(
            Literal::from_word("k8s-uuid"),
            Literal::Word("k8s-uuid".into())
        );
    }

    #[test]
    fn namespace_membership() {
        let tag = Tag {
            namespace: None,
            name: "required".into(),
            scope: Scope::Field,
            args: vec![],
            payload: None,
            raw: "+required".into(),
        };
        assert!(tag.in_namespace("k8s"));
        let qualified = Tag {
            namespace: Some("other".into()),
            ..tag
        };
        assert!(!qualified.in_namespace("k8s"));
        assert_eq!(qualified.qualified_name(), "other:required");
    }
}
