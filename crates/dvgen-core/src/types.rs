//! # Static Type Model
//!
//! The type-introspection collaborator hands the compiler a
//! [`TypeUniverse`]: every struct and alias definition with its raw tags and,
//! for enum-like aliases, an explicit ordered list of constants. Nothing is
//! discovered by scanning; a type is validated exactly as registered.
//!
//! Type references use a Go-like textual form:
//!
//! ```text
//! string  int64  bool  float64          scalars
//! *Widget                               pointer (nullable)
//! []string                              slice
//! map[string]Widget                     map
//! Widget                                named struct or alias
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{TypeError, TypeRefParseError};

/// Scalar value domains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarKind {
    String,
    Int,
    Uint,
    Float,
    Bool,
}

impl ScalarKind {
    /// Map a Go scalar spelling onto its value domain.
    pub fn from_name(name: &str) -> Option<Self> {
        let kind = match name {
            "string" => Self::String,
            "int" | "int8" | "int16" | "int32" | "int64" => Self::Int,
            "uint" | "uint8" | "uint16" | "uint32" | "uint64" | "byte" => Self::Uint,
            "float32" | "float64" => Self::Float,
            "bool" => Self::Bool,
            _ => return None,
        };
        Some(kind)
    }

    /// Canonical spelling.
    pub fn name(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Int => "int",
            Self::Uint => "uint",
            Self::Float => "float64",
            Self::Bool => "bool",
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, Self::Int | Self::Uint)
    }
}

/// A reference to a type as written on a field or alias.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    Scalar(ScalarKind),
    Pointer(Box<TypeRef>),
    Slice(Box<TypeRef>),
    Map { key: Box<TypeRef>, value: Box<TypeRef> },
    Named(String),
}

impl TypeRef {
    /// Shorthand for a named reference.
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    /// Parse the Go-like textual form.
    ///
    /// # Errors
    ///
    /// Returns [`TypeRefParseError`] on empty input, unbalanced map brackets
    /// or identifiers containing characters other than `[A-Za-z0-9_.]`.
    pub fn parse(input: &str) -> Result<Self, TypeRefParseError> {
        let err = |reason: &str| TypeRefParseError {
            input: input.to_string(),
            reason: reason.to_string(),
        };
        let s = input.trim();
        if s.is_empty() {
            return Err(err("empty type"));
        }
        if let Some(rest) = s.strip_prefix('*') {
            return Ok(Self::Pointer(Box::new(Self::parse(rest)?)));
        }
        if let Some(rest) = s.strip_prefix("[]") {
            return Ok(Self::Slice(Box::new(Self::parse(rest)?)));
        }
        if let Some(rest) = s.strip_prefix("map[") {
            let mut depth = 1usize;
            let mut close = None;
            for (i, c) in rest.char_indices() {
                match c {
                    '[' => depth += 1,
                    ']' => {
                        depth -= 1;
                        if depth == 0 {
                            close = Some(i);
                            break;
                        }
                    }
                    _ => {}
                }
            }
            let close = close.ok_or_else(|| err("unbalanced map brackets"))?;
            let key = Self::parse(&rest[..close])?;
            let value = Self::parse(&rest[close + 1..])?;
            return Ok(Self::Map {
                key: Box::new(key),
                value: Box::new(value),
            });
        }
        if !s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
        {
            return Err(err("invalid identifier"));
        }
        Ok(ScalarKind::from_name(s)
            .map(Self::Scalar)
            .unwrap_or_else(|| Self::Named(s.to_string())))
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(kind) => f.write_str(kind.name()),
            Self::Pointer(inner) => write!(f, "*{inner}"),
            Self::Slice(elem) => write!(f, "[]{elem}"),
            Self::Map { key, value } => write!(f, "map[{key}]{value}"),
            Self::Named(name) => f.write_str(name),
        }
    }
}

impl FromStr for TypeRef {
    type Err = TypeRefParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for TypeRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TypeRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// A struct field declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    /// Declared (Go) name, e.g. `MaxItems`.
    pub name: String,
    /// Serialized name; defaults to `name` with a lowercased first letter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json_name: Option<String>,
    #[serde(rename = "type")]
    pub type_ref: TypeRef,
    /// Raw tag strings in declaration order.
    #[serde(default)]
    pub tags: Vec<String>,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, type_ref: TypeRef) -> Self {
        Self {
            name: name.into(),
            json_name: None,
            type_ref,
            tags: Vec::new(),
        }
    }

    pub fn with_json_name(mut self, json_name: impl Into<String>) -> Self {
        self.json_name = Some(json_name.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// The name used in instances and error paths.
    pub fn json_name(&self) -> String {
        if let Some(name) = &self.json_name {
            return name.clone();
        }
        let mut chars = self.name.chars();
        match chars.next() {
            Some(first) => first.to_lowercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

/// A constant of an enum-like alias type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstDef {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl ConstDef {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            tags: Vec::new(),
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }
}

/// Struct or alias body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeDefKind {
    Struct {
        #[serde(default)]
        fields: Vec<FieldDef>,
    },
    Alias {
        underlying: TypeRef,
        #[serde(default)]
        constants: Vec<ConstDef>,
    },
}

/// A named type definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDef {
    pub name: String,
    /// Raw type-level tag strings.
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(flatten)]
    pub kind: TypeDefKind,
}

impl TypeDef {
    /// A struct type with the given fields.
    pub fn structure(name: impl Into<String>, fields: Vec<FieldDef>) -> Self {
        Self {
            name: name.into(),
            tags: Vec::new(),
            kind: TypeDefKind::Struct { fields },
        }
    }

    /// An alias of `underlying`.
    pub fn alias(name: impl Into<String>, underlying: TypeRef) -> Self {
        Self {
            name: name.into(),
            tags: Vec::new(),
            kind: TypeDefKind::Alias {
                underlying,
                constants: Vec::new(),
            },
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Register constants for an alias type. Ignored for structs.
    pub fn with_constants(mut self, new_constants: Vec<ConstDef>) -> Self {
        if let TypeDefKind::Alias { constants, .. } = &mut self.kind {
            constants.extend(new_constants);
        }
        self
    }

    /// Struct fields, or an empty slice for aliases.
    pub fn fields(&self) -> &[FieldDef] {
        match &self.kind {
            TypeDefKind::Struct { fields } => fields,
            TypeDefKind::Alias { .. } => &[],
        }
    }

    /// Registered constants, or an empty slice for structs.
    pub fn constants(&self) -> &[ConstDef] {
        match &self.kind {
            TypeDefKind::Alias { constants, .. } => constants,
            TypeDefKind::Struct { .. } => &[],
        }
    }

    /// Look up a field by JSON name.
    pub fn field(&self, json_name: &str) -> Option<&FieldDef> {
        self.fields().iter().find(|f| f.json_name() == json_name)
    }
}

/// The resolved shape of a type reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape<'a> {
    Scalar(ScalarKind),
    Slice(&'a TypeRef),
    Map { key: &'a TypeRef, value: &'a TypeRef },
    Struct(&'a str),
}

/// A type reference with pointers and aliases stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved<'a> {
    pub shape: Shape<'a>,
    /// Reached through at least one pointer.
    pub nullable: bool,
    /// Named types passed through, outermost first. A struct name is last.
    pub named: Vec<&'a str>,
}

impl<'a> Resolved<'a> {
    pub fn is_string(&self) -> bool {
        matches!(self.shape, Shape::Scalar(ScalarKind::String))
    }

    pub fn is_integer(&self) -> bool {
        matches!(self.shape, Shape::Scalar(k) if k.is_integer())
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self.shape, Shape::Scalar(_))
    }

    pub fn is_slice(&self) -> bool {
        matches!(self.shape, Shape::Slice(_))
    }

    pub fn is_map(&self) -> bool {
        matches!(self.shape, Shape::Map { .. })
    }

    /// The struct name when the shape is a struct.
    pub fn struct_name(&self) -> Option<&'a str> {
        match self.shape {
            Shape::Struct(name) => Some(name),
            _ => None,
        }
    }

    /// Short description for diagnostics.
    pub fn describe(&self) -> String {
        match self.shape {
            Shape::Scalar(kind) => kind.name().to_string(),
            Shape::Slice(elem) => format!("[]{elem}"),
            Shape::Map { key, value } => format!("map[{key}]{value}"),
            Shape::Struct(name) => format!("struct {name}"),
        }
    }
}

/// Every type definition known to the compiler, by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<TypeDef>", into = "Vec<TypeDef>")]
pub struct TypeUniverse {
    types: BTreeMap<String, TypeDef>,
}

impl TypeUniverse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a definition, returning any definition it replaces.
    pub fn insert(&mut self, def: TypeDef) -> Option<TypeDef> {
        self.types.insert(def.name.clone(), def)
    }

    pub fn get(&self, name: &str) -> Option<&TypeDef> {
        self.types.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Definitions in name order.
    pub fn iter(&self) -> impl Iterator<Item = &TypeDef> {
        self.types.values()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Strip pointers and aliases down to a shape.
    ///
    /// # Errors
    ///
    /// Returns [`TypeError::UnknownType`] for unregistered names and
    /// [`TypeError::AliasCycle`] when an alias chain revisits a name.
    pub fn resolve<'a>(&'a self, type_ref: &'a TypeRef) -> Result<Resolved<'a>, TypeError> {
        let mut current = type_ref;
        let mut nullable = false;
        let mut named: Vec<&'a str> = Vec::new();
        loop {
            match current {
                TypeRef::Scalar(kind) => {
                    return Ok(Resolved {
                        shape: Shape::Scalar(*kind),
                        nullable,
                        named,
                    })
                }
                TypeRef::Pointer(inner) => {
                    nullable = true;
                    current = inner;
                }
                TypeRef::Slice(elem) => {
                    return Ok(Resolved {
                        shape: Shape::Slice(elem),
                        nullable,
                        named,
                    })
                }
                TypeRef::Map { key, value } => {
                    return Ok(Resolved {
                        shape: Shape::Map { key, value },
                        nullable,
                        named,
                    })
                }
                TypeRef::Named(name) => {
                    if named.contains(&name.as_str()) {
                        return Err(TypeError::AliasCycle(name.clone()));
                    }
                    let def = self
                        .types
                        .get(name)
                        .ok_or_else(|| TypeError::UnknownType(name.clone()))?;
                    named.push(def.name.as_str());
                    match &def.kind {
                        TypeDefKind::Struct { .. } => {
                            return Ok(Resolved {
                                shape: Shape::Struct(def.name.as_str()),
                                nullable,
                                named,
                            })
                        }
                        TypeDefKind::Alias { underlying, .. } => current = underlying,
                    }
                }
            }
        }
    }
}

impl From<Vec<TypeDef>> for TypeUniverse {
    fn from(defs: Vec<TypeDef>) -> Self {
        defs.into_iter().collect()
    }
}

impl From<TypeUniverse> for Vec<TypeDef> {
    fn from(universe: TypeUniverse) -> Self {
        universe.types.into_values().collect()
    }
}

impl FromIterator<TypeDef> for TypeUniverse {
    fn from_iter<I: IntoIterator<Item = TypeDef>>(iter: I) -> Self {
        let mut universe = Self::new();
        for def in iter {
            universe.insert(def);
        }
        universe
    }
}
