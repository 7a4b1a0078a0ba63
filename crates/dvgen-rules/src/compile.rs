//! # Type Compiler
//!
//! Compiles every definition of a [`TypeUniverse`] into a
//! [`CompiledSchema`]: per-type rule trees, per-field value plans with list
//! semantics, and per-struct union groups. A build error rejects only the
//! type it occurs in; the remaining types are still compiled.
//!
//! ## Value plans
//!
//! A [`ValuePlan`] records the static shape the executor expects at runtime
//! and the chain of named types whose type-level rules apply there. List
//! metadata is merged from the field's own tags and the type-level tags of
//! every alias in the chain:
//!
//! ```text
//! // +k8s:listType=map
//! // +k8s:listMapKey=name
//! type Ports []Port          field `ports Ports` inherits map identity by name
//! ```

use std::collections::BTreeMap;

use serde::Serialize;

use dvgen_core::{ScalarKind, Shape, TypeDef, TypeDefKind, TypeRef, TypeUniverse};

use crate::builder::RuleBuilder;
use crate::error::{BuildError, CompileError};
use crate::kind::{ItemSelector, ListType, RuleKind, UniqueMode};
use crate::options::CompilerOptions;
use crate::rule::{Rule, RuleTree};

// ---------------------------------------------------------------------------
// Compiled products
// ---------------------------------------------------------------------------

/// Every accepted type, by name.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct CompiledSchema {
    types: BTreeMap<String, CompiledType>,
}

impl CompiledSchema {
    pub fn get(&self, name: &str) -> Option<&CompiledType> {
        self.types.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Types in name order.
    pub fn iter(&self) -> impl Iterator<Item = &CompiledType> {
        self.types.values()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// One compiled type.
#[derive(Debug, Clone, Serialize)]
pub struct CompiledType {
    pub name: String,
    /// Type-level rules, applied wherever a value of this type appears.
    pub rules: RuleTree,
    pub body: TypeBody,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeBody {
    Struct(CompiledStruct),
    Alias(ValuePlan),
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CompiledStruct {
    pub fields: Vec<CompiledField>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unions: Vec<UnionSpec>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub zero_or_one: Vec<UnionSpec>,
}

impl CompiledStruct {
    /// Look up a field by JSON name.
    pub fn field(&self, json_name: &str) -> Option<&CompiledField> {
        self.fields.iter().find(|f| f.json_name == json_name)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CompiledField {
    /// Declared (Go) name.
    pub name: String,
    pub json_name: String,
    pub rules: RuleTree,
    pub plan: ValuePlan,
    /// Validated only declaratively; errors are marked native.
    pub native: bool,
    /// The executor does not descend into the value.
    pub opaque: bool,
}

/// Compiled static shape of a value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValuePlan {
    pub shape: ValueShape,
    /// Reached through a pointer.
    pub nullable: bool,
    /// Named types whose type-level rules apply, outermost first.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub named: Vec<String>,
    /// Set for list shapes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list: Option<ListSemantics>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "of", rename_all = "snake_case")]
pub enum ValueShape {
    Scalar(ScalarKind),
    Slice(Box<ValuePlan>),
    Map {
        key: Box<ValuePlan>,
        value: Box<ValuePlan>,
    },
    Struct(String),
}

/// How list elements are identified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementIdentity {
    /// `atomic`: no per-element identity, no uniqueness.
    Positional,
    /// `set`: an element is identified by its whole value.
    Value,
    /// `map`: an element is identified by its key fields.
    Keys,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListSemantics {
    pub list_type: ListType,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub keys: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unique: Option<UniqueMode>,
    /// Uniqueness is checked elsewhere; the generated check is disabled.
    pub custom_unique: bool,
}

impl Default for ListSemantics {
    fn default() -> Self {
        Self {
            list_type: ListType::Atomic,
            keys: Vec::new(),
            unique: None,
            custom_unique: false,
        }
    }
}

impl ListSemantics {
    pub fn identity(&self) -> ElementIdentity {
        if self.list_type == ListType::Map || self.unique == Some(UniqueMode::Map) {
            ElementIdentity::Keys
        } else if self.list_type == ListType::Set || self.unique == Some(UniqueMode::Set) {
            ElementIdentity::Value
        } else {
            ElementIdentity::Positional
        }
    }

    /// Whether the executor emits Duplicate errors for this list.
    pub fn checks_uniqueness(&self) -> bool {
        !self.custom_unique && self.identity() != ElementIdentity::Positional
    }

    /// Origin of uniqueness errors.
    pub fn origin(&self) -> &'static str {
        match (self.list_type, self.unique) {
            (ListType::Map, _) => "listType=map",
            (ListType::Set, _) => "listType=set",
            (_, Some(UniqueMode::Map)) => "unique=map",
            (_, Some(UniqueMode::Set)) => "unique=set",
            _ => "listType",
        }
    }
}

/// A union or zero-or-one-of group within one struct.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnionSpec {
    /// Union name; empty for the default union.
    pub name: String,
    /// JSON name of the discriminator field.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discriminator: Option<String>,
    pub members: Vec<UnionMemberSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnionMemberSpec {
    /// The value the discriminator uses for this member.
    pub name: String,
    /// JSON name of the member field (or of the list holding the item).
    pub field: String,
    /// Set when the member is a list item selected by `+k8s:item`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selector: Option<ItemSelector>,
}

/// Result of compiling a universe.
#[derive(Debug, Clone, Default)]
pub struct Compilation {
    pub schema: CompiledSchema,
    /// One entry per rejected type.
    pub errors: Vec<CompileError>,
}

impl Compilation {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// The schema when every type was accepted.
    ///
    /// # Errors
    ///
    /// Returns every [`CompileError`] when at least one type was rejected.
    pub fn into_result(self) -> Result<CompiledSchema, Vec<CompileError>> {
        if self.errors.is_empty() {
            Ok(self.schema)
        } else {
            Err(self.errors)
        }
    }
}

// ---------------------------------------------------------------------------
// Compiler
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct Compiler {
    options: CompilerOptions,
}

impl Compiler {
    pub fn new(options: CompilerOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    /// Compile every type. Rejected types are listed in
    /// [`Compilation::errors`] and left out of the schema.
    pub fn compile(&self, universe: &TypeUniverse) -> Compilation {
        let mut compilation = Compilation::default();
        for def in universe.iter() {
            match self.compile_type(universe, def) {
                Ok(compiled) => {
                    tracing::debug!(
                        type_name = %def.name,
                        type_rules = compiled.rules.len(),
                        "compiled type"
                    );
                    compilation.schema.types.insert(def.name.clone(), compiled);
                }
                Err(e) => {
                    tracing::warn!(type_name = %def.name, error = %e, "rejected type");
                    compilation.errors.push(e);
                }
            }
        }
        tracing::debug!(
            accepted = compilation.schema.len(),
            rejected = compilation.errors.len(),
            "compilation finished"
        );
        compilation
    }

    /// Compile a single definition.
    ///
    /// # Errors
    ///
    /// Returns the first [`CompileError`] found in the type.
    pub fn compile_type(
        &self,
        universe: &TypeUniverse,
        def: &TypeDef,
    ) -> Result<CompiledType, CompileError> {
        let builder = RuleBuilder::new(universe, &self.options);
        let type_error = |source| CompileError {
            type_name: def.name.clone(),
            field: None,
            source,
        };

        let rules = builder.type_rules(def).map_err(type_error)?;
        let body = match &def.kind {
            TypeDefKind::Struct { .. } => TypeBody::Struct(compile_struct(universe, &builder, def)?),
            TypeDefKind::Alias { .. } => {
                let plan = plan(universe, &builder, &TypeRef::named(def.name.clone()), &[])
                    .map_err(type_error)?;
                TypeBody::Alias(plan)
            }
        };
        Ok(CompiledType {
            name: def.name.clone(),
            rules,
            body,
        })
    }
}

fn compile_struct(
    universe: &TypeUniverse,
    builder: &RuleBuilder<'_>,
    def: &TypeDef,
) -> Result<CompiledStruct, CompileError> {
    let mut out = CompiledStruct::default();
    for field in def.fields() {
        let field_error = |source| CompileError {
            type_name: def.name.clone(),
            field: Some(field.name.clone()),
            source,
        };
        let rules = builder.field_rules(field).map_err(field_error)?;
        let local: Vec<&Rule> = rules.iter().collect();
        let plan = plan(universe, builder, &field.type_ref, &local).map_err(field_error)?;
        let json_name = field.json_name();

        for rule in rules.iter() {
            collect_union_marker(&mut out, rule, &json_name, None).map_err(field_error)?;
            if let (RuleKind::Item(selector), Some(child)) = (rule.kind(), rule.child()) {
                collect_union_marker(&mut out, child, &json_name, Some(selector))
                    .map_err(field_error)?;
            }
        }

        out.fields.push(CompiledField {
            name: field.name.clone(),
            json_name,
            native: rules.has(|k| matches!(k, RuleKind::DeclarativeNative)),
            opaque: rules.has(|k| matches!(k, RuleKind::Opaque)),
            rules,
            plan,
        });
    }

    for union in &out.unions {
        if union.discriminator.is_some() && union.members.is_empty() {
            return Err(CompileError {
                type_name: def.name.clone(),
                field: None,
                source: BuildError::InvalidComposition {
                    tag: "+k8s:unionDiscriminator".to_string(),
                    reason: format!("union '{}' has a discriminator but no members", union.name),
                },
            });
        }
    }
    Ok(out)
}

fn collect_union_marker(
    out: &mut CompiledStruct,
    rule: &Rule,
    json_name: &str,
    selector: Option<&ItemSelector>,
) -> Result<(), BuildError> {
    let member_spec = |member: &str| UnionMemberSpec {
        name: member.to_string(),
        field: json_name.to_string(),
        selector: selector.cloned(),
    };
    match rule.kind() {
        RuleKind::UnionMember { union, member } => {
            let spec = group_mut(&mut out.unions, union);
            if spec.members.iter().any(|m| &m.name == member) {
                return Err(BuildError::InvalidComposition {
                    tag: rule.tag().to_string(),
                    reason: format!("duplicate member '{member}' in union '{union}'"),
                });
            }
            spec.members.push(member_spec(member));
        }
        RuleKind::ZeroOrOneOfMember { group, member } => {
            group_mut(&mut out.zero_or_one, group).members.push(member_spec(member));
        }
        RuleKind::UnionDiscriminator { union } => {
            let spec = group_mut(&mut out.unions, union);
            if spec.discriminator.is_some() {
                return Err(BuildError::InvalidComposition {
                    tag: rule.tag().to_string(),
                    reason: format!("union '{union}' already has a discriminator"),
                });
            }
            spec.discriminator = Some(json_name.to_string());
        }
        _ => {}
    }
    Ok(())
}

fn group_mut<'a>(groups: &'a mut Vec<UnionSpec>, name: &str) -> &'a mut UnionSpec {
    let idx = match groups.iter().position(|g| g.name == name) {
        Some(idx) => idx,
        None => {
            groups.push(UnionSpec {
                name: name.to_string(),
                discriminator: None,
                members: Vec::new(),
            });
            groups.len() - 1
        }
    };
    &mut groups[idx]
}

// ---------------------------------------------------------------------------
// Value plans
// ---------------------------------------------------------------------------

/// Plan a value of `type_ref`. `local` holds the unconditional rules
/// attached at this position, consulted for list metadata and for the
/// `eachVal`/`eachKey` payloads that describe nested positions.
fn plan(
    universe: &TypeUniverse,
    builder: &RuleBuilder<'_>,
    type_ref: &TypeRef,
    local: &[&Rule],
) -> Result<ValuePlan, BuildError> {
    let resolved = universe.resolve(type_ref)?;

    let mut chain_trees = Vec::new();
    for name in &resolved.named {
        if let Some(def) = universe.get(name) {
            if matches!(def.kind, TypeDefKind::Alias { .. }) {
                chain_trees.push(builder.type_rules(def)?);
            }
        }
    }
    let mut scope: Vec<&Rule> = local.to_vec();
    for tree in &chain_trees {
        scope.extend(tree.iter());
    }

    let mut list = None;
    let shape = match resolved.shape {
        Shape::Scalar(kind) => ValueShape::Scalar(kind),
        Shape::Struct(name) => ValueShape::Struct(name.to_string()),
        Shape::Slice(elem) => {
            list = Some(list_semantics(&scope)?);
            let elem_local = children_of(&scope, |k| matches!(k, RuleKind::EachVal));
            ValueShape::Slice(Box::new(plan(universe, builder, elem, &elem_local)?))
        }
        Shape::Map { key, value } => {
            let key_local = children_of(&scope, |k| matches!(k, RuleKind::EachKey));
            let value_local = children_of(&scope, |k| matches!(k, RuleKind::EachVal));
            ValueShape::Map {
                key: Box::new(plan(universe, builder, key, &key_local)?),
                value: Box::new(plan(universe, builder, value, &value_local)?),
            }
        }
    };

    Ok(ValuePlan {
        shape,
        nullable: resolved.nullable,
        named: resolved.named.iter().map(|s| s.to_string()).collect(),
        list,
    })
}

fn children_of<'r>(rules: &[&'r Rule], pred: impl Fn(&RuleKind) -> bool) -> Vec<&'r Rule> {
    rules
        .iter()
        .filter(|r| !r.is_conditional() && pred(r.kind()))
        .filter_map(|r| r.child())
        .collect()
}

fn list_semantics(rules: &[&Rule]) -> Result<ListSemantics, BuildError> {
    let mut semantics = ListSemantics::default();
    let mut list_type_tag: Option<&Rule> = None;
    let mut key_tag: Option<&Rule> = None;
    let mut unique_tag: Option<&Rule> = None;
    let mut custom_tag: Option<&Rule> = None;

    for &rule in rules {
        match rule.kind() {
            RuleKind::ListIdentity(list_type) => {
                if let Some(prev) = list_type_tag {
                    if semantics.list_type != *list_type {
                        return Err(composition(rule, &format!("conflicts with '{}'", prev.tag())));
                    }
                }
                semantics.list_type = *list_type;
                list_type_tag = Some(rule);
            }
            RuleKind::ListMapKey(key) => {
                if !semantics.keys.contains(key) {
                    semantics.keys.push(key.clone());
                }
                key_tag.get_or_insert(rule);
            }
            RuleKind::Unique(mode) => {
                semantics.unique = Some(*mode);
                unique_tag = Some(rule);
            }
            RuleKind::CustomUnique => {
                semantics.custom_unique = true;
                custom_tag = Some(rule);
            }
            _ => {}
        }
    }

    let map_identity = semantics.identity() == ElementIdentity::Keys;
    if let Some(rule) = key_tag {
        if !map_identity {
            return Err(composition(rule, "listMapKey requires listType=map or unique=map"));
        }
    }
    if map_identity && semantics.keys.is_empty() {
        let rule = list_type_tag.or(unique_tag);
        return Err(match rule {
            Some(rule) => composition(rule, "map identity requires at least one listMapKey"),
            None => BuildError::InvalidComposition {
                tag: "+k8s:listType=map".to_string(),
                reason: "map identity requires at least one listMapKey".to_string(),
            },
        });
    }
    if let (Some(rule), ListType::Set | ListType::Map) = (unique_tag, semantics.list_type) {
        return Err(composition(rule, "unique may not be combined with listType=set or listType=map"));
    }
    if let Some(rule) = custom_tag {
        if semantics.identity() == ElementIdentity::Positional {
            return Err(composition(rule, "customUnique requires a uniqueness check to disable"));
        }
    }
    Ok(semantics)
}

fn composition(rule: &Rule, reason: &str) -> BuildError {
    BuildError::InvalidComposition {
        tag: rule.tag().to_string(),
        reason: reason.to_string(),
    }
}
