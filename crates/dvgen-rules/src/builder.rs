//! # Rule Tree Builder
//!
//! Turns the parsed tags of one field, type or enum constant into a
//! [`RuleTree`], checking each tag against its valid scopes and the value
//! domain of its target. Composed tags are built recursively against the
//! element, key, value or subfield type they apply to.
//!
//! ## Checks
//!
//! - Unknown tag names in the compiled namespace (unless configured to skip).
//! - Scope and value-domain compatibility.
//! - Duplicate and conflicting presence rules.
//! - Stability of every rule on a declarative-native field.
//! - Gate names against the configured registry.
//! - Tags that may not be made conditional: list metadata, union markers,
//!   `opaqueType`, `declarativeValidationNative` and `enum`.

use serde_json::Value;

use dvgen_core::{FieldDef, ScalarKind, Shape, TypeDef, TypeDefKind, TypeError, TypeRef, TypeUniverse};
use dvgen_tags::{parse_tags, Literal, Scope, Tag};

use crate::error::BuildError;
use crate::kind::{
    valid_scopes, EnumMember, Format, ItemSelector, ListType, RuleKind, Stability, UniqueMode,
    UpdateOp,
};
use crate::options::CompilerOptions;
use crate::rule::{Condition, Rule, RuleTree};

/// Tags that are compile-time metadata and so may not depend on gates.
const UNCONDITIONAL_ONLY: &[&str] = &[
    "listType",
    "listMapKey",
    "unique",
    "customUnique",
    "unionMember",
    "unionDiscriminator",
    "zeroOrOneOfMember",
    "opaqueType",
    "declarativeValidationNative",
    "enum",
];

/// Per-call build context, threaded through composition.
#[derive(Debug, Clone, Copy, Default)]
struct Context<'c> {
    under_condition: bool,
    /// Default union member name: the field's Go name, or the first item
    /// selector value.
    member_name: Option<&'c str>,
}

/// Builds rule trees against a type universe.
#[derive(Debug, Clone, Copy)]
pub struct RuleBuilder<'u> {
    universe: &'u TypeUniverse,
    options: &'u CompilerOptions,
}

impl<'u> RuleBuilder<'u> {
    pub fn new(universe: &'u TypeUniverse, options: &'u CompilerOptions) -> Self {
        Self { universe, options }
    }

    /// Rules attached to a struct field.
    ///
    /// # Errors
    ///
    /// Returns the first [`BuildError`] found.
    pub fn field_rules(&self, field: &FieldDef) -> Result<RuleTree, BuildError> {
        let tags = parse_tags(&field.tags, Scope::Field)?;
        let ctx = Context {
            under_condition: false,
            member_name: Some(field.name.as_str()),
        };
        self.tree(&tags, &field.type_ref, ctx)
    }

    /// Type-level rules of a named type.
    ///
    /// # Errors
    ///
    /// Returns the first [`BuildError`] found.
    pub fn type_rules(&self, def: &TypeDef) -> Result<RuleTree, BuildError> {
        let tags = parse_tags(&def.tags, Scope::Type)?;
        let target = TypeRef::named(def.name.clone());
        self.tree(&tags, &target, Context::default())
    }

    fn tree(&self, tags: &[Tag], target: &TypeRef, ctx: Context<'_>) -> Result<RuleTree, BuildError> {
        let mut tree = RuleTree::new();
        for tag in tags {
            if !self.in_namespace(tag) {
                tracing::trace!(tag = %tag.raw, "ignoring tag outside the compiled namespace");
                continue;
            }
            if let Some(rule) = self.rule(tag, target, ctx)? {
                tree.push(rule);
            }
        }
        check_tree(&tree)?;
        Ok(tree)
    }

    fn in_namespace(&self, tag: &Tag) -> bool {
        match &self.options.namespace {
            Some(ns) => tag.namespace.as_deref() == Some(ns.as_str()),
            None => true,
        }
    }

    fn rule(&self, tag: &Tag, target: &TypeRef, ctx: Context<'_>) -> Result<Option<Rule>, BuildError> {
        let name = tag.name.as_str();
        let raw = tag.raw.as_str();
        let Some(scopes) = valid_scopes(name) else {
            if self.options.allow_unknown_tags {
                tracing::warn!(tag = %raw, "skipping unknown tag");
                return Ok(None);
            }
            return Err(BuildError::UnknownTag { tag: raw.to_string() });
        };
        if !scopes.contains(&tag.scope) {
            return Err(BuildError::ScopeMismatch {
                tag: raw.to_string(),
                scope: tag.scope,
            });
        }
        if ctx.under_condition && UNCONDITIONAL_ONLY.contains(&name) {
            return Err(composition(tag, "may not appear under ifEnabled or ifDisabled"));
        }

        let rule = match name {
            "required" => self.marker(tag, RuleKind::Required, "required")?,
            "optional" => self.marker(tag, RuleKind::Optional, "optional")?,
            "forbidden" => self.marker(tag, RuleKind::Forbidden, "forbidden")?,
            "immutable" => self.marker(tag, RuleKind::Immutable, "immutable")?,
            "opaqueType" => self.marker(tag, RuleKind::Opaque, "opaqueType")?,
            "declarativeValidationNative" => {
                self.marker(tag, RuleKind::DeclarativeNative, "declarativeValidationNative")?
            }
            "enumExclude" => self.marker(tag, RuleKind::EnumExclude, "enum")?,
            "update" => {
                let op: UpdateOp = parse_word(tag)?;
                Rule::new(RuleKind::UpdateConstraint(op), "update", raw)
            }
            "minimum" => {
                let shape = self.universe.resolve(target)?;
                expect(tag, shape.is_integer(), "an integer", || shape.describe())?;
                Rule::new(RuleKind::Minimum(int_payload(tag)?), "minimum", raw)
            }
            "maxLength" => {
                let shape = self.universe.resolve(target)?;
                expect(tag, shape.is_string(), "a string", || shape.describe())?;
                Rule::new(RuleKind::MaxLength(limit_payload(tag)?), "maxLength", raw)
            }
            "maxItems" => {
                let shape = self.universe.resolve(target)?;
                expect(tag, shape.is_slice(), "a list", || shape.describe())?;
                Rule::new(RuleKind::MaxItems(limit_payload(tag)?), "maxItems", raw)
            }
            "maxProperties" => {
                let shape = self.universe.resolve(target)?;
                expect(tag, shape.is_map(), "a map", || shape.describe())?;
                Rule::new(RuleKind::MaxProperties(limit_payload(tag)?), "maxProperties", raw)
            }
            "format" => {
                let shape = self.universe.resolve(target)?;
                expect(tag, shape.is_string(), "a string", || shape.describe())?;
                let format: Format = parse_word(tag)?;
                Rule::new(RuleKind::Format(format), format!("format={}", format.name()), raw)
            }
            "neq" => self.neq(tag, target)?,
            "enum" => self.enumeration(tag, target)?,
            "listType" => {
                let list_type: ListType = parse_word(tag)?;
                if list_type == ListType::Map {
                    self.list_element_struct(tag, target)?;
                } else {
                    self.list_element(tag, target)?;
                }
                Rule::new(RuleKind::ListIdentity(list_type), "listType", raw)
            }
            "unique" => {
                let mode: UniqueMode = parse_word(tag)?;
                if mode == UniqueMode::Map {
                    self.list_element_struct(tag, target)?;
                } else {
                    self.list_element(tag, target)?;
                }
                Rule::new(RuleKind::Unique(mode), "unique", raw)
            }
            "listMapKey" => {
                let elem = self.list_element_struct(tag, target)?;
                let key = word_payload(tag)?;
                if elem.field(key).is_none() {
                    return Err(BuildError::UnknownField {
                        tag: raw.to_string(),
                        field: key.to_string(),
                        type_name: elem.name.clone(),
                    });
                }
                Rule::new(RuleKind::ListMapKey(key.to_string()), "listMapKey", raw)
            }
            "customUnique" => {
                self.list_element(tag, target)?;
                self.marker(tag, RuleKind::CustomUnique, "customUnique")?
            }
            "unionMember" => {
                allow_args(tag, &["union", "memberName"])?;
                let member = member_name(tag, ctx)?;
                let union = string_arg(tag, "union")?.unwrap_or_default();
                Rule::new(RuleKind::UnionMember { union, member }, "union", raw)
            }
            "zeroOrOneOfMember" => {
                allow_args(tag, &["union", "memberName"])?;
                let member = member_name(tag, ctx)?;
                let group = string_arg(tag, "union")?.unwrap_or_default();
                Rule::new(
                    RuleKind::ZeroOrOneOfMember { group, member },
                    "zeroOrOneOf",
                    raw,
                )
            }
            "unionDiscriminator" => {
                allow_args(tag, &["union"])?;
                let shape = self.universe.resolve(target)?;
                expect(tag, shape.is_string(), "a string", || shape.describe())?;
                let union = string_arg(tag, "union")?.unwrap_or_default();
                Rule::new(RuleKind::UnionDiscriminator { union }, "union", raw)
            }
            "eachVal" => {
                let shape = self.universe.resolve(target)?;
                let (elem, scope) = match shape.shape {
                    Shape::Slice(elem) => (elem, Scope::ListValue),
                    Shape::Map { value, .. } => (value, Scope::MapValue),
                    _ => return Err(incompatible(tag, "a list or map", shape.describe())),
                };
                let Some(child) = self.child(tag, scope, elem, ctx)? else {
                    return Ok(None);
                };
                Rule::composed(RuleKind::EachVal, child, "eachVal", raw)
            }
            "eachKey" => {
                let shape = self.universe.resolve(target)?;
                let Shape::Map { key, .. } = shape.shape else {
                    return Err(incompatible(tag, "a map", shape.describe()));
                };
                let Some(child) = self.child(tag, Scope::MapKey, key, ctx)? else {
                    return Ok(None);
                };
                Rule::composed(RuleKind::EachKey, child, "eachKey", raw)
            }
            "subfield" => {
                let def = self.struct_def(tag, target)?;
                let field_name = tag
                    .positional(0)
                    .and_then(Literal::as_str)
                    .ok_or_else(|| arguments(tag, "subfield requires a field name"))?;
                let field = def.field(field_name).ok_or_else(|| BuildError::UnknownField {
                    tag: raw.to_string(),
                    field: field_name.to_string(),
                    type_name: def.name.clone(),
                })?;
                let sub_ctx = Context {
                    member_name: Some(field.name.as_str()),
                    ..ctx
                };
                let Some(child) = self.child(tag, Scope::Field, &field.type_ref, sub_ctx)? else {
                    return Ok(None);
                };
                Rule::composed(RuleKind::Subfield(field_name.to_string()), child, "subfield", raw)
            }
            "item" => return self.item(tag, target, ctx),
            "ifEnabled" | "ifDisabled" => {
                let gate = match (tag.args.len(), tag.positional(0).and_then(Literal::as_str)) {
                    (1, Some(gate)) => gate,
                    _ => return Err(arguments(tag, "requires exactly one feature gate name")),
                };
                if let Some(registry) = &self.options.feature_gates {
                    if !registry.contains(gate) {
                        return Err(BuildError::UnknownFeatureGate {
                            tag: raw.to_string(),
                            gate: gate.to_string(),
                        });
                    }
                }
                let cond_ctx = Context {
                    under_condition: true,
                    ..ctx
                };
                let Some(child) = self.child(tag, tag.scope, target, cond_ctx)? else {
                    return Ok(None);
                };
                let condition = if name == "ifEnabled" {
                    Condition::if_enabled(gate)
                } else {
                    Condition::if_disabled(gate)
                };
                Rule::conditional(condition, child, raw)
            }
            _ => return Err(BuildError::UnknownTag { tag: raw.to_string() }),
        };
        Ok(Some(rule))
    }

    /// Build the nested payload of a composed tag in `scope` against `target`.
    fn child(
        &self,
        tag: &Tag,
        scope: Scope,
        target: &TypeRef,
        ctx: Context<'_>,
    ) -> Result<Option<Rule>, BuildError> {
        let nested = tag
            .nested()
            .ok_or_else(|| payload(tag, "expected a nested tag"))?;
        if let Some(ns) = &self.options.namespace {
            if !nested.in_namespace(ns) {
                return Err(composition(tag, "nested tag is in a different namespace"));
            }
        }
        let nested = nested.clone().in_scope(scope);
        self.rule(&nested, target, ctx)
    }

    /// A rule that takes no arguments and no payload.
    fn marker(&self, tag: &Tag, kind: RuleKind, origin: &str) -> Result<Rule, BuildError> {
        if !tag.args.is_empty() {
            return Err(arguments(tag, "takes no arguments"));
        }
        if tag.payload.is_some() {
            return Err(payload(tag, "takes no payload"));
        }
        Ok(Rule::new(kind, origin, tag.raw.as_str()))
    }

    fn neq(&self, tag: &Tag, target: &TypeRef) -> Result<Rule, BuildError> {
        let shape = self.universe.resolve(target)?;
        let Shape::Scalar(kind) = shape.shape else {
            return Err(incompatible(tag, "a scalar", shape.describe()));
        };
        let literal = tag
            .literal()
            .ok_or_else(|| payload(tag, "expected a value"))?;
        let value = match (kind, literal) {
            (ScalarKind::String, lit) => Value::String(
                lit.as_str()
                    .map(str::to_string)
                    .unwrap_or_else(|| lit.to_string()),
            ),
            (ScalarKind::Int | ScalarKind::Uint | ScalarKind::Float, Literal::Int(n)) => {
                Value::from(*n)
            }
            (ScalarKind::Bool, Literal::Bool(b)) => Value::Bool(*b),
            _ => return Err(payload(tag, "value does not match the field type")),
        };
        Ok(Rule::new(RuleKind::Neq(value), "neq", tag.raw.as_str()))
    }

    fn enumeration(&self, tag: &Tag, target: &TypeRef) -> Result<Rule, BuildError> {
        if tag.payload.is_some() || !tag.args.is_empty() {
            return Err(payload(tag, "takes no payload"));
        }
        let not_alias = || incompatible(tag, "a string alias type", target.to_string());
        let TypeRef::Named(name) = target else {
            return Err(not_alias());
        };
        let def = self
            .universe
            .get(name)
            .ok_or_else(|| TypeError::UnknownType(name.clone()))?;
        let TypeDefKind::Alias { underlying, constants } = &def.kind else {
            return Err(not_alias());
        };
        if !self.universe.resolve(underlying)?.is_string() {
            return Err(not_alias());
        }
        let mut members = Vec::with_capacity(constants.len());
        for constant in constants {
            let mut exclusions = Vec::new();
            for const_tag in parse_tags(&constant.tags, Scope::Const)? {
                if !self.in_namespace(&const_tag) {
                    continue;
                }
                if let Some(rule) = self.rule(&const_tag, target, Context::default())? {
                    exclusions.push(rule);
                }
            }
            members.push(EnumMember {
                name: constant.name.clone(),
                value: constant.value.clone(),
                exclusions,
            });
        }
        Ok(Rule::new(RuleKind::Enum(members), "enum", tag.raw.as_str()))
    }

    fn item(&self, tag: &Tag, target: &TypeRef, ctx: Context<'_>) -> Result<Option<Rule>, BuildError> {
        let elem_def = self.list_element_struct(tag, target)?;
        let elem_ref = self.list_element(tag, target)?;
        if tag.args.is_empty() {
            return Err(arguments(tag, "requires at least one key: value selector"));
        }
        let mut keys = Vec::with_capacity(tag.args.len());
        for arg in &tag.args {
            let Some(field) = &arg.name else {
                return Err(arguments(tag, "selector arguments must be key: value"));
            };
            if elem_def.field(field).is_none() {
                return Err(BuildError::UnknownField {
                    tag: tag.raw.clone(),
                    field: field.clone(),
                    type_name: elem_def.name.clone(),
                });
            }
            keys.push((field.clone(), literal_value(&arg.value)));
        }
        let default_member = match &keys[0].1 {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        let item_ctx = Context {
            member_name: Some(default_member.as_str()),
            ..ctx
        };
        let Some(child) = self.child(tag, Scope::ListValue, elem_ref, item_ctx)? else {
            return Ok(None);
        };
        Ok(Some(Rule::composed(
            RuleKind::Item(ItemSelector { keys }),
            child,
            "item",
            tag.raw.as_str(),
        )))
    }

    /// Element type of a list target.
    fn list_element<'t>(&self, tag: &Tag, target: &'t TypeRef) -> Result<&'t TypeRef, BuildError>
    where
        'u: 't,
    {
        let shape = self.universe.resolve(target)?;
        match shape.shape {
            Shape::Slice(elem) => Ok(elem),
            _ => Err(incompatible(tag, "a list", shape.describe())),
        }
    }

    /// Element struct of a list-of-structs target.
    fn list_element_struct(&self, tag: &Tag, target: &TypeRef) -> Result<&'u TypeDef, BuildError> {
        let shape = self.universe.resolve(target)?;
        let Shape::Slice(elem) = shape.shape else {
            return Err(incompatible(tag, "a list of structs", shape.describe()));
        };
        self.struct_def(tag, elem)
            .map_err(|_| incompatible(tag, "a list of structs", shape.describe()))
    }

    fn struct_def(&self, tag: &Tag, target: &TypeRef) -> Result<&'u TypeDef, BuildError> {
        let shape = self.universe.resolve(target)?;
        let name = shape
            .struct_name()
            .ok_or_else(|| incompatible(tag, "a struct", shape.describe()))?;
        self.universe
            .get(name)
            .ok_or_else(|| BuildError::Type(TypeError::UnknownType(name.to_string())))
    }
}

/// Presence and stability checks over a finished tree.
fn check_tree(tree: &RuleTree) -> Result<(), BuildError> {
    let mut seen: Vec<&Rule> = Vec::new();
    for rule in tree.iter().filter(|r| !r.is_conditional()) {
        if !matches!(
            rule.kind(),
            RuleKind::Required | RuleKind::Optional | RuleKind::Forbidden | RuleKind::Immutable
        ) {
            continue;
        }
        if seen.iter().any(|s| s.kind() == rule.kind()) {
            return Err(BuildError::DuplicateRule {
                tag: rule.tag().to_string(),
            });
        }
        seen.push(rule);
    }

    if let Some(required) = seen.iter().find(|r| matches!(r.kind(), RuleKind::Required)) {
        if let Some(other) = seen
            .iter()
            .find(|r| matches!(r.kind(), RuleKind::Optional | RuleKind::Forbidden))
        {
            return Err(BuildError::ConflictingRules {
                first: required.tag().to_string(),
                second: other.tag().to_string(),
            });
        }
    }

    if tree.has(|k| matches!(k, RuleKind::DeclarativeNative)) {
        if let Some(unstable) = tree
            .all_rules()
            .into_iter()
            .find(|r| r.stability() != Stability::Stable)
        {
            return Err(BuildError::StabilityViolation {
                tag: unstable.tag().to_string(),
                actual: unstable.stability(),
            });
        }
    }
    Ok(())
}

fn literal_value(lit: &Literal) -> Value {
    match lit {
        Literal::String(s) | Literal::Word(s) => Value::String(s.clone()),
        Literal::Int(n) => Value::from(*n),
        Literal::Bool(b) => Value::Bool(*b),
    }
}

fn member_name(tag: &Tag, ctx: Context<'_>) -> Result<String, BuildError> {
    match string_arg(tag, "memberName")? {
        Some(name) => Ok(name),
        None => ctx
            .member_name
            .map(str::to_string)
            .ok_or_else(|| arguments(tag, "memberName is required here")),
    }
}

fn string_arg(tag: &Tag, name: &str) -> Result<Option<String>, BuildError> {
    match tag.arg(name) {
        None => Ok(None),
        Some(lit) => lit
            .as_str()
            .map(|s| Some(s.to_string()))
            .ok_or_else(|| arguments(tag, &format!("{name} must be a string"))),
    }
}

fn allow_args(tag: &Tag, allowed: &[&str]) -> Result<(), BuildError> {
    for arg in &tag.args {
        match &arg.name {
            Some(name) if allowed.contains(&name.as_str()) => {}
            Some(name) => return Err(arguments(tag, &format!("unknown argument '{name}'"))),
            None => return Err(arguments(tag, "arguments must be key: value")),
        }
    }
    if tag.payload.is_some() {
        return Err(payload(tag, "takes no payload"));
    }
    Ok(())
}

fn word_payload(tag: &Tag) -> Result<&str, BuildError> {
    tag.literal()
        .and_then(Literal::as_str)
        .ok_or_else(|| payload(tag, "expected a word"))
}

fn parse_word<T: std::str::FromStr<Err = String>>(tag: &Tag) -> Result<T, BuildError> {
    word_payload(tag)?
        .parse()
        .map_err(|reason: String| payload(tag, &reason))
}

fn int_payload(tag: &Tag) -> Result<i64, BuildError> {
    tag.literal()
        .and_then(Literal::as_int)
        .ok_or_else(|| payload(tag, "expected an integer"))
}

fn limit_payload(tag: &Tag) -> Result<usize, BuildError> {
    usize::try_from(int_payload(tag)?).map_err(|_| payload(tag, "limit may not be negative"))
}

fn expect(
    tag: &Tag,
    ok: bool,
    expected: &str,
    found: impl FnOnce() -> String,
) -> Result<(), BuildError> {
    if ok {
        Ok(())
    } else {
        Err(incompatible(tag, expected, found()))
    }
}

fn incompatible(tag: &Tag, expected: &str, found: String) -> BuildError {
    BuildError::IncompatibleType {
        tag: tag.raw.clone(),
        expected: expected.to_string(),
        found,
    }
}

fn payload(tag: &Tag, reason: &str) -> BuildError {
    BuildError::InvalidPayload {
        tag: tag.raw.clone(),
        reason: reason.to_string(),
    }
}

fn arguments(tag: &Tag, reason: &str) -> BuildError {
    BuildError::InvalidArguments {
        tag: tag.raw.clone(),
        reason: reason.to_string(),
    }
}

fn composition(tag: &Tag, reason: &str) -> BuildError {
    BuildError::InvalidComposition {
        tag: tag.raw.clone(),
        reason: reason.to_string(),
    }
}
