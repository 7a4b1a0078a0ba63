//! # Rule Executor
//!
//! Walks an object instance (and, on update, its previous version) against
//! a [`CompiledSchema`] and returns every violation found. The walk never
//! stops early: one violation does not prevent others from being reported.
//!
//! ## Evaluation at one position
//!
//! 1. **Ratcheting.** On update, a value equal to its old counterpart is
//!    skipped together with everything beneath it.
//! 2. **Short-circuit phase.** Conditionals are resolved first. Then, on
//!    update, `immutable` and `update` constraints; then `required` and
//!    `forbidden`. The first violation stops the position. An unset field
//!    that is not required stops here as well.
//! 3. **Additive rules** in declaration order, followed by the type-level
//!    rules of every named type in the value's chain.
//! 4. **Descent** into struct fields, list elements, and map keys and
//!    values, unless the field is opaque.
//!
//! ## Element identity
//!
//! | List      | Path             | Old counterpart           |
//! |-----------|------------------|---------------------------|
//! | atomic    | `items[3]`       | none                      |
//! | set       | `items[3]`       | equal element             |
//! | map       | `items[name=a]`  | element with equal keys   |
//!
//! Map values are addressed as `labels[key]` and matched by key. Keys are
//! converted to the key type's domain before their rules run.
//!
//! A value without an old counterpart, or whose counterpart is `null`, is
//! validated with nothing beneath it treated as unchanged.

use serde_json::{Map, Value};
use tracing::{debug, trace, warn};

use dvgen_core::{ErrorList, FeatureGates, FieldPath, ValidationError};
use dvgen_rules::{
    CompiledSchema, CompiledStruct, CompiledType, ConditionalResolver, ItemSelector,
    ListSemantics, ListType, Rule, RuleKind, TypeBody, UpdateOp, ValuePlan, ValueShape,
};

use crate::collections;
use crate::error::ExecError;
use crate::scalar;
use crate::union;
use crate::value::{expected, is_unset, key_value, shape_matches, NULL};

static ATOMIC: ListSemantics = ListSemantics {
    list_type: ListType::Atomic,
    keys: Vec::new(),
    unique: None,
    custom_unique: false,
};

// ---------------------------------------------------------------------------
// Public surface
// ---------------------------------------------------------------------------

/// Validator for one root type of a compiled schema.
#[derive(Debug, Clone)]
pub struct TypeValidator<'s> {
    schema: &'s CompiledSchema,
    ty: &'s CompiledType,
    root: ValuePlan,
}

impl<'s> TypeValidator<'s> {
    /// # Errors
    ///
    /// Returns [`ExecError::UnknownType`] when `type_name` is not in the
    /// schema.
    pub fn new(schema: &'s CompiledSchema, type_name: &str) -> Result<Self, ExecError> {
        let ty = schema
            .get(type_name)
            .ok_or_else(|| ExecError::UnknownType(type_name.to_string()))?;
        let root = match &ty.body {
            TypeBody::Struct(_) => ValuePlan {
                shape: ValueShape::Struct(ty.name.clone()),
                nullable: false,
                named: vec![ty.name.clone()],
                list: None,
            },
            TypeBody::Alias(plan) => plan.clone(),
        };
        Ok(Self { schema, ty, root })
    }

    pub fn type_name(&self) -> &str {
        &self.ty.name
    }

    /// Validate `new`. Supplying `old` makes the operation an update.
    ///
    /// The result depends only on the arguments: the same inputs and gate
    /// snapshot always yield the same list in the same order.
    pub fn validate(&self, new: &Value, old: Option<&Value>, gates: &dyn FeatureGates) -> ErrorList {
        let mut walker = Walker {
            schema: self.schema,
            resolver: ConditionalResolver::new(gates),
            errors: ErrorList::new(),
        };
        walker.position(Position {
            path: FieldPath::root(),
            rules: Vec::new(),
            plan: &self.root,
            new: Some(new),
            old,
            native: false,
            field_scope: false,
            shallow: false,
        });
        debug!(
            type_name = %self.ty.name,
            update = old.is_some(),
            errors = walker.errors.len(),
            "validated object"
        );
        walker.errors
    }
}

/// Access to per-type validators of a compiled schema.
pub trait SchemaValidators {
    /// The validator for `type_name`, or `None` when the type was not
    /// compiled.
    fn validator(&self, type_name: &str) -> Option<TypeValidator<'_>>;
}

impl SchemaValidators for CompiledSchema {
    fn validator(&self, type_name: &str) -> Option<TypeValidator<'_>> {
        TypeValidator::new(self, type_name).ok()
    }
}

/// Validate one object of `type_name`.
///
/// # Errors
///
/// Returns [`ExecError::UnknownType`] when the type was not compiled.
/// Constraint violations are returned in the `Ok` list.
pub fn validate(
    schema: &CompiledSchema,
    type_name: &str,
    new: &Value,
    old: Option<&Value>,
    gates: &dyn FeatureGates,
) -> Result<ErrorList, ExecError> {
    let validator = TypeValidator::new(schema, type_name).map_err(|e| {
        warn!(type_name = %type_name, "validation requested for a type missing from the schema");
        e
    })?;
    Ok(validator.validate(new, old, gates))
}

// ---------------------------------------------------------------------------
// Walk
// ---------------------------------------------------------------------------

/// One place in the instance being evaluated.
struct Position<'a, 'v> {
    path: FieldPath,
    /// Rules attached here, conditionals not yet resolved.
    rules: Vec<&'a Rule>,
    plan: &'a ValuePlan,
    new: Option<&'v Value>,
    /// `Some` only on update when a counterpart exists; `Some(null)` when
    /// the counterpart is unset.
    old: Option<&'v Value>,
    native: bool,
    /// Field positions stop when unset; elements continue.
    field_scope: bool,
    /// Only the attached rules apply: no type-level rules, no descent.
    shallow: bool,
}

struct Walker<'a, 'g> {
    schema: &'a CompiledSchema,
    resolver: ConditionalResolver<'g>,
    errors: ErrorList,
}

impl<'a, 'g> Walker<'a, 'g> {
    fn push(&mut self, error: ValidationError, native: bool) {
        self.errors.push(error.native_if(native));
    }

    fn position<'v>(&mut self, pos: Position<'a, 'v>) {
        if let Some(old) = pos.old {
            if pos.new.unwrap_or(&NULL) == old {
                trace!(path = %pos.path, "unchanged on update");
                return;
            }
        }

        let resolver = self.resolver;
        let own: Vec<&'a Rule> = pos
            .rules
            .iter()
            .copied()
            .filter_map(|r| resolver.resolve(r))
            .collect();
        if self.short_circuit(&pos, &own) {
            return;
        }
        let Some(value) = pos.new.filter(|v| !v.is_null()) else {
            return;
        };

        let mut rules = own;
        if !pos.shallow {
            for name in &pos.plan.named {
                match self.schema.get(name) {
                    Some(ty) => rules.extend(resolver.active(&ty.rules)),
                    None => warn!(
                        type_name = %name,
                        path = %pos.path,
                        "type not compiled; its rules are skipped"
                    ),
                }
            }
        }

        if !shape_matches(pos.plan, value) {
            let origin = rules
                .iter()
                .find(|r| checks_value(r.kind()))
                .map_or("type", |r| r.origin());
            let detail = format!("must be {}", expected(pos.plan));
            self.push(
                ValidationError::invalid(pos.path.clone(), value.clone(), detail, origin),
                pos.native,
            );
            return;
        }

        for &rule in &rules {
            self.apply(&pos, rule, value);
        }
        if pos.shallow {
            return;
        }

        let each_val = children(&rules, |k| matches!(k, RuleKind::EachVal));
        let each_key = children(&rules, |k| matches!(k, RuleKind::EachKey));
        let plan = pos.plan;
        match &plan.shape {
            ValueShape::Scalar(_) => {}
            ValueShape::Struct(name) => {
                self.structure(&pos.path, name, value, pos.old, pos.native);
            }
            ValueShape::Slice(elem) => {
                if let Some(items) = value.as_array() {
                    self.list(&pos, elem, items, &each_val);
                }
            }
            ValueShape::Map { key, value: entry } => {
                if let Some(map) = value.as_object() {
                    self.map(&pos, key, entry, map, &each_key, &each_val);
                }
            }
        }
    }

    /// Returns `true` when evaluation of the position stops.
    fn short_circuit(&mut self, pos: &Position<'a, '_>, own: &[&'a Rule]) -> bool {
        let unset = is_unset(pos.new, pos.plan);

        if let Some(old) = pos.old {
            let old_unset = is_unset(Some(old), pos.plan);
            let new = pos.new.unwrap_or(&NULL);
            let changed = !(unset && old_unset) && new != old;
            for rule in own {
                let detail = match rule.kind() {
                    RuleKind::Immutable if changed => "field is immutable",
                    RuleKind::UpdateConstraint(UpdateOp::NoSet) if old_unset && !unset => {
                        "field may not be set once created"
                    }
                    RuleKind::UpdateConstraint(UpdateOp::NoUnset) if !old_unset && unset => {
                        "field may not be cleared once set"
                    }
                    RuleKind::UpdateConstraint(UpdateOp::NoModify)
                        if !old_unset && !unset && changed =>
                    {
                        "field may not be modified once set"
                    }
                    _ => continue,
                };
                trace!(path = %pos.path, origin = rule.origin(), "transition rejected");
                self.push(
                    ValidationError::forbidden(pos.path.clone(), detail, rule.origin()),
                    pos.native,
                );
                return true;
            }
        }

        for rule in own {
            match rule.kind() {
                RuleKind::Required if unset => {
                    self.push(ValidationError::required(pos.path.clone(), rule.origin()), pos.native);
                    return true;
                }
                RuleKind::Forbidden if !unset => {
                    self.push(
                        ValidationError::forbidden(pos.path.clone(), "may not be specified", rule.origin()),
                        pos.native,
                    );
                    return true;
                }
                _ => {}
            }
        }
        unset && pos.field_scope
    }

    fn apply<'v>(&mut self, pos: &Position<'a, 'v>, rule: &'a Rule, value: &'v Value) {
        let path = &pos.path;
        let origin = rule.origin();
        let error = match rule.kind() {
            RuleKind::Minimum(min) => scalar::minimum(path, value, *min, origin),
            RuleKind::MaxLength(max) => scalar::max_length(path, value, *max, origin),
            RuleKind::MaxItems(max) => {
                scalar::max_entries(path, value.as_array().map(Vec::len), *max, origin)
            }
            RuleKind::MaxProperties(max) => {
                scalar::max_entries(path, value.as_object().map(Map::len), *max, origin)
            }
            RuleKind::Format(format) => scalar::string_format(path, value, *format, origin),
            RuleKind::Neq(disallowed) => scalar::neq(path, value, disallowed, origin),
            RuleKind::Enum(members) => {
                let allowed = self.resolver.allowed_values(members);
                scalar::enumeration(path, value, &allowed, origin)
            }
            RuleKind::Subfield(name) => {
                self.subfield(pos, rule, name, value);
                None
            }
            RuleKind::Item(selector) => {
                self.item(pos, rule, selector, value);
                None
            }
            _ => None,
        };
        if let Some(error) = error {
            self.push(error, pos.native);
        }
    }

    fn subfield<'v>(&mut self, pos: &Position<'a, 'v>, rule: &'a Rule, name: &str, value: &'v Value) {
        let schema = self.schema;
        let plan: &'a ValuePlan = pos.plan;
        let ValueShape::Struct(struct_name) = &plan.shape else {
            return;
        };
        let Some(body) = struct_body(schema, struct_name) else {
            return;
        };
        let (Some(field), Some(child)) = (body.field(name), rule.child()) else {
            return;
        };
        self.position(Position {
            path: pos.path.child(name),
            rules: vec![child],
            plan: &field.plan,
            new: value.get(name),
            old: existing(pos.old).map(|o| o.get(name).unwrap_or(&NULL)),
            native: pos.native || field.native,
            field_scope: true,
            shallow: true,
        });
    }

    fn item<'v>(
        &mut self,
        pos: &Position<'a, 'v>,
        rule: &'a Rule,
        selector: &ItemSelector,
        value: &'v Value,
    ) {
        let plan: &'a ValuePlan = pos.plan;
        let (ValueShape::Slice(elem), Some(items), Some(child)) =
            (&plan.shape, value.as_array(), rule.child())
        else {
            return;
        };
        let semantics = plan.list.as_ref().unwrap_or(&ATOMIC);
        let found = items.iter().enumerate().find(|(_, it)| selector.matches(it));
        let path = match found {
            Some((i, it)) => collections::element_path(&pos.path, i, it, semantics),
            None => pos.path.key(selector.identity()),
        };
        let old = existing(pos.old).map(|o| {
            o.as_array()
                .and_then(|a| a.iter().find(|it| selector.matches(it)))
                .unwrap_or(&NULL)
        });
        self.position(Position {
            path,
            rules: vec![child],
            plan: elem,
            new: found.map(|(_, it)| it),
            old,
            native: pos.native,
            field_scope: true,
            shallow: true,
        });
    }

    fn structure<'v>(
        &mut self,
        path: &FieldPath,
        name: &str,
        value: &'v Value,
        old: Option<&'v Value>,
        native: bool,
    ) {
        let schema = self.schema;
        let old = existing(old);
        let Some(body) = struct_body(schema, name) else {
            trace!(type_name = %name, path = %path, "no compiled struct; not descending");
            return;
        };
        for field in &body.fields {
            let json = field.json_name.as_str();
            self.position(Position {
                path: path.child(json),
                rules: field.rules.iter().collect(),
                plan: &field.plan,
                new: value.get(json),
                old: old.map(|o| o.get(json).unwrap_or(&NULL)),
                native: native || field.native,
                field_scope: true,
                shallow: field.opaque,
            });
        }
        for spec in &body.unions {
            for error in union::check_union(path, spec, value, old) {
                self.push(error, native);
            }
        }
        for spec in &body.zero_or_one {
            if let Some(error) = union::check_zero_or_one(path, spec, value, old) {
                self.push(error, native);
            }
        }
    }

    fn list<'v>(
        &mut self,
        pos: &Position<'a, 'v>,
        elem: &'a ValuePlan,
        items: &'v [Value],
        rules: &[&'a Rule],
    ) {
        let plan: &'a ValuePlan = pos.plan;
        let semantics = plan.list.as_ref().unwrap_or(&ATOMIC);
        if semantics.checks_uniqueness() {
            for error in collections::duplicates(&pos.path, items, semantics) {
                self.push(error, pos.native);
            }
        }
        let old_items = pos.old.and_then(Value::as_array).map(Vec::as_slice);
        for (i, item) in items.iter().enumerate() {
            self.position(Position {
                path: collections::element_path(&pos.path, i, item, semantics),
                rules: rules.to_vec(),
                plan: elem,
                new: Some(item),
                old: collections::counterpart(item, old_items, semantics),
                native: pos.native,
                field_scope: false,
                shallow: false,
            });
        }
    }

    fn map<'v>(
        &mut self,
        pos: &Position<'a, 'v>,
        key_plan: &'a ValuePlan,
        value_plan: &'a ValuePlan,
        entries: &'v Map<String, Value>,
        key_rules: &[&'a Rule],
        value_rules: &[&'a Rule],
    ) {
        let old_map = pos.old.and_then(Value::as_object);
        for (key, entry) in entries {
            let path = pos.path.key(key.as_str());
            let existed = old_map.is_some_and(|o| o.contains_key(key));
            if !existed && (!key_rules.is_empty() || !key_plan.named.is_empty()) {
                let typed_key = key_value(key_plan, key);
                self.position(Position {
                    path: path.clone(),
                    rules: key_rules.to_vec(),
                    plan: key_plan,
                    new: Some(&typed_key),
                    old: None,
                    native: pos.native,
                    field_scope: false,
                    shallow: false,
                });
            }
            self.position(Position {
                path,
                rules: value_rules.to_vec(),
                plan: value_plan,
                new: Some(entry),
                old: old_map.and_then(|o| o.get(key)),
                native: pos.native,
                field_scope: false,
                shallow: false,
            });
        }
    }
}

/// The old value when it existed; a `null` counterpart has no children.
fn existing(old: Option<&Value>) -> Option<&Value> {
    old.filter(|o| !o.is_null())
}

fn struct_body<'a>(schema: &'a CompiledSchema, name: &str) -> Option<&'a CompiledStruct> {
    match &schema.get(name)?.body {
        TypeBody::Struct(body) => Some(body),
        TypeBody::Alias(_) => None,
    }
}

/// Kinds that inspect the value itself.
fn checks_value(kind: &RuleKind) -> bool {
    matches!(
        kind,
        RuleKind::Minimum(_)
            | RuleKind::MaxLength(_)
            | RuleKind::MaxItems(_)
            | RuleKind::MaxProperties(_)
            | RuleKind::Format(_)
            | RuleKind::Enum(_)
            | RuleKind::Neq(_)
    )
}

fn children<'a>(rules: &[&'a Rule], pred: impl Fn(&RuleKind) -> bool) -> Vec<&'a Rule> {
    rules
        .iter()
        .copied()
        .filter(|r| pred(r.kind()))
        .filter_map(Rule::child)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use dvgen_core::{ConstDef, ErrorKind, FeatureGateSnapshot, FieldDef, TypeDef, TypeRef, TypeUniverse};
    use dvgen_rules::Compiler;
    use serde_json::json;

    fn ty(s: &str) -> TypeRef {
        TypeRef::parse(s).unwrap()
    }

    fn compile(defs: Vec<TypeDef>) -> CompiledSchema {
        let universe: TypeUniverse = defs.into();
        Compiler::default().compile(&universe).into_result().unwrap()
    }

    fn summary(errors: &ErrorList) -> Vec<(String, ErrorKind)> {
        errors.iter().map(|e| (e.path().to_string(), e.kind())).collect()
    }

    fn widget_schema() -> CompiledSchema {
        compile(vec![
            TypeDef::structure(
                "Item",
                vec![
                    FieldDef::new("Name", ty("string")),
                    FieldDef::new("Count", ty("int")).with_tags(["+k8s:minimum=0"]),
                ],
            ),
            TypeDef::alias("ShortName", ty("string")).with_tags(["+k8s:maxLength=3"]),
            TypeDef::structure(
                "Widget",
                vec![
                    FieldDef::new("Name", ty("string")).with_tags(["+k8s:required", "+k8s:maxLength=8"]),
                    FieldDef::new("Owner", ty("*string")).with_tags(["+k8s:optional", "+k8s:immutable"]),
                    FieldDef::new("Tags", ty("[]string"))
                        .with_tags(["+k8s:listType=set", "+k8s:eachVal=+k8s:maxLength=3"]),
                    FieldDef::new("Items", ty("[]Item")).with_tags([
                        "+k8s:listType=map",
                        "+k8s:listMapKey=name",
                        "+k8s:maxItems=2",
                    ]),
                    FieldDef::new("Labels", ty("map[string]string")).with_tags([
                        "+k8s:maxProperties=1",
                        "+k8s:eachKey=+k8s:format=k8s-short-name",
                    ]),
                    FieldDef::new("Alias", ty("ShortName")),
                ],
            ),
        ])
    }

    fn run(schema: &CompiledSchema, new: Value, old: Option<Value>) -> ErrorList {
        let gates = FeatureGateSnapshot::new();
        validate(schema, "Widget", &new, old.as_ref(), &gates).unwrap()
    }

    #[test]
    fn valid_object_has_no_errors() {
        let schema = widget_schema();
        assert!(run(&schema, json!({"name": "w"}), None).is_empty());
    }

    #[test]
    fn required_field_missing_or_zero() {
        let schema = widget_schema();
        for obj in [json!({}), json!({"name": ""})] {
            let errors = run(&schema, obj, None);
            assert_eq!(summary(&errors), vec![("name".to_string(), ErrorKind::Required)]);
            assert_eq!(errors.as_slice()[0].origin(), "required");
        }
    }

    #[test]
    fn additive_rules_after_presence() {
        let schema = widget_schema();
        let errors = run(&schema, json!({"name": "far-too-long"}), None);
        assert_eq!(summary(&errors), vec![("name".to_string(), ErrorKind::TooLong)]);
    }

    #[test]
    fn immutable_field_on_update() {
        let schema = widget_schema();
        let old = json!({"name": "w", "owner": "a"});

        let errors = run(&schema, json!({"name": "w", "owner": "b"}), Some(old.clone()));
        assert_eq!(summary(&errors), vec![("owner".to_string(), ErrorKind::Forbidden)]);
        assert_eq!(errors.as_slice()[0].origin(), "immutable");

        assert!(run(&schema, old.clone(), Some(old.clone())).is_empty());

        let cleared = run(&schema, json!({"name": "w"}), Some(old));
        assert_eq!(summary(&cleared), vec![("owner".to_string(), ErrorKind::Forbidden)]);
    }

    #[test]
    fn immutable_is_not_checked_on_create() {
        let schema = widget_schema();
        assert!(run(&schema, json!({"name": "w", "owner": "b"}), None).is_empty());
    }

    #[test]
    fn set_list_duplicates_and_element_rules() {
        let schema = widget_schema();
        let errors = run(&schema, json!({"name": "w", "tags": ["ab", "ab", "toolong"]}), None);
        assert_eq!(
            summary(&errors),
            vec![
                ("tags[1]".to_string(), ErrorKind::Duplicate),
                ("tags[2]".to_string(), ErrorKind::TooLong),
            ]
        );
    }

    #[test]
    fn map_list_limits_and_keyed_paths() {
        let schema = widget_schema();
        let obj = json!({
            "name": "w",
            "items": [
                {"name": "a", "count": 1},
                {"name": "b", "count": -1},
                {"name": "c"},
            ]
        });
        let errors = run(&schema, obj, None);
        assert_eq!(
            summary(&errors),
            vec![
                ("items".to_string(), ErrorKind::TooMany),
                ("items[name=b].count".to_string(), ErrorKind::Invalid),
            ]
        );
        assert_eq!(errors.as_slice()[0].origin(), "maxItems");
    }

    #[test]
    fn unchanged_list_elements_are_ratcheted() {
        let schema = widget_schema();
        let old = json!({"name": "w", "items": [{"name": "a", "count": -1}]});
        let new = json!({"name": "w", "items": [{"name": "b", "count": 1}, {"name": "a", "count": -1}]});
        assert!(run(&schema, new, Some(old)).is_empty());

        let old = json!({"name": "w", "items": [{"name": "a", "count": 1}]});
        let new = json!({"name": "w", "items": [{"name": "a", "count": -1}]});
        let errors = run(&schema, new, Some(old));
        assert_eq!(summary(&errors), vec![("items[name=a].count".to_string(), ErrorKind::Invalid)]);
    }

    #[test]
    fn map_keys_and_properties() {
        let schema = widget_schema();
        let obj = json!({"name": "w", "labels": {"Bad_Key": "v", "ok": "v"}});
        let errors = run(&schema, obj.clone(), None);
        assert_eq!(
            summary(&errors),
            vec![
                ("labels".to_string(), ErrorKind::TooMany),
                ("labels[Bad_Key]".to_string(), ErrorKind::Invalid),
            ]
        );
        assert_eq!(errors.as_slice()[1].origin(), "format=k8s-short-name");
        assert!(run(&schema, obj.clone(), Some(obj)).is_empty());
    }

    #[test]
    fn type_level_rules_follow_alias() {
        let schema = widget_schema();
        let errors = run(&schema, json!({"name": "w", "alias": "abcd"}), None);
        assert_eq!(summary(&errors), vec![("alias".to_string(), ErrorKind::TooLong)]);
    }

    #[test]
    fn shape_mismatch_yields_one_invalid() {
        let schema = widget_schema();
        let errors = run(&schema, json!({"name": 5, "tags": "x"}), None);
        assert_eq!(
            summary(&errors),
            vec![
                ("name".to_string(), ErrorKind::Invalid),
                ("tags".to_string(), ErrorKind::Invalid),
            ]
        );
        assert_eq!(errors.as_slice()[0].origin(), "maxLength");
        assert_eq!(errors.as_slice()[1].origin(), "type");
    }

    #[test]
    fn unknown_type_is_an_error() {
        let schema = widget_schema();
        assert!(schema.validator("Missing").is_none());
        assert_eq!(schema.validator("Widget").unwrap().type_name(), "Widget");
        let gates = FeatureGateSnapshot::new();
        let err = validate(&schema, "Missing", &json!({}), None, &gates).unwrap_err();
        assert_eq!(err, ExecError::UnknownType("Missing".into()));
    }

    fn mode_schema() -> CompiledSchema {
        compile(vec![
            TypeDef::alias("Mode", ty("string"))
                .with_tags(["+k8s:enum"])
                .with_constants(vec![
                    ConstDef::new("ModeA", "A").with_tags(["+k8s:ifEnabled(FeatureA)=+k8s:enumExclude"]),
                    ConstDef::new("ModeB", "B").with_tags(["+k8s:ifDisabled(FeatureB)=+k8s:enumExclude"]),
                    ConstDef::new("ModeC", "C"),
                ]),
            TypeDef::structure(
                "Config",
                vec![
                    FieldDef::new("Mode", ty("Mode")),
                    FieldDef::new("Extra", ty("*string"))
                        .with_tags(["+k8s:ifEnabled(FeatureA)=+k8s:required"]),
                ],
            ),
        ])
    }

    #[test]
    fn enum_members_follow_gates() {
        let schema = mode_schema();
        let none = FeatureGateSnapshot::new();
        let errors = validate(&schema, "Config", &json!({"mode": "B"}), None, &none).unwrap();
        assert_eq!(summary(&errors), vec![("mode".to_string(), ErrorKind::NotSupported)]);
        assert_eq!(errors.as_slice()[0].detail(), r#"supported values: "A", "C""#);

        let b_only = FeatureGateSnapshot::new().with("FeatureB", true);
        assert!(validate(&schema, "Config", &json!({"mode": "B"}), None, &b_only)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn conditional_required() {
        let schema = mode_schema();
        let on = FeatureGateSnapshot::new().with("FeatureA", true);
        let off = FeatureGateSnapshot::new();
        let obj = json!({"mode": "C"});
        assert!(validate(&schema, "Config", &obj, None, &off).unwrap().is_empty());
        let errors = validate(&schema, "Config", &obj, None, &on).unwrap();
        assert_eq!(summary(&errors), vec![("extra".to_string(), ErrorKind::Required)]);
    }

    #[test]
    fn native_fields_mark_errors() {
        let schema = compile(vec![TypeDef::structure(
            "Widget",
            vec![
                FieldDef::new("Native", ty("string"))
                    .with_tags(["+k8s:declarativeValidationNative", "+k8s:maxLength=2"]),
                FieldDef::new("Plain", ty("string")).with_tags(["+k8s:maxLength=2"]),
            ],
        )]);
        let errors = run(&schema, json!({"native": "abc", "plain": "abc"}), None);
        let flags: Vec<bool> = errors.iter().map(|e| e.is_declarative_native()).collect();
        assert_eq!(flags, vec![true, false]);
    }

    #[test]
    fn item_and_subfield() {
        let schema = compile(vec![
            TypeDef::structure(
                "Entry",
                vec![FieldDef::new("Name", ty("string")), FieldDef::new("Count", ty("int"))],
            ),
            TypeDef::structure(
                "Widget",
                vec![FieldDef::new("Entries", ty("[]Entry")).with_tags([
                    "+k8s:listType=map",
                    "+k8s:listMapKey=name",
                    r#"+k8s:item(name: "a")=+k8s:subfield(count)=+k8s:minimum=1"#,
                ])],
            ),
        ]);
        let errors = run(&schema, json!({"entries": [{"name": "b", "count": -1}, {"name": "a", "count": -1}]}), None);
        assert_eq!(summary(&errors), vec![("entries[name=a].count".to_string(), ErrorKind::Invalid)]);
        assert!(run(&schema, json!({"entries": [{"name": "b", "count": -1}]}), None).is_empty());
    }

    #[test]
    fn discriminated_union_in_struct() {
        let schema = compile(vec![TypeDef::structure(
            "Widget",
            vec![
                FieldDef::new("Type", ty("string")).with_tags(["+k8s:unionDiscriminator"]),
                FieldDef::new("Git", ty("*string")).with_tags(["+k8s:unionMember"]),
                FieldDef::new("Image", ty("*string")).with_tags(["+k8s:unionMember"]),
            ],
        )]);
        let missing = run(&schema, json!({"type": "Git"}), None);
        assert_eq!(summary(&missing), vec![("git".to_string(), ErrorKind::Required)]);
        let extra = run(&schema, json!({"type": "Git", "git": "x", "image": "y"}), None);
        assert_eq!(summary(&extra), vec![("image".to_string(), ErrorKind::Forbidden)]);
        assert!(run(&schema, json!({"type": "Image", "image": "y"}), None).is_empty());
    }

    #[test]
    fn discriminated_union_reports_missing_and_extra_members() {
        let schema = compile(vec![TypeDef::structure(
            "Widget",
            vec![
                FieldDef::new("Type", ty("string")).with_tags(["+k8s:unionDiscriminator"]),
                FieldDef::new("Git", ty("*string")).with_tags(["+k8s:unionMember"]),
                FieldDef::new("Image", ty("*string")).with_tags(["+k8s:unionMember"]),
            ],
        )]);
        let errors = run(&schema, json!({"type": "Git", "image": "y"}), None);
        assert_eq!(
            summary(&errors),
            vec![
                ("git".to_string(), ErrorKind::Required),
                ("image".to_string(), ErrorKind::Forbidden),
            ]
        );
    }

    #[test]
    fn integer_map_keys_are_checked_as_numbers() {
        let schema = compile(vec![TypeDef::structure(
            "Widget",
            vec![FieldDef::new("Counts", ty("map[int32]string"))
                .with_tags(["+k8s:eachKey=+k8s:minimum=1"])],
        )]);
        assert!(run(&schema, json!({"counts": {"5": "a"}}), None).is_empty());

        let low = run(&schema, json!({"counts": {"0": "a", "7": "b"}}), None);
        assert_eq!(summary(&low), vec![("counts[0]".to_string(), ErrorKind::Invalid)]);
        assert_eq!(low.as_slice()[0].bad_value(), Some(&json!(0)));
        assert_eq!(low.as_slice()[0].origin(), "minimum");

        let unparsable = run(&schema, json!({"counts": {"five": "a"}}), None);
        assert_eq!(summary(&unparsable), vec![("counts[five]".to_string(), ErrorKind::Invalid)]);
    }

    #[test]
    fn struct_added_on_update_is_validated_like_create() {
        let schema = compile(vec![
            TypeDef::structure(
                "Inner",
                vec![FieldDef::new("Name", ty("string")).with_tags(["+k8s:required"])],
            ),
            TypeDef::structure(
                "Widget",
                vec![FieldDef::new("Inner", ty("*Inner")).with_tags(["+k8s:optional"])],
            ),
        ]);
        let new = json!({"inner": {}});
        let expected = vec![("inner.name".to_string(), ErrorKind::Required)];
        assert_eq!(summary(&run(&schema, new.clone(), None)), expected);
        assert_eq!(summary(&run(&schema, new.clone(), Some(json!({})))), expected);
        assert_eq!(summary(&run(&schema, new, Some(json!({"inner": null})))), expected);
    }

    #[test]
    fn opaque_fields_are_not_descended() {
        let defs = |tags: &[&str]| {
            vec![
                TypeDef::structure(
                    "Inner",
                    vec![FieldDef::new("Count", ty("int")).with_tags(["+k8s:minimum=0"])],
                ),
                TypeDef::structure(
                    "Widget",
                    vec![FieldDef::new("Inner", ty("Inner")).with_tags(tags.iter().copied())],
                ),
            ]
        };
        let obj = json!({"inner": {"count": -1}});
        let plain = compile(defs(&[]));
        assert_eq!(
            summary(&run(&plain, obj.clone(), None)),
            vec![("inner.count".to_string(), ErrorKind::Invalid)]
        );
        let opaque = compile(defs(&["+k8s:opaqueType"]));
        assert!(run(&opaque, obj, None).is_empty());
    }
}
