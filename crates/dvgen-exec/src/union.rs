//! # Unions
//!
//! Struct-level checks over union and zero-or-one-of groups. A group is
//! skipped on update when none of its fields changed. Each violation
//! category yields one error; a discriminated union can report a missing
//! chosen member together with the extra members that are set.

use serde_json::Value;

use dvgen_core::{FieldPath, ValidationError};
use dvgen_rules::{UnionMemberSpec, UnionSpec};

use crate::value::{is_present, NULL};

fn member_is_set(member: &UnionMemberSpec, object: &Value) -> bool {
    let value = object.get(&member.field);
    match &member.selector {
        Some(selector) => value
            .and_then(Value::as_array)
            .is_some_and(|items| items.iter().any(|item| selector.matches(item))),
        None => is_present(value),
    }
}

fn member_path(object: &FieldPath, member: &UnionMemberSpec) -> FieldPath {
    let field = object.child(&member.field);
    match &member.selector {
        Some(selector) => field.key(selector.identity()),
        None => field,
    }
}

fn unchanged(group: &UnionSpec, object: &Value, old: Option<&Value>) -> bool {
    let Some(old) = old else {
        return false;
    };
    let same = |field: &str| object.get(field).unwrap_or(&NULL) == old.get(field).unwrap_or(&NULL);
    group.members.iter().all(|m| same(&m.field))
        && group.discriminator.as_deref().map_or(true, same)
}

fn names(members: &[&UnionMemberSpec]) -> String {
    members
        .iter()
        .map(|m| format!("`{}`", m.name))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Check one union of a struct value at `path`.
///
/// A discriminated union can report both a missing chosen member and the
/// extra members that are set; every other violation is a single error.
pub(crate) fn check_union(
    path: &FieldPath,
    union: &UnionSpec,
    object: &Value,
    old: Option<&Value>,
) -> Vec<ValidationError> {
    if unchanged(union, object, old) {
        tracing::trace!(path = %path, union = %union.name, "union unchanged");
        return Vec::new();
    }
    let set: Vec<&UnionMemberSpec> = union
        .members
        .iter()
        .filter(|m| member_is_set(m, object))
        .collect();

    let Some(disc) = &union.discriminator else {
        let all: Vec<&UnionMemberSpec> = union.members.iter().collect();
        return match set.len() {
            1 => Vec::new(),
            0 => vec![ValidationError::invalid(
                path.clone(),
                Value::Null,
                format!("must specify one of: {}", names(&all)),
                "union",
            )],
            _ => vec![ValidationError::invalid(
                path.clone(),
                Value::from(set.iter().map(|m| m.name.clone()).collect::<Vec<_>>()),
                format!("must specify exactly one of: {}", names(&all)),
                "union",
            )],
        };
    };

    let disc_value = object.get(disc).unwrap_or(&NULL);
    let chosen = disc_value
        .as_str()
        .and_then(|name| union.members.iter().find(|m| m.name == name));
    match chosen {
        Some(member) => {
            let mut errors = Vec::new();
            if !member_is_set(member, object) {
                errors.push(
                    ValidationError::required(member_path(path, member), "union").with_detail(
                        format!("must be specified when `{disc}` is \"{}\"", member.name),
                    ),
                );
            }
            let extras: Vec<&UnionMemberSpec> =
                set.into_iter().filter(|m| m.name != member.name).collect();
            if let Some(first) = extras.first() {
                errors.push(ValidationError::forbidden(
                    member_path(path, first),
                    format!(
                        "may not be specified when `{disc}` is \"{}\" (also set: {})",
                        member.name,
                        names(&extras)
                    ),
                    "union",
                ));
            }
            errors
        }
        None if set.is_empty() && disc_value.is_null() => Vec::new(),
        None => {
            let all: Vec<&UnionMemberSpec> = union.members.iter().collect();
            vec![ValidationError::invalid(
                path.child(disc),
                disc_value.clone(),
                format!("must be one of: {}", names(&all)),
                "union",
            )]
        }
    }
}

/// Check one zero-or-one-of group of a struct value at `path`.
pub(crate) fn check_zero_or_one(
    path: &FieldPath,
    group: &UnionSpec,
    object: &Value,
    old: Option<&Value>,
) -> Option<ValidationError> {
    if unchanged(group, object, old) {
        return None;
    }
    let set: Vec<&UnionMemberSpec> = group
        .members
        .iter()
        .filter(|m| member_is_set(m, object))
        .collect();
    if set.len() <= 1 {
        return None;
    }
    let all: Vec<&UnionMemberSpec> = group.members.iter().collect();
    Some(ValidationError::invalid(
        path.clone(),
        Value::from(set.iter().map(|m| m.name.clone()).collect::<Vec<_>>()),
        format!("must specify at most one of: {}", names(&all)),
        "zeroOrOneOf",
    ))
}
