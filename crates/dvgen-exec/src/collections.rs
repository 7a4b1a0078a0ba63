//! # List Identity
//!
//! How list elements are addressed, matched against the previous object,
//! and checked for uniqueness.
//!
//! - `atomic` lists address elements by index and have no counterpart on
//!   update.
//! - `set` lists address elements by index; the counterpart of an element
//!   is an equal element of the old list.
//! - `map` lists address elements by their identity key
//!   (`items[name=a]`); the counterpart shares every key value.

use serde_json::Value;

use dvgen_core::{FieldPath, ValidationError};
use dvgen_rules::{render_identity, ElementIdentity, ListSemantics};

use crate::value::NULL;

/// Identity-key rendering of a map-list element, or `None` when the
/// element is not an object.
pub(crate) fn identity_key(item: &Value, keys: &[String]) -> Option<String> {
    item.as_object()?;
    Some(render_identity(
        keys.iter()
            .map(|k| (k.as_str(), item.get(k).unwrap_or(&NULL))),
    ))
}

/// Path of the element at `index`.
pub(crate) fn element_path(
    list: &FieldPath,
    index: usize,
    item: &Value,
    semantics: &ListSemantics,
) -> FieldPath {
    if semantics.identity() == ElementIdentity::Keys {
        if let Some(key) = identity_key(item, &semantics.keys) {
            return list.key(key);
        }
    }
    list.index(index)
}

fn same_keys(a: &Value, b: &Value, keys: &[String]) -> bool {
    keys.iter()
        .all(|k| a.get(k).unwrap_or(&NULL) == b.get(k).unwrap_or(&NULL))
}

/// The element of the old list that `item` is compared with on update.
pub(crate) fn counterpart<'v>(
    item: &Value,
    old: Option<&'v [Value]>,
    semantics: &ListSemantics,
) -> Option<&'v Value> {
    let old = old?;
    match semantics.identity() {
        ElementIdentity::Positional => None,
        ElementIdentity::Value => old.iter().find(|o| *o == item),
        ElementIdentity::Keys => old.iter().find(|o| same_keys(o, item, &semantics.keys)),
    }
}

/// Duplicate errors for a list with set or map identity. Every element
/// equal (set) or key-equal (map) to an earlier one is reported once.
pub(crate) fn duplicates(
    list: &FieldPath,
    items: &[Value],
    semantics: &ListSemantics,
) -> Vec<ValidationError> {
    let mut errs = Vec::new();
    let identity = semantics.identity();
    for (i, item) in items.iter().enumerate() {
        let earlier = &items[..i];
        let repeated = match identity {
            ElementIdentity::Positional => false,
            ElementIdentity::Value => earlier.contains(item),
            ElementIdentity::Keys => earlier
                .iter()
                .any(|e| e.is_object() && item.is_object() && same_keys(e, item, &semantics.keys)),
        };
        if repeated {
            errs.push(ValidationError::duplicate(
                element_path(list, i, item, semantics),
                item.clone(),
                semantics.origin(),
            ));
        }
    }
    errs
}

#[cfg(test)]
mod tests {
    use super::*;
    use dvgen_rules::{ListType, UniqueMode};
    use serde_json::json;

    fn map_list() -> ListSemantics {
        ListSemantics {
            list_type: ListType::Map,
            keys: vec!["name".into()],
            ..ListSemantics::default()
        }
    }

    fn set_list() -> ListSemantics {
        ListSemantics {
            list_type: ListType::Set,
            ..ListSemantics::default()
        }
    }

    #[test]
    fn map_elements_are_addressed_by_key() {
        let path = FieldPath::new("items");
        let item = json!({"name": "a", "value": 1});
        assert_eq!(element_path(&path, 3, &item, &map_list()).to_string(), "items[name=a]");
        assert_eq!(element_path(&path, 3, &item, &set_list()).to_string(), "items[3]");
        assert_eq!(element_path(&path, 3, &json!("x"), &map_list()).to_string(), "items[3]");
    }

    #[test]
    fn set_duplicates_reported_at_later_index() {
        let items = vec![json!("a"), json!("b"), json!("a"), json!("a")];
        let errs = duplicates(&FieldPath::new("tags"), &items, &set_list());
        let paths: Vec<_> = errs.iter().map(|e| e.path().to_string()).collect();
        assert_eq!(paths, vec!["tags[2]", "tags[3]"]);
        assert_eq!(errs[0].origin(), "listType=set");
    }

    #[test]
    fn map_duplicates_compare_keys_only() {
        let items = vec![json!({"name": "a", "v": 1}), json!({"name": "a", "v": 2})];
        let errs = duplicates(&FieldPath::new("items"), &items, &map_list());
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].path().to_string(), "items[name=a]");
    }

    #[test]
    fn unique_map_without_list_type() {
        let semantics = ListSemantics {
            unique: Some(UniqueMode::Map),
            keys: vec!["name".into()],
            ..ListSemantics::default()
        };
        let items = vec![json!({"name": "x"}), json!({"name": "x"})];
        let errs = duplicates(&FieldPath::new("items"), &items, &semantics);
        assert_eq!(errs[0].origin(), "unique=map");
    }

    #[test]
    fn counterparts_follow_identity() {
        let old = vec![json!({"name": "a", "v": 1}), json!({"name": "b", "v": 2})];
        let new_item = json!({"name": "b", "v": 3});
        let found = counterpart(&new_item, Some(old.as_slice()), &map_list());
        assert_eq!(found, Some(&old[1]));
        assert_eq!(counterpart(&new_item, Some(old.as_slice()), &set_list()), None);
        assert_eq!(counterpart(&new_item, Some(old.as_slice()), &ListSemantics::default()), None);
        assert_eq!(counterpart(&new_item, None, &map_list()), None);
    }
}
