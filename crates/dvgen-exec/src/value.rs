//! JSON value helpers shared by the executor: presence, shape checks and
//! comparisons.

use serde_json::Value;

use dvgen_core::ScalarKind;
use dvgen_rules::{ValuePlan, ValueShape};

/// Stand-in for a missing value.
pub(crate) static NULL: Value = Value::Null;

/// Whether a value counts as unset at a position with this plan.
///
/// Missing and `null` are always unset. Empty lists and maps are unset.
/// Zero scalars are unset unless the position is reached through a pointer.
pub(crate) fn is_unset(value: Option<&Value>, plan: &ValuePlan) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::Array(items)) => items.is_empty(),
        Some(Value::Object(map)) => map.is_empty() && matches!(plan.shape, ValueShape::Map { .. }),
        Some(_) if plan.nullable => false,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Bool(b)) => !b,
        Some(Value::Number(n)) => n.as_f64() == Some(0.0),
    }
}

/// Presence test for union members, which are pointers or collections.
pub(crate) fn is_present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(map)) => !map.is_empty(),
        Some(_) => true,
    }
}

/// A map key as a value of the key plan's scalar domain.
///
/// JSON object keys are always strings. A key that does not parse into its
/// domain stays a string, so the shape check reports it.
pub(crate) fn key_value(plan: &ValuePlan, key: &str) -> Value {
    let parsed = match &plan.shape {
        ValueShape::Scalar(ScalarKind::Int) => key.parse::<i64>().ok().map(Value::from),
        ValueShape::Scalar(ScalarKind::Uint) => key.parse::<u64>().ok().map(Value::from),
        ValueShape::Scalar(ScalarKind::Float) => key
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number),
        ValueShape::Scalar(ScalarKind::Bool) => key.parse::<bool>().ok().map(Value::Bool),
        _ => None,
    };
    parsed.unwrap_or_else(|| Value::String(key.to_string()))
}

/// Whether the runtime value fits the compiled shape.
pub(crate) fn shape_matches(plan: &ValuePlan, value: &Value) -> bool {
    match &plan.shape {
        ValueShape::Scalar(kind) => match kind {
            ScalarKind::String => value.is_string(),
            ScalarKind::Int => value.is_i64() || value.is_u64(),
            ScalarKind::Uint => value.is_u64(),
            ScalarKind::Float => value.is_number(),
            ScalarKind::Bool => value.is_boolean(),
        },
        ValueShape::Slice(_) => value.is_array(),
        ValueShape::Map { .. } | ValueShape::Struct(_) => value.is_object(),
    }
}

/// Human description of the expected shape, for mismatch details.
pub(crate) fn expected(plan: &ValuePlan) -> String {
    match &plan.shape {
        ValueShape::Scalar(kind) => match kind {
            ScalarKind::String => "a string".to_string(),
            ScalarKind::Int => "an integer".to_string(),
            ScalarKind::Uint => "a non-negative integer".to_string(),
            ScalarKind::Float => "a number".to_string(),
            ScalarKind::Bool => "a boolean".to_string(),
        },
        ValueShape::Slice(_) => "a list".to_string(),
        ValueShape::Map { .. } => "a map".to_string(),
        ValueShape::Struct(name) => format!("an object of type {name}"),
    }
}

/// Equality with numbers compared by value, so `1` equals `1.0`.
pub(crate) fn loosely_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => x == y,
            _ => x.as_f64() == y.as_f64(),
        },
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn scalar(kind: ScalarKind, nullable: bool) -> ValuePlan {
        ValuePlan {
            shape: ValueShape::Scalar(kind),
            nullable,
            named: Vec::new(),
            list: None,
        }
    }

    #[test]
    fn zero_values_are_unset_unless_nullable() {
        let plain = scalar(ScalarKind::String, false);
        let pointer = scalar(ScalarKind::String, true);
        assert!(is_unset(Some(&json!("")), &plain));
        assert!(!is_unset(Some(&json!("")), &pointer));
        assert!(is_unset(None, &pointer));
        assert!(is_unset(Some(&Value::Null), &pointer));

        let int = scalar(ScalarKind::Int, false);
        assert!(is_unset(Some(&json!(0)), &int));
        assert!(!is_unset(Some(&json!(-1)), &int));
    }

    #[test]
    fn empty_collections_are_unset() {
        let list = ValuePlan {
            shape: ValueShape::Slice(Box::new(scalar(ScalarKind::String, false))),
            nullable: false,
            named: Vec::new(),
            list: None,
        };
        assert!(is_unset(Some(&json!([])), &list));
        assert!(!is_unset(Some(&json!(["a"])), &list));

        let strukt = ValuePlan {
            shape: ValueShape::Struct("S".into()),
            nullable: false,
            named: vec!["S".into()],
            list: None,
        };
        assert!(!is_unset(Some(&json!({})), &strukt));
    }

    #[test]
    fn integer_shape_rejects_fractions() {
        let int = scalar(ScalarKind::Int, false);
        assert!(shape_matches(&int, &json!(-3)));
        assert!(!shape_matches(&int, &json!(1.5)));
        assert!(!shape_matches(&int, &json!("1")));
        assert!(!shape_matches(&scalar(ScalarKind::Uint, false), &json!(-1)));
    }

    #[test]
    fn loose_equality_compares_numbers_by_value() {
        assert!(loosely_equal(&json!(1), &json!(1.0)));
        assert!(!loosely_equal(&json!(1), &json!("1")));
        assert!(loosely_equal(&json!("a"), &json!("a")));
    }

    #[test]
    fn map_keys_take_the_key_domain() {
        let int = scalar(ScalarKind::Int, false);
        assert_eq!(key_value(&int, "5"), json!(5));
        assert_eq!(key_value(&int, "-3"), json!(-3));
        assert_eq!(key_value(&int, "five"), json!("five"));

        let uint = scalar(ScalarKind::Uint, false);
        assert_eq!(key_value(&uint, "-3"), json!("-3"));

        let boolean = scalar(ScalarKind::Bool, false);
        assert_eq!(key_value(&boolean, "true"), json!(true));

        let string = scalar(ScalarKind::String, false);
        assert_eq!(key_value(&string, "5"), json!("5"));
    }
}
