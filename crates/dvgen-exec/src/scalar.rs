//! Value checks that look at a single value and need no descent.

use serde_json::Value;

use dvgen_core::{FieldPath, ValidationError};
use dvgen_rules::Format;

use crate::format;
use crate::value::loosely_equal;

pub(crate) fn minimum(
    path: &FieldPath,
    value: &Value,
    min: i64,
    origin: &str,
) -> Option<ValidationError> {
    let below = match (value.as_i64(), value.as_u64(), value.as_f64()) {
        (Some(v), _, _) => v < min,
        (None, Some(_), _) => false,
        (None, None, Some(v)) => v < min as f64,
        _ => false,
    };
    below.then(|| {
        ValidationError::invalid(
            path.clone(),
            value.clone(),
            format!("must be greater than or equal to {min}"),
            origin,
        )
    })
}

/// Length is measured in bytes.
pub(crate) fn max_length(
    path: &FieldPath,
    value: &Value,
    max: usize,
    origin: &str,
) -> Option<ValidationError> {
    let len = value.as_str()?.len();
    (len > max).then(|| ValidationError::too_long(path.clone(), len, max, origin))
}

pub(crate) fn max_entries(
    path: &FieldPath,
    len: Option<usize>,
    max: usize,
    origin: &str,
) -> Option<ValidationError> {
    let len = len?;
    (len > max).then(|| ValidationError::too_many(path.clone(), len, max, origin))
}

pub(crate) fn string_format(
    path: &FieldPath,
    value: &Value,
    format: Format,
    origin: &str,
) -> Option<ValidationError> {
    let messages = format::check(format, value.as_str()?);
    if messages.is_empty() {
        return None;
    }
    Some(ValidationError::invalid(
        path.clone(),
        value.clone(),
        messages.join("; "),
        origin,
    ))
}

pub(crate) fn neq(
    path: &FieldPath,
    value: &Value,
    disallowed: &Value,
    origin: &str,
) -> Option<ValidationError> {
    loosely_equal(value, disallowed).then(|| {
        ValidationError::invalid(
            path.clone(),
            value.clone(),
            format!("must not be equal to {disallowed}"),
            origin,
        )
    })
}

/// `allowed` is the member list after gate-dependent exclusions.
pub(crate) fn enumeration(
    path: &FieldPath,
    value: &Value,
    allowed: &[&str],
    origin: &str,
) -> Option<ValidationError> {
    let text = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    if allowed.contains(&text.as_str()) {
        return None;
    }
    Some(ValidationError::not_supported(
        path.clone(),
        value.clone(),
        allowed,
        origin,
    ))
}
