//! Ordered, typed field extraction over a generic JSON tree.
//!
//! Untrusted records are first decoded into a [`serde_json::Value`] and then
//! checked field by field. Deserializing straight into a strict struct would
//! merge "missing", "wrong type", and "unknown field" into one error, and
//! each of those has its own error code.

use serde_json::{Map, Value};

pub(crate) type Object = Map<String, Value>;

/// Decode `bytes` as a JSON object.
pub(crate) fn parse_object<E>(bytes: &[u8], not_well_formed: impl FnOnce(String) -> E) -> Result<Object, E> {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(not_well_formed(format!("expected an object, found {}", type_name(&other)))),
        Err(e) => Err(not_well_formed(e.to_string())),
    }
}

/// Fail on the first key (in key order) that is not in `allowed`.
pub(crate) fn reject_unknown<E>(
    object: &Object,
    allowed: &[&str],
    unknown: impl FnOnce(String) -> E,
) -> Result<(), E> {
    match object.keys().find(|k| !allowed.contains(&k.as_str())) {
        Some(key) => Err(unknown(key.clone())),
        None => Ok(()),
    }
}

pub(crate) fn required_str<'a, E>(object: &'a Object, key: &str, missing: E, not_string: E) -> Result<&'a str, E> {
    match object.get(key) {
        None => Err(missing),
        Some(Value::String(s)) => Ok(s.as_str()),
        Some(_) => Err(not_string),
    }
}

pub(crate) fn required_array<'a, E>(object: &'a Object, key: &str, missing: E, not_array: E) -> Result<&'a [Value], E> {
    match object.get(key) {
        None => Err(missing),
        Some(Value::Array(items)) => Ok(items.as_slice()),
        Some(_) => Err(not_array),
    }
}

pub(crate) fn required_object<'a, E>(object: &'a Object, key: &str, missing: E, not_object: E) -> Result<&'a Object, E> {
    match object.get(key) {
        None => Err(missing),
        Some(Value::Object(map)) => Ok(map),
        Some(_) => Err(not_object),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
