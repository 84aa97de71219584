//! Accessors for JSON trees.
//!
//! XML documents are handed over in the `@attr` / `#text` convention: an
//! element with attributes or mixed content becomes an object holding its
//! attributes under `@name` and its text under `#text`; an element repeated
//! under the same parent becomes an array. These helpers read such trees
//! without caring which shape a given element ended up in.

use serde_json::Value;

/// Follows a path of object keys.
pub fn path<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().try_fold(value, |current, key| current.get(*key))
}

/// Items of a value that may be a single item or an array. Null is empty.
pub fn as_list(value: Option<&Value>) -> Vec<&Value> {
    match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.iter().collect(),
        Some(item) => vec![item],
    }
}

/// Text content of an element: a string, a number, or the `#text` entry of
/// an object. Blank text is `None`.
pub fn text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Object(map) => return map.get("#text").and_then(text),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// Attribute of an element (`@name`).
pub fn attr<'a>(value: &'a Value, name: &str) -> Option<&'a str> {
    value
        .get(format!("@{}", name))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Text of every item found at `keys`.
pub fn texts(value: &Value, keys: &[&str]) -> Vec<String> {
    as_list(path(value, keys))
        .into_iter()
        .filter_map(text)
        .collect()
}

/// Text of the first item found at `keys`.
pub fn first_text(value: &Value, keys: &[&str]) -> Option<String> {
    as_list(path(value, keys)).into_iter().find_map(text)
}
