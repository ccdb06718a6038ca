//! The bound data context and dotted-path lookup.
//!
//! A [`Context`] is an ordered mapping from lower-cased keys to JSON values.
//! Every key is trimmed and lower-cased on the way in, including the keys of
//! nested mappings, so lookups are case-insensitive at any depth:
//!
//! ```rust
//! use sleepy_template::Context;
//! use serde_json::json;
//!
//! let mut ctx = Context::new();
//! ctx.insert(" Page ", json!({"Title": "Home"}));
//!
//! assert_eq!(ctx.resolve("PAGE.title"), Some(&json!("Home")));
//! assert_eq!(ctx.resolve("page.missing"), None);
//! ```

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{RenderError, Result};

/// Normalizes a context key: trimmed and lower-cased.
pub fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase()
}

/// Recursively normalizes the keys of every mapping inside `value`.
pub fn normalize_value(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (normalize_key(&k), normalize_value(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(normalize_value).collect()),
        other => other,
    }
}

/// Resolves a dotted path against a mapping.
///
/// Segments are matched case-insensitively. A numeric segment indexes into a
/// sequence (`users.0.name`). The first segment that cannot be followed ends
/// the walk with `None`; there are no partial results.
pub fn resolve_path<'a>(map: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let path = path.trim();
    if path.is_empty() {
        return None;
    }

    let mut segments = path.split('.');
    let first = segments.next()?;
    let mut current = map.get(&normalize_key(first))?;

    for segment in segments {
        current = match current {
            Value::Object(inner) => inner.get(&normalize_key(segment))?,
            Value::Array(items) => {
                let index: usize = segment.trim().parse().ok()?;
                items.get(index)?
            }
            _ => return None,
        };
    }

    Some(current)
}

/// Formats a resolved value as final placeholder text.
///
/// Mappings and sequences are not meaningful leaf values and render empty.
pub fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => String::new(),
    }
}

/// Ordered, case-insensitive key → value mapping bound to a template.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context {
    entries: Map<String, Value>,
}

impl Context {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a context from any value that serializes to a mapping.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::ContextError`] if `data` is not a mapping.
    pub fn from_serialize<T: Serialize + ?Sized>(data: &T) -> Result<Self> {
        match serde_json::to_value(data)? {
            Value::Object(map) => Ok(Self::from_map(map)),
            other => Err(RenderError::ContextError(format!(
                "expected a mapping of placeholders, got {}",
                type_name(&other)
            ))),
        }
    }

    /// Builds a context from a JSON mapping, normalizing every key.
    pub fn from_map(map: Map<String, Value>) -> Self {
        let mut ctx = Self::new();
        for (key, value) in map {
            ctx.insert(&key, value);
        }
        ctx
    }

    /// Inserts a value, replacing any previous value under the same key.
    pub fn insert(&mut self, key: &str, value: Value) {
        self.entries.insert(normalize_key(key), normalize_value(value));
    }

    /// Merges every entry of `other` into this context. Entries of `other` win.
    pub fn extend(&mut self, other: Context) {
        for (key, value) in other.entries {
            self.entries.insert(key, value);
        }
    }

    /// Returns the top-level value bound under `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(&normalize_key(key))
    }

    /// Removes and returns the value bound under `key`.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.entries.shift_remove(&normalize_key(key))
    }

    /// Resolves a dotted path. See [`resolve_path`].
    pub fn resolve(&self, path: &str) -> Option<&Value> {
        resolve_path(&self.entries, path)
    }

    /// Returns true if `key` is bound.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(&normalize_key(key))
    }

    /// Returns the number of top-level entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is bound.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns the underlying mapping.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.entries
    }

    /// Consumes the context and returns it as a JSON object.
    pub fn into_value(self) -> Value {
        Value::Object(self.entries)
    }
}

impl From<Map<String, Value>> for Context {
    fn from(map: Map<String, Value>) -> Self {
        Self::from_map(map)
    }
}

impl IntoIterator for Context {
    type Item = (String, Value);
    type IntoIter = serde_json::map::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx(value: Value) -> Context {
        match value {
            Value::Object(map) => Context::from_map(map),
            _ => panic!("test context must be an object"),
        }
    }

    #[test]
    fn test_resolve_nested() {
        let data = ctx(json!({"a": {"b": {"c": 42}}}));
        assert_eq!(data.resolve("a.b.c"), Some(&json!(42)));
    }

    #[test]
    fn test_resolve_missing_leaf() {
        let data = ctx(json!({"a": {"b": {}}}));
        assert_eq!(data.resolve("a.b.c"), None);
    }

    #[test]
    fn test_resolve_short_circuits_on_scalar() {
        let data = ctx(json!({"a": "text"}));
        assert_eq!(data.resolve("a.b"), None);
    }

    #[test]
    fn test_resolve_returns_containers() {
        let data = ctx(json!({"a": {"list": [1, 2]}}));
        assert_eq!(data.resolve("a"), Some(&json!({"list": [1, 2]})));
        assert_eq!(data.resolve("a.list"), Some(&json!([1, 2])));
    }

    #[test]
    fn test_resolve_sequence_index() {
        let data = ctx(json!({"users": [{"name": "Ann"}, {"name": "Bo"}]}));
        assert_eq!(data.resolve("users.1.name"), Some(&json!("Bo")));
        assert_eq!(data.resolve("users.2.name"), None);
        assert_eq!(data.resolve("users.x"), None);
    }

    #[test]
    fn test_resolve_empty_path() {
        let data = ctx(json!({"": 1}));
        assert_eq!(data.resolve(""), None);
        assert_eq!(data.resolve("   "), None);
    }

    #[test]
    fn test_keys_are_case_insensitive_at_every_depth() {
        let mut data = Context::new();
        data.insert("Name", json!("Ann"));
        data.insert("Profile", json!({"EMAIL": "ann@example.com"}));

        assert_eq!(data.get("name"), Some(&json!("Ann")));
        assert_eq!(data.resolve("NAME"), Some(&json!("Ann")));
        assert_eq!(data.resolve("profile.Email"), Some(&json!("ann@example.com")));
    }

    #[test]
    fn test_later_insert_wins() {
        let mut data = Context::new();
        data.insert("title", json!("first"));
        data.insert("TITLE", json!("second"));
        assert_eq!(data.len(), 1);
        assert_eq!(data.get("title"), Some(&json!("second")));
    }

    #[test]
    fn test_insertion_order_preserved() {
        let data = ctx(json!({"z": 1, "a": 2, "m": 3}));
        let keys: Vec<&str> = data.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_from_serialize_requires_mapping() {
        #[derive(Serialize)]
        struct Page {
            title: String,
        }

        let data = Context::from_serialize(&Page {
            title: "Home".into(),
        })
        .unwrap();
        assert_eq!(data.get("title"), Some(&json!("Home")));

        let err = Context::from_serialize(&vec![1, 2]).unwrap_err();
        assert!(matches!(err, RenderError::ContextError(_)));
    }

    #[test]
    fn test_extend_and_remove() {
        let mut base = ctx(json!({"a": 1, "b": 2}));
        base.extend(ctx(json!({"B": 3, "c": 4})));
        assert_eq!(base.get("b"), Some(&json!(3)));
        assert_eq!(base.remove("A"), Some(json!(1)));
        assert!(!base.contains_key("a"));
        assert_eq!(base.len(), 2);
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(&json!("text")), "text");
        assert_eq!(format_value(&json!(42)), "42");
        assert_eq!(format_value(&json!(1.5)), "1.5");
        assert_eq!(format_value(&json!(true)), "true");
        assert_eq!(format_value(&Value::Null), "");
        assert_eq!(format_value(&json!([1])), "");
        assert_eq!(format_value(&json!({"a": 1})), "");
    }
}
