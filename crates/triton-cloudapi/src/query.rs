//! Request path and query string composition.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::error::{Error, Result};

/// URL-encodes one path segment.
#[must_use]
pub fn encode_segment(segment: &str) -> String {
    url::form_urlencoded::byte_serialize(segment.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

/// Builds `/<account>/<segments...>` with every segment encoded.
#[must_use]
pub fn resource_path(account: &str, segments: &[&str]) -> String {
    let mut path = format!("/{}", encode_segment(account));
    for segment in segments {
        path.push('/');
        path.push_str(&encode_segment(segment));
    }
    path
}

/// Query parameters with deterministic ordering.
///
/// Built from option records or JSON objects; null values are dropped,
/// arrays are comma-joined, scalars use their JSON text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(BTreeMap<String, String>);

impl QueryParams {
    /// Empty parameter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Converts a serializable option record.
    ///
    /// # Errors
    ///
    /// Returns a `Usage` error if the record does not serialize to a JSON
    /// object.
    pub fn from_options<T: Serialize>(options: &T) -> Result<Self> {
        let value = serde_json::to_value(options)
            .map_err(|e| Error::internal(format!("cannot serialize query options: {e}")))?;
        match value {
            Value::Object(_) | Value::Null => Ok(Self::from_value(&value)),
            other => Err(Error::usage(format!(
                "query options must be an object, got {other}"
            ))),
        }
    }

    /// Converts a JSON object, dropping null members.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let mut params = Self::new();
        if let Value::Object(map) = value {
            for (key, v) in map {
                if let Some(s) = scalar_text(v) {
                    params.0.insert(key.clone(), s);
                }
            }
        }
        params
    }

    /// Adds a parameter, replacing any previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Adds a parameter if `value` is present.
    pub fn insert_opt(&mut self, key: impl Into<String>, value: Option<impl ToString>) -> &mut Self {
        if let Some(value) = value {
            self.0.insert(key.into(), value.to_string());
        }
        self
    }

    /// Merges `other` into `self`, `other` winning on conflicts.
    pub fn extend(&mut self, other: Self) -> &mut Self {
        self.0.extend(other.0);
        self
    }

    /// Value for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// True if no parameters are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterates parameters in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// `application/x-www-form-urlencoded` query string (no leading `?`).
    #[must_use]
    pub fn to_query_string(&self) -> String {
        let mut ser = url::form_urlencoded::Serializer::new(String::new());
        for (k, v) in &self.0 {
            ser.append_pair(k, v);
        }
        ser.finish()
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(scalar_text)
                .collect::<Vec<_>>()
                .join(","),
        ),
        Value::Object(_) => Some(value.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[derive(Serialize)]
    struct Opts {
        name: Option<String>,
        limit: Option<u32>,
        public: Option<bool>,
    }

    #[test]
    fn test_encode_segment() {
        assert_eq!(encode_segment("my vm"), "my%20vm");
        assert_eq!(encode_segment("a/b"), "a%2Fb");
        assert_eq!(encode_segment("base-64"), "base-64");
        assert_eq!(
            resource_path("alice", &["machines", "x y", "tags"]),
            "/alice/machines/x%20y/tags"
        );
    }

    #[test]
    fn test_from_options_drops_absent() {
        let q = QueryParams::from_options(&Opts {
            name: Some("web".to_string()),
            limit: None,
            public: Some(false),
        })
        .expect("object");
        assert_eq!(q.len(), 2);
        assert_eq!(q.get("name"), Some("web"));
        assert_eq!(q.get("public"), Some("false"));
        assert_eq!(q.get("limit"), None);
        assert_eq!(q.to_query_string(), "name=web&public=false");
    }

    #[test]
    fn test_arrays_and_objects() {
        let q = QueryParams::from_value(&json!({"ids": ["a", "b"], "o": {"k": 1}}));
        assert_eq!(q.get("ids"), Some("a,b"));
        assert_eq!(q.get("o"), Some("{\"k\":1}"));
    }

    #[test]
    fn test_non_object_options_rejected() {
        assert!(QueryParams::from_options(&vec![1, 2]).is_err());
        assert!(QueryParams::from_options(&()).expect("null").is_empty());
    }

    proptest! {
        #[test]
        fn prop_query_keeps_exactly_present_keys(
            entries in proptest::collection::btree_map("[a-z]{1,8}", proptest::option::of("[a-zA-Z0-9]{0,8}"), 0..12)
        ) {
            let obj: serde_json::Map<String, Value> = entries
                .iter()
                .map(|(k, v)| (k.clone(), v.clone().map_or(Value::Null, Value::String)))
                .collect();
            let q = QueryParams::from_value(&Value::Object(obj));
            for (k, v) in &entries {
                prop_assert_eq!(q.get(k), v.as_deref());
            }
            prop_assert_eq!(q.len(), entries.values().filter(|v| v.is_some()).count());
        }
    }
}
