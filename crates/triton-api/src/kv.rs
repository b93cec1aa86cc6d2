//! `key=value` argument parsing and typed update validation.
//!
//! ```text
//! name=web            -> {"name": "web"}
//! count=3             -> {"count": 3}
//! tags.role=db        -> {"tags": {"role": "db"}}
//! description=@a.txt  -> {"description": "<contents of a.txt, minus one final newline>"}
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde_json::{Map, Value};
use triton_cloudapi::{Error, Result};

/// Declared JSON type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// JSON string; values are never JSON-parsed.
    String,
    /// JSON number.
    Number,
    /// JSON boolean.
    Boolean,
    /// JSON array.
    Array,
    /// JSON object.
    Object,
}

impl FieldType {
    /// True if `value` has this type. Null is never accepted.
    #[must_use]
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::Array => value.is_array(),
            Self::Object => value.is_object(),
        }
    }

    /// Lower-case type name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fields of an image that `UpdateImage` accepts.
pub const IMAGE_UPDATE_FIELDS: &[(&str, FieldType)] = &[
    ("name", FieldType::String),
    ("version", FieldType::String),
    ("description", FieldType::String),
    ("homepage", FieldType::String),
    ("eula", FieldType::String),
    ("acl", FieldType::Array),
    ("tags", FieldType::Object),
];

/// Fields of a VPC that `UpdateVpc` accepts.
pub const VPC_UPDATE_FIELDS: &[(&str, FieldType)] = &[
    ("name", FieldType::String),
    ("description", FieldType::String),
];

/// Parsing switches.
#[derive(Debug, Clone, Default)]
pub struct KvOptions {
    /// Type hints per key; `String` keys skip JSON parsing.
    pub types: BTreeMap<String, FieldType>,
    /// Reject `key=` instead of mapping it to null.
    pub fail_on_empty_value: bool,
    /// Treat `a.b` as a plain key.
    pub disable_dotted: bool,
}

impl KvOptions {
    /// Options hinting every field of `vocabulary`.
    #[must_use]
    pub fn for_vocabulary(vocabulary: &[(&str, FieldType)]) -> Self {
        Self {
            types: vocabulary
                .iter()
                .map(|(name, ty)| ((*name).to_string(), *ty))
                .collect(),
            ..Self::default()
        }
    }
}

/// Parses one `key=value` argument.
pub fn parse_kv(arg: &str, options: &KvOptions) -> Result<(String, Value)> {
    let (key, raw) = arg
        .split_once('=')
        .ok_or_else(|| Error::usage(format!("invalid key=value argument: \"{arg}\"")))?;
    if key.is_empty() {
        return Err(Error::usage(format!("missing key in \"{arg}\"")));
    }
    if raw.is_empty() {
        if options.fail_on_empty_value {
            return Err(Error::usage(format!("missing value for key \"{key}\"")));
        }
        return Ok((key.to_string(), Value::Null));
    }

    let hint = options.types.get(key).copied();
    let value = match raw.strip_prefix('@') {
        Some(file) => read_value_file(Path::new(file), hint)?,
        None => text_value(raw, hint),
    };
    if let Some(ty) = hint {
        if !ty.accepts(&value) {
            return Err(Error::usage(format!(
                "value of \"{key}\" must be of type {ty}, got {value}"
            )));
        }
    }
    Ok((key.to_string(), value))
}

/// Parses repeated `key=value` arguments into one object.
///
/// Dotted keys nest one level; later arguments win.
pub fn parse_kvs<S: AsRef<str>>(args: &[S], options: &KvOptions) -> Result<Map<String, Value>> {
    let mut out = Map::new();
    for arg in args {
        let (key, value) = parse_kv(arg.as_ref(), options)?;
        match key.split_once('.').filter(|_| !options.disable_dotted) {
            Some((outer, inner)) if !outer.is_empty() && !inner.is_empty() => {
                let slot = out
                    .entry(outer.to_string())
                    .or_insert_with(|| Value::Object(Map::new()));
                match slot {
                    Value::Object(map) => {
                        map.insert(inner.to_string(), value);
                    }
                    _ => {
                        return Err(Error::usage(format!(
                            "\"{key}\" conflicts with a non-object value for \"{outer}\""
                        )));
                    }
                }
            }
            _ => {
                out.insert(key, value);
            }
        }
    }
    Ok(out)
}

fn text_value(raw: &str, hint: Option<FieldType>) -> Value {
    if hint == Some(FieldType::String) {
        return Value::String(raw.to_string());
    }
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Drops one trailing line ending, as editors leave one after the last line.
fn strip_final_newline(content: &str) -> &str {
    content
        .strip_suffix('\n')
        .map_or(content, |c| c.strip_suffix('\r').unwrap_or(c))
}

fn read_value_file(path: &Path, hint: Option<FieldType>) -> Result<Value> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::usage(format!("cannot read \"{}\": {e}", path.display())))?;
    Ok(text_value(strip_final_newline(&content), hint))
}

/// Checks an update document against a field vocabulary.
///
/// # Errors
///
/// Returns a `Usage` error naming the first unknown field or the first
/// value of the wrong type.
pub fn validate_update(fields: &Map<String, Value>, vocabulary: &[(&str, FieldType)]) -> Result<()> {
    for (key, value) in fields {
        let Some((_, ty)) = vocabulary.iter().find(|(name, _)| name == key) else {
            let valid: Vec<&str> = vocabulary.iter().map(|(name, _)| *name).collect();
            return Err(Error::usage(format!(
                "unknown field \"{key}\" (updatable fields: {})",
                valid.join(", ")
            )));
        };
        if !ty.accepts(value) {
            return Err(Error::usage(format!(
                "field \"{key}\" must be of type {ty}, got {value}"
            )));
        }
    }
    Ok(())
}

/// Parses `key=value` update arguments and validates them.
pub fn parse_update_args<S: AsRef<str>>(
    args: &[S],
    vocabulary: &[(&str, FieldType)],
) -> Result<Map<String, Value>> {
    let fields = parse_kvs(args, &KvOptions::for_vocabulary(vocabulary))?;
    validate_update(&fields, vocabulary)?;
    Ok(fields)
}

/// Parses a JSON update document and validates it.
pub fn parse_update_json(text: &str, vocabulary: &[(&str, FieldType)]) -> Result<Map<String, Value>> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| Error::usage(format!("invalid JSON update document: {e}")))?;
    let Value::Object(fields) = value else {
        return Err(Error::usage("update document must be a JSON object"));
    };
    validate_update(&fields, vocabulary)?;
    Ok(fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;
    use test_case::test_case;

    #[test_case("name=web", "name", json!("web") ; "string")]
    #[test_case("count=3", "count", json!(3) ; "number")]
    #[test_case("on=true", "on", json!(true) ; "boolean")]
    #[test_case("ids=[1,2]", "ids", json!([1, 2]) ; "array")]
    #[test_case("x=", "x", Value::Null ; "empty is null")]
    #[test_case("expr=a=b", "expr", json!("a=b") ; "split on first equals")]
    #[test_case("s={bad", "s", json!("{bad") ; "unparseable falls back to string")]
    fn test_parse_kv(arg: &str, key: &str, value: Value) {
        let (k, v) = parse_kv(arg, &KvOptions::default()).expect("valid");
        assert_eq!(k, key);
        assert_eq!(v, value);
    }

    #[test]
    fn test_parse_kv_errors() {
        assert!(parse_kv("novalue", &KvOptions::default()).is_err());
        assert!(parse_kv("=v", &KvOptions::default()).is_err());
        let strict = KvOptions {
            fail_on_empty_value: true,
            ..KvOptions::default()
        };
        assert_eq!(parse_kv("x=", &strict).expect_err("empty").name(), "UsageError");
    }

    #[test]
    fn test_string_hint_skips_json() {
        let opts = KvOptions::for_vocabulary(IMAGE_UPDATE_FIELDS);
        let (_, v) = parse_kv("version=1.10", &opts).expect("valid");
        assert_eq!(v, json!("1.10"));
        let (_, v) = parse_kv("name=true", &opts).expect("valid");
        assert_eq!(v, json!("true"));
    }

    #[test]
    fn test_dotted_keys_nest_once() {
        let fields = parse_kvs(&["tags.role=db", "tags.n=2", "name=x"], &KvOptions::default())
            .expect("valid");
        assert_eq!(fields.get("tags"), Some(&json!({"role": "db", "n": 2})));

        let flat = KvOptions {
            disable_dotted: true,
            ..KvOptions::default()
        };
        let fields = parse_kvs(&["a.b=1"], &flat).expect("valid");
        assert_eq!(fields.get("a.b"), Some(&json!(1)));

        assert!(parse_kvs(&["a=1", "a.b=2"], &KvOptions::default()).is_err());
    }

    #[test]
    fn test_file_values() {
        let dir = tempfile::tempdir().expect("tempdir");
        let json_file = dir.path().join("tags.json");
        std::fs::write(&json_file, r#"{"a": 1}"#).expect("write");
        let text_file = dir.path().join("desc.txt");
        std::fs::write(&text_file, "plain words").expect("write");

        let (_, v) = parse_kv(&format!("tags=@{}", json_file.display()), &KvOptions::default())
            .expect("json file");
        assert_eq!(v, json!({"a": 1}));
        let (_, v) = parse_kv(&format!("d=@{}", text_file.display()), &KvOptions::default())
            .expect("text file");
        assert_eq!(v, json!("plain words"));
        assert!(parse_kv("d=@/nonexistent/file", &KvOptions::default()).is_err());
    }

    #[test]
    fn test_file_value_drops_one_trailing_newline() {
        let dir = tempfile::tempdir().expect("tempdir");
        let read = |name: &str, content: &str| {
            let path = dir.path().join(name);
            std::fs::write(&path, content).expect("write");
            let opts = KvOptions::for_vocabulary(VPC_UPDATE_FIELDS);
            parse_kv(&format!("description=@{}", path.display()), &opts)
                .expect("file value")
                .1
        };
        assert_eq!(read("a.txt", "web tier\n"), json!("web tier"));
        assert_eq!(read("b.txt", "web tier\r\n"), json!("web tier"));
        assert_eq!(read("c.txt", "two\nlines\n\n"), json!("two\nlines\n"));
        assert_eq!(read("d.txt", ""), json!(""));
    }

    #[test]
    fn test_update_validation() {
        let fields = parse_update_args(&["name=base", "acl=[\"a\"]"], IMAGE_UPDATE_FIELDS)
            .expect("valid");
        assert_eq!(fields.len(), 2);

        let err = parse_update_args(&["state=active"], IMAGE_UPDATE_FIELDS).expect_err("unknown");
        assert!(err.to_string().contains("unknown field \"state\""));

        let err = parse_update_args(&["acl=a"], IMAGE_UPDATE_FIELDS).expect_err("type");
        assert!(err.to_string().contains("must be of type array"));

        let err = parse_update_json(r#"{"name": 5}"#, VPC_UPDATE_FIELDS).expect_err("type");
        assert_eq!(err.name(), "UsageError");
        assert!(parse_update_json("[1]", VPC_UPDATE_FIELDS).is_err());
        assert!(parse_update_json(r#"{"description": "d"}"#, VPC_UPDATE_FIELDS).is_ok());
    }

    proptest! {
        #[test]
        fn prop_json_values_survive_kv(n in any::<i64>(), b in any::<bool>(), s in "[a-z]{1,10}") {
            let opts = KvOptions::default();
            for value in [json!(n), json!(b), json!([n, b]), json!({"k": s.clone()})] {
                let (_, parsed) = parse_kv(&format!("k={value}"), &opts).expect("valid");
                prop_assert_eq!(parsed, value);
            }
        }
    }
}
