//! Type-preserving recursive merge of a base configuration with an override.
//!
//! The base defines the key set of the result. Scalars from the override
//! replace base scalars only when both have the same JSON type; anything else
//! in the override is dropped without error. Schema validation of the merged
//! value is the only place where bad input is reported.

use std::mem;

use serde_json::{Map, Value};

/// Fuses `base` with an optional `change`.
///
/// Returns `base` unchanged when `change` is `None`. Nested objects recurse;
/// arrays are treated as opaque leaves.
pub fn fuse(base: &Value, change: Option<&Value>) -> Value {
    let Some(change) = change else {
        return base.clone();
    };

    match base {
        Value::Object(fields) => Value::Object(fuse_object(fields, change)),
        leaf if same_type(leaf, change) => change.clone(),
        leaf => leaf.clone(),
    }
}

/// Like [`fuse`], but either side may be missing.
///
/// With no base the change is returned as is. This only happens before a
/// baseline exists.
pub fn fuse_optional(base: Option<&Value>, change: Option<&Value>) -> Option<Value> {
    match base {
        Some(base) => Some(fuse(base, change)),
        None => change.cloned(),
    }
}

fn fuse_object(fields: &Map<String, Value>, change: &Value) -> Map<String, Value> {
    fields
        .iter()
        .map(|(key, base)| {
            let merged = match base {
                Value::Object(_) => fuse(base, change.get(key)),
                _ => match change.get(key) {
                    Some(candidate) if same_type(base, candidate) => candidate.clone(),
                    _ => base.clone(),
                },
            };
            (key.clone(), merged)
        })
        .collect()
}

fn same_type(a: &Value, b: &Value) -> bool {
    mem::discriminant(a) == mem::discriminant(b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::Configuration;
    use serde_json::json;

    fn base() -> Value {
        Configuration::default().to_value().unwrap()
    }

    fn keys(value: &Value) -> Vec<String> {
        value.as_object().unwrap().keys().cloned().collect()
    }

    #[test]
    fn test_absent_change_returns_base() {
        assert_eq!(fuse(&base(), None), base());
    }

    #[test]
    fn test_absent_base_returns_change() {
        let change = json!({ "console": { "level": "debug" } });
        assert_eq!(fuse_optional(None, Some(&change)), Some(change.clone()));
        assert_eq!(fuse_optional(None, None), None);
        assert_eq!(fuse_optional(Some(&base()), None), Some(base()));
    }

    #[test]
    fn test_scalar_override_applies() {
        let merged = fuse(&base(), Some(&json!({ "file": { "active": true, "level": "warning" } })));
        assert_eq!(merged["file"]["active"], json!(true));
        assert_eq!(merged["file"]["level"], json!("warning"));
        assert_eq!(merged["file"]["logpath"], json!("./logs/"));
    }

    #[test]
    fn test_false_override_applies() {
        let merged = fuse(&base(), Some(&json!({ "console": { "active": false } })));
        assert_eq!(merged["console"]["active"], json!(false));
    }

    #[test]
    fn test_type_mismatch_is_discarded() {
        let merged = fuse(&json!({ "level": "info" }), Some(&json!({ "level": 7 })));
        assert_eq!(merged["level"], json!("info"));

        let merged = fuse(&base(), Some(&json!({ "strict": "no", "file": "./x/" })));
        assert_eq!(merged, base());
    }

    #[test]
    fn test_absent_subtree_leaves_base() {
        let merged = fuse(&json!({ "file": { "active": false } }), Some(&json!({})));
        assert_eq!(merged["file"]["active"], json!(false));
    }

    #[test]
    fn test_extra_keys_are_ignored() {
        let change = json!({
            "syslog": { "active": true },
            "console": { "colors": true }
        });
        let merged = fuse(&base(), Some(&change));
        assert_eq!(keys(&merged), keys(&base()));
        assert_eq!(keys(&merged["console"]), keys(&base()["console"]));
    }

    #[test]
    fn test_shape_is_preserved() {
        for change in [
            json!({}),
            json!(null),
            json!("nonsense"),
            json!({ "mongo": null }),
            json!({ "mongo": { "db": "mongodb://h/db", "unknown": 1 } }),
        ] {
            let merged = fuse(&base(), Some(&change));
            assert_eq!(keys(&merged), keys(&base()));
            for section in ["console", "file", "mongo"] {
                assert_eq!(keys(&merged[section]), keys(&base()[section]));
            }
        }
    }

    #[test]
    fn test_fusion_is_idempotent() {
        let change = json!({
            "strict": false,
            "console": { "level": "silly" },
            "mongo": { "active": true, "safe": false }
        });
        let once = fuse(&base(), Some(&change));
        let twice = fuse(&once, Some(&change));
        assert_eq!(once, twice);
    }

    #[test]
    fn test_change_key_order_does_not_matter() {
        let a: Value = serde_json::from_str(
            r#"{ "file": { "level": "crit", "active": true }, "console": { "active": false } }"#,
        )
        .unwrap();
        let b: Value = serde_json::from_str(
            r#"{ "console": { "active": false }, "file": { "active": true, "level": "crit" } }"#,
        )
        .unwrap();
        assert_eq!(fuse(&base(), Some(&a)), fuse(&base(), Some(&b)));
    }
}
