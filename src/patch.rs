//! Minimal PATCH payload computation.
//!
//! Both records are serialized to `serde_json::Value` and compared by wire
//! name, so serde renames, `flatten` and `skip` attributes shape the payload
//! exactly as they shape the record on the wire.
//!
//! Once serialized, a nested record and a string-keyed map look the same. Any
//! object whose key set is unchanged is treated as a record and recursed into,
//! so only its changed members are sent. Fields that are real mappings and
//! must be written whole are named in the `mappings` argument of
//! [`patch_payload_with_mappings`] (or in [`Resource::MAPPINGS`](crate::Resource::MAPPINGS)).

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Compute the fields of `updated` that differ from `original`.
pub fn patch_payload<T: Serialize + ?Sized>(original: &T, updated: &T) -> Result<Map<String, Value>> {
    patch_payload_with_mappings(original, updated, &[])
}

/// Like [`patch_payload`], but the top-level fields named in `mappings` are
/// compared whole and, when they differ, written whole.
pub fn patch_payload_with_mappings<T: Serialize + ?Sized>(
    original: &T,
    updated: &T,
    mappings: &[&str],
) -> Result<Map<String, Value>> {
    let original = serde_json::to_value(original)?;
    let updated = serde_json::to_value(updated)?;
    match (original, updated) {
        (Value::Object(original), Value::Object(updated)) => {
            Ok(diff_fields(&original, &updated, mappings))
        }
        _ => Err(Error::InvalidArgument("only records can be patched")),
    }
}

/// Fail with `<field> field is read only` for the first key not in `allowed`.
pub fn check_allowed(payload: &Map<String, Value>, allowed: &[&str]) -> Result<()> {
    match payload.keys().find(|key| !allowed.contains(&key.as_str())) {
        Some(key) => Err(Error::validation(format!("{key} field is read only"))),
        None => Ok(()),
    }
}

fn diff_fields(
    original: &Map<String, Value>,
    updated: &Map<String, Value>,
    mappings: &[&str],
) -> Map<String, Value> {
    let mut out = Map::new();
    for (key, current) in updated {
        let previous = original.get(key).unwrap_or(&Value::Null);
        let changed = if mappings.contains(&key.as_str()) {
            (previous != current).then(|| current.clone())
        } else {
            diff_value(previous, current)
        };
        if let Some(value) = changed {
            out.insert(key.clone(), value);
        }
    }
    out
}

fn diff_value(previous: &Value, current: &Value) -> Option<Value> {
    if is_link(previous) || is_link(current) {
        return None;
    }
    match (previous, current) {
        (Value::Null, Value::Null) => None,
        (Value::Object(previous), Value::Object(current)) => {
            if same_keys(previous, current) {
                let nested = diff_fields(previous, current, &[]);
                (!nested.is_empty()).then(|| Value::Object(nested))
            } else {
                Some(Value::Object(current.clone()))
            }
        }
        (previous, current) if previous != current => Some(current.clone()),
        _ => None,
    }
}

/// A reference such as `{"@odata.id": "/redfish/v1/Chassis/1"}`.
fn is_link(value: &Value) -> bool {
    match value {
        Value::Object(map) => map.len() == 1 && map.contains_key("@odata.id"),
        _ => false,
    }
}

fn same_keys(a: &Map<String, Value>, b: &Map<String, Value>) -> bool {
    a.len() == b.len() && a.keys().all(|key| b.contains_key(key))
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    fn diff(original: Value, updated: Value) -> Map<String, Value> {
        patch_payload(&original, &updated).expect("diff")
    }

    #[test]
    fn changed_scalars_only() {
        let payload = diff(
            json!({"AssetTag": "a", "HostName": "h", "Count": 1}),
            json!({"AssetTag": "b", "HostName": "h", "Count": 1}),
        );
        assert_eq!(Value::Object(payload), json!({"AssetTag": "b"}));
    }

    #[test]
    fn arrays_compare_deeply() {
        let payload = diff(json!({"B": ["x", "y"]}), json!({"B": ["x", "z"]}));
        assert_eq!(Value::Object(payload), json!({"B": ["x", "z"]}));
        assert!(diff(json!({"B": ["x"]}), json!({"B": ["x"]})).is_empty());
    }

    #[test]
    fn nested_records_produce_sub_objects() {
        let payload = diff(
            json!({"Boot": {"Target": "None", "Enabled": "Once"}}),
            json!({"Boot": {"Target": "Pxe", "Enabled": "Once"}}),
        );
        assert_eq!(Value::Object(payload), json!({"Boot": {"Target": "Pxe"}}));
    }

    #[test]
    fn maps_with_new_keys_are_written_whole() {
        let payload = diff(json!({"M": {"a": 1}}), json!({"M": {"a": 1, "b": 2}}));
        assert_eq!(Value::Object(payload), json!({"M": {"a": 1, "b": 2}}));
    }

    #[test]
    fn mappings_are_written_whole() {
        let original = json!({"Attributes": {"a": 1, "b": 2}, "Boot": {"x": 1, "y": 2}});
        let updated = json!({"Attributes": {"a": 1, "b": 3}, "Boot": {"x": 1, "y": 3}});
        let payload = patch_payload_with_mappings(&original, &updated, &["Attributes"]).expect("diff");
        assert_eq!(
            Value::Object(payload),
            json!({"Attributes": {"a": 1, "b": 3}, "Boot": {"y": 3}})
        );
        let unchanged = patch_payload_with_mappings(&original, &original, &["Attributes"]).expect("diff");
        assert!(unchanged.is_empty());
    }

    #[test]
    fn links_are_never_patched() {
        let payload = diff(
            json!({"Chassis": {"@odata.id": "/a"}}),
            json!({"Chassis": {"@odata.id": "/b"}}),
        );
        assert!(payload.is_empty());
    }

    #[test]
    fn nulls() {
        assert!(diff(json!({"X": null}), json!({"X": null})).is_empty());
        assert_eq!(
            Value::Object(diff(json!({"X": null}), json!({"X": 3}))),
            json!({"X": 3})
        );
        assert_eq!(
            Value::Object(diff(json!({"X": 3}), json!({"X": null}))),
            json!({"X": null})
        );
    }

    #[test]
    fn read_only_fields_are_named() {
        let payload = diff(json!({"Id": "1", "A": 1}), json!({"Id": "2", "A": 2}));
        let err = check_allowed(&payload, &["A"]).expect_err("expected error");
        assert_eq!(err.to_string(), "Id field is read only");
        check_allowed(&payload, &["A", "Id"]).expect("allowed");
    }
}
