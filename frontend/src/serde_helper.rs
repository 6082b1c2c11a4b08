use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

use akr_shared::{AppError, AppResult};

/// Merge `patch` into `target` key by key.
///
/// Only top-level keys present in `patch` are replaced; an explicit `null`
/// overwrites the existing value. Non-object inputs replace `target` wholesale.
pub fn merge_json(target: &mut Value, patch: &Value) {
    match (target, patch) {
        (Value::Object(target), Value::Object(patch)) => {
            for (key, value) in patch {
                target.insert(key.clone(), value.clone());
            }
        }
        (target, patch) => *target = patch.clone(),
    }
}

/// Serialize a Rust data structure into a JSON object map.
pub fn to_object<T: Serialize>(value: &T) -> AppResult<Map<String, Value>> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(AppError::backend(format!(
            "expected a JSON object, got {}",
            other
        ))),
    }
}

/// Deserialize a JSON value, reporting failures as backend parse errors.
pub fn from_value<T: DeserializeOwned>(value: Value) -> AppResult<T> {
    serde_json::from_value(value).map_err(AppError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn merge_replaces_only_present_keys() {
        let mut target = json!({ "a": 1, "b": "keep", "c": true });
        merge_json(&mut target, &json!({ "a": 2, "c": null }));
        assert_eq!(target, json!({ "a": 2, "b": "keep", "c": null }));
    }

    #[test]
    fn to_object_rejects_scalars() {
        assert!(to_object(&json!({ "x": 1 })).is_ok());
        assert!(to_object(&3).is_err());
    }
}
