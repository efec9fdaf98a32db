//! RFC 7396 JSON Merge Patch, used to layer `clinic.json` files.

use serde_json::{Map, Value};

/// Applies `patch` on top of `target` per RFC 7396.
///
/// Objects merge key by key, `null` removes a key, anything else replaces.
///
/// ```
/// use serde_json::json;
/// use clinic_config::merge::merge_patch;
///
/// let global = json!({"services": {"api": {"base_url": "http://a"}}, "logging": {"level": "info"}});
/// let local = json!({"services": {"chat": {"timeout_secs": 10}}, "logging": null});
/// assert_eq!(
///     merge_patch(global, local),
///     json!({"services": {"api": {"base_url": "http://a"}, "chat": {"timeout_secs": 10}}})
/// );
/// ```
pub fn merge_patch(target: Value, patch: Value) -> Value {
    let Value::Object(patch_map) = patch else {
        return patch;
    };
    let mut merged = match target {
        Value::Object(map) => map,
        _ => Map::new(),
    };

    for (key, value) in patch_map {
        if value.is_null() {
            merged.remove(&key);
        } else {
            let base = merged.remove(&key).unwrap_or(Value::Null);
            merged.insert(key, merge_patch(base, value));
        }
    }
    Value::Object(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn nested_sections_merge() {
        let global = json!({"identity": {"url": "http://id", "realm": "CBT"}});
        let local = json!({"identity": {"realm": "Clinique"}});
        assert_eq!(
            merge_patch(global, local),
            json!({"identity": {"url": "http://id", "realm": "Clinique"}})
        );
    }

    #[test]
    fn null_removes_nested_key() {
        let global = json!({"identity": {"token_store": "/tmp/x", "realm": "CBT"}});
        let local = json!({"identity": {"token_store": null}});
        assert_eq!(merge_patch(global, local), json!({"identity": {"realm": "CBT"}}));
    }

    #[test]
    fn scalars_and_arrays_replace() {
        assert_eq!(
            merge_patch(json!({"a": [1, 2, 3]}), json!({"a": [4]})),
            json!({"a": [4]})
        );
        assert_eq!(
            merge_patch(json!({"a": {"nested": true}}), json!({"a": 42})),
            json!({"a": 42})
        );
        assert_eq!(
            merge_patch(json!({"a": 42}), json!({"a": {"nested": true}})),
            json!({"a": {"nested": true}})
        );
    }

    #[test]
    fn object_patch_over_scalar_target_drops_nulls() {
        assert_eq!(merge_patch(json!(7), json!({"a": null, "b": 1})), json!({"b": 1}));
    }

    proptest! {
        #[test]
        fn empty_patch_is_identity(target in arb_object(true)) {
            prop_assert_eq!(merge_patch(target.clone(), json!({})), target);
        }

        #[test]
        fn null_free_patch_is_idempotent(target in arb_object(true), patch in arb_object(false)) {
            let once = merge_patch(target, patch.clone());
            let twice = merge_patch(once.clone(), patch);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn patch_keys_win(target in arb_object(true), patch in arb_object(false)) {
            let merged = merge_patch(target, patch.clone());
            for (key, value) in patch.as_object().unwrap() {
                if !value.is_object() {
                    prop_assert_eq!(&merged[key], value);
                }
            }
        }
    }

    fn arb_leaf(with_null: bool) -> BoxedStrategy<Value> {
        let scalars = prop_oneof![
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(|n| Value::Number(n.into())),
            "[a-z]{0,8}".prop_map(Value::String),
        ];
        if with_null {
            prop_oneof![Just(Value::Null), scalars].boxed()
        } else {
            scalars.boxed()
        }
    }

    fn arb_object(with_null: bool) -> impl Strategy<Value = Value> {
        let nested = prop::collection::hash_map("[a-z]{1,2}", arb_leaf(with_null), 0..3)
            .prop_map(|m| Value::Object(m.into_iter().collect()));
        let value = prop_oneof![arb_leaf(with_null), nested];
        prop::collection::hash_map("[a-z]{1,3}", value, 0..5)
            .prop_map(|m| Value::Object(m.into_iter().collect()))
    }
}
