// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Deterministic record serialization and hashing, per spec.md §4.8.
//!
//! `stable_stringify` produces a canonical textual form of a JSON value with
//! object keys sorted ascending, so equal values always serialize to the
//! same string regardless of field insertion order. `hash_stable` is the
//! SHA-1 digest of that string, used for idempotency keys and checkpoint
//! fingerprints.

use serde_json::Value;
use sha1::{Digest, Sha1};

/// Renders `value` as a canonical string: null -> `"null"`, primitives via
/// their JSON form, arrays elementwise, objects with keys sorted ascending.
pub fn stable_stringify(value: &Value) -> String {
    let mut out = String::new();
    write_stable(value, &mut out);
    out
}

fn write_stable(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::String(s) => out.push_str(&serde_json::to_string(s).expect("string always serializes")),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_stable(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&serde_json::to_string(key).expect("string always serializes"));
                out.push(':');
                write_stable(&map[*key], out);
            }
            out.push('}');
        }
    }
}

/// SHA-1 digest of `stable_stringify(value)`, as lowercase hex.
pub fn hash_stable(value: &Value) -> String {
    let mut hasher = Sha1::new();
    hasher.update(stable_stringify(value).as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn key_order_does_not_affect_output() {
        let a = json!({"b": 1, "a": 2});
        let b = json!({"a": 2, "b": 1});
        assert_eq!(stable_stringify(&a), stable_stringify(&b));
    }

    #[test]
    fn nested_structures_are_canonicalized() {
        let v = json!({"z": [1, {"y": true, "x": null}], "a": "hi"});
        assert_eq!(
            stable_stringify(&v),
            r#"{"a":"hi","z":[1,{"x":null,"y":true}]}"#
        );
    }

    #[test]
    fn hash_is_deterministic_and_order_independent() {
        let a = json!({"b": 1, "a": 2});
        let b = json!({"a": 2, "b": 1});
        assert_eq!(hash_stable(&a), hash_stable(&b));
        assert_eq!(hash_stable(&a).len(), 40);
    }

    #[test]
    fn hash_differs_for_different_values() {
        assert_ne!(hash_stable(&json!(1)), hash_stable(&json!(2)));
    }

    proptest! {
        /// Inserting the same key/value pairs in any order produces the
        /// same canonical string (spec.md §8 property #7).
        #[test]
        fn stable_stringify_is_insertion_order_independent(
            pairs in prop::collection::vec(("[a-e]", any::<i32>()), 0..8),
            shuffle_seed in 0u64..64,
        ) {
            let mut deduped = serde_json::Map::new();
            for (k, v) in &pairs {
                deduped.insert(k.clone(), json!(v));
            }
            let mut forward = serde_json::Map::new();
            for (k, v) in &pairs {
                forward.insert(k.clone(), json!(v));
            }
            let mut reversed = serde_json::Map::new();
            for (k, v) in pairs.iter().rev() {
                reversed.insert(k.clone(), json!(v));
            }
            let mut rotated = serde_json::Map::new();
            let split = if deduped.is_empty() { 0 } else { (shuffle_seed as usize) % deduped.len() };
            for (k, v) in pairs.iter().cycle().skip(split).take(pairs.len()) {
                rotated.insert(k.clone(), json!(v));
            }

            let canonical = stable_stringify(&Value::Object(forward));
            prop_assert_eq!(canonical.clone(), stable_stringify(&Value::Object(reversed)));
            prop_assert_eq!(canonical, stable_stringify(&Value::Object(rotated)));
        }
    }
}
