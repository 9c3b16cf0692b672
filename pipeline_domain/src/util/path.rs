// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Dotted-path accessors over `serde_json::Value`, per spec.md §4.8.
//!
//! `get`/`set`/`remove` treat missing intermediate objects as empty and
//! create them on `set`; a path segment that parses as a non-negative
//! integer indexes into a JSON array instead of an object key.

use serde_json::Value;

pub(crate) fn segments(path: &str) -> Vec<&str> {
    path.split('.').filter(|s| !s.is_empty()).collect()
}

fn as_index(segment: &str) -> Option<usize> {
    segment.parse::<usize>().ok()
}

/// Reads the value at `path`, or `None` if any segment is missing.
pub fn get<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    get_segments(value, &segments(path))
}

/// Like [`get`], but starting from an already-split segment list — lets
/// callers resolve their own root (e.g. a `Record`'s first key) before
/// continuing traversal through nested `Value`s.
pub(crate) fn get_segments<'a>(value: &'a Value, segs: &[&str]) -> Option<&'a Value> {
    let mut current = value;
    for segment in segs {
        current = match current {
            Value::Object(map) => map.get(*segment)?,
            Value::Array(arr) => arr.get(as_index(segment)?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Writes `new_value` at `path`, creating missing intermediate objects (or
/// arrays, when the next segment is numeric) along the way.
pub fn set(value: &mut Value, path: &str, new_value: Value) {
    let segs = segments(path);
    if segs.is_empty() {
        *value = new_value;
        return;
    }
    set_rec(value, &segs, new_value);
}

fn set_rec(value: &mut Value, segs: &[&str], new_value: Value) {
    let (head, rest) = (segs[0], &segs[1..]);

    if rest.is_empty() {
        assign_leaf(value, head, new_value);
        return;
    }

    if let Some(idx) = as_index(head) {
        if !value.is_array() {
            *value = Value::Array(Vec::new());
        }
        let arr = value.as_array_mut().unwrap();
        while arr.len() <= idx {
            arr.push(Value::Null);
        }
        if arr[idx].is_null() {
            arr[idx] = if rest.first().and_then(|s| as_index(s)).is_some() {
                Value::Array(Vec::new())
            } else {
                Value::Object(serde_json::Map::new())
            };
        }
        set_rec(&mut arr[idx], rest, new_value);
    } else {
        if !value.is_object() {
            *value = Value::Object(serde_json::Map::new());
        }
        let map = value.as_object_mut().unwrap();
        let entry = map
            .entry(head.to_string())
            .or_insert_with(|| {
                if rest.first().and_then(|s| as_index(s)).is_some() {
                    Value::Array(Vec::new())
                } else {
                    Value::Object(serde_json::Map::new())
                }
            });
        set_rec(entry, rest, new_value);
    }
}

fn assign_leaf(value: &mut Value, head: &str, new_value: Value) {
    if let Some(idx) = as_index(head) {
        if !value.is_array() {
            *value = Value::Array(Vec::new());
        }
        let arr = value.as_array_mut().unwrap();
        while arr.len() <= idx {
            arr.push(Value::Null);
        }
        arr[idx] = new_value;
    } else {
        if !value.is_object() {
            *value = Value::Object(serde_json::Map::new());
        }
        value.as_object_mut().unwrap().insert(head.to_string(), new_value);
    }
}

/// Removes the value at `path`. A no-op if any intermediate segment is
/// missing.
pub fn remove(value: &mut Value, path: &str) {
    let segs = segments(path);
    if segs.is_empty() {
        return;
    }
    remove_rec(value, &segs);
}

fn remove_rec(value: &mut Value, segs: &[&str]) {
    let (head, rest) = (segs[0], &segs[1..]);
    if rest.is_empty() {
        match value {
            Value::Object(map) => {
                map.remove(head);
            }
            Value::Array(arr) => {
                if let Some(idx) = as_index(head) {
                    if idx < arr.len() {
                        arr[idx] = Value::Null;
                    }
                }
            }
            _ => {}
        }
        return;
    }

    match value {
        Value::Object(map) => {
            if let Some(inner) = map.get_mut(head) {
                remove_rec(inner, rest);
            }
        }
        Value::Array(arr) => {
            if let Some(idx) = as_index(head) {
                if let Some(inner) = arr.get_mut(idx) {
                    remove_rec(inner, rest);
                }
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn get_nested() {
        let v = json!({"a": {"b": {"c": 1}}});
        assert_eq!(get(&v, "a.b.c"), Some(&json!(1)));
        assert_eq!(get(&v, "a.x.c"), None);
    }

    #[test]
    fn get_array_index() {
        let v = json!({"items": [10, 20, 30]});
        assert_eq!(get(&v, "items.1"), Some(&json!(20)));
    }

    #[test]
    fn set_creates_missing_intermediates() {
        let mut v = json!({});
        set(&mut v, "a.b.c", json!(42));
        assert_eq!(v, json!({"a": {"b": {"c": 42}}}));
    }

    #[test]
    fn set_creates_array_for_numeric_segment() {
        let mut v = json!({});
        set(&mut v, "items.2", json!("x"));
        assert_eq!(v, json!({"items": [null, null, "x"]}));
    }

    #[test]
    fn remove_existing_key() {
        let mut v = json!({"a": {"b": 1, "c": 2}});
        remove(&mut v, "a.b");
        assert_eq!(v, json!({"a": {"c": 2}}));
    }

    #[test]
    fn remove_missing_path_is_noop() {
        let mut v = json!({"a": 1});
        remove(&mut v, "a.b.c");
        assert_eq!(v, json!({"a": 1}));
    }
}
