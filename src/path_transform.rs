//! Conversion between nested JSON documents and flat dot-path maps.
//!
//! HTML forms only carry flat `name=value` pairs, so the admin editor names
//! every field after the path of the leaf it edits:
//!
//! ```text
//! {"author": {"first": "Ada"}, "tags": [{"name": "x"}]}
//!
//! author.first = Ada
//! tags.0.name  = x
//! ```
//!
//! [`flatten`] produces those pairs from a document and [`unflatten`] rebuilds
//! the document from a submitted form. Keys carry no type information: while
//! unflattening, a container becomes an array when the segment after it is
//! all digits and an object otherwise.
//!
//! The encoding is lossy in two known ways. Empty arrays and objects have no
//! leaf to anchor a key, so they disappear. Object keys made only of digits
//! come back as array indices.

use serde_json::{Map, Value};

use crate::errors::PathError;

/// Separator between the segments of a flat key.
pub const DELIMITER: char = '.';

/// Largest array index a flat key may address.
///
/// Unflattening pads arrays up to the addressed slot, so one submitted field
/// could otherwise allocate an arbitrarily large array.
pub const MAX_INDEX: usize = 9_999;

/// Flat key → scalar value. Iteration follows insertion order.
pub type FlatMap = Map<String, Value>;

/// Returns true when `segment` addresses an array slot (`^\d+$`).
pub fn is_index_segment(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}

/// Split a flat key into its segments, rejecting empty segments.
pub fn split_key(key: &str) -> Result<Vec<&str>, PathError> {
    let segments: Vec<&str> = key.split(DELIMITER).collect();
    if segments.iter().any(|segment| segment.is_empty()) {
        return Err(PathError::EmptySegment {
            key: key.to_string(),
        });
    }
    Ok(segments)
}

/// Flatten `value` into a map from dotted paths to leaf scalars.
///
/// Every scalar reachable from `value` appears exactly once. A scalar at the
/// root is stored under the empty key.
pub fn flatten(value: &Value) -> FlatMap {
    let mut out = FlatMap::new();
    flatten_into(value, "", &mut out);
    out
}

fn flatten_into(value: &Value, prefix: &str, out: &mut FlatMap) {
    match value {
        Value::Object(map) => {
            for (name, child) in map {
                flatten_into(child, &join(prefix, name), out);
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                flatten_into(child, &join(prefix, &index.to_string()), out);
            }
        }
        scalar => {
            out.insert(prefix.to_string(), scalar.clone());
        }
    }
}

fn join(prefix: &str, segment: &str) -> String {
    if prefix.is_empty() {
        segment.to_string()
    } else {
        format!("{prefix}{DELIMITER}{segment}")
    }
}

/// Rebuild a nested document from a flat map. The result is always an object.
///
/// Keys are applied in iteration order. When two keys disagree about the kind
/// of container at a shared prefix, the later key replaces the container.
pub fn unflatten(flat: &FlatMap) -> Result<Value, PathError> {
    let mut root = Value::Object(Map::new());
    for (key, value) in flat {
        let segments = split_key(key)?;
        insert_path(&mut root, key, &segments, value.clone())?;
    }
    Ok(root)
}

fn insert_path(
    root: &mut Value,
    key: &str,
    segments: &[&str],
    value: Value,
) -> Result<(), PathError> {
    let Some((last, parents)) = segments.split_last() else {
        return Err(PathError::EmptySegment {
            key: key.to_string(),
        });
    };

    let mut current = root;
    for (i, segment) in parents.iter().enumerate() {
        let wants_array = is_index_segment(segments[i + 1]);
        let next = slot(current, key, segment)?;
        let fits = if wants_array {
            next.is_array()
        } else {
            next.is_object()
        };
        if !fits {
            *next = if wants_array {
                Value::Array(Vec::new())
            } else {
                Value::Object(Map::new())
            };
        }
        current = next;
    }

    *slot(current, key, last)? = value;
    Ok(())
}

/// Locate (creating if needed) the child of `container` named by `segment`.
fn slot<'a>(
    container: &'a mut Value,
    key: &str,
    segment: &str,
) -> Result<&'a mut Value, PathError> {
    let indexed = container.is_array() && is_index_segment(segment);
    if !indexed && !container.is_object() {
        *container = Value::Object(Map::new());
    }

    match container {
        Value::Array(items) => {
            let index = segment
                .parse::<usize>()
                .ok()
                .filter(|&index| index <= MAX_INDEX)
                .ok_or_else(|| PathError::IndexOverflow {
                    key: key.to_string(),
                    segment: segment.to_string(),
                })?;
            if items.len() <= index {
                items.resize(index + 1, Value::Null);
            }
            Ok(&mut items[index])
        }
        Value::Object(map) => Ok(map.entry(segment).or_insert(Value::Null)),
        _ => unreachable!("container is an array or an object at this point"),
    }
}

/// Build a flat map of string values from decoded form pairs.
///
/// Repeated names keep their first position and their last value.
pub fn flat_map_from_pairs<I, K, V>(pairs: I) -> FlatMap
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    let mut flat = FlatMap::new();
    for (key, value) in pairs {
        flat.insert(key.into(), Value::String(value.into()));
    }
    flat
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn flat(value: Value) -> FlatMap {
        match value {
            Value::Object(map) => map,
            other => panic!("expected an object, got {other}"),
        }
    }

    fn leaf_count(value: &Value) -> usize {
        match value {
            Value::Object(map) => map.values().map(leaf_count).sum(),
            Value::Array(items) => items.iter().map(leaf_count).sum(),
            _ => 1,
        }
    }

    #[test]
    fn index_segment_detection() {
        assert!(is_index_segment("0"));
        assert!(is_index_segment("0042"));
        assert!(!is_index_segment(""));
        assert!(!is_index_segment("-1"));
        assert!(!is_index_segment("1a"));
        assert!(!is_index_segment("name"));
        assert!(!is_index_segment("١"));
    }

    #[test]
    fn split_key_rejects_empty_segments() {
        assert_eq!(split_key("a.b.0").unwrap(), vec!["a", "b", "0"]);
        for bad in ["", ".a", "a.", "a..b"] {
            assert!(
                matches!(split_key(bad), Err(PathError::EmptySegment { .. })),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn round_trip_without_empty_containers() {
        let samples = [
            json!({"title": "Hello"}),
            json!({"a": {"b": {"c": 1, "d": true}}, "e": null}),
            json!({"grid": [[1, 2], [3, [4, 5]]]}),
            json!({"hero": {"buttons": [{"label": "Play", "href": "/play"}, {"label": "Join"}]},
                   "footer": {"links": ["a", "b"], "year": 2024}}),
        ];
        for v in samples {
            assert_eq!(unflatten(&flatten(&v)).unwrap(), v);
        }
    }

    #[test]
    fn leaf_coverage_counts_only_scalars() {
        let samples = [
            json!({}),
            json!({"a": [], "b": {}, "c": 1}),
            json!({"a": [1, [2, {}], {"x": null}], "b": {"c": [[]]}}),
            json!(7),
            json!([]),
        ];
        for v in samples {
            assert_eq!(flatten(&v).len(), leaf_count(&v), "{v}");
        }
    }

    #[test]
    fn array_indices_are_in_order() {
        let v = json!({"items": ["a", "b", "c"]});
        assert_eq!(
            flatten(&v),
            flat(json!({"items.0": "a", "items.1": "b", "items.2": "c"}))
        );
        let f = flatten(&v);
        let keys: Vec<&str> = f.keys().map(String::as_str).collect();
        assert_eq!(keys, ["items.0", "items.1", "items.2"]);
    }

    #[test]
    fn nested_object() {
        let v = json!({"author": {"first": "Ada", "last": "Lovelace"}});
        let f = flatten(&v);
        assert_eq!(
            f,
            flat(json!({"author.first": "Ada", "author.last": "Lovelace"}))
        );
        assert_eq!(unflatten(&f).unwrap(), v);
    }

    #[test]
    fn array_of_objects_comes_back_as_array() {
        let v = json!({"tags": [{"name": "x"}, {"name": "y"}]});
        let f = flatten(&v);
        assert_eq!(f, flat(json!({"tags.0.name": "x", "tags.1.name": "y"})));

        let back = unflatten(&f).unwrap();
        assert!(back["tags"].is_array());
        assert_eq!(back, v);
    }

    #[test]
    fn single_segment_key_is_not_nested() {
        let f = flat(json!({"title": "Hello"}));
        assert_eq!(unflatten(&f).unwrap(), json!({"title": "Hello"}));
    }

    #[test]
    fn empty_inputs() {
        assert_eq!(unflatten(&FlatMap::new()).unwrap(), json!({}));
        assert!(flatten(&json!({})).is_empty());
    }

    #[test]
    fn empty_containers_are_dropped() {
        let v = json!({"keep": 1, "list": [], "obj": {}});
        let f = flatten(&v);
        assert_eq!(f, flat(json!({"keep": 1})));
        assert_eq!(unflatten(&f).unwrap(), json!({"keep": 1}));
    }

    #[test]
    fn root_scalar_uses_empty_key() {
        assert_eq!(flatten(&json!("x")), flat(json!({"": "x"})));
    }

    #[test]
    fn root_array_is_keyed_by_index() {
        let f = flatten(&json!(["a", {"b": 1}]));
        assert_eq!(f, flat(json!({"0": "a", "1.b": 1})));
    }

    #[test]
    fn digit_object_keys_become_arrays() {
        let v = json!({"years": {"2023": "a"}});
        let f = flatten(&v);
        assert_eq!(f, flat(json!({"years.2023": "a"})));
        let back = unflatten(&f).unwrap();
        assert!(back["years"].is_array());
        assert_eq!(back["years"][2023], "a");
    }

    #[test]
    fn sparse_indices_are_padded_with_null() {
        let f = flat(json!({"items.2": "c", "items.0": "a"}));
        assert_eq!(unflatten(&f).unwrap(), json!({"items": ["a", null, "c"]}));
    }

    #[test]
    fn keys_apply_in_any_order() {
        let f = flat(json!({"tags.1.name": "y", "tags.0.name": "x", "title": "t"}));
        assert_eq!(
            unflatten(&f).unwrap(),
            json!({"tags": [{"name": "x"}, {"name": "y"}], "title": "t"})
        );
    }

    #[test]
    fn unflatten_leaves_input_untouched() {
        let f = flat(json!({"a.b": "1"}));
        let copy = f.clone();
        unflatten(&f).unwrap();
        assert_eq!(f, copy);
    }

    #[test]
    fn malformed_keys_fail_fast() {
        for bad in ["", "a..b", ".a", "a."] {
            let f = flat(json!({ bad: "v" }));
            assert!(
                matches!(unflatten(&f), Err(PathError::EmptySegment { ref key }) if key == bad),
                "{bad:?}"
            );
        }
    }

    #[test]
    fn oversized_index_is_rejected() {
        let f = flat(json!({"items.99999999999999999999999": "v"}));
        assert!(matches!(
            unflatten(&f),
            Err(PathError::IndexOverflow { .. })
        ));
    }

    #[test]
    fn usize_max_index_is_rejected() {
        let key = format!("items.{}", usize::MAX);
        let f = flat(json!({ key.clone(): "v" }));
        assert_eq!(
            unflatten(&f),
            Err(PathError::IndexOverflow {
                key,
                segment: usize::MAX.to_string(),
            })
        );
    }

    #[test]
    fn index_beyond_limit_is_rejected() {
        let f = flat(json!({"items.50000000": "v"}));
        assert!(matches!(
            unflatten(&f),
            Err(PathError::IndexOverflow { ref segment, .. }) if segment == "50000000"
        ));

        let f = flat(json!({"a.b": "ok", "grid.0.10000": "v"}));
        assert!(matches!(
            unflatten(&f),
            Err(PathError::IndexOverflow { .. })
        ));
    }

    #[test]
    fn index_at_limit_is_padded() {
        let f = flat(json!({ format!("items.{MAX_INDEX}"): "last" }));
        let out = unflatten(&f).unwrap();
        let items = out["items"].as_array().unwrap();
        assert_eq!(items.len(), MAX_INDEX + 1);
        assert_eq!(items[MAX_INDEX], "last");
        assert!(items[..MAX_INDEX].iter().all(Value::is_null));
    }

    // Mixed array/object keys at one prefix have no defined result. These only
    // pin down that the call completes with an object at the root.
    #[test]
    fn mixed_container_kinds_are_undefined_but_total() {
        for f in [
            flat(json!({"items.0": "a", "items.name": "n"})),
            flat(json!({"items.name": "n", "items.0": "a"})),
            flat(json!({"a": "scalar", "a.b": "deeper"})),
        ] {
            let out = unflatten(&f);
            assert!(out.is_ok(), "{f:?}");
            assert!(out.unwrap().is_object());
        }
    }

    #[test]
    fn form_pairs_last_write_wins() {
        let f = flat_map_from_pairs(vec![("a", "1"), ("b", "2"), ("a", "3")]);
        assert_eq!(f, flat(json!({"a": "3", "b": "2"})));
        assert_eq!(f.keys().next().map(String::as_str), Some("a"));
    }

    #[test]
    fn form_values_stay_strings() {
        let f = flat_map_from_pairs(vec![("hero.count", "3"), ("hero.visible", "true")]);
        assert_eq!(
            unflatten(&f).unwrap(),
            json!({"hero": {"count": "3", "visible": "true"}})
        );
    }
}
