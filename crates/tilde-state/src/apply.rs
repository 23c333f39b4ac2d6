//! Update application logic.
//!
//! Every update is first probed against the current tree without touching it. Only an
//! effective update is then written, so a no-op never clones, coerces or creates a node.
//!
//! Descent rules shared by the probe and the write:
//! - a root that is not an object is treated as `{}`;
//! - a missing or non-container intermediate is treated as `{}`;
//! - an array intermediate is entered by numeric index, padding with `null` past its end;
//! - a non-numeric segment addressed to an array makes the whole update a no-op.

use crate::mode::UpdateMode;
use crate::DataPath;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Apply an update to a document (pure function).
///
/// Returns the new document, or `None` when the update is a no-op.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use tilde_state::{apply_update, DataPath, UpdateMode};
///
/// let doc = json!({"list": [1, 2, 3]});
///
/// let step = json!({"increment": 1});
/// let moved = apply_update(&doc, &DataPath::parse("list.0"), Some(&step), UpdateMode::Move);
/// assert_eq!(moved, Some(json!({"list": [2, 1, 3]})));
///
/// let same = apply_update(&doc, &DataPath::parse("list.1"), Some(&json!(2)), UpdateMode::Replace);
/// assert_eq!(same, None);
/// ```
pub fn apply_update(
    doc: &Value,
    path: &DataPath,
    value: Option<&Value>,
    mode: UpdateMode,
) -> Option<Value> {
    if !is_effective(doc, path.segments(), value, mode) {
        return None;
    }

    let mut result = doc.clone();
    write(&mut result, path.segments(), value.cloned(), mode);
    Some(result)
}

/// Apply an update to a shared document, copying it only when it changes.
///
/// Returns whether the update was effective.
pub(crate) fn apply_update_shared(
    doc: &mut Arc<Value>,
    path: &DataPath,
    value: Option<Value>,
    mode: UpdateMode,
) -> bool {
    if !is_effective(&**doc, path.segments(), value.as_ref(), mode) {
        return false;
    }

    write(Arc::make_mut(doc), path.segments(), value, mode);
    true
}

/// Get a value at a path, reading array segments as indices.
pub fn get_at_path<'a>(doc: &'a Value, path: &DataPath) -> Option<&'a Value> {
    path.segments()
        .iter()
        .try_fold(doc, |node, seg| child(node, seg))
}

fn child<'a>(node: &'a Value, seg: &str) -> Option<&'a Value> {
    match node {
        Value::Object(map) => map.get(seg),
        Value::Array(items) => items.get(seg.parse::<usize>().ok()?),
        _ => None,
    }
}

#[inline]
fn is_container(v: &Value) -> bool {
    v.is_object() || v.is_array()
}

/// Where a probe currently stands while descending.
#[derive(Clone, Copy)]
enum Probe<'a> {
    /// An existing container.
    Node(&'a Value),
    /// A fresh `{}` that the write would create.
    Fresh,
}

fn is_effective(doc: &Value, segments: &[String], value: Option<&Value>, mode: UpdateMode) -> bool {
    let Some((last, parents)) = segments.split_last() else {
        return matches!((mode, value), (UpdateMode::Replace, Some(v)) if v != doc);
    };

    let mut parent = if doc.is_object() {
        Probe::Node(doc)
    } else {
        Probe::Fresh
    };

    for seg in parents {
        parent = match parent {
            Probe::Fresh => Probe::Fresh,
            Probe::Node(node) => {
                if node.is_array() && seg.parse::<usize>().is_err() {
                    return false;
                }
                descend(child(node, seg))
            }
        };
    }

    match parent {
        Probe::Fresh => fresh_parent_effective(value, mode),
        Probe::Node(Value::Object(map)) => object_parent_effective(map.get(last), value, mode),
        Probe::Node(Value::Array(items)) => match last.parse::<usize>() {
            Ok(index) => array_parent_effective(items, index, value, mode),
            Err(_) => false,
        },
        Probe::Node(_) => false,
    }
}

fn descend(next: Option<&Value>) -> Probe<'_> {
    match next {
        Some(v) if is_container(v) => Probe::Node(v),
        _ => Probe::Fresh,
    }
}

fn fresh_parent_effective(value: Option<&Value>, mode: UpdateMode) -> bool {
    match mode {
        UpdateMode::Replace | UpdateMode::Add => value.is_some(),
        UpdateMode::Remove | UpdateMode::Move => false,
    }
}

fn object_parent_effective(
    current: Option<&Value>,
    value: Option<&Value>,
    mode: UpdateMode,
) -> bool {
    match mode {
        UpdateMode::Replace => match value {
            None => current.is_some(),
            Some(v) => current != Some(v),
        },
        UpdateMode::Add => add_effective(current, value),
        UpdateMode::Remove | UpdateMode::Move => false,
    }
}

fn array_parent_effective(
    items: &[Value],
    index: usize,
    value: Option<&Value>,
    mode: UpdateMode,
) -> bool {
    let current = items.get(index);
    match mode {
        UpdateMode::Replace => match value {
            // Deleting an element leaves a hole, stored as null.
            None => current.is_some_and(|c| !c.is_null()),
            Some(v) => current != Some(v),
        },
        UpdateMode::Add => add_effective(current, value),
        UpdateMode::Remove => index < items.len(),
        UpdateMode::Move => move_destination(items.len(), index, value).is_some(),
    }
}

fn add_effective(current: Option<&Value>, value: Option<&Value>) -> bool {
    let Some(value) = value else {
        return false;
    };
    match current {
        None => true,
        Some(c) if c == value => false,
        Some(c) => c.is_array(),
    }
}

/// Post-removal index for a move, or `None` when the element stays where it is.
///
/// The requested index is clamped to `[0, len]`; an index past the last element appends.
pub(crate) fn move_destination(len: usize, index: usize, value: Option<&Value>) -> Option<usize> {
    if index >= len {
        return None;
    }
    let increment = value.and_then(increment_of).filter(|i| *i != 0)?;
    let len_i = i64::try_from(len).ok()?;
    let index_i = i64::try_from(index).ok()?;
    let wanted = index_i.saturating_add(increment).clamp(0, len_i);
    let destination = usize::try_from(wanted).ok()?.min(len - 1);
    (destination != index).then_some(destination)
}

fn increment_of(value: &Value) -> Option<i64> {
    match value.get("increment")? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn write(doc: &mut Value, segments: &[String], value: Option<Value>, mode: UpdateMode) {
    let Some((last, parents)) = segments.split_last() else {
        if let Some(value) = value {
            *doc = value;
        }
        return;
    };

    if !doc.is_object() {
        *doc = Value::Object(Map::new());
    }

    let mut node = doc;
    for seg in parents {
        match descend_mut(node, seg) {
            Some(next) => node = next,
            None => return,
        }
    }

    write_terminal(node, last, value, mode);
}

fn descend_mut<'a>(node: &'a mut Value, seg: &str) -> Option<&'a mut Value> {
    let next = match node {
        Value::Object(map) => map.entry(seg.to_owned()).or_insert(Value::Null),
        Value::Array(items) => slot_mut(items, seg.parse::<usize>().ok()?),
        _ => return None,
    };
    if !is_container(next) {
        *next = Value::Object(Map::new());
    }
    Some(next)
}

fn slot_mut(items: &mut Vec<Value>, index: usize) -> &mut Value {
    if index >= items.len() {
        items.resize(index + 1, Value::Null);
    }
    &mut items[index]
}

fn write_terminal(node: &mut Value, key: &str, value: Option<Value>, mode: UpdateMode) {
    match (mode, node) {
        (UpdateMode::Replace, Value::Object(map)) => match value {
            Some(value) => {
                map.insert(key.to_owned(), value);
            }
            None => {
                map.shift_remove(key);
            }
        },
        (UpdateMode::Replace, Value::Array(items)) => {
            if let Ok(index) = key.parse::<usize>() {
                *slot_mut(items, index) = value.unwrap_or(Value::Null);
            }
        }
        (UpdateMode::Add, parent) => {
            let Some(value) = value else {
                return;
            };
            let target = match parent {
                Value::Object(map) => map
                    .entry(key.to_owned())
                    .or_insert_with(|| Value::Array(Vec::new())),
                Value::Array(items) => {
                    let Ok(index) = key.parse::<usize>() else {
                        return;
                    };
                    if index >= items.len() {
                        items.resize(index, Value::Null);
                        items.push(Value::Array(Vec::new()));
                    }
                    &mut items[index]
                }
                _ => return,
            };
            if let Value::Array(list) = target {
                list.push(value);
            }
        }
        (UpdateMode::Remove, Value::Array(items)) => {
            if let Ok(index) = key.parse::<usize>() {
                if index < items.len() {
                    items.remove(index);
                }
            }
        }
        (UpdateMode::Move, Value::Array(items)) => {
            let Ok(index) = key.parse::<usize>() else {
                return;
            };
            if let Some(destination) = move_destination(items.len(), index, value.as_ref()) {
                let item = items.remove(index);
                items.insert(destination, item);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_path;
    use serde_json::json;

    fn update(doc: &Value, path: &str, value: Option<Value>, mode: UpdateMode) -> Option<Value> {
        apply_update(doc, &DataPath::parse(path), value.as_ref(), mode)
    }

    // ========================================================================
    // Replace
    // ========================================================================

    #[test]
    fn test_replace_creates_intermediates() {
        let doc = json!({});
        let out = update(&doc, "user.name", Some(json!("Ada")), UpdateMode::Replace);
        assert_eq!(out, Some(json!({"user": {"name": "Ada"}})));
        assert_eq!(doc, json!({}));
    }

    #[test]
    fn test_replace_equal_value_is_noop() {
        let doc = json!({"a": {"b": [1, 2]}});
        assert_eq!(update(&doc, "a.b", Some(json!([1, 2])), UpdateMode::Replace), None);
    }

    #[test]
    fn test_replace_none_deletes_key_keeping_order() {
        let doc = json!({"a": 1, "b": 2, "c": 3});
        let out = update(&doc, "a", None, UpdateMode::Replace).unwrap();
        let keys: Vec<_> = out.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["b", "c"]);
    }

    #[test]
    fn test_delete_absent_key_is_noop() {
        let doc = json!({"a": 1});
        assert_eq!(update(&doc, "zzz", None, UpdateMode::Replace), None);
        assert_eq!(update(&doc, "x.y.z", None, UpdateMode::Replace), None);
    }

    #[test]
    fn test_replace_coerces_scalar_intermediate() {
        let doc = json!({"a": "text"});
        let out = update(&doc, "a.b", Some(json!(1)), UpdateMode::Replace);
        assert_eq!(out, Some(json!({"a": {"b": 1}})));
    }

    #[test]
    fn test_replace_through_array_by_index() {
        let doc = json!({"rows": [{"v": 1}, {"v": 2}]});
        let out = update(&doc, "rows.1.v", Some(json!(20)), UpdateMode::Replace);
        assert_eq!(out, Some(json!({"rows": [{"v": 1}, {"v": 20}]})));
    }

    #[test]
    fn test_non_numeric_segment_on_array_is_noop() {
        let doc = json!({"rows": [1, 2]});
        assert_eq!(update(&doc, "rows.x", Some(json!(0)), UpdateMode::Replace), None);
        assert_eq!(update(&doc, "rows.x.y", Some(json!(0)), UpdateMode::Replace), None);
    }

    #[test]
    fn test_index_past_end_pads_with_null() {
        let doc = json!({"rows": [1]});
        let out = update(&doc, "rows.3", Some(json!(4)), UpdateMode::Replace);
        assert_eq!(out, Some(json!({"rows": [1, null, null, 4]})));
        let out = update(&doc, "rows.2.x", Some(json!(true)), UpdateMode::Replace);
        assert_eq!(out, Some(json!({"rows": [1, null, {"x": true}]})));
    }

    #[test]
    fn test_non_object_root_is_coerced() {
        let doc = json!([1, 2]);
        let out = update(&doc, "a", Some(json!(1)), UpdateMode::Replace);
        assert_eq!(out, Some(json!({"a": 1})));
    }

    #[test]
    fn test_root_path_replaces_whole_tree() {
        let doc = json!({"a": 1});
        let root = DataPath::root();
        assert_eq!(
            apply_update(&doc, &root, Some(&json!([1])), UpdateMode::Replace),
            Some(json!([1]))
        );
        assert_eq!(apply_update(&doc, &root, Some(&doc), UpdateMode::Replace), None);
        assert_eq!(apply_update(&doc, &root, Some(&json!(1)), UpdateMode::Add), None);
    }

    // ========================================================================
    // Add
    // ========================================================================

    #[test]
    fn test_add_on_missing_creates_list() {
        let doc = json!({});
        let out = update(&doc, "list", Some(json!("x")), UpdateMode::Add);
        assert_eq!(out, Some(json!({"list": ["x"]})));
    }

    #[test]
    fn test_add_appends() {
        let doc = json!({"list": ["x"]});
        let out = update(&doc, "list", Some(json!("y")), UpdateMode::Add);
        assert_eq!(out, Some(json!({"list": ["x", "y"]})));
    }

    #[test]
    fn test_add_on_non_array_is_noop() {
        let doc = json!({"list": "x", "nil": null});
        assert_eq!(update(&doc, "list", Some(json!("y")), UpdateMode::Add), None);
        assert_eq!(update(&doc, "nil", Some(json!("y")), UpdateMode::Add), None);
        assert_eq!(update(&doc, "fresh", None, UpdateMode::Add), None);
    }

    #[test]
    fn test_add_equal_to_current_is_noop() {
        let doc = json!({"list": ["x"]});
        assert_eq!(update(&doc, "list", Some(json!(["x"])), UpdateMode::Add), None);
    }

    #[test]
    fn test_add_into_array_slot() {
        let doc = json!({"groups": [["a"]]});
        assert_eq!(
            update(&doc, "groups.0", Some(json!("b")), UpdateMode::Add),
            Some(json!({"groups": [["a", "b"]]}))
        );
        assert_eq!(
            update(&doc, "groups.2", Some(json!("c")), UpdateMode::Add),
            Some(json!({"groups": [["a"], null, ["c"]]}))
        );
    }

    // ========================================================================
    // Remove
    // ========================================================================

    #[test]
    fn test_remove_element() {
        let doc = json!({"list": ["a", "b", "c"]});
        let out = update(&doc, "list.1", None, UpdateMode::Remove);
        assert_eq!(out, Some(json!({"list": ["a", "c"]})));
    }

    #[test]
    fn test_invalid_remove_targets_are_noops() {
        let doc = json!({"list": ["a"], "obj": {"k": 1}});
        assert_eq!(update(&doc, "list.5", None, UpdateMode::Remove), None);
        assert_eq!(update(&doc, "list.x", None, UpdateMode::Remove), None);
        assert_eq!(update(&doc, "obj.k", None, UpdateMode::Remove), None);
        assert_eq!(update(&doc, "missing.0", None, UpdateMode::Remove), None);
    }

    // ========================================================================
    // Move
    // ========================================================================

    #[test]
    fn test_move_clamped_at_start_is_noop() {
        let doc = json!({"list": [1, 2, 3]});
        assert_eq!(
            update(&doc, "list.0", Some(json!({"increment": -1})), UpdateMode::Move),
            None
        );
    }

    #[test]
    fn test_move_clamped_at_end_is_noop() {
        let doc = json!({"list": [1, 2, 3]});
        assert_eq!(
            update(&doc, "list.2", Some(json!({"increment": 5})), UpdateMode::Move),
            None
        );
    }

    #[test]
    fn test_move_up_and_down() {
        let doc = json!({"list": [1, 2, 3]});
        assert_eq!(
            update(&doc, "list.2", Some(json!({"increment": -2})), UpdateMode::Move),
            Some(json!({"list": [3, 1, 2]}))
        );
        assert_eq!(
            update(&doc, "list.0", Some(json!({"increment": "1"})), UpdateMode::Move),
            Some(json!({"list": [2, 1, 3]}))
        );
        assert_eq!(
            update(&doc, "list.0", Some(json!({"increment": 10})), UpdateMode::Move),
            Some(json!({"list": [2, 3, 1]}))
        );
    }

    #[test]
    fn test_move_without_increment_is_noop() {
        let doc = json!({"list": [1, 2]});
        for value in [json!({}), json!({"increment": 0}), json!({"increment": "x"}), json!(1)] {
            assert_eq!(update(&doc, "list.0", Some(value), UpdateMode::Move), None);
        }
        assert_eq!(update(&doc, "list.0", None, UpdateMode::Move), None);
    }

    #[test]
    fn test_move_destination() {
        assert_eq!(move_destination(3, 0, Some(&json!({"increment": 1}))), Some(1));
        assert_eq!(move_destination(3, 1, Some(&json!({"increment": 1}))), Some(2));
        assert_eq!(move_destination(3, 2, Some(&json!({"increment": 1}))), None);
        assert_eq!(move_destination(3, 3, Some(&json!({"increment": -1}))), None);
        assert_eq!(move_destination(0, 0, Some(&json!({"increment": 1}))), None);
    }

    // ========================================================================
    // Shared documents
    // ========================================================================

    #[test]
    fn test_shared_noop_does_not_copy() {
        let mut doc = Arc::new(json!({"a": 1}));
        let reader = Arc::clone(&doc);
        assert!(!apply_update_shared(
            &mut doc,
            &data_path!("a"),
            Some(json!(1)),
            UpdateMode::Replace
        ));
        assert!(Arc::ptr_eq(&doc, &reader));
    }

    #[test]
    fn test_shared_write_leaves_readers_untouched() {
        let mut doc = Arc::new(json!({"a": 1}));
        let reader = Arc::clone(&doc);
        assert!(apply_update_shared(
            &mut doc,
            &data_path!("a"),
            Some(json!(2)),
            UpdateMode::Replace
        ));
        assert_eq!(*reader, json!({"a": 1}));
        assert_eq!(*doc, json!({"a": 2}));
    }

    #[test]
    fn test_get_at_path() {
        let doc = json!({"a": [{"b": 1}]});
        assert_eq!(get_at_path(&doc, &DataPath::parse("a.0.b")), Some(&json!(1)));
        assert_eq!(get_at_path(&doc, &DataPath::parse("a.x")), None);
        assert_eq!(get_at_path(&doc, &DataPath::root()), Some(&doc));
    }
}
