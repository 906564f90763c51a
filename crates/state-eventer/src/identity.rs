//! Path-copying writes.
//!
//! A write at `a.b.c` produces a new root in which the root, `a` and `a.b`
//! are fresh shallow copies and every container off that path keeps its
//! reference. Consumers comparing references can then tell which subtrees
//! changed without a deep comparison.

use std::rc::Rc;

use state_eventer_path::{Path, PathSegment};
use state_eventer_value::StateValue;

use crate::error::{Result, StateError};

/// Most `null`s a single write may insert to reach an index past the end of
/// an array.
pub const MAX_ARRAY_PADDING: usize = 1 << 16;

/// Returns a new root with `value` written at `path`.
///
/// Missing or scalar intermediates become containers: an array when the
/// segment addressed inside them is an index, otherwise an object. Writing
/// past the end of an array pads with `null`.
///
/// # Errors
///
/// [`StateError::PathConflict`] when a non-numeric key addresses an
/// existing array, and [`StateError::IndexOutOfRange`] when reaching the
/// index would take more than [`MAX_ARRAY_PADDING`] padding slots.
pub fn write(root: &StateValue, path: &Path, value: StateValue) -> Result<StateValue> {
    write_at(Some(root), path.segments(), value, path)
}

fn write_at(
    node: Option<&StateValue>,
    segments: &[PathSegment],
    value: StateValue,
    path: &Path,
) -> Result<StateValue> {
    let Some((head, rest)) = segments.split_first() else {
        return Ok(value);
    };
    match node {
        Some(StateValue::Object(map)) => {
            let mut copy = (**map).clone();
            let key = head.as_key().into_owned();
            let child = write_at(copy.get(&key), rest, value, path)?;
            copy.insert(key, child);
            Ok(StateValue::Object(Rc::new(copy)))
        }
        Some(StateValue::Array(items)) => {
            let idx = head.as_index().ok_or_else(|| StateError::PathConflict {
                path: path.as_str().to_string(),
                segment: head.to_string(),
            })?;
            if idx.saturating_sub(items.len()) > MAX_ARRAY_PADDING {
                return Err(StateError::IndexOutOfRange {
                    path: path.as_str().to_string(),
                    index: idx,
                    limit: MAX_ARRAY_PADDING,
                });
            }
            let mut copy = (**items).clone();
            let child = write_at(copy.get(idx), rest, value, path)?;
            if idx < copy.len() {
                copy[idx] = child;
            } else {
                copy.resize(idx, StateValue::Null);
                copy.push(child);
            }
            Ok(StateValue::Array(Rc::new(copy)))
        }
        _ => {
            let container = match head {
                PathSegment::Index(_) => StateValue::array(),
                PathSegment::Key(_) => StateValue::object(),
            };
            write_at(Some(&container), segments, value, path)
        }
    }
}

/// What deleting `path` leaves in its place, judged against `root`.
///
/// Object keys disappear (`None`); array elements become a `null` hole so
/// sibling indices are unaffected.
pub fn deletion_result(root: &StateValue, path: &Path) -> Option<StateValue> {
    let parent = path.parent().ok()?;
    let leaf = path.segments().last()?;
    match root.get_path(&parent)? {
        StateValue::Array(items) => leaf
            .as_index()
            .filter(|idx| *idx < items.len())
            .map(|_| StateValue::Null),
        _ => None,
    }
}

/// Returns a new root with `path` deleted, or `None` when nothing is there.
pub fn delete(root: &StateValue, path: &Path) -> Option<StateValue> {
    delete_at(root, path.segments())
}

fn delete_at(node: &StateValue, segments: &[PathSegment]) -> Option<StateValue> {
    let (head, rest) = segments.split_first()?;
    match node {
        StateValue::Object(map) => {
            let key = head.as_key();
            let child = map.get(&*key)?;
            let mut copy = (**map).clone();
            if rest.is_empty() {
                copy.shift_remove(&*key);
            } else {
                let replaced = delete_at(child, rest)?;
                copy.insert(key.into_owned(), replaced);
            }
            Some(StateValue::Object(Rc::new(copy)))
        }
        StateValue::Array(items) => {
            let idx = head.as_index()?;
            let child = items.get(idx)?;
            let replaced = if rest.is_empty() {
                StateValue::Null
            } else {
                delete_at(child, rest)?
            };
            let mut copy = (**items).clone();
            copy[idx] = replaced;
            Some(StateValue::Array(Rc::new(copy)))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use state_eventer_value::state;

    fn p(s: &str) -> Path {
        Path::parse(s).unwrap()
    }

    #[test]
    fn test_write_creates_intermediates() {
        let root = StateValue::object();
        let out = write(&root, &p("a.b.c"), state!(1)).unwrap();
        assert_eq!(out, state!({"a": {"b": {"c": 1}}}));
    }

    #[test]
    fn test_write_creates_arrays_for_index_segments() {
        let out = write(&StateValue::object(), &p("list.2.name"), state!("x")).unwrap();
        assert_eq!(out, state!({"list": [null, null, {"name": "x"}]}));
    }

    #[test]
    fn test_write_through_scalar_replaces_it() {
        let out = write(&state!({"a": 5}), &p("a.b"), state!(1)).unwrap();
        assert_eq!(out, state!({"a": {"b": 1}}));
    }

    #[test]
    fn test_write_key_into_array_conflicts() {
        let err = write(&state!({"a": [1]}), &p("a.x"), state!(1)).unwrap_err();
        assert_eq!(
            err,
            StateError::PathConflict {
                path: "a.x".to_string(),
                segment: "x".to_string()
            }
        );
    }

    #[test]
    fn test_write_pads_up_to_the_limit() {
        let out = write(&state!({"a": []}), &p(&format!("a.{MAX_ARRAY_PADDING}")), state!(1)).unwrap();
        let items = out.get_path(&p("a")).unwrap().as_array().unwrap();
        assert_eq!(items.len(), MAX_ARRAY_PADDING + 1);
        assert!(items[0].is_null());
        assert_eq!(items[MAX_ARRAY_PADDING], state!(1));
    }

    #[test]
    fn test_write_rejects_huge_index() {
        let root = state!({"a": [1]});
        for raw in ["a.18446744073709551615", "b.1000000", "a.65538.x"] {
            let err = write(&root, &p(raw), state!(1)).unwrap_err();
            assert!(
                matches!(err, StateError::IndexOutOfRange { limit: MAX_ARRAY_PADDING, .. }),
                "{raw}: {err:?}"
            );
        }
    }

    #[test]
    fn test_write_refreshes_only_the_path() {
        let root = state!({"a": {"b": {"c": 1}, "side": {"x": 1}}, "other": [1]});
        let out = write(&root, &p("a.b.c"), state!(2)).unwrap();

        assert!(!out.same_ref(&root));
        let (old_a, new_a) = (root.get_path(&p("a")).unwrap(), out.get_path(&p("a")).unwrap());
        assert!(!old_a.same_ref(new_a));
        assert!(!root
            .get_path(&p("a.b"))
            .unwrap()
            .same_ref(out.get_path(&p("a.b")).unwrap()));
        assert!(root
            .get_path(&p("a.side"))
            .unwrap()
            .same_ref(out.get_path(&p("a.side")).unwrap()));
        assert!(root
            .get_path(&p("other"))
            .unwrap()
            .same_ref(out.get_path(&p("other")).unwrap()));
    }

    #[test]
    fn test_write_keeps_key_order() {
        let out = write(&state!({"x": 1, "y": 2}), &p("x"), state!(3)).unwrap();
        let keys: Vec<&String> = out.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["x", "y"]);
    }

    #[test]
    fn test_delete_object_key() {
        let root = state!({"a": {"b": 1, "c": 2}});
        let out = delete(&root, &p("a.b")).unwrap();
        assert_eq!(out, state!({"a": {"c": 2}}));
    }

    #[test]
    fn test_delete_missing_is_none() {
        let root = state!({"a": {"b": 1}});
        assert!(delete(&root, &p("a.x")).is_none());
        assert!(delete(&root, &p("a.b.c")).is_none());
        assert!(delete(&root, &p("z.y")).is_none());
    }

    #[test]
    fn test_delete_array_element_leaves_hole() {
        let root = state!({"a": [1, 2, 3]});
        let out = delete(&root, &p("a.1")).unwrap();
        assert_eq!(out, state!({"a": [1, null, 3]}));
        assert_eq!(deletion_result(&root, &p("a.1")), Some(StateValue::Null));
        assert_eq!(deletion_result(&root, &p("a.7")), None);
    }

    #[test]
    fn test_deletion_result_for_object_key() {
        assert_eq!(deletion_result(&state!({"a": {"b": 1}}), &p("a.b")), None);
        assert_eq!(deletion_result(&state!({"a": 1}), &Path::root()), None);
    }
}
