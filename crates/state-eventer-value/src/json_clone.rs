use std::rc::Rc;

use crate::StateValue;

/// Creates a deep clone of a state value.
///
/// Every nested array and object gets a fresh allocation, so the result
/// shares no container with `value`.
///
/// # Examples
///
/// ```
/// use state_eventer_value::{deep_clone, state};
///
/// let original = state!({"foo": [1, 2, 3]});
/// let cloned = deep_clone(&original);
///
/// assert_eq!(original, cloned);
/// assert!(!original.same_ref(&cloned));
/// ```
pub fn deep_clone(value: &StateValue) -> StateValue {
    match value {
        StateValue::Array(items) => {
            StateValue::Array(Rc::new(items.iter().map(deep_clone).collect()))
        }
        StateValue::Object(map) => StateValue::Object(Rc::new(
            map.iter().map(|(k, v)| (k.clone(), deep_clone(v))).collect(),
        )),
        scalar => scalar.clone(),
    }
}

/// True when no container reachable from `a` is also reachable from `b`.
pub fn shares_no_containers(a: &StateValue, b: &StateValue) -> bool {
    let mut left = Vec::new();
    collect_containers(a, &mut left);
    let mut right = Vec::new();
    collect_containers(b, &mut right);
    left.iter().all(|ptr| !right.contains(ptr))
}

fn collect_containers(value: &StateValue, out: &mut Vec<*const ()>) {
    match value {
        StateValue::Array(items) => {
            out.push(Rc::as_ptr(items) as *const ());
            for item in items.iter() {
                collect_containers(item, out);
            }
        }
        StateValue::Object(map) => {
            out.push(Rc::as_ptr(map) as *const ());
            for item in map.values() {
                collect_containers(item, out);
            }
        }
        _ => {}
    }
}
