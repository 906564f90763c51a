use std::rc::Rc;

use serde_json::Number;

use crate::StateValue;

/// Performs a deep equality check between two state values.
///
/// This function compares values recursively, checking equality for:
/// - Primitives (null, bool, number, string); `1` and `1.0` are equal
/// - Arrays (element-by-element comparison)
/// - Objects (key-by-key comparison, order-insensitive)
///
/// Containers sharing an allocation are equal without descending.
///
/// # Examples
///
/// ```
/// use state_eventer_value::{deep_equal, state};
///
/// let a = state!({"foo": [1, 2, 3]});
/// let b = state!({"foo": [1, 2, 3]});
/// let c = state!({"foo": [1, 2, 4]});
///
/// assert!(deep_equal(&a, &b));
/// assert!(!deep_equal(&a, &c));
/// ```
pub fn deep_equal(a: &StateValue, b: &StateValue) -> bool {
    match (a, b) {
        (StateValue::Null, StateValue::Null) => true,
        (StateValue::Bool(a), StateValue::Bool(b)) => a == b,
        (StateValue::Number(a), StateValue::Number(b)) => number_equal(a, b),
        (StateValue::String(a), StateValue::String(b)) => a == b,

        (StateValue::Array(arr_a), StateValue::Array(arr_b)) => {
            if Rc::ptr_eq(arr_a, arr_b) {
                return true;
            }
            if arr_a.len() != arr_b.len() {
                return false;
            }
            arr_a.iter().zip(arr_b.iter()).all(|(x, y)| deep_equal(x, y))
        }

        (StateValue::Object(obj_a), StateValue::Object(obj_b)) => {
            if Rc::ptr_eq(obj_a, obj_b) {
                return true;
            }
            if obj_a.len() != obj_b.len() {
                return false;
            }
            for (key, val_a) in obj_a.iter() {
                match obj_b.get(key) {
                    Some(val_b) => {
                        if !deep_equal(val_a, val_b) {
                            return false;
                        }
                    }
                    None => return false,
                }
            }
            true
        }

        // Different types are never equal
        _ => false,
    }
}

/// Integers compare exactly; once either side is a float both are compared
/// as `f64`.
fn number_equal(a: &Number, b: &Number) -> bool {
    if a == b {
        return true;
    }
    if !(a.is_f64() || b.is_f64()) {
        return false;
    }
    matches!((a.as_f64(), b.as_f64()), (Some(x), Some(y)) if x == y)
}

/// Deep equality over possibly-absent values.
///
/// Absent equals only absent; `Some(Null)` is a present value.
pub fn deep_equal_opt(a: Option<&StateValue>, b: Option<&StateValue>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => deep_equal(a, b),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state;

    #[test]
    fn test_equal_numbers() {
        assert!(deep_equal(&state!(1), &state!(1)));
    }

    #[test]
    fn test_not_equal_numbers() {
        assert!(!deep_equal(&state!(1), &state!(2)));
    }

    #[test]
    fn test_integer_equals_float_spelling() {
        assert!(deep_equal(&state!(1), &state!(1.0)));
        assert!(deep_equal(&state!({"a": [0, -2]}), &state!({"a": [0.0, -2.0]})));
        assert!(!deep_equal(&state!(1), &state!(1.5)));
    }

    #[test]
    fn test_large_integers_compare_exactly() {
        let a = StateValue::from(9_007_199_254_740_993_u64);
        let b = StateValue::from(9_007_199_254_740_992_u64);
        assert!(!deep_equal(&a, &b));
    }

    #[test]
    fn test_number_and_array_not_equal() {
        assert!(!deep_equal(&state!(1), &state!([])));
    }

    #[test]
    fn test_zero_and_null_not_equal() {
        assert!(!deep_equal(&state!(0), &state!(null)));
    }

    #[test]
    fn test_empty_string_and_null_not_equal() {
        assert!(!deep_equal(&state!(""), &state!(null)));
    }

    #[test]
    fn test_one_and_true_not_equal() {
        assert!(!deep_equal(&state!(1), &state!(true)));
    }

    #[test]
    fn test_equal_objects_different_order() {
        assert!(deep_equal(
            &state!({"a": 1, "b": "2"}),
            &state!({"b": "2", "a": 1})
        ));
    }

    #[test]
    fn test_not_equal_objects_extra_property() {
        assert!(!deep_equal(
            &state!({"a": 1, "b": "2"}),
            &state!({"a": 1, "b": "2", "c": []})
        ));
    }

    #[test]
    fn test_not_equal_objects_different_properties() {
        assert!(!deep_equal(
            &state!({"a": 1, "b": "2", "c": 3}),
            &state!({"a": 1, "b": "2", "d": 3})
        ));
    }

    #[test]
    fn test_empty_object_and_array_not_equal() {
        assert!(!deep_equal(&state!({}), &state!([])));
    }

    #[test]
    fn test_not_equal_arrays_different_length() {
        assert!(!deep_equal(&state!([1, 2, 3]), &state!([1, 2])));
    }

    #[test]
    fn test_not_equal_arrays_of_objects() {
        assert!(!deep_equal(
            &state!([{"a": "a"}, {"b": "b"}]),
            &state!([{"a": "a"}, {"b": "c"}])
        ));
    }

    #[test]
    fn test_shared_allocation_is_equal() {
        let a = state!({"big": [1, 2, 3]});
        let b = a.clone();
        assert!(deep_equal(&a, &b));
    }

    #[test]
    fn test_deep_equal_opt() {
        let one = state!(1);
        let null = state!(null);
        assert!(deep_equal_opt(None, None));
        assert!(deep_equal_opt(Some(&one), Some(&state!(1))));
        assert!(!deep_equal_opt(Some(&null), None));
        assert!(!deep_equal_opt(None, Some(&one)));
    }

    #[test]
    fn test_big_object() {
        let a = state!({
            "prop1": "value1",
            "prop4": {
                "subProp1": "sub value1",
                "subProp2": {
                    "subSubProp1": "sub sub value1",
                    "subSubProp2": [1, 2, {"prop2": 1, "prop": 2}, 4, 5]
                }
            },
            "prop5": 1000
        });
        let b = state!({
            "prop5": 1000,
            "prop1": "value1",
            "prop4": {
                "subProp2": {
                    "subSubProp1": "sub sub value1",
                    "subSubProp2": [1, 2, {"prop2": 1, "prop": 2}, 4, 5]
                },
                "subProp1": "sub value1"
            }
        });
        assert!(deep_equal(&a, &b));
    }
}
