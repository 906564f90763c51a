//! state-eventer-value - values stored in a state tree
//!
//! [`StateValue`] mirrors JSON, but arrays and objects sit behind `Rc` so
//! that reference identity is observable: a consumer holding a subtree can
//! tell "something under here changed" with [`StateValue::same_ref`] instead
//! of a deep comparison.

pub mod json_clone;
pub mod json_equal;
pub mod value;

pub use json_clone::{deep_clone, shares_no_containers};
pub use json_equal::{deep_equal, deep_equal_opt};
pub use value::{Map, StateValue};

#[doc(hidden)]
pub mod __private {
    pub use serde_json;
}

/// Builds a [`StateValue`] from JSON literal syntax.
///
/// ```
/// use state_eventer_value::state;
///
/// let value = state!({"a": {"b": [1, 2, null]}});
/// assert!(value.is_object());
/// ```
#[macro_export]
macro_rules! state {
    ($($json:tt)+) => {
        $crate::StateValue::from($crate::__private::serde_json::json!($($json)+))
    };
}
