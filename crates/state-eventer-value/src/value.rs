//! [`StateValue`], the value type stored in a state tree.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::Number;
use state_eventer_path::{IntoPath, Path, PathError, PathSegment};

/// Ordered object map used by [`StateValue::Object`].
pub type Map = IndexMap<String, StateValue>;

/// A JSON-shaped value whose containers are reference counted.
///
/// Cloning a `StateValue` is cheap: containers share their allocation, and
/// [`StateValue::same_ref`] tells whether two values point at the same
/// container. Containers are never mutated in place once shared, so a value
/// obtained from a tree stays valid after the tree changes.
#[derive(Debug, Clone, Default)]
pub enum StateValue {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Rc<Vec<StateValue>>),
    Object(Rc<Map>),
}

impl StateValue {
    /// An empty object.
    pub fn object() -> Self {
        StateValue::Object(Rc::new(Map::new()))
    }

    /// An empty array.
    pub fn array() -> Self {
        StateValue::Array(Rc::new(Vec::new()))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, StateValue::Null)
    }

    pub fn is_object(&self) -> bool {
        matches!(self, StateValue::Object(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, StateValue::Array(_))
    }

    /// True for arrays and objects.
    pub fn is_container(&self) -> bool {
        matches!(self, StateValue::Array(_) | StateValue::Object(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            StateValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            StateValue::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            StateValue::Number(n) => n.as_u64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            StateValue::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            StateValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[StateValue]> {
        match self {
            StateValue::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Map> {
        match self {
            StateValue::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Reference identity.
    ///
    /// Containers are identical when they share an allocation. Scalars have
    /// no identity of their own and compare by value.
    ///
    /// ```
    /// use state_eventer_value::{state, StateValue};
    ///
    /// let a = state!({"x": 1});
    /// let b = a.clone();
    /// let c = state!({"x": 1});
    /// assert!(a.same_ref(&b));
    /// assert!(!a.same_ref(&c));
    /// assert!(StateValue::from(1).same_ref(&StateValue::from(1)));
    /// ```
    pub fn same_ref(&self, other: &StateValue) -> bool {
        match (self, other) {
            (StateValue::Array(a), StateValue::Array(b)) => Rc::ptr_eq(a, b),
            (StateValue::Object(a), StateValue::Object(b)) => Rc::ptr_eq(a, b),
            (StateValue::Array(_) | StateValue::Object(_), _)
            | (_, StateValue::Array(_) | StateValue::Object(_)) => false,
            (a, b) => crate::deep_equal(a, b),
        }
    }

    /// Child of a container addressed by one segment.
    ///
    /// Keys over arrays resolve when they spell an index; indices over
    /// objects resolve their decimal key.
    pub fn child(&self, segment: &PathSegment) -> Option<&StateValue> {
        match self {
            StateValue::Array(items) => items.get(segment.as_index()?),
            StateValue::Object(map) => {
                let key = segment.as_key();
                map.get(&*key)
            }
            _ => None,
        }
    }

    /// Value at a relative segment path, or `None` when absent.
    ///
    /// Reading through a scalar is absent, never an error.
    pub fn get(&self, segments: &[PathSegment]) -> Option<&StateValue> {
        let mut current = self;
        for segment in segments {
            current = current.child(segment)?;
        }
        Some(current)
    }

    pub fn get_path(&self, path: &Path) -> Option<&StateValue> {
        self.get(path.segments())
    }

    /// Short name of the value kind, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            StateValue::Null => "null",
            StateValue::Bool(_) => "boolean",
            StateValue::Number(_) => "number",
            StateValue::String(_) => "string",
            StateValue::Array(_) => "array",
            StateValue::Object(_) => "object",
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::from(self)
    }
}

impl PartialEq for StateValue {
    fn eq(&self, other: &Self) -> bool {
        crate::deep_equal(self, other)
    }
}

impl fmt::Display for StateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

impl From<bool> for StateValue {
    fn from(b: bool) -> Self {
        StateValue::Bool(b)
    }
}

macro_rules! from_integer {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for StateValue {
                fn from(n: $ty) -> Self {
                    StateValue::Number(Number::from(n))
                }
            }
        )*
    };
}

from_integer!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl From<f64> for StateValue {
    /// Non-finite floats have no JSON form and become `Null`.
    fn from(f: f64) -> Self {
        Number::from_f64(f).map_or(StateValue::Null, StateValue::Number)
    }
}

impl From<&str> for StateValue {
    fn from(s: &str) -> Self {
        StateValue::String(s.to_string())
    }
}

impl From<String> for StateValue {
    fn from(s: String) -> Self {
        StateValue::String(s)
    }
}

impl From<Vec<StateValue>> for StateValue {
    fn from(items: Vec<StateValue>) -> Self {
        StateValue::Array(Rc::new(items))
    }
}

impl From<Map> for StateValue {
    fn from(map: Map) -> Self {
        StateValue::Object(Rc::new(map))
    }
}

impl<T: Into<StateValue>> From<Option<T>> for StateValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(StateValue::Null, Into::into)
    }
}

impl From<serde_json::Value> for StateValue {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => StateValue::Null,
            serde_json::Value::Bool(b) => StateValue::Bool(b),
            serde_json::Value::Number(n) => StateValue::Number(n),
            serde_json::Value::String(s) => StateValue::String(s),
            serde_json::Value::Array(arr) => {
                StateValue::from(arr.into_iter().map(StateValue::from).collect::<Vec<_>>())
            }
            serde_json::Value::Object(obj) => StateValue::from(
                obj.into_iter()
                    .map(|(k, v)| (k, StateValue::from(v)))
                    .collect::<Map>(),
            ),
        }
    }
}

impl From<&serde_json::Value> for StateValue {
    fn from(v: &serde_json::Value) -> Self {
        StateValue::from(v.clone())
    }
}

impl From<&StateValue> for serde_json::Value {
    fn from(v: &StateValue) -> Self {
        match v {
            StateValue::Null => serde_json::Value::Null,
            StateValue::Bool(b) => serde_json::Value::Bool(*b),
            StateValue::Number(n) => serde_json::Value::Number(n.clone()),
            StateValue::String(s) => serde_json::Value::String(s.clone()),
            StateValue::Array(items) => {
                serde_json::Value::Array(items.iter().map(serde_json::Value::from).collect())
            }
            StateValue::Object(map) => serde_json::Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), serde_json::Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<StateValue> for serde_json::Value {
    fn from(v: StateValue) -> Self {
        serde_json::Value::from(&v)
    }
}

impl Serialize for StateValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            StateValue::Null => serializer.serialize_unit(),
            StateValue::Bool(b) => serializer.serialize_bool(*b),
            StateValue::Number(n) => n.serialize(serializer),
            StateValue::String(s) => serializer.serialize_str(s),
            StateValue::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items.iter() {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            StateValue::Object(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map.iter() {
                    out.serialize_entry(k, v)?;
                }
                out.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for StateValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(StateValue::from)
    }
}

impl IntoPath for &StateValue {
    /// Strings parse as dot paths; arrays are explicit segment sequences.
    fn into_path(self) -> Result<Path, PathError> {
        match self {
            StateValue::String(s) => Path::parse(s),
            StateValue::Array(_) => Path::try_from(&self.to_json()),
            other => Err(PathError::InvalidPath {
                reason: format!("`path` must be a string or array, got {}", other.kind_name()),
            }),
        }
    }
}
