//! Path utilities for state-eventer.
//!
//! A path is an ordered sequence of object keys and array indices. Callers
//! hand paths in as dot strings (`"a.b.0"`, with `a.b[0]` accepted as sugar)
//! or as explicit segment sequences; both normalize to the same canonical
//! dot-joined string.
//!
//! # Example
//!
//! ```
//! use state_eventer_path::{parse_path, format_path, Path, PathSegment};
//!
//! let segments = parse_path("todos[1].done").unwrap();
//! assert_eq!(
//!     segments,
//!     vec![
//!         PathSegment::Key("todos".to_string()),
//!         PathSegment::Index(1),
//!         PathSegment::Key("done".to_string()),
//!     ]
//! );
//! assert_eq!(format_path(&segments), "todos.1.done");
//!
//! let path = Path::from_segments(["todos", "1", "done"]);
//! assert_eq!(path, Path::parse("todos.1.done").unwrap());
//! ```

use serde_json::Value;
use thiserror::Error;

pub mod types;
pub use types::{Path, PathSegment};

/// Separator between segments in the canonical form.
pub const SEPARATOR: char = '.';

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("invalid path: {reason}")]
    InvalidPath { reason: String },
    #[error("invalid path segment `{segment}`")]
    InvalidSegment { segment: String },
    #[error("root path has no parent")]
    NoParent,
}

/// Check if a string is a canonical non-negative array index.
///
/// # Example
///
/// ```
/// use state_eventer_path::is_valid_index;
///
/// assert!(is_valid_index("0"));
/// assert!(is_valid_index("123"));
/// assert!(!is_valid_index("-1"));
/// assert!(!is_valid_index("01"));
/// assert!(!is_valid_index(""));
/// ```
pub fn is_valid_index(index: &str) -> bool {
    if index.is_empty() {
        return false;
    }
    let bytes = index.as_bytes();
    if bytes.len() > 1 && bytes[0] == b'0' {
        return false;
    }
    bytes.iter().all(|&b| b.is_ascii_digit())
}

/// Parse a dot string into segments.
///
/// - The empty string is the root (no segments).
/// - Segments are split on `.`; `a..b` has an empty key in the middle.
/// - Bracketed indices are split out: `a[0][1]` is `a.0.1`.
/// - Canonical digit runs become [`PathSegment::Index`].
///
/// # Errors
///
/// Returns [`PathError::InvalidSegment`] for unbalanced brackets or a bracket
/// that does not hold an index.
pub fn parse_path(path: &str) -> Result<Vec<PathSegment>, PathError> {
    if path.is_empty() {
        return Ok(Vec::new());
    }
    let mut out = Vec::new();
    for part in path.split(SEPARATOR) {
        parse_part(part, &mut out)?;
    }
    Ok(out)
}

fn parse_part(part: &str, out: &mut Vec<PathSegment>) -> Result<(), PathError> {
    let invalid = || PathError::InvalidSegment {
        segment: part.to_string(),
    };
    let Some(open) = part.find('[') else {
        if part.contains(']') {
            return Err(invalid());
        }
        out.push(PathSegment::from(part));
        return Ok(());
    };

    let head = &part[..open];
    if head.contains(']') {
        return Err(invalid());
    }
    if !head.is_empty() {
        out.push(PathSegment::from(head));
    }

    let mut rest = &part[open..];
    while !rest.is_empty() {
        let inner = rest.strip_prefix('[').ok_or_else(invalid)?;
        let close = inner.find(']').ok_or_else(invalid)?;
        let index = &inner[..close];
        if !is_valid_index(index) {
            return Err(invalid());
        }
        let idx = index.parse().map_err(|_| invalid())?;
        out.push(PathSegment::Index(idx));
        rest = &inner[close + 1..];
    }
    Ok(())
}

/// Format segments into the canonical dot string.
///
/// Returns an empty string for the root.
///
/// # Example
///
/// ```
/// use state_eventer_path::{format_path, PathSegment};
///
/// assert_eq!(format_path(&[]), "");
/// assert_eq!(format_path(&[PathSegment::from("a"), PathSegment::Index(2)]), "a.2");
/// ```
pub fn format_path(segments: &[PathSegment]) -> String {
    let mut out = String::new();
    for (i, segment) in segments.iter().enumerate() {
        if i > 0 {
            out.push(SEPARATOR);
        }
        out.push_str(&segment.as_key());
    }
    out
}

/// Check if `parent` is a strict prefix of `child`.
///
/// # Example
///
/// ```
/// use state_eventer_path::{is_child, PathSegment};
///
/// let parent = vec![PathSegment::from("foo")];
/// let child = vec![PathSegment::from("foo"), PathSegment::from("bar")];
/// assert!(is_child(&parent, &child));
/// assert!(!is_child(&child, &parent));
/// ```
pub fn is_child(parent: &[PathSegment], child: &[PathSegment]) -> bool {
    if parent.len() >= child.len() {
        return false;
    }
    parent
        .iter()
        .zip(child)
        .all(|(a, b)| a.as_key() == b.as_key())
}

/// Conversion into a normalized [`Path`].
///
/// Implemented for dot strings, segment sequences, existing paths and
/// dynamic JSON values. Dynamic values that are neither a string nor an array
/// fail with [`PathError::InvalidPath`].
pub trait IntoPath {
    fn into_path(self) -> Result<Path, PathError>;
}

impl IntoPath for Path {
    fn into_path(self) -> Result<Path, PathError> {
        Ok(self)
    }
}

impl IntoPath for &Path {
    fn into_path(self) -> Result<Path, PathError> {
        Ok(self.clone())
    }
}

impl IntoPath for &str {
    fn into_path(self) -> Result<Path, PathError> {
        Path::parse(self)
    }
}

impl IntoPath for String {
    fn into_path(self) -> Result<Path, PathError> {
        Path::parse(&self)
    }
}

impl IntoPath for &String {
    fn into_path(self) -> Result<Path, PathError> {
        Path::parse(self)
    }
}

impl IntoPath for Vec<PathSegment> {
    fn into_path(self) -> Result<Path, PathError> {
        Ok(Path::from_segments(self))
    }
}

impl IntoPath for &[PathSegment] {
    fn into_path(self) -> Result<Path, PathError> {
        Ok(Path::from_segments(self.iter().cloned()))
    }
}

impl<const N: usize> IntoPath for [PathSegment; N] {
    fn into_path(self) -> Result<Path, PathError> {
        Ok(Path::from_segments(self))
    }
}

impl<const N: usize> IntoPath for [&str; N] {
    fn into_path(self) -> Result<Path, PathError> {
        Ok(Path::from_segments(self))
    }
}

impl IntoPath for Vec<&str> {
    fn into_path(self) -> Result<Path, PathError> {
        Ok(Path::from_segments(self))
    }
}

impl IntoPath for &Value {
    fn into_path(self) -> Result<Path, PathError> {
        Path::try_from(self)
    }
}

impl TryFrom<&Value> for Path {
    type Error = PathError;

    /// A string is parsed as a dot path; an array is an explicit segment
    /// sequence of strings and non-negative integers.
    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match value {
            Value::String(s) => Path::parse(s),
            Value::Array(items) => {
                let mut segments = Vec::with_capacity(items.len());
                for item in items {
                    segments.push(segment_from_value(item)?);
                }
                Ok(Path::from_segments(segments))
            }
            other => Err(PathError::InvalidPath {
                reason: format!("`path` must be a string or array, got {}", kind_name(other)),
            }),
        }
    }
}

fn segment_from_value(value: &Value) -> Result<PathSegment, PathError> {
    match value {
        Value::String(s) => Ok(PathSegment::from(s.as_str())),
        Value::Number(n) => n
            .as_u64()
            .and_then(|n| usize::try_from(n).ok())
            .map(PathSegment::Index)
            .ok_or_else(|| PathError::InvalidSegment {
                segment: n.to_string(),
            }),
        other => Err(PathError::InvalidSegment {
            segment: other.to_string(),
        }),
    }
}

/// Short name of a JSON value kind, used in error messages.
pub fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
