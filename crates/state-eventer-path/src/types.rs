//! Type definitions for state paths.

use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::{is_valid_index, PathError};

/// A single step in a [`Path`].
///
/// Object keys are `Key`, array positions are `Index`. A key made only of
/// canonical decimal digits is always normalized to `Index` when built from a
/// string, so `"0"` and `0` address the same location.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl PathSegment {
    /// Returns the array index this segment addresses, if any.
    ///
    /// A `Key` that spells a valid index (e.g. `"3"`) also resolves, since a
    /// key over an array is read as a position.
    pub fn as_index(&self) -> Option<usize> {
        match self {
            PathSegment::Index(idx) => Some(*idx),
            PathSegment::Key(key) if is_valid_index(key) => key.parse().ok(),
            PathSegment::Key(_) => None,
        }
    }

    /// Returns the object key this segment addresses.
    pub fn as_key(&self) -> Cow<'_, str> {
        match self {
            PathSegment::Key(key) => Cow::Borrowed(key.as_str()),
            PathSegment::Index(idx) => Cow::Owned(idx.to_string()),
        }
    }

    pub fn is_index(&self) -> bool {
        matches!(self, PathSegment::Index(_))
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => f.write_str(key),
            PathSegment::Index(idx) => write!(f, "{idx}"),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(step: &str) -> Self {
        if is_valid_index(step) {
            if let Ok(idx) = step.parse() {
                return PathSegment::Index(idx);
            }
        }
        PathSegment::Key(step.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(step: String) -> Self {
        if is_valid_index(&step) {
            if let Ok(idx) = step.parse() {
                return PathSegment::Index(idx);
            }
        }
        PathSegment::Key(step)
    }
}

impl From<usize> for PathSegment {
    fn from(idx: usize) -> Self {
        PathSegment::Index(idx)
    }
}

/// A normalized location in a state tree.
///
/// Two paths are equal iff their canonical dot-joined strings are equal.
/// The empty path is the root.
#[derive(Debug, Clone, Default)]
pub struct Path {
    segments: Vec<PathSegment>,
    canonical: String,
}

impl Path {
    /// The root path (no segments, canonical form `""`).
    pub fn root() -> Self {
        Self::default()
    }

    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<PathSegment>,
    {
        let segments: Vec<PathSegment> = segments.into_iter().map(Into::into).collect();
        let canonical = crate::format_path(&segments);
        Self {
            segments,
            canonical,
        }
    }

    /// Parses a dot string; see [`crate::parse_path`].
    pub fn parse(path: &str) -> Result<Self, PathError> {
        crate::parse_path(path).map(Self::from_segments)
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// The canonical dot-joined form.
    pub fn as_str(&self) -> &str {
        &self.canonical
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns the parent path.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::NoParent`] for the root.
    pub fn parent(&self) -> Result<Path, PathError> {
        if self.segments.is_empty() {
            return Err(PathError::NoParent);
        }
        Ok(Self::from_segments(
            self.segments[..self.segments.len() - 1].iter().cloned(),
        ))
    }

    pub fn child(&self, segment: impl Into<PathSegment>) -> Path {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Self::from_segments(segments)
    }

    /// True when `self` is a strict prefix of `other`.
    ///
    /// The root is an ancestor of every non-root path.
    pub fn is_ancestor_of(&self, other: &Path) -> bool {
        crate::is_child(&self.segments, &other.segments)
    }

    /// True when `other` is a strict prefix of `self`.
    pub fn is_descendant_of(&self, other: &Path) -> bool {
        other.is_ancestor_of(self)
    }

    /// Returns the segments of `self` below `ancestor`, or `None` when
    /// `ancestor` is not a prefix of `self`. Equal paths yield an empty slice.
    pub fn strip_prefix(&self, ancestor: &Path) -> Option<&[PathSegment]> {
        if ancestor.segments.len() > self.segments.len() {
            return None;
        }
        if ancestor.is_root() {
            return Some(&self.segments);
        }
        for (a, b) in ancestor.segments.iter().zip(&self.segments) {
            if a.as_key() != b.as_key() {
                return None;
            }
        }
        Some(&self.segments[ancestor.segments.len()..])
    }

    /// Strict ancestors, nearest first, ending with the root.
    ///
    /// ```
    /// use state_eventer_path::Path;
    ///
    /// let path = Path::parse("a.b.c").unwrap();
    /// let chain: Vec<String> = path.ancestors().map(|p| p.as_str().to_string()).collect();
    /// assert_eq!(chain, vec!["a.b", "a", ""]);
    /// ```
    pub fn ancestors(&self) -> impl Iterator<Item = Path> + '_ {
        (0..self.segments.len())
            .rev()
            .map(move |len| Self::from_segments(self.segments[..len].iter().cloned()))
    }
}

impl PartialEq for Path {
    fn eq(&self, other: &Self) -> bool {
        self.canonical == other.canonical
    }
}

impl Eq for Path {}

impl Hash for Path {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical.hash(state);
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical)
    }
}

impl AsRef<str> for Path {
    fn as_ref(&self) -> &str {
        &self.canonical
    }
}
