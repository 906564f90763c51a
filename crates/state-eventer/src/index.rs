//! Listener registry keyed by canonical path.
//!
//! A flat map from canonical path string to the listeners registered there.
//! Prefix and ancestor lookups scan the registered keys, which stays cheap
//! while listener counts are small.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;
use state_eventer_path::Path;

use crate::event::ChangeEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

pub type Callback = Rc<dyn Fn(&ChangeEvent)>;

/// One registration. Identity is the `id`; registering the same callback
/// twice at a path yields two records.
#[derive(Clone)]
pub struct ListenerRecord {
    pub id: ListenerId,
    pub path: Path,
    callback: Callback,
}

impl ListenerRecord {
    pub fn call(&self, event: &ChangeEvent) {
        (self.callback)(event)
    }
}

impl fmt::Debug for ListenerRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRecord")
            .field("id", &self.id)
            .field("path", &self.path.as_str())
            .finish_non_exhaustive()
    }
}

struct PathEntry {
    path: Path,
    listeners: Vec<ListenerRecord>,
}

/// Registered listeners grouped by path.
///
/// Paths iterate in the order they were first registered; listeners at one
/// path iterate in registration order. A path with no listeners is never
/// present.
#[derive(Default)]
pub struct PathIndex {
    entries: IndexMap<String, PathEntry>,
    next_id: u64,
}

impl PathIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, path: Path, callback: Callback) -> ListenerRecord {
        self.next_id = self.next_id.saturating_add(1);
        let record = ListenerRecord {
            id: ListenerId(self.next_id),
            path: path.clone(),
            callback,
        };
        self.entries
            .entry(path.as_str().to_string())
            .or_insert_with(|| PathEntry {
                path,
                listeners: Vec::new(),
            })
            .listeners
            .push(record.clone());
        record
    }

    /// Removes the listener `id` at `path`. Unknown ids are a no-op.
    ///
    /// Returns whether a listener was removed.
    pub fn unsubscribe(&mut self, path: &Path, id: ListenerId) -> bool {
        let Some(entry) = self.entries.get_mut(path.as_str()) else {
            return false;
        };
        let Some(pos) = entry.listeners.iter().position(|r| r.id == id) else {
            return false;
        };
        entry.listeners.remove(pos);
        if entry.listeners.is_empty() {
            self.entries.shift_remove(path.as_str());
        }
        true
    }

    pub fn is_registered(&self, path: &Path, id: ListenerId) -> bool {
        self.entries
            .get(path.as_str())
            .is_some_and(|entry| entry.listeners.iter().any(|r| r.id == id))
    }

    pub fn all_registered_paths(&self) -> impl Iterator<Item = &Path> {
        self.entries.values().map(|entry| &entry.path)
    }

    pub fn exact(&self, path: &Path) -> &[ListenerRecord] {
        self.entries
            .get(path.as_str())
            .map(|entry| entry.listeners.as_slice())
            .unwrap_or(&[])
    }

    /// Registered paths strictly below `path`, in registration order.
    pub fn descendants_of<'a>(&'a self, path: &'a Path) -> impl Iterator<Item = &'a Path> + 'a {
        self.all_registered_paths()
            .filter(move |candidate| candidate.is_descendant_of(path))
    }

    /// Registered strict ancestors of `path`, nearest first, root last.
    pub fn ancestor_chain_of(&self, path: &Path) -> Vec<Path> {
        path.ancestors()
            .filter(|ancestor| self.entries.contains_key(ancestor.as_str()))
            .collect()
    }

    pub fn listener_count(&self, path: &Path) -> usize {
        self.exact(path).len()
    }

    pub fn path_count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Handle returned by `on`.
///
/// Holds only the listener id and a weak back-reference to the owning index.
/// Dropping the handle leaves the listener registered; call
/// [`Subscription::unsubscribe`] to remove it. Unsubscribing more than once,
/// or after the container is gone, does nothing.
#[derive(Debug, Clone)]
pub struct Subscription {
    id: ListenerId,
    path: Path,
    index: Weak<RefCell<PathIndex>>,
}

impl Subscription {
    pub(crate) fn new(index: &Rc<RefCell<PathIndex>>, record: &ListenerRecord) -> Self {
        Self {
            id: record.id,
            path: record.path.clone(),
            index: Rc::downgrade(index),
        }
    }

    pub fn id(&self) -> ListenerId {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_active(&self) -> bool {
        self.index
            .upgrade()
            .is_some_and(|index| index.borrow().is_registered(&self.path, self.id))
    }

    pub fn unsubscribe(&self) {
        if let Some(index) = self.index.upgrade() {
            let removed = index.borrow_mut().unsubscribe(&self.path, self.id);
            if removed {
                log::trace!("unsubscribed listener {} at `{}`", self.id, self.path);
            }
        }
    }
}
