//! The public container.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use serde_json::Value;
use state_eventer_path::{IntoPath, Path};
use state_eventer_value::StateValue;

use crate::config::{EventerConfig, ReentrancyMode};
use crate::detector::{ChangeDetector, Mutation};
use crate::dispatch::{self, Delivery, Dispatcher};
use crate::error::{Result, StateError};
use crate::event::ChangeEvent;
use crate::index::{ListenerId, PathIndex, Subscription};
use crate::snapshot::Snapshot;
use crate::tree::StateTree;

/// A hierarchical state tree with path-scoped change listeners.
///
/// Cloning is cheap and yields another handle to the same container, which
/// is how a listener callback gets to read or mutate the state that
/// notified it.
///
/// ```
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use state_eventer::{state, StateEventer};
///
/// let store = StateEventer::new();
/// let seen = Rc::new(RefCell::new(Vec::new()));
/// let sink = Rc::clone(&seen);
/// store
///     .on("a", move |event| sink.borrow_mut().push(event.value.clone()))
///     .unwrap();
///
/// store.set("a.b", 1).unwrap();
/// store.set("a.b", 1).unwrap();
/// assert_eq!(*seen.borrow(), vec![Some(state!({"b": 1}))]);
/// ```
#[derive(Clone)]
pub struct StateEventer {
    inner: Rc<Inner>,
}

struct Inner {
    config: EventerConfig,
    tree: RefCell<StateTree>,
    snapshot: RefCell<Snapshot>,
    index: Rc<RefCell<PathIndex>>,
    /// Dispatch batches currently on the stack.
    depth: Cell<usize>,
    pending: RefCell<VecDeque<Mutation>>,
}

impl Default for StateEventer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StateEventer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateEventer")
            .field("root", self.inner.tree.borrow().root())
            .field("paths", &self.path_count())
            .field("config", &self.inner.config)
            .finish()
    }
}

impl StateEventer {
    /// An empty object root with the default configuration.
    pub fn new() -> Self {
        Self::with_config(EventerConfig::default())
    }

    pub fn with_config(config: EventerConfig) -> Self {
        Self::build(StateValue::object(), config)
    }

    pub fn with_root(root: impl Into<StateValue>) -> Self {
        Self::build(root.into(), EventerConfig::default())
    }

    pub fn with_root_and_config(root: impl Into<StateValue>, config: EventerConfig) -> Self {
        Self::build(root.into(), config)
    }

    fn build(root: StateValue, config: EventerConfig) -> Self {
        let snapshot = Snapshot::of(&root);
        Self {
            inner: Rc::new(Inner {
                config,
                tree: RefCell::new(StateTree::new(root)),
                snapshot: RefCell::new(snapshot),
                index: Rc::new(RefCell::new(PathIndex::new())),
                depth: Cell::new(0),
                pending: RefCell::new(VecDeque::new()),
            }),
        }
    }

    pub fn config(&self) -> &EventerConfig {
        &self.inner.config
    }

    // ----------------------------------------------------------------- reads

    /// The whole tree.
    pub fn root(&self) -> StateValue {
        self.inner.tree.borrow().root().clone()
    }

    /// The value at `path`, or `None` when nothing is there.
    ///
    /// Containers come back as shared references into the live tree:
    /// [`StateValue::same_ref`] on two reads tells whether anything beneath
    /// changed in between.
    pub fn get(&self, path: impl IntoPath) -> Result<Option<StateValue>> {
        let path = path.into_path()?;
        Ok(self.inner.tree.borrow().get(&path).cloned())
    }

    /// Like [`get`](Self::get) but substitutes `default` for an absent value.
    /// Nothing is written.
    pub fn get_or(&self, path: impl IntoPath, default: impl Into<StateValue>) -> Result<StateValue> {
        Ok(self.get(path)?.unwrap_or_else(|| default.into()))
    }

    // ------------------------------------------------------------- mutations

    /// Writes `value` at `path`. Writing the empty path replaces the root.
    ///
    /// Listeners fire before this returns. Writing a value deep-equal to the
    /// current one does nothing at all: no notifications and no new
    /// container references.
    ///
    /// # Errors
    ///
    /// [`StateError::Path`] for an unparsable path and
    /// [`StateError::PathConflict`] when a key addresses an existing array.
    pub fn set(&self, path: impl IntoPath, value: impl Into<StateValue>) -> Result<()> {
        let path = path.into_path()?;
        self.mutate(Mutation::set(path, value.into()))
    }

    /// Replaces the whole tree.
    pub fn set_root(&self, value: impl Into<StateValue>) -> Result<()> {
        self.mutate(Mutation::ReplaceRoot {
            value: value.into(),
        })
    }

    /// `set` for callers holding a path only as runtime data.
    ///
    /// A JSON object `target` is itself the new root and `value` is ignored.
    /// A string or array `target` is a path. Anything else is an invalid
    /// path.
    pub fn set_dynamic(&self, target: &Value, value: impl Into<StateValue>) -> Result<()> {
        if target.is_object() {
            return self.set_root(StateValue::from(target));
        }
        let path = Path::try_from(target)?;
        self.set(path, value)
    }

    /// Removes the value at `path`. Object keys disappear; array elements
    /// become `null` so later indices keep their meaning. Unsetting an absent
    /// path does nothing.
    pub fn unset(&self, path: impl IntoPath) -> Result<()> {
        let path = path.into_path()?;
        self.mutate(Mutation::delete(path))
    }

    /// Reads `path`, applies `f` and writes the result back.
    pub fn update<F>(&self, path: impl IntoPath, f: F) -> Result<()>
    where
        F: FnOnce(Option<StateValue>) -> StateValue,
    {
        let path = path.into_path()?;
        let current = self.inner.tree.borrow().get(&path).cloned();
        self.mutate(Mutation::set(path, f(current)))
    }

    /// [`update`](Self::update) with `default` standing in for an absent
    /// value.
    pub fn update_or<F>(&self, path: impl IntoPath, default: impl Into<StateValue>, f: F) -> Result<()>
    where
        F: FnOnce(StateValue) -> StateValue,
    {
        let default = default.into();
        self.update(path, |current| f(current.unwrap_or(default)))
    }

    // ------------------------------------------------------------- listeners

    /// Registers `callback` at `path`.
    ///
    /// The callback fires whenever the value observed at `path` changes:
    /// through a write at `path`, beneath it, or above it. Dropping the
    /// returned [`Subscription`] keeps the listener registered.
    pub fn on<F>(&self, path: impl IntoPath, callback: F) -> Result<Subscription>
    where
        F: Fn(&ChangeEvent) + 'static,
    {
        let path = path.into_path()?;
        let record = self.inner.index.borrow_mut().register(path, Rc::new(callback));
        log::trace!("registered listener {} at `{}`", record.id, record.path);
        Ok(Subscription::new(&self.inner.index, &record))
    }

    /// Returns whether a listener was removed.
    pub fn remove_listener(&self, path: impl IntoPath, id: ListenerId) -> Result<bool> {
        let path = path.into_path()?;
        Ok(self.inner.index.borrow_mut().unsubscribe(&path, id))
    }

    /// Paths with at least one listener, in registration order.
    pub fn registered_paths(&self) -> Vec<Path> {
        self.inner
            .index
            .borrow()
            .all_registered_paths()
            .cloned()
            .collect()
    }

    pub fn listener_count(&self, path: impl IntoPath) -> Result<usize> {
        let path = path.into_path()?;
        Ok(self.inner.index.borrow().listener_count(&path))
    }

    pub fn path_count(&self) -> usize {
        self.inner.index.borrow().path_count()
    }

    // -------------------------------------------------------------- engine

    fn mutate(&self, mutation: Mutation) -> Result<()> {
        let inner = &self.inner;
        if inner.depth.get() > 0 && inner.config.reentrancy == ReentrancyMode::Deferred {
            log::debug!("deferring {mutation} until the current batch finishes");
            inner.pending.borrow_mut().push_back(mutation);
            return Ok(());
        }
        self.run_cycle(&mutation)?;
        if inner.depth.get() == 0 {
            self.drain_pending();
        }
        Ok(())
    }

    fn drain_pending(&self) {
        loop {
            let next = self.inner.pending.borrow_mut().pop_front();
            let Some(mutation) = next else {
                break;
            };
            log::debug!("processing deferred {mutation}");
            if let Err(err) = self.run_cycle(&mutation) {
                log::warn!("deferred {mutation} failed: {err}");
            }
        }
    }

    fn run_cycle(&self, mutation: &Mutation) -> Result<()> {
        let inner = &self.inner;
        let max = inner.config.max_reentrancy_depth;
        if inner.depth.get() > max {
            return Err(StateError::ReentrancyLimit { depth: max });
        }

        let Some(deliveries) = self.commit(mutation)? else {
            log::debug!("{mutation} left the state unchanged");
            return Ok(());
        };
        log::debug!("{mutation} committed, {} deliveries", deliveries.len());

        let _depth = DepthGuard::enter(&inner.depth);
        let report = Dispatcher::new(&inner.index, inner.config.catch_listener_panics)
            .dispatch(deliveries);
        log::debug!(
            "{mutation}: delivered {}, skipped {}, panicked {}",
            report.delivered,
            report.skipped,
            report.panicked
        );
        Ok(())
    }

    /// Detects, applies and snapshots one mutation. `None` for a no-op.
    ///
    /// Every borrow taken here is released before listeners run.
    fn commit(&self, mutation: &Mutation) -> Result<Option<Vec<Delivery>>> {
        let inner = &self.inner;
        let mut tree = inner.tree.borrow_mut();
        let mut snapshot = inner.snapshot.borrow_mut();

        let notifications = {
            let index = inner.index.borrow();
            let detector = ChangeDetector::new(&index, &tree, &snapshot);
            if detector.is_noop(mutation) {
                return Ok(None);
            }
            detector.detect(mutation)?
        };

        match mutation {
            Mutation::Set { path, value } => tree.set(path, value.clone())?,
            Mutation::Delete { path } => {
                tree.delete(path);
            }
            Mutation::ReplaceRoot { value } => tree.replace_root(value.clone()),
        }
        snapshot.refresh(tree.root());

        Ok(Some(dispatch::plan(notifications, &tree)))
    }
}

struct DepthGuard<'a>(&'a Cell<usize>);

impl<'a> DepthGuard<'a> {
    fn enter(depth: &'a Cell<usize>) -> Self {
        depth.set(depth.get() + 1);
        Self(depth)
    }
}

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        self.0.set(self.0.get().saturating_sub(1));
    }
}
