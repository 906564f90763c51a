//! Pre-mutation baseline.

use state_eventer_path::Path;
use state_eventer_value::{deep_clone, StateValue};

/// A deep, independent copy of the live tree as of the last committed
/// mutation. No container in the snapshot is reachable from the live tree.
#[derive(Debug)]
pub struct Snapshot {
    root: StateValue,
}

impl Snapshot {
    pub fn of(live: &StateValue) -> Self {
        Self {
            root: deep_clone(live),
        }
    }

    pub fn refresh(&mut self, live: &StateValue) {
        self.root = deep_clone(live);
    }

    pub fn root(&self) -> &StateValue {
        &self.root
    }

    pub fn get(&self, path: &Path) -> Option<&StateValue> {
        self.root.get_path(path)
    }
}
