//! The live state tree.

use state_eventer_path::Path;
use state_eventer_value::StateValue;

use crate::error::Result;
use crate::identity;

/// Owns the live root. Every change swaps in a new root built by
/// [`identity`], so previously handed-out values are never modified.
#[derive(Debug)]
pub struct StateTree {
    root: StateValue,
}

impl Default for StateTree {
    fn default() -> Self {
        Self::new(StateValue::object())
    }
}

impl StateTree {
    pub fn new(root: StateValue) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &StateValue {
        &self.root
    }

    pub fn get(&self, path: &Path) -> Option<&StateValue> {
        self.root.get_path(path)
    }

    pub fn set(&mut self, path: &Path, value: StateValue) -> Result<()> {
        self.root = identity::write(&self.root, path, value)?;
        Ok(())
    }

    /// Returns whether anything was removed.
    pub fn delete(&mut self, path: &Path) -> bool {
        match identity::delete(&self.root, path) {
            Some(root) => {
                self.root = root;
                true
            }
            None => false,
        }
    }

    /// Swaps the whole tree; no path copying is involved.
    pub fn replace_root(&mut self, root: StateValue) {
        self.root = root;
    }
}
