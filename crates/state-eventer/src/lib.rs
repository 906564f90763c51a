//! state-eventer - a hierarchical state tree whose listeners fire when the
//! value they observe changes.
//!
//! Listeners are registered at a path. A mutation at one path notifies:
//!
//! - listeners at exactly that path,
//! - listeners beneath it whose value differs under the new subtree,
//! - listeners above it, nearest first, whose value (now containing the
//!   change) differs from before.
//!
//! Every container on a mutated path gets a new reference and every
//! container off it keeps its old one, so consumers can skip work with a
//! reference comparison ([`StateValue::same_ref`]). Writing a value equal to
//! the current one is a complete no-op.
//!
//! # Example
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use state_eventer::{state, StateEventer};
//!
//! let store = StateEventer::new();
//! let hits = Rc::new(Cell::new(0));
//! let counter = Rc::clone(&hits);
//! let sub = store.on("user", move |_| counter.set(counter.get() + 1)).unwrap();
//!
//! store.set("user.name", "ada").unwrap();
//! store.set("user.name", "ada").unwrap();
//! store.set("other", 1).unwrap();
//! assert_eq!(hits.get(), 1);
//!
//! sub.unsubscribe();
//! store.set("user", state!({})).unwrap();
//! assert_eq!(hits.get(), 1);
//! ```

pub mod config;
pub mod detector;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod eventer;
pub mod identity;
pub mod index;
pub mod snapshot;
pub mod tree;

pub use config::{EventerConfig, ReentrancyMode, DEFAULT_MAX_REENTRANCY_DEPTH};
pub use error::{Result, StateError};
pub use event::ChangeEvent;
pub use eventer::StateEventer;
pub use index::{ListenerId, Subscription};

pub use state_eventer_path::{IntoPath, Path, PathError, PathSegment};
pub use state_eventer_value::{deep_clone, deep_equal, state, Map, StateValue};
