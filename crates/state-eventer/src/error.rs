//! Error types for state-eventer.

use state_eventer_path::PathError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error(transparent)]
    Path(#[from] PathError),
    #[error("cannot address key `{segment}` inside the array at `{path}`")]
    PathConflict { path: String, segment: String },
    #[error("index {index} at `{path}` is more than {limit} slots past the end of the array")]
    IndexOutOfRange {
        path: String,
        index: usize,
        limit: usize,
    },
    #[error("listener reentrancy exceeded {depth} nested mutations")]
    ReentrancyLimit { depth: usize },
}

impl StateError {
    pub fn is_invalid_path(&self) -> bool {
        matches!(
            self,
            StateError::Path(PathError::InvalidPath { .. } | PathError::InvalidSegment { .. })
        )
    }
}

pub type Result<T> = std::result::Result<T, StateError>;
