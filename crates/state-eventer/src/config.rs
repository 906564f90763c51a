//! Container configuration.
//!
//! `EventerConfig` deserializes from any serde format; every field is
//! optional and falls back to [`EventerConfig::default`].

use serde::{Deserialize, Serialize};

/// Default cap on nested mutate-from-listener cycles.
pub const DEFAULT_MAX_REENTRANCY_DEPTH: usize = 64;

/// How a mutation requested from inside a listener callback is processed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReentrancyMode {
    /// Run a full nested detect/commit/dispatch cycle before the callback
    /// regains control.
    #[default]
    Immediate,
    /// Queue the mutation and process it after the in-flight batch finishes,
    /// before the outermost mutating call returns.
    Deferred,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventerConfig {
    pub reentrancy: ReentrancyMode,
    /// Catch listener panics, log them and keep dispatching.
    pub catch_listener_panics: bool,
    pub max_reentrancy_depth: usize,
}

impl Default for EventerConfig {
    fn default() -> Self {
        Self {
            reentrancy: ReentrancyMode::Immediate,
            catch_listener_panics: true,
            max_reentrancy_depth: DEFAULT_MAX_REENTRANCY_DEPTH,
        }
    }
}

impl EventerConfig {
    pub fn deferred() -> Self {
        Self {
            reentrancy: ReentrancyMode::Deferred,
            ..Self::default()
        }
    }

    pub fn with_reentrancy(mut self, mode: ReentrancyMode) -> Self {
        self.reentrancy = mode;
        self
    }

    pub fn with_catch_listener_panics(mut self, catch: bool) -> Self {
        self.catch_listener_panics = catch;
        self
    }

    pub fn with_max_reentrancy_depth(mut self, depth: usize) -> Self {
        self.max_reentrancy_depth = depth;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EventerConfig::default();
        assert_eq!(config.reentrancy, ReentrancyMode::Immediate);
        assert!(config.catch_listener_panics);
        assert_eq!(config.max_reentrancy_depth, DEFAULT_MAX_REENTRANCY_DEPTH);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: EventerConfig = serde_json::from_str(r#"{"reentrancy": "deferred"}"#).unwrap();
        assert_eq!(config, EventerConfig::deferred());
    }

    #[test]
    fn test_unknown_mode_rejected() {
        let result: Result<EventerConfig, _> = serde_json::from_str(r#"{"reentrancy": "lazy"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_builder() {
        let config = EventerConfig::default()
            .with_catch_listener_panics(false)
            .with_max_reentrancy_depth(3);
        assert!(!config.catch_listener_panics);
        assert_eq!(config.max_reentrancy_depth, 3);
    }
}
