use state_eventer_value::StateValue;

/// Payload delivered to a listener.
///
/// `None` means the location is absent; `Some(StateValue::Null)` is an
/// explicit null.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    /// Canonical path of the listener that fired.
    pub path: String,
    pub value: Option<StateValue>,
    pub old_value: Option<StateValue>,
}
