//! Session state management
//!
//! Defines the session state machine and the event stream payloads.

use serde::{Deserialize, Serialize};

/// Current state of a recording session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// Just constructed or reset; configuration is the default image
    Idle,
    /// Setters have been called, no pipeline is active
    Configured,
    /// An assembled pipeline is running
    Recording,
    /// Pipeline torn down, configuration retained
    Stopped,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::Idle
    }
}

impl SessionState {
    /// Whether configuration may be mutated in this state
    pub fn accepts_configuration(&self) -> bool {
        !matches!(self, SessionState::Recording)
    }
}

/// Events emitted over the session's broadcast channel
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum SessionEvent {
    /// Recording started
    Started,
    /// Recording stopped
    Stopped,
    /// Error occurred
    Error { message: String },
}

impl SessionEvent {
    /// JSON payload for hosts forwarding events to an external listener
    pub fn to_payload(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_else(|_| serde_json::Value::Null)
    }
}
