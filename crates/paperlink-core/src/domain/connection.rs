//! Log stream connection state.

use std::fmt;

use serde::{Deserialize, Serialize};

/// State of the log stream bridge.
///
/// Only the bridge mutates this; everyone else observes it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    /// A one-shot reconnect timer is pending.
    ReconnectScheduled,
}

impl ConnectionState {
    pub const fn is_connected(self) -> bool {
        matches!(self, Self::Connected)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Connecting => write!(f, "Connecting"),
            Self::Connected => write!(f, "Connected"),
            Self::ReconnectScheduled => write!(f, "ReconnectScheduled"),
        }
    }
}
