//! Session event types
//!
//! The core is UI-framework agnostic: rendering layers subscribe to these
//! events instead of being re-rendered by state magic.

use serde::{Deserialize, Serialize};

use crate::store::FeedMutation;

/// Lifecycle of the live channel for the active room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionState::Disconnected => write!(f, "disconnected"),
            ConnectionState::Connecting => write!(f, "connecting"),
            ConnectionState::Connected => write!(f, "connected"),
            ConnectionState::Reconnecting => write!(f, "reconnecting"),
        }
    }
}

/// Why the channel gave up for this room activation.
///
/// All of these are terminal until the room is reselected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisconnectReason {
    /// Closed with the unauthenticated code; the session token is bad
    Unauthorized,
    /// Closed with the access-denied code; the user cannot watch this room
    Forbidden,
    /// No credential was available for the handshake
    MissingCredential,
    /// The reconnect bound was exhausted
    RetriesExhausted,
}

/// Which load path failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadKind {
    Initial,
    Older,
}

/// Events emitted by a room session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// The timeline changed; the mutation kind drives scroll reconciliation
    FeedChanged { mutation: FeedMutation },

    /// The live channel moved through its state machine
    ConnectionChanged { state: ConnectionState },

    /// The live channel gave up for this room activation
    ConnectionFailed { reason: DisconnectReason },

    /// A history load failed
    LoadFailed {
        kind: LoadKind,
        message: String,
        retryable: bool,
    },
}

impl SessionEvent {
    /// Check if this event means the channel will not recover on its own
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionEvent::ConnectionFailed { .. })
    }
}
