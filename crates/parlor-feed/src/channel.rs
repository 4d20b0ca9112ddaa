//! Live-channel seam.
//!
//! The connection runner drives an abstract channel so tests can script
//! frames and closures; `crate::ws` provides the WebSocket implementation.

use async_trait::async_trait;
use parlor_api::StreamFrame;
use thiserror::Error;

/// Close code the backend sends when the session token is rejected.
pub const CLOSE_UNAUTHENTICATED: u16 = 4001;
/// Close code the backend sends when the user has no access to the room.
pub const CLOSE_FORBIDDEN: u16 = 4003;

/// Errors from the live channel itself.
#[derive(Error, Debug)]
pub enum ChannelError {
    /// No credential available for the handshake
    #[error("missing credential for channel handshake")]
    MissingCredential,

    /// Opening the channel failed
    #[error("channel connect failed: {0}")]
    Connect(String),

    /// Sending on the channel failed
    #[error("channel send failed: {0}")]
    Send(String),
}

/// Why a channel closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CloseReason {
    /// Close code, when the peer supplied one
    pub code: Option<u16>,
}

impl CloseReason {
    pub fn new(code: Option<u16>) -> Self {
        Self { code }
    }

    pub fn is_unauthenticated(&self) -> bool {
        self.code == Some(CLOSE_UNAUTHENTICATED)
    }

    pub fn is_forbidden(&self) -> bool {
        self.code == Some(CLOSE_FORBIDDEN)
    }

    /// Terminal closures are never retried.
    pub fn is_terminal(&self) -> bool {
        self.is_unauthenticated() || self.is_forbidden()
    }
}

/// What a channel read produced.
#[derive(Debug)]
pub enum ChannelEvent {
    /// A parsed frame. Malformed frames never surface here; implementations
    /// drop them silently.
    Frame(StreamFrame),
    /// The channel closed.
    Closed(CloseReason),
}

/// One live channel to a room.
#[async_trait]
pub trait RoomChannel: Send {
    /// Next frame or closure. After `Closed` the channel is spent.
    async fn recv(&mut self) -> ChannelEvent;

    /// Send a client heartbeat.
    async fn ping(&mut self) -> Result<(), ChannelError>;
}

/// Opens channels; one per room activation (and per reconnect attempt).
#[async_trait]
pub trait ChannelFactory: Send + Sync {
    async fn connect(&self, room_id: &str) -> Result<Box<dyn RoomChannel>, ChannelError>;
}
