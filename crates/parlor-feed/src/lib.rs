//! parlor-feed: room feed synchronization
//!
//! This crate merges a REST-paginated history with the live channel's
//! append-only stream into one ordered, deduplicated timeline per room, and
//! keeps it consistent across backward pagination, room switches, and
//! disconnect/reconnect cycles.

pub mod backend;
pub mod channel;
pub mod connection;
pub mod entry;
pub mod error;
pub mod events;
pub mod filter;
pub mod session;
pub mod store;
pub mod ws;

pub use backend::{Backend, HttpBackend};
pub use channel::{ChannelError, ChannelEvent, ChannelFactory, CloseReason, RoomChannel};
pub use connection::ConnectionConfig;
pub use entry::{ChatMessage, FeedEntry, NarratorEvent, Sender};
pub use error::{Error, Result};
pub use events::{ConnectionState, DisconnectReason, LoadKind, SessionEvent};
pub use filter::HiddenSenders;
pub use session::{FeedSnapshot, RoomSession, SessionConfig};
pub use store::{FeedMutation, FeedStore};
pub use ws::WebSocketFactory;
