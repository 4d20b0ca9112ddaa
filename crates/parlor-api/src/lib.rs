//! parlor-api: wire layer for the parlor backend
//!
//! Typed REST client plus the wire DTOs for both REST responses and
//! live-channel frames. The feed semantics (ordering, dedup, reconnect)
//! live in `parlor-feed`; this crate only speaks the protocol.

pub mod agents;
pub mod auth;
pub mod client;
pub mod error;
pub mod events;
pub mod feed;
pub mod rooms;
pub mod types;

pub use auth::{CredentialProvider, StaticToken, UnauthorizedHandler};
pub use client::ApiClient;
pub use error::{Error, Result};
pub use types::*;
