//! Wire types for the backend's REST responses and live-channel frames.
//!
//! Everything here mirrors the backend contract verbatim (camelCase field
//! names, ISO-8601 timestamps). Domain-level types live in `parlor-feed`;
//! this crate stays at the wire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Accept an id that arrives as a JSON string or number, normalized to `String`.
///
/// The backend is not consistent here: feed items carry string ids, while
/// stream payloads have been observed with numeric ones.
fn de_loose_id<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }))
}

// ============================================================================
// REST: feed history and pagination
// ============================================================================

/// One message as the REST API returns it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageItem {
    pub id: String,
    pub text: String,
    /// `"user"`, `"agent"`, `"system"`, or a display name for special roles
    pub sender: String,
    #[serde(default)]
    pub agent_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// One narrator event as the REST API returns it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventItem {
    pub id: String,
    pub event_type: String,
    /// Empty means the event addresses every agent in the room
    #[serde(default)]
    pub agent_ids: Vec<String>,
    pub description: String,
    pub timestamp: DateTime<Utc>,
}

/// A feed item: message or narrator event, tagged on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FeedItem {
    Message(MessageItem),
    Event(EventItem),
}

/// `GET /api/rooms/{roomId}/feed` response
#[derive(Debug, Clone, Deserialize)]
pub struct FeedResponse {
    #[serde(default)]
    pub items: Vec<FeedItem>,
}

/// `GET /api/rooms/{roomId}/messages` response (backward pagination)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagesPage {
    #[serde(default)]
    pub items: Vec<MessageItem>,
    #[serde(default)]
    pub has_more: bool,
}

// ============================================================================
// REST: send acknowledgments
// ============================================================================

/// Synchronous response to a message send.
///
/// The `id` is the canonical server id; the optimistic feed insertion uses it
/// directly so the later stream echo deduplicates by id.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageAck {
    pub id: String,
    pub text: String,
    pub sender: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub agent_id: Option<String>,
    #[serde(default)]
    pub agent_response: Option<String>,
}

/// Synchronous response to an event creation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventAck {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub agent_ids: Vec<String>,
    pub description: String,
    pub timestamp: DateTime<Utc>,
}

/// `POST /api/rooms/{roomId}/messages` request body
#[derive(Debug, Clone, Serialize)]
pub struct SendMessageRequest<'a> {
    pub text: &'a str,
    pub sender: &'a str,
}

/// `POST /api/rooms/{roomId}/events` request body
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest<'a> {
    pub description: &'a str,
    #[serde(rename = "type")]
    pub event_type: &'a str,
    pub agent_ids: &'a [String],
}

// ============================================================================
// REST: rooms and agents directory
// ============================================================================

/// Mood readout attached to an agent summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentMood {
    pub mood: String,
    pub level: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// One agent in a room's participant directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentSummary {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub mood: Option<AgentMood>,
}

/// `GET /api/rooms/{roomId}/agents` response
#[derive(Debug, Clone, Deserialize)]
pub struct AgentsResponse {
    #[serde(default)]
    pub agents: Vec<AgentSummary>,
}

/// Room metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomInfo {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub speed: Option<f64>,
    #[serde(default)]
    pub agent_count: Option<u32>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// `GET /api/rooms` response
#[derive(Debug, Clone, Deserialize)]
pub struct RoomsResponse {
    #[serde(default)]
    pub rooms: Vec<RoomInfo>,
}

/// How the backend orchestrates agent turns within a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrchestrationMode {
    Single,
    Circular,
    Narrator,
    FullContext,
}

/// `POST /api/rooms` request body
#[derive(Debug, Clone, Serialize)]
pub struct CreateRoomRequest<'a> {
    pub title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orchestration_type: Option<OrchestrationMode>,
}

// ============================================================================
// Live channel frames
// ============================================================================

/// Frame kind tag on the live channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameKind {
    Connected,
    Message,
    Event,
    Pong,
    Error,
    /// Unrecognized kinds parse instead of failing the whole frame
    #[serde(other)]
    Unknown,
}

/// One inbound frame: `{ "type": ..., "payload": ... }`.
///
/// The payload is kept raw and decoded per kind, because the backend fills it
/// loosely and a frame must never fail to parse over one odd field.
#[derive(Debug, Clone, Deserialize)]
pub struct StreamFrame {
    #[serde(rename = "type")]
    pub kind: FrameKind,
    #[serde(default)]
    pub payload: Option<serde_json::Value>,
}

/// Payload of a `message` frame. Every field optional; the consumer decides
/// whether the frame is complete enough to use.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamMessagePayload {
    #[serde(default, deserialize_with = "de_loose_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub sender: Option<String>,
    #[serde(default, deserialize_with = "de_loose_id")]
    pub agent_id: Option<String>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Payload of an `event` frame.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamEventPayload {
    #[serde(default, deserialize_with = "de_loose_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub event_type: Option<String>,
    #[serde(default)]
    pub agent_ids: Option<Vec<String>>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl StreamFrame {
    /// Decode the payload of a `message` frame. A missing or malformed payload
    /// yields the empty payload, which the consumer treats as incomplete.
    pub fn message_payload(&self) -> StreamMessagePayload {
        self.payload
            .clone()
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_default()
    }

    /// Decode the payload of an `event` frame.
    pub fn event_payload(&self) -> StreamEventPayload {
        self.payload
            .clone()
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_default()
    }

    /// Human-readable message of an `error` frame, if present.
    pub fn error_message(&self) -> Option<String> {
        self.payload
            .as_ref()
            .and_then(|p| p.get("message"))
            .and_then(|m| m.as_str())
            .map(str::to_string)
    }
}

/// Frames the client sends on the live channel.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientFrame {
    /// Periodic heartbeat
    Ping,
}
