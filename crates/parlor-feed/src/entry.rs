//! Timeline domain model: messages, narrator events, and their wire conversions.

use chrono::{DateTime, Utc};
use parlor_api::{
    EventAck, EventItem, FeedItem, MessageAck, MessageItem, StreamEventPayload,
    StreamMessagePayload,
};
use serde::{Deserialize, Serialize};

/// Who authored a message.
///
/// The wire carries a free-form string: the well-known roles plus display
/// names for special backend roles (narrator, summarizer digests).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Sender {
    User,
    Agent,
    System,
    Named(String),
}

impl Sender {
    pub fn as_str(&self) -> &str {
        match self {
            Sender::User => "user",
            Sender::Agent => "agent",
            Sender::System => "system",
            Sender::Named(name) => name,
        }
    }
}

impl From<String> for Sender {
    fn from(value: String) -> Self {
        match value.as_str() {
            "user" => Sender::User,
            "agent" => Sender::Agent,
            "system" => Sender::System,
            _ => Sender::Named(value),
        }
    }
}

impl From<&str> for Sender {
    fn from(value: &str) -> Self {
        Sender::from(value.to_string())
    }
}

impl From<Sender> for String {
    fn from(value: Sender) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for Sender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A chat message in a room's timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub room_id: String,
    /// `None` for user and system messages
    pub agent_id: Option<String>,
    pub content: String,
    pub sent_at: DateTime<Utc>,
    pub sender: Sender,
}

/// A narrator event addressed to all or selected agents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NarratorEvent {
    pub id: String,
    pub room_id: String,
    pub kind: String,
    pub description: String,
    /// Empty means every agent in the room
    pub target_agent_ids: Vec<String>,
    pub occurred_at: DateTime<Utc>,
}

/// One entry of the merged timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeedEntry {
    Message(ChatMessage),
    Event(NarratorEvent),
}

impl FeedEntry {
    /// Entry id, unique within a room's feed.
    pub fn id(&self) -> &str {
        match self {
            FeedEntry::Message(m) => &m.id,
            FeedEntry::Event(e) => &e.id,
        }
    }

    /// Primary ordering key of the timeline.
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            FeedEntry::Message(m) => m.sent_at,
            FeedEntry::Event(e) => e.occurred_at,
        }
    }

    pub fn room_id(&self) -> &str {
        match self {
            FeedEntry::Message(m) => &m.room_id,
            FeedEntry::Event(e) => &e.room_id,
        }
    }

    pub fn is_message(&self) -> bool {
        matches!(self, FeedEntry::Message(_))
    }

    /// Sender, for messages.
    pub fn sender(&self) -> Option<&Sender> {
        match self {
            FeedEntry::Message(m) => Some(&m.sender),
            FeedEntry::Event(_) => None,
        }
    }

    /// Convert a REST feed item into a timeline entry.
    pub fn from_wire(room_id: &str, item: FeedItem) -> Self {
        match item {
            FeedItem::Message(m) => FeedEntry::Message(ChatMessage::from_item(room_id, m)),
            FeedItem::Event(e) => FeedEntry::Event(NarratorEvent::from_item(room_id, e)),
        }
    }

    /// Convert a live `message` payload, or `None` when it lacks an id.
    ///
    /// Missing text defaults to empty, a missing sender to `agent`, and a
    /// missing timestamp to now; without an id there is nothing to merge by.
    pub fn from_stream_message(room_id: &str, payload: StreamMessagePayload) -> Option<Self> {
        let id = payload.id?;
        Some(FeedEntry::Message(ChatMessage {
            id,
            room_id: room_id.to_string(),
            agent_id: payload.agent_id,
            content: payload.text.unwrap_or_default(),
            sent_at: payload.timestamp.unwrap_or_else(Utc::now),
            sender: payload.sender.map(Sender::from).unwrap_or(Sender::Agent),
        }))
    }

    /// Convert a live `event` payload, or `None` when id or timestamp is missing.
    pub fn from_stream_event(room_id: &str, payload: StreamEventPayload) -> Option<Self> {
        let id = payload.id?;
        let occurred_at = payload.timestamp?;
        Some(FeedEntry::Event(NarratorEvent {
            id,
            room_id: room_id.to_string(),
            kind: payload.event_type.unwrap_or_else(|| "user_event".to_string()),
            description: payload.description.unwrap_or_default(),
            target_agent_ids: payload.agent_ids.unwrap_or_default(),
            occurred_at,
        }))
    }
}

impl ChatMessage {
    pub fn from_item(room_id: &str, item: MessageItem) -> Self {
        Self {
            id: item.id,
            room_id: room_id.to_string(),
            agent_id: item.agent_id,
            content: item.text,
            sent_at: item.timestamp,
            sender: Sender::from(item.sender),
        }
    }

    /// Build the optimistic entry from a send acknowledgment.
    ///
    /// The ack carries the canonical server id, so the later stream echo of
    /// the same message deduplicates by id instead of needing a swap.
    pub fn from_ack(room_id: &str, ack: MessageAck) -> Self {
        Self {
            id: ack.id,
            room_id: room_id.to_string(),
            agent_id: ack.agent_id,
            content: ack.text,
            sent_at: ack.timestamp,
            sender: Sender::from(ack.sender),
        }
    }
}

impl NarratorEvent {
    pub fn from_item(room_id: &str, item: EventItem) -> Self {
        Self {
            id: item.id,
            room_id: room_id.to_string(),
            kind: item.event_type,
            description: item.description,
            target_agent_ids: item.agent_ids,
            occurred_at: item.timestamp,
        }
    }

    pub fn from_ack(room_id: &str, ack: EventAck) -> Self {
        Self {
            id: ack.id,
            room_id: room_id.to_string(),
            kind: ack.event_type,
            description: ack.description,
            target_agent_ids: ack.agent_ids,
            occurred_at: ack.timestamp,
        }
    }
}
