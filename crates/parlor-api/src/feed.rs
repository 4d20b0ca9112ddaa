//! Feed history, backward pagination, and message send.

use crate::client::ApiClient;
use crate::error::Result;
use crate::types::{FeedItem, FeedResponse, MessageAck, MessagesPage, SendMessageRequest};

impl ApiClient {
    /// `GET /api/rooms/{roomId}/feed` — the most recent messages and events.
    pub async fn fetch_feed(&self, room_id: &str, limit: Option<usize>) -> Result<Vec<FeedItem>> {
        let path = match limit {
            Some(n) => format!("/api/rooms/{room_id}/feed?limit={n}"),
            None => format!("/api/rooms/{room_id}/feed"),
        };
        let response: FeedResponse = self.get(&path).await?;
        Ok(response.items)
    }

    /// `GET /api/rooms/{roomId}/messages` — messages strictly older than `after_id`.
    pub async fn fetch_older_messages(
        &self,
        room_id: &str,
        after_id: &str,
        limit: usize,
    ) -> Result<MessagesPage> {
        let path = format!(
            "/api/rooms/{room_id}/messages?after_id={}&limit={limit}",
            urlencoding::encode(after_id)
        );
        self.get(&path).await
    }

    /// `POST /api/rooms/{roomId}/messages` — send a user message to the whole room.
    pub async fn send_room_message(&self, room_id: &str, text: &str) -> Result<MessageAck> {
        let body = SendMessageRequest {
            text,
            sender: "user",
        };
        self.post(&format!("/api/rooms/{room_id}/messages"), &body)
            .await
    }

    /// `POST /api/rooms/{roomId}/agents/{agentId}/messages` — send a user
    /// message addressed to a single agent.
    pub async fn send_agent_message(
        &self,
        room_id: &str,
        agent_id: &str,
        text: &str,
    ) -> Result<MessageAck> {
        let body = SendMessageRequest {
            text,
            sender: "user",
        };
        self.post(
            &format!("/api/rooms/{room_id}/agents/{agent_id}/messages"),
            &body,
        )
        .await
    }
}
