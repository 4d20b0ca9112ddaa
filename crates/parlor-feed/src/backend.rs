//! Data-source seam between the feed runtime and the REST wire layer.

use async_trait::async_trait;
use parlor_api::{AgentSummary, ApiClient, EventAck, FeedItem, MessageAck, MessagesPage};

/// Everything the feed runtime asks of the backend over REST.
///
/// `HttpBackend` is the production implementation; tests substitute mocks.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Most recent feed page for a room.
    async fn fetch_feed(&self, room_id: &str, limit: usize) -> parlor_api::Result<Vec<FeedItem>>;

    /// Messages strictly older than `after_id`.
    async fn fetch_older_messages(
        &self,
        room_id: &str,
        after_id: &str,
        limit: usize,
    ) -> parlor_api::Result<MessagesPage>;

    /// Participant directory, resolved alongside the initial feed load.
    async fn fetch_participants(&self, room_id: &str) -> parlor_api::Result<Vec<AgentSummary>>;

    /// Send a user message to the whole room.
    async fn send_room_message(&self, room_id: &str, text: &str)
    -> parlor_api::Result<MessageAck>;

    /// Send a user message to one agent.
    async fn send_agent_message(
        &self,
        room_id: &str,
        agent_id: &str,
        text: &str,
    ) -> parlor_api::Result<MessageAck>;

    /// Create a narrator event; empty `agent_ids` addresses every agent.
    async fn send_event(
        &self,
        room_id: &str,
        description: &str,
        event_type: &str,
        agent_ids: &[String],
    ) -> parlor_api::Result<EventAck>;
}

/// REST-backed data source.
pub struct HttpBackend {
    api: ApiClient,
}

impl HttpBackend {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn fetch_feed(&self, room_id: &str, limit: usize) -> parlor_api::Result<Vec<FeedItem>> {
        self.api.fetch_feed(room_id, Some(limit)).await
    }

    async fn fetch_older_messages(
        &self,
        room_id: &str,
        after_id: &str,
        limit: usize,
    ) -> parlor_api::Result<MessagesPage> {
        self.api.fetch_older_messages(room_id, after_id, limit).await
    }

    async fn fetch_participants(&self, room_id: &str) -> parlor_api::Result<Vec<AgentSummary>> {
        self.api.fetch_agents(room_id).await
    }

    async fn send_room_message(
        &self,
        room_id: &str,
        text: &str,
    ) -> parlor_api::Result<MessageAck> {
        self.api.send_room_message(room_id, text).await
    }

    async fn send_agent_message(
        &self,
        room_id: &str,
        agent_id: &str,
        text: &str,
    ) -> parlor_api::Result<MessageAck> {
        self.api.send_agent_message(room_id, agent_id, text).await
    }

    async fn send_event(
        &self,
        room_id: &str,
        description: &str,
        event_type: &str,
        agent_ids: &[String],
    ) -> parlor_api::Result<EventAck> {
        self.api
            .create_event(room_id, description, event_type, agent_ids)
            .await
    }
}
