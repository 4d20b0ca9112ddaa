//! Room participant directory.

use crate::client::ApiClient;
use crate::error::Result;
use crate::types::{AgentSummary, AgentsResponse};

impl ApiClient {
    /// `GET /api/rooms/{roomId}/agents` — agents participating in a room.
    ///
    /// Resolved in parallel with the initial feed load so the feed can render
    /// sender names without a second round-trip.
    pub async fn fetch_agents(&self, room_id: &str) -> Result<Vec<AgentSummary>> {
        let response: AgentsResponse = self.get(&format!("/api/rooms/{room_id}/agents")).await?;
        Ok(response.agents)
    }
}
