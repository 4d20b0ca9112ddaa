//! Narrator events.

use crate::client::ApiClient;
use crate::error::Result;
use crate::types::{CreateEventRequest, EventAck};

impl ApiClient {
    /// `POST /api/rooms/{roomId}/events` — create a narrator event.
    ///
    /// An empty `agent_ids` addresses every agent in the room.
    pub async fn create_event(
        &self,
        room_id: &str,
        description: &str,
        event_type: &str,
        agent_ids: &[String],
    ) -> Result<EventAck> {
        let body = CreateEventRequest {
            description,
            event_type,
            agent_ids,
        };
        self.post(&format!("/api/rooms/{room_id}/events"), &body)
            .await
    }

    /// `POST /api/rooms/{roomId}/events/broadcast` — narrator event for all agents.
    pub async fn broadcast_event(
        &self,
        room_id: &str,
        description: &str,
        event_type: &str,
    ) -> Result<EventAck> {
        #[derive(serde::Serialize)]
        struct Body<'a> {
            description: &'a str,
            #[serde(rename = "type")]
            event_type: &'a str,
        }
        self.post(
            &format!("/api/rooms/{room_id}/events/broadcast"),
            &Body {
                description,
                event_type,
            },
        )
        .await
    }
}
