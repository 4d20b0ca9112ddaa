//! Room directory CRUD.

use crate::client::ApiClient;
use crate::error::Result;
use crate::types::{CreateRoomRequest, OrchestrationMode, RoomInfo, RoomsResponse};

impl ApiClient {
    /// `GET /api/rooms` — rooms visible to the current user.
    pub async fn fetch_rooms(&self) -> Result<Vec<RoomInfo>> {
        let response: RoomsResponse = self.get("/api/rooms").await?;
        Ok(response.rooms)
    }

    /// `GET /api/rooms/{roomId}` — one room's metadata.
    pub async fn fetch_room(&self, room_id: &str) -> Result<RoomInfo> {
        self.get(&format!("/api/rooms/{room_id}")).await
    }

    /// `POST /api/rooms` — create a room.
    pub async fn create_room(
        &self,
        title: &str,
        description: Option<&str>,
        orchestration: Option<OrchestrationMode>,
    ) -> Result<RoomInfo> {
        let body = CreateRoomRequest {
            title,
            description,
            orchestration_type: orchestration,
        };
        self.post("/api/rooms", &body).await
    }

    /// `DELETE /api/rooms/{roomId}`
    pub async fn delete_room(&self, room_id: &str) -> Result<()> {
        self.delete(&format!("/api/rooms/{room_id}")).await
    }
}
