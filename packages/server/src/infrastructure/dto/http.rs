//! HTTP API DTOs.

use serde::{Deserialize, Serialize};

use super::websocket::{MessageEnvelope, RoomPresenceDto};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: String,
}

/// `GET /api/rooms`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoomListResponse {
    pub rooms: Vec<RoomPresenceDto>,
}

/// Query of `GET /api/rooms/{room}/messages`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HistoryResponse {
    pub room: String,
    pub messages: Vec<MessageEnvelope>,
}

/// `POST /api/rooms/public`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreatePublicRoomRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub creator_id: u64,
}

/// `POST /api/rooms/private`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreatePrivateRoomRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub creator_id: u64,
    #[serde(default)]
    pub member_ids: Vec<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoomDto {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub is_private: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator_id: Option<u64>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
}
