//! WebSocket wire DTOs.
//!
//! Field names are the stable protocol surface shared with existing clients.
//! Optional fields are omitted, never sent as `null`.

use serde::{Deserialize, Serialize};

/// First frame a client sends after the upgrade.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JoinRoomRequest {
    pub room: String,
    /// Ignored; the display name comes from the authenticated identity.
    #[serde(default)]
    pub username: String,
}

/// Any frame sent by a joined client.
///
/// Every field is optional on the wire; `conversion` decides which ones a
/// given `type` needs.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InboundFrame {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r#type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<ReplyToDto>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
}

/// Reply reference, inbound and outbound.
///
/// Outbound, `id` is empty once the replied message was deleted.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReplyToDto {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub sender: String,
    #[serde(default)]
    pub text: String,
}

/// `type` of an outbound envelope.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EnvelopeKind {
    Message,
    Media,
    Join,
    Leave,
    Delete,
    ReactionUpdate,
    RoomUpdate,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReactionSummaryDto {
    pub emoji: String,
    pub count: usize,
    pub users: Vec<String>,
    pub user_ids: Vec<u64>,
}

/// Message-shaped envelope: message, media, join, leave, delete and
/// reaction_update.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MessageEnvelope {
    pub id: String,
    pub sender: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub avatar: String,
    pub room: String,
    pub text: String,
    /// RFC 3339, UTC
    pub timestamp: String,
    pub r#type: EnvelopeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<ReplyToDto>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reactions: Option<Vec<ReactionSummaryDto>>,
}

/// One room inside a `room_update`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoomPresenceDto {
    pub name: String,
    pub count: usize,
    pub clients: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoomUpdateMessage {
    pub r#type: EnvelopeKind,
    pub timestamp: String,
    pub rooms: Vec<RoomPresenceDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorMessage {
    pub error: String,
}

pub const ACCESS_DENIED: &str = "Access denied to this room";
