//! Conversion logic between DTOs and domain values.

use hiroba_shared::time::timestamp_to_rfc3339;
use thiserror::Error;

use crate::domain::{
    Emoji, Envelope, InboundCommand, MediaAttachment, Message, MessageId, MessageKind,
    MessageText, PostMessage, ReactionAction, ReactionSummary, ReplyRequest, Room, RoomPresence,
    ValueObjectError,
};
use crate::infrastructure::dto::{http as http_dto, websocket as dto};

/// Why an inbound frame could not be turned into a command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("frame has no text")]
    MissingText,

    #[error("media frame has no mediaUrl")]
    MissingMediaUrl,

    #[error("frame has no messageId")]
    MissingMessageId,

    #[error("reaction frame has no emoji")]
    MissingEmoji,

    #[error(transparent)]
    InvalidValue(#[from] ValueObjectError),
}

// ========================================
// DTO → Domain
// ========================================

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl From<dto::ReplyToDto> for ReplyRequest {
    fn from(dto: dto::ReplyToDto) -> Self {
        Self {
            message_id: MessageId::new(dto.id).ok(),
            sender: dto.sender,
            text: dto.text,
        }
    }
}

impl TryFrom<dto::InboundFrame> for InboundCommand {
    type Error = FrameError;

    /// Interpret a frame by its `type`. A missing or unrecognized type is a
    /// plain text message.
    fn try_from(frame: dto::InboundFrame) -> Result<Self, Self::Error> {
        let reply_to = frame.reply_to.map(ReplyRequest::from);

        match frame.r#type.as_deref() {
            Some("ping") => Ok(Self::Ping),
            Some("request_room_update") => Ok(Self::RequestRoomUpdate),
            Some("delete") => {
                let id = non_empty(frame.message_id).ok_or(FrameError::MissingMessageId)?;
                Ok(Self::Delete {
                    message_id: MessageId::new(id)?,
                })
            }
            Some("reaction") => {
                let id = non_empty(frame.message_id).ok_or(FrameError::MissingMessageId)?;
                let emoji = non_empty(frame.emoji).ok_or(FrameError::MissingEmoji)?;
                let action = match frame.action {
                    Some(action) => action.parse::<ReactionAction>()?,
                    None => ReactionAction::default(),
                };
                Ok(Self::React {
                    message_id: MessageId::new(id)?,
                    emoji: Emoji::new(emoji)?,
                    action,
                })
            }
            Some("media") => {
                let url = non_empty(frame.media_url).ok_or(FrameError::MissingMediaUrl)?;
                Ok(Self::Post(PostMessage::Media {
                    media: MediaAttachment {
                        url,
                        media_type: frame.media_type.unwrap_or_default(),
                        file_name: frame.file_name.unwrap_or_default(),
                    },
                    caption: frame.text.unwrap_or_default(),
                    reply_to,
                }))
            }
            _ => {
                let text = frame.text.ok_or(FrameError::MissingText)?;
                Ok(Self::Post(PostMessage::Text {
                    text: MessageText::new(text)?,
                    reply_to,
                }))
            }
        }
    }
}

// ========================================
// Domain → DTO
// ========================================

impl From<MessageKind> for dto::EnvelopeKind {
    fn from(kind: MessageKind) -> Self {
        match kind {
            MessageKind::Message => Self::Message,
            MessageKind::Media => Self::Media,
            MessageKind::Join => Self::Join,
            MessageKind::Leave => Self::Leave,
        }
    }
}

impl From<&ReactionSummary> for dto::ReactionSummaryDto {
    fn from(summary: &ReactionSummary) -> Self {
        Self {
            emoji: summary.emoji.as_str().to_string(),
            count: summary.count,
            users: summary.user_names.clone(),
            user_ids: summary.user_ids.iter().map(|id| id.value()).collect(),
        }
    }
}

impl From<&Message> for dto::MessageEnvelope {
    fn from(message: &Message) -> Self {
        let media = message.media.as_ref();
        let reactions: Vec<dto::ReactionSummaryDto> = message
            .reaction_summary()
            .iter()
            .map(dto::ReactionSummaryDto::from)
            .collect();

        Self {
            id: message.id.as_str().to_string(),
            sender: message.sender.name.clone(),
            avatar: message.sender.avatar_url.clone(),
            room: message.room.as_str().to_string(),
            text: message.text.clone(),
            timestamp: timestamp_to_rfc3339(message.created_at.value()),
            r#type: message.kind.into(),
            media_url: media.map(|m| m.url.clone()),
            media_type: media.map(|m| m.media_type.clone()).filter(|t| !t.is_empty()),
            file_name: media.map(|m| m.file_name.clone()).filter(|f| !f.is_empty()),
            reply_to: message.reply_to.as_ref().map(|reply| dto::ReplyToDto {
                id: reply
                    .message_id
                    .as_ref()
                    .map(|id| id.as_str().to_string())
                    .unwrap_or_default(),
                sender: reply.sender.clone(),
                text: reply.text.clone(),
            }),
            reactions: (!reactions.is_empty()).then_some(reactions),
        }
    }
}

impl From<&RoomPresence> for dto::RoomPresenceDto {
    fn from(presence: &RoomPresence) -> Self {
        Self {
            name: presence.room.as_str().to_string(),
            count: presence.count,
            clients: presence.member_names.clone(),
        }
    }
}

impl From<&Room> for http_dto::RoomDto {
    fn from(room: &Room) -> Self {
        Self {
            name: room.name.as_str().to_string(),
            description: room.description.clone(),
            is_private: room.is_private(),
            creator_id: room.creator_id.map(|id| id.value()),
            created_at: timestamp_to_rfc3339(room.created_at.value()),
        }
    }
}

/// Encode an envelope into its JSON wire form.
pub fn encode_envelope(envelope: &Envelope) -> Result<String, serde_json::Error> {
    match envelope {
        Envelope::Message(message) => serde_json::to_string(&dto::MessageEnvelope::from(message)),
        Envelope::ReactionUpdate(message) => {
            let mut wire = dto::MessageEnvelope::from(message);
            wire.r#type = dto::EnvelopeKind::ReactionUpdate;
            // a complete replacement, so an empty aggregate is sent as []
            wire.reactions.get_or_insert_with(Vec::new);
            serde_json::to_string(&wire)
        }
        Envelope::Deleted {
            message_id,
            sender,
            room,
            at,
        } => serde_json::to_string(&dto::MessageEnvelope {
            id: message_id.as_str().to_string(),
            sender: sender.name.clone(),
            avatar: sender.avatar_url.clone(),
            room: room.as_str().to_string(),
            text: String::new(),
            timestamp: timestamp_to_rfc3339(at.value()),
            r#type: dto::EnvelopeKind::Delete,
            media_url: None,
            media_type: None,
            file_name: None,
            reply_to: None,
            reactions: None,
        }),
        Envelope::RoomUpdate { rooms, at } => serde_json::to_string(&dto::RoomUpdateMessage {
            r#type: dto::EnvelopeKind::RoomUpdate,
            timestamp: timestamp_to_rfc3339(at.value()),
            rooms: rooms.iter().map(dto::RoomPresenceDto::from).collect(),
        }),
        Envelope::AccessDenied => serde_json::to_string(&dto::ErrorMessage {
            error: dto::ACCESS_DENIED.to_string(),
        }),
    }
}
