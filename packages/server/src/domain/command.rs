//! Commands a joined connection can issue, decoded from inbound frames.

use super::{
    entity::{MediaAttachment, ReactionAction, ReplySnapshot},
    value_object::{Emoji, MessageId, MessageText},
};

/// A message a connection wants to post to its room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostMessage {
    Text {
        text: MessageText,
        reply_to: Option<ReplyRequest>,
    },
    Media {
        media: MediaAttachment,
        caption: String,
        reply_to: Option<ReplyRequest>,
    },
}

impl PostMessage {
    pub fn reply_to(&self) -> Option<&ReplyRequest> {
        match self {
            Self::Text { reply_to, .. } | Self::Media { reply_to, .. } => reply_to.as_ref(),
        }
    }
}

/// Reply reference as sent by the client.
///
/// The id is the replied message's public id and may not resolve; sender and
/// text are the client's snapshot of the original.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyRequest {
    pub message_id: Option<MessageId>,
    pub sender: String,
    pub text: String,
}

impl ReplyRequest {
    /// Turn the request into a stored snapshot with an already-resolved id.
    pub fn into_snapshot(self, resolved: Option<MessageId>) -> ReplySnapshot {
        ReplySnapshot {
            message_id: resolved,
            sender: self.sender,
            text: self.text,
        }
    }
}

/// One decoded inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundCommand {
    Post(PostMessage),
    Delete {
        message_id: MessageId,
    },
    React {
        message_id: MessageId,
        emoji: Emoji,
        action: ReactionAction,
    },
    Ping,
    RequestRoomUpdate,
}
