//! Domain entities.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{
    error::ValueObjectError,
    value_object::{Emoji, MessageId, RoomName, Timestamp, UserId},
};

/// Authenticated user as supplied by the identity provider.
///
/// Display name and avatar are denormalized onto every connection so that
/// broadcasts never need a user lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub name: String,
    pub avatar_url: String,
}

impl UserProfile {
    pub fn new(id: UserId, name: impl Into<String>, avatar_url: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            avatar_url: avatar_url.into(),
        }
    }

    /// Build a profile from session data.
    ///
    /// Falls back to the local part of `email` when `name` is empty.
    ///
    /// # Errors
    ///
    /// `ValueObjectError::EmptyDisplayName` if neither yields a name.
    pub fn from_session(
        id: UserId,
        name: &str,
        email: &str,
        avatar_url: &str,
    ) -> Result<Self, ValueObjectError> {
        let name = name.trim();
        let display_name = if name.is_empty() {
            match email.find('@') {
                Some(at) if at > 0 => &email[..at],
                _ => email.trim(),
            }
        } else {
            name
        };

        if display_name.is_empty() {
            return Err(ValueObjectError::EmptyDisplayName);
        }

        Ok(Self::new(id, display_name, avatar_url))
    }
}

/// Kind of a persisted message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageKind {
    Message,
    Media,
    Join,
    Leave,
}

/// Media reference carried opaquely by a media message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaAttachment {
    pub url: String,
    pub media_type: String,
    pub file_name: String,
}

/// Denormalized snapshot of the message being replied to.
///
/// `message_id` becomes `None` once the original message is deleted; the
/// sender and text snapshot survive so the reply still renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplySnapshot {
    pub message_id: Option<MessageId>,
    pub sender: String,
    pub text: String,
}

/// One reaction row. Unique per (message, user, emoji).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
    pub user_id: UserId,
    pub user_name: String,
    pub emoji: Emoji,
    pub created_at: Timestamp,
}

/// Per-emoji aggregate of the reactions on a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionSummary {
    pub emoji: Emoji,
    pub count: usize,
    pub user_names: Vec<String>,
    pub user_ids: Vec<UserId>,
}

/// Aggregate reaction rows per emoji.
///
/// Emojis appear in the order their first reaction was added.
pub fn summarize_reactions(reactions: &[Reaction]) -> Vec<ReactionSummary> {
    let mut summaries: Vec<ReactionSummary> = Vec::new();

    for reaction in reactions {
        match summaries.iter_mut().find(|s| s.emoji == reaction.emoji) {
            Some(summary) => {
                summary.count += 1;
                summary.user_names.push(reaction.user_name.clone());
                summary.user_ids.push(reaction.user_id);
            }
            None => summaries.push(ReactionSummary {
                emoji: reaction.emoji.clone(),
                count: 1,
                user_names: vec![reaction.user_name.clone()],
                user_ids: vec![reaction.user_id],
            }),
        }
    }

    summaries
}

/// What a `reaction` frame asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReactionAction {
    Add,
    Remove,
    #[default]
    Toggle,
}

impl FromStr for ReactionAction {
    type Err = ValueObjectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "add" => Ok(Self::Add),
            "remove" => Ok(Self::Remove),
            "toggle" => Ok(Self::Toggle),
            other => Err(ValueObjectError::InvalidReactionAction(other.to_string())),
        }
    }
}

/// A persisted chat message with its current reactions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub sender: UserProfile,
    pub room: RoomName,
    pub text: String,
    pub kind: MessageKind,
    pub media: Option<MediaAttachment>,
    pub reply_to: Option<ReplySnapshot>,
    pub reactions: Vec<Reaction>,
    pub created_at: Timestamp,
}

impl Message {
    pub fn reaction_summary(&self) -> Vec<ReactionSummary> {
        summarize_reactions(&self.reactions)
    }
}

/// Input of `MessageRepository::create_message`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub sender: UserProfile,
    pub room: RoomName,
    pub text: String,
    pub kind: MessageKind,
    pub media: Option<MediaAttachment>,
    pub reply_to: Option<ReplySnapshot>,
}

impl NewMessage {
    /// A `join`/`leave` system message for `sender`.
    pub fn system(sender: UserProfile, room: RoomName, kind: MessageKind) -> Self {
        let text = match kind {
            MessageKind::Leave => format!("{} left the room", sender.name),
            _ => format!("{} joined the room", sender.name),
        };
        Self {
            sender,
            room,
            text,
            kind,
            media: None,
            reply_to: None,
        }
    }
}

/// Visibility of a persisted room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomVisibility {
    Public,
    Private,
}

/// A persisted room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub name: RoomName,
    pub description: String,
    pub visibility: RoomVisibility,
    pub creator_id: Option<UserId>,
    pub created_at: Timestamp,
}

impl Room {
    pub fn is_private(&self) -> bool {
        self.visibility == RoomVisibility::Private
    }
}

/// Role of a user inside a persisted room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemberRole {
    Creator,
    Member,
}

/// Persisted room membership of one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomMembership {
    pub user_id: UserId,
    pub role: MemberRole,
    pub is_active: bool,
    pub joined_at: Timestamp,
}
