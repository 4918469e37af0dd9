//! Domain error types.

use thiserror::Error;

/// Validation errors raised when constructing value objects.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("room name must not be empty")]
    EmptyRoomName,

    #[error("room name must be at most {max} characters")]
    RoomNameTooLong { max: usize },

    #[error("message id must not be empty")]
    EmptyMessageId,

    #[error("message text must not be empty")]
    EmptyMessageText,

    #[error("emoji must not be empty")]
    EmptyEmoji,

    #[error("emoji must be at most {max} characters")]
    EmojiTooLong { max: usize },

    #[error("display name must not be empty")]
    EmptyDisplayName,

    #[error("unknown reaction action '{0}'")]
    InvalidReactionAction(String),
}

/// Errors returned by the persistence collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("message '{0}' not found")]
    MessageNotFound(String),

    #[error("message '{0}' not found or not owned by the requester")]
    NotMessageOwner(String),

    #[error("room '{0}' not found")]
    RoomNotFound(String),

    #[error("room '{0}' already exists")]
    RoomAlreadyExists(String),

    #[error("storage error: {0}")]
    Storage(String),
}

/// Errors raised while pushing data to connections or posting to the hub.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagePushError {
    /// The connection was already closed
    #[error("connection '{0}' is closed")]
    Closed(String),

    /// A single write did not finish within the write timeout
    #[error("write to connection '{0}' timed out")]
    Timeout(String),

    /// The transport rejected the write
    #[error("failed to push message: {0}")]
    PushFailed(String),

    /// The hub actor is no longer running
    #[error("hub is not running")]
    HubStopped,
}
