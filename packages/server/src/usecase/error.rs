//! UseCase 層のエラー定義

use thiserror::Error;

use crate::domain::{MessagePushError, RepositoryError};

/// 参加者接続のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectError {
    #[error("access denied to room '{0}'")]
    AccessDenied(String),

    #[error("room lookup failed: {0}")]
    Repository(#[from] RepositoryError),

    #[error("failed to register connection: {0}")]
    RegisterFailed(#[from] MessagePushError),
}

/// メッセージ送信のエラー
///
/// 永続化に失敗した場合はブロードキャストしない。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SendMessageError {
    #[error("failed to persist message: {0}")]
    Repository(#[from] RepositoryError),

    #[error("failed to broadcast message: {0}")]
    BroadcastFailed(#[from] MessagePushError),
}

/// メッセージ削除のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeleteMessageError {
    #[error("message '{0}' not found")]
    NotFound(String),

    #[error("message '{0}' is not owned by the requester")]
    NotOwner(String),

    #[error("failed to delete message: {0}")]
    Repository(RepositoryError),

    #[error("failed to broadcast deletion: {0}")]
    BroadcastFailed(#[from] MessagePushError),
}

impl From<RepositoryError> for DeleteMessageError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::MessageNotFound(id) => Self::NotFound(id),
            RepositoryError::NotMessageOwner(id) => Self::NotOwner(id),
            other => Self::Repository(other),
        }
    }
}

/// リアクションのエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReactionError {
    #[error("message '{0}' not found")]
    MessageNotFound(String),

    #[error("message belongs to room '{message_room}', not '{connection_room}'")]
    WrongRoom {
        message_room: String,
        connection_room: String,
    },

    #[error("user is not an active member of private room '{0}'")]
    NotMember(String),

    #[error("failed to update reactions: {0}")]
    Repository(RepositoryError),

    #[error("failed to broadcast reaction update: {0}")]
    BroadcastFailed(#[from] MessagePushError),
}

impl From<RepositoryError> for ReactionError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::MessageNotFound(id) => Self::MessageNotFound(id),
            other => Self::Repository(other),
        }
    }
}

/// 在室状況の通知のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PresenceError {
    #[error("failed to push room update: {0}")]
    PushFailed(#[from] MessagePushError),
}
