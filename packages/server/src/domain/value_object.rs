//! Value objects of the chat domain.
//!
//! Every value object validates itself on construction, so the rest of the
//! server never has to re-check an empty room name or an empty emoji.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::ValueObjectError;

/// Maximum number of characters in a room name.
pub const ROOM_NAME_MAX_CHARS: usize = 64;

/// Maximum number of characters in a reaction emoji.
pub const EMOJI_MAX_CHARS: usize = 32;

/// Identifier of one live WebSocket connection.
///
/// Generated at accept time and unique for the lifetime of the process.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(String);

impl ConnectionId {
    /// Generate a new, process-unique connection id.
    pub fn generate() -> Self {
        Self(format!("conn-{}", Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stable identity of an authenticated user, owned by the identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(u64);

impl UserId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Name of a room. Unique key of both live and persisted rooms.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoomName(String);

impl RoomName {
    /// Create a room name. Surrounding whitespace is trimmed.
    ///
    /// # Errors
    ///
    /// - `ValueObjectError::EmptyRoomName` if the trimmed name is empty
    /// - `ValueObjectError::RoomNameTooLong` if it exceeds [`ROOM_NAME_MAX_CHARS`]
    pub fn new(value: impl Into<String>) -> Result<Self, ValueObjectError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValueObjectError::EmptyRoomName);
        }
        if trimmed.chars().count() > ROOM_NAME_MAX_CHARS {
            return Err(ValueObjectError::RoomNameTooLong {
                max: ROOM_NAME_MAX_CHARS,
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for RoomName {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for RoomName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Public identifier of a persisted message.
///
/// This is the id clients see; it is reused by later deliveries about the
/// same message (delete, reaction update).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(String);

impl MessageId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn new(value: impl Into<String>) -> Result<Self, ValueObjectError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(ValueObjectError::EmptyMessageId);
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for MessageId {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Text body of a chat message.
///
/// The text is kept exactly as sent; only the emptiness check trims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageText(String);

impl MessageText {
    pub fn new(value: impl Into<String>) -> Result<Self, ValueObjectError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(ValueObjectError::EmptyMessageText);
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for MessageText {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Emoji used in a reaction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Emoji(String);

impl Emoji {
    pub fn new(value: impl Into<String>) -> Result<Self, ValueObjectError> {
        let value = value.into();
        if value.is_empty() {
            return Err(ValueObjectError::EmptyEmoji);
        }
        if value.chars().count() > EMOJI_MAX_CHARS {
            return Err(ValueObjectError::EmojiTooLong {
                max: EMOJI_MAX_CHARS,
            });
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Emoji {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Unix timestamp in milliseconds (UTC).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_name_is_trimmed() {
        // テスト項目: ルーム名の前後の空白が取り除かれる
        // given (前提条件):
        let raw = "  general  ".to_string();

        // when (操作):
        let name = RoomName::new(raw).unwrap();

        // then (期待する結果):
        assert_eq!(name.as_str(), "general");
    }

    #[test]
    fn test_room_name_rejects_blank() {
        // テスト項目: 空白のみのルーム名は拒否される
        // given (前提条件):
        let raw = "   ";

        // when (操作):
        let result = RoomName::new(raw);

        // then (期待する結果):
        assert_eq!(result, Err(ValueObjectError::EmptyRoomName));
    }

    #[test]
    fn test_room_name_rejects_too_long() {
        // テスト項目: 上限を超えるルーム名は拒否される
        // given (前提条件):
        let raw = "a".repeat(ROOM_NAME_MAX_CHARS + 1);

        // when (操作):
        let result = RoomName::new(raw);

        // then (期待する結果):
        assert_eq!(
            result,
            Err(ValueObjectError::RoomNameTooLong {
                max: ROOM_NAME_MAX_CHARS
            })
        );
    }

    #[test]
    fn test_message_text_keeps_original_whitespace() {
        // テスト項目: メッセージ本文は送信されたまま保持される
        // given (前提条件):
        let raw = "  hi there ";

        // when (操作):
        let text = MessageText::new(raw).unwrap();

        // then (期待する結果):
        assert_eq!(text.as_str(), "  hi there ");
    }

    #[test]
    fn test_message_text_rejects_whitespace_only() {
        // テスト項目: 空白のみの本文は拒否される
        // given (前提条件):
        let raw = " \n\t ";

        // when (操作):
        let result = MessageText::new(raw);

        // then (期待する結果):
        assert_eq!(result, Err(ValueObjectError::EmptyMessageText));
    }

    #[test]
    fn test_emoji_validation() {
        // テスト項目: 空の絵文字と長すぎる絵文字は拒否される
        // given (前提条件):
        let too_long = "👍".repeat(EMOJI_MAX_CHARS + 1);

        // when (操作):
        let empty = Emoji::new("");
        let long = Emoji::new(too_long);
        let ok = Emoji::new("👍");

        // then (期待する結果):
        assert_eq!(empty, Err(ValueObjectError::EmptyEmoji));
        assert!(matches!(long, Err(ValueObjectError::EmojiTooLong { .. })));
        assert_eq!(ok.unwrap().as_str(), "👍");
    }

    #[test]
    fn test_connection_ids_are_unique() {
        // テスト項目: 生成される接続 ID は毎回異なる
        // given (前提条件):

        // when (操作):
        let a = ConnectionId::generate();
        let b = ConnectionId::generate();

        // then (期待する結果):
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("conn-"));
    }
}
