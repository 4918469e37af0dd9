//! Repository trait 定義
//!
//! ハブが必要とする永続化サービスのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。
//!
//! ハブ自身はストレージを直接変更せず、これらの trait を呼び出して
//! その結果をブロードキャストするだけです。

use async_trait::async_trait;

use super::{
    entity::{Message, NewMessage, Room, UserProfile},
    error::RepositoryError,
    value_object::{Emoji, MessageId, RoomName, UserId},
};

/// Message Repository trait
///
/// メッセージとリアクションの永続化。リアクションは (message, user, emoji) で一意。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// メッセージを保存し、保存後の状態を返す
    async fn create_message(&self, message: NewMessage) -> Result<Message, RepositoryError>;

    /// 公開 ID でメッセージを取得
    async fn get_message(&self, id: &MessageId) -> Result<Message, RepositoryError>;

    /// メッセージを完全に削除する（送信者本人のみ）
    ///
    /// 返信元としての参照は切り離され、リアクションも削除される。
    async fn delete_message(&self, id: &MessageId, requester: UserId)
    -> Result<(), RepositoryError>;

    /// リアクションを追加（既にあれば何もしない）
    async fn add_reaction(
        &self,
        id: &MessageId,
        user: &UserProfile,
        emoji: &Emoji,
    ) -> Result<Message, RepositoryError>;

    /// リアクションを削除（なければ何もしない）
    async fn remove_reaction(
        &self,
        id: &MessageId,
        user_id: UserId,
        emoji: &Emoji,
    ) -> Result<Message, RepositoryError>;

    /// 同一のリアクションがあれば削除、なければ追加
    async fn toggle_reaction(
        &self,
        id: &MessageId,
        user: &UserProfile,
        emoji: &Emoji,
    ) -> Result<Message, RepositoryError>;

    /// ルームの履歴を作成順に取得
    async fn list_room_messages(
        &self,
        room: &RoomName,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Message>, RepositoryError>;
}

/// Room Repository trait
///
/// 永続化されたルームとメンバーシップ。ライブ接続の管理はハブが行う。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoomRepository: Send + Sync {
    /// ルームを取得、存在しなければ公開ルームとして作成
    async fn create_or_get_room(&self, name: &RoomName) -> Result<Room, RepositoryError>;

    /// 公開ルームを作成（作成者は creator ロールのメンバーになる）
    async fn create_public_room(
        &self,
        name: &RoomName,
        description: String,
        creator: UserId,
    ) -> Result<Room, RepositoryError>;

    /// プライベートルームを作成
    async fn create_private_room(
        &self,
        name: &RoomName,
        description: String,
        creator: UserId,
        members: Vec<UserId>,
    ) -> Result<Room, RepositoryError>;

    async fn get_room(&self, name: &RoomName) -> Result<Room, RepositoryError>;

    /// ユーザーがルームにアクセスできるか
    ///
    /// ルームが存在しなければ `RepositoryError::RoomNotFound`。
    async fn can_access(&self, user_id: UserId, room: &RoomName) -> Result<bool, RepositoryError>;

    /// ユーザーがルームのアクティブなメンバーか
    async fn is_active_member(
        &self,
        user_id: UserId,
        room: &RoomName,
    ) -> Result<bool, RepositoryError>;

    /// メンバーシップを作成、または再アクティブ化
    async fn join_room(&self, user_id: UserId, room: &RoomName) -> Result<(), RepositoryError>;

    /// メンバーシップを非アクティブ化
    async fn leave_room(&self, user_id: UserId, room: &RoomName) -> Result<(), RepositoryError>;

    /// メンバーシップを削除（プライベートルームへのアクセス権も失う）
    async fn revoke_membership(
        &self,
        user_id: UserId,
        room: &RoomName,
    ) -> Result<(), RepositoryError>;
}
