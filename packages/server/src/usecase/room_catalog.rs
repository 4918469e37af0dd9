//! UseCase: ルーム一覧・履歴・ルーム作成（HTTP API 用）

use std::sync::Arc;

use crate::domain::{
    Message, MessagePusher, MessageRepository, RepositoryError, Room, RoomName, RoomPresence,
    RoomRepository, UserId,
};

/// HTTP API から使うルーム関連のユースケース
pub struct RoomCatalogUseCase {
    rooms: Arc<dyn RoomRepository>,
    messages: Arc<dyn MessageRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    /// limit が指定されない場合の履歴の件数
    history_limit: usize,
}

impl RoomCatalogUseCase {
    pub fn new(
        rooms: Arc<dyn RoomRepository>,
        messages: Arc<dyn MessageRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        history_limit: usize,
    ) -> Self {
        Self {
            rooms,
            messages,
            message_pusher,
            history_limit,
        }
    }

    /// 接続中のメンバーがいるルームの在室状況（ルーム名順）
    pub async fn live_rooms(&self) -> Vec<RoomPresence> {
        self.message_pusher.all_presence().await
    }

    /// ルームの履歴を作成順に取得
    pub async fn history(
        &self,
        room: &RoomName,
        limit: Option<usize>,
        offset: Option<usize>,
    ) -> Result<Vec<Message>, RepositoryError> {
        let limit = limit.unwrap_or(self.history_limit);
        let offset = offset.unwrap_or(0);
        self.messages.list_room_messages(room, limit, offset).await
    }

    pub async fn create_public_room(
        &self,
        name: &RoomName,
        description: String,
        creator: UserId,
    ) -> Result<Room, RepositoryError> {
        let room = self
            .rooms
            .create_public_room(name, description, creator)
            .await?;
        tracing::info!(room = %room.name, user_id = %creator, "Public room created");
        Ok(room)
    }

    pub async fn create_private_room(
        &self,
        name: &RoomName,
        description: String,
        creator: UserId,
        members: Vec<UserId>,
    ) -> Result<Room, RepositoryError> {
        let room = self
            .rooms
            .create_private_room(name, description, creator, members)
            .await?;
        tracing::info!(room = %room.name, user_id = %creator, "Private room created");
        Ok(room)
    }
}
