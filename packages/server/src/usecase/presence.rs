//! UseCase: 在室状況の通知
//!
//! `room_update` は接続ごとに内容が異なる（プライベートルームは見えるユーザーにだけ
//! 含まれる）ため、ブロードキャストではなく接続ごとのユニキャストで送る。
//! 送信はベストエフォートで、失敗した接続はハブに登録解除を依頼する。

use std::sync::Arc;

use futures_util::future::join_all;
use hiroba_shared::time::Clock;

use crate::domain::{
    Connection, Envelope, MessagePusher, RoomName, RoomPresence, RoomRepository, Timestamp,
    UserId,
};

use super::error::PresenceError;

/// 在室状況の通知
pub struct PresenceNotifier {
    rooms: Arc<dyn RoomRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
}

impl PresenceNotifier {
    pub fn new(
        rooms: Arc<dyn RoomRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            rooms,
            message_pusher,
            clock,
        }
    }

    /// ルームの在室状況（誰もいなければ件数 0）
    pub async fn snapshot(&self, room: &RoomName) -> RoomPresence {
        self.message_pusher
            .room_presence(room)
            .await
            .unwrap_or_else(|| RoomPresence::empty(room.clone()))
    }

    /// ユーザーがアクセスできるライブなルームの在室状況（ルーム名順）
    ///
    /// アクセス判定に失敗したルームは含めない。
    pub async fn filtered_snapshot(&self, user_id: UserId) -> Vec<RoomPresence> {
        let mut visible = Vec::new();
        for presence in self.message_pusher.all_presence().await {
            match self.rooms.can_access(user_id, &presence.room).await {
                Ok(true) => visible.push(presence),
                Ok(false) => {}
                Err(e) => {
                    tracing::debug!(
                        user_id = %user_id,
                        room = %presence.room,
                        "Access check failed, excluding room: {}",
                        e
                    );
                }
            }
        }
        visible
    }

    /// 1 つの接続に `room_update` を送る
    pub async fn push_room_update(&self, connection: &Connection) -> Result<(), PresenceError> {
        let rooms = self.filtered_snapshot(connection.user().id).await;
        let room_count = rooms.len();
        let envelope = Envelope::RoomUpdate {
            rooms,
            at: Timestamp::new(self.clock.now_millis()),
        };
        self.message_pusher.push_to(connection, &envelope).await?;

        tracing::debug!(
            connection_id = %connection.id(),
            "Room update sent ({} rooms)",
            room_count
        );
        Ok(())
    }

    /// 全ての接続に個別の `room_update` を送る
    ///
    /// 送信に失敗した接続は登録解除される。
    pub async fn push_to_all(&self) {
        let connections = self.message_pusher.connections().await;
        let pushes = connections.iter().map(|connection| async move {
            if let Err(e) = self.push_room_update(connection).await {
                tracing::warn!(
                    connection_id = %connection.id(),
                    "Room update failed, evicting connection: {}",
                    e
                );
                if let Err(e) = self.message_pusher.unregister_client(Arc::clone(connection)) {
                    tracing::debug!("Eviction not queued: {}", e);
                }
            }
        });
        join_all(pushes).await;
    }
}
