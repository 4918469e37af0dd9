//! UseCase: 参加者接続処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - ConnectParticipantUseCase::execute() メソッド
//! - 参加時のルーム作成、アクセス判定、ハブへの登録
//!
//! ### なぜこのテストが必要か
//! - 存在しないルームは公開ルームとして作成されてから参加できること
//! - アクセスできないルームでは拒否エンベロープが一度だけ送られ、接続が閉じられること
//!
//! ### どのような状況を想定しているか
//! - 正常系：公開ルームへの参加
//! - 異常系：プライベートルームへのアクセス拒否
//! - 異常系：ハブが停止している

use std::sync::Arc;

use crate::domain::{Connection, Envelope, MessagePusher, RoomRepository};

use super::error::ConnectError;

/// 参加者接続のユースケース
pub struct ConnectParticipantUseCase {
    /// Repository（ルームとアクセス判定）
    rooms: Arc<dyn RoomRepository>,
    /// MessagePusher（ハブ）
    message_pusher: Arc<dyn MessagePusher>,
}

impl ConnectParticipantUseCase {
    /// 新しい ConnectParticipantUseCase を作成
    pub fn new(rooms: Arc<dyn RoomRepository>, message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self {
            rooms,
            message_pusher,
        }
    }

    /// 参加者接続を実行
    ///
    /// ルームが存在しなければ公開ルームとして作成し、アクセスを確認してから
    /// ハブに登録する。登録はハブのキューに積まれるだけで、join メッセージの
    /// 保存とブロードキャストはメンバーシップイベントの処理で行われる。
    ///
    /// # Errors
    ///
    /// * `ConnectError::AccessDenied` - 拒否エンベロープを送って接続を閉じた
    /// * `ConnectError::Repository` - ルームの取得・作成に失敗した
    /// * `ConnectError::RegisterFailed` - ハブが停止している
    pub async fn execute(&self, connection: Arc<Connection>) -> Result<(), ConnectError> {
        let room = connection.room().clone();
        let user_id = connection.user().id;

        // 1. ルームを取得、なければ公開ルームとして作成
        self.rooms.create_or_get_room(&room).await?;

        // 2. アクセス判定
        if !self.rooms.can_access(user_id, &room).await? {
            tracing::warn!(
                connection_id = %connection.id(),
                user_id = %user_id,
                room = %room,
                "Access denied on join"
            );
            if let Err(e) = self
                .message_pusher
                .push_to(&connection, &Envelope::AccessDenied)
                .await
            {
                tracing::debug!("Denial not delivered: {}", e);
            }
            connection.close().await;
            return Err(ConnectError::AccessDenied(room.into_string()));
        }

        // 3. ハブに登録
        self.message_pusher.register_client(connection)?;

        Ok(())
    }
}
