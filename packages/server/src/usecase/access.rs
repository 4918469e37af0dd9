//! アクセスの再検証
//!
//! 接続時と、受信した全てのフレームの処理前に呼ばれる。

use std::sync::Arc;

use crate::domain::{RepositoryError, RoomName, RoomRepository, UserId};

pub struct AccessRevalidator {
    rooms: Arc<dyn RoomRepository>,
}

impl AccessRevalidator {
    pub fn new(rooms: Arc<dyn RoomRepository>) -> Self {
        Self { rooms }
    }

    /// ユーザーがルームで操作できるか
    ///
    /// まだ存在しないルームは公開ルームとして作成できるため許可する。
    /// 既存のプライベートルームと名前が衝突する場合はリポジトリの判定に従う。
    pub async fn can_access(
        &self,
        user_id: UserId,
        room: &RoomName,
    ) -> Result<bool, RepositoryError> {
        match self.rooms.can_access(user_id, room).await {
            Err(RepositoryError::RoomNotFound(_)) => Ok(true),
            other => other,
        }
    }
}
