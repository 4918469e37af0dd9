//! UseCase: 参加者切断処理
//!
//! 読み込みループの終了（クライアントの切断、読み込みエラー）で呼ばれる。
//! 書き込み失敗による強制切断はハブ自身が行うため、ここは通らない。

use std::sync::Arc;

use crate::domain::{Connection, MessagePusher};

/// 参加者切断のユースケース
pub struct DisconnectParticipantUseCase {
    /// MessagePusher（ハブ）
    message_pusher: Arc<dyn MessagePusher>,
}

impl DisconnectParticipantUseCase {
    /// 新しい DisconnectParticipantUseCase を作成
    pub fn new(message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self { message_pusher }
    }

    /// 参加者切断を実行
    ///
    /// ハブに登録解除を依頼する。ハブが既に停止していれば、接続をここで閉じる。
    pub async fn execute(&self, connection: Arc<Connection>) {
        if let Err(e) = self.message_pusher.unregister_client(Arc::clone(&connection)) {
            tracing::debug!(
                connection_id = %connection.id(),
                "Hub unavailable on disconnect ({}), closing directly",
                e
            );
            connection.close().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        MessagePushError, connection::testing::test_connection, pusher::MockMessagePusher,
    };

    #[tokio::test]
    async fn test_disconnect_unregisters_from_hub() {
        // テスト項目: 切断でハブに登録解除が依頼される
        // given (前提条件):
        let (connection, probe) = test_connection(1, "alice", "general");
        let mut pusher = MockMessagePusher::new();
        let expected_id = connection.id().clone();
        pusher
            .expect_unregister_client()
            .withf(move |c| c.id() == &expected_id)
            .times(1)
            .returning(|_| Ok(()));
        let usecase = DisconnectParticipantUseCase::new(Arc::new(pusher));

        // when (操作):
        usecase.execute(connection.clone()).await;

        // then (期待する結果): 接続を閉じるのはハブの役割
        assert_eq!(probe.close_count(), 0);
    }

    #[tokio::test]
    async fn test_disconnect_closes_directly_when_hub_stopped() {
        // テスト項目: ハブが停止している場合は接続を直接閉じる
        // given (前提条件):
        let (connection, probe) = test_connection(1, "alice", "general");
        let mut pusher = MockMessagePusher::new();
        pusher
            .expect_unregister_client()
            .returning(|_| Err(MessagePushError::HubStopped));
        let usecase = DisconnectParticipantUseCase::new(Arc::new(pusher));

        // when (操作):
        usecase.execute(connection.clone()).await;

        // then (期待する結果):
        assert!(connection.is_closed());
        assert_eq!(probe.close_count(), 1);
    }
}
