//! UseCase: メッセージ削除処理
//!
//! 送信者本人だけが削除できる。削除は永続化層で完全に行われ
//! （返信の参照を外し、リアクションも削除）、その後 `delete` エンベロープを
//! メッセージのルームにブロードキャストする。

use std::sync::Arc;

use hiroba_shared::time::Clock;

use crate::domain::{
    ConnectionIdentity, Envelope, MessageId, MessagePusher, MessageRepository, Timestamp,
};

use super::error::DeleteMessageError;

/// メッセージ削除のユースケース
pub struct DeleteMessageUseCase {
    messages: Arc<dyn MessageRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
}

impl DeleteMessageUseCase {
    pub fn new(
        messages: Arc<dyn MessageRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            messages,
            message_pusher,
            clock,
        }
    }

    /// メッセージ削除を実行
    ///
    /// # Errors
    ///
    /// * `DeleteMessageError::NotFound` - メッセージが存在しない
    /// * `DeleteMessageError::NotOwner` - 要求者が送信者ではない
    pub async fn execute(
        &self,
        requester: &ConnectionIdentity,
        message_id: MessageId,
    ) -> Result<(), DeleteMessageError> {
        // 1. 削除対象のルームを確認
        let message = self.messages.get_message(&message_id).await?;

        // 2. 削除（所有者の確認は Repository が行う）
        self.messages
            .delete_message(&message_id, requester.user.id)
            .await?;

        tracing::info!(
            room = %message.room,
            message_id = %message_id,
            "Message deleted by '{}'",
            requester.user.name
        );

        // 3. ブロードキャスト
        let envelope = Envelope::Deleted {
            message_id,
            sender: requester.user.clone(),
            room: message.room.clone(),
            at: Timestamp::new(self.clock.now_millis()),
        };
        self.message_pusher.broadcast(message.room, envelope)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use hiroba_shared::time::FixedClock;

    use super::*;
    use crate::{
        domain::{
            ConnectionId, MessageKind, NewMessage, RoomName, UserId, UserProfile,
            pusher::MockMessagePusher,
        },
        infrastructure::repository::InMemoryMessageRepository,
    };

    fn identity(user_id: u64, name: &str, room: &str) -> ConnectionIdentity {
        ConnectionIdentity::new(
            ConnectionId::generate(),
            UserProfile::new(UserId::new(user_id), name, ""),
            RoomName::new(room).unwrap(),
        )
    }

    async fn seed(messages: &InMemoryMessageRepository, author: &ConnectionIdentity) -> MessageId {
        messages
            .create_message(NewMessage {
                sender: author.user.clone(),
                room: author.room.clone(),
                text: "hi".to_string(),
                kind: MessageKind::Message,
                media: None,
                reply_to: None,
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_owner_deletes_and_broadcasts() {
        // テスト項目: 送信者はメッセージを削除でき、delete エンベロープがブロードキャストされる
        // given (前提条件):
        let messages = Arc::new(InMemoryMessageRepository::new());
        let alice = identity(1, "alice", "general");
        let id = seed(&messages, &alice).await;
        let expected_id = id.clone();
        let mut pusher = MockMessagePusher::new();
        pusher
            .expect_broadcast()
            .withf(move |room, envelope| {
                room.as_str() == "general"
                    && envelope
                        == &Envelope::Deleted {
                            message_id: expected_id.clone(),
                            sender: UserProfile::new(UserId::new(1), "alice", ""),
                            room: RoomName::new("general").unwrap(),
                            at: Timestamp::new(42),
                        }
            })
            .times(1)
            .returning(|_, _| Ok(()));
        let usecase = DeleteMessageUseCase::new(
            messages.clone(),
            Arc::new(pusher),
            Arc::new(FixedClock::new(42)),
        );

        // when (操作):
        let result = usecase.execute(&alice, id.clone()).await;

        // then (期待する結果):
        assert!(result.is_ok());
        assert!(messages.get_message(&id).await.is_err());
    }

    #[tokio::test]
    async fn test_non_owner_cannot_delete() {
        // テスト項目: 送信者以外の削除は拒否され、ブロードキャストされない
        // given (前提条件):
        let messages = Arc::new(InMemoryMessageRepository::new());
        let alice = identity(1, "alice", "general");
        let bob = identity(2, "bob", "general");
        let id = seed(&messages, &alice).await;
        let mut pusher = MockMessagePusher::new();
        pusher.expect_broadcast().never();
        let usecase = DeleteMessageUseCase::new(
            messages.clone(),
            Arc::new(pusher),
            Arc::new(FixedClock::new(42)),
        );

        // when (操作):
        let result = usecase.execute(&bob, id.clone()).await;

        // then (期待する結果):
        assert_eq!(result, Err(DeleteMessageError::NotOwner(id.to_string())));
        assert!(messages.get_message(&id).await.is_ok());
    }

    #[tokio::test]
    async fn test_missing_message() {
        // テスト項目: 存在しないメッセージの削除は NotFound になる
        // given (前提条件):
        let mut pusher = MockMessagePusher::new();
        pusher.expect_broadcast().never();
        let usecase = DeleteMessageUseCase::new(
            Arc::new(InMemoryMessageRepository::new()),
            Arc::new(pusher),
            Arc::new(FixedClock::new(42)),
        );

        // when (操作):
        let result = usecase
            .execute(&identity(1, "alice", "general"), MessageId::new("gone").unwrap())
            .await;

        // then (期待する結果):
        assert_eq!(result, Err(DeleteMessageError::NotFound("gone".to_string())));
    }
}
