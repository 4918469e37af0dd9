//! UseCase: リアクション処理
//!
//! リアクションは (message, user, emoji) で一意。更新後は絵文字ごとの集計を
//! 全て計算し直した `reaction_update` を送る（差分ではなく置き換え）。

use std::sync::Arc;

use crate::domain::{
    ConnectionIdentity, Emoji, Envelope, Message, MessageId, MessagePusher, MessageRepository,
    ReactionAction, RoomRepository,
};

use super::error::ReactionError;

/// リアクションのユースケース
pub struct ReactToMessageUseCase {
    messages: Arc<dyn MessageRepository>,
    rooms: Arc<dyn RoomRepository>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl ReactToMessageUseCase {
    pub fn new(
        messages: Arc<dyn MessageRepository>,
        rooms: Arc<dyn RoomRepository>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            messages,
            rooms,
            message_pusher,
        }
    }

    /// リアクションを追加・削除・トグルする
    ///
    /// # Errors
    ///
    /// * `ReactionError::MessageNotFound` - メッセージが存在しない
    /// * `ReactionError::WrongRoom` - メッセージが接続中のルームのものではない
    /// * `ReactionError::NotMember` - プライベートルームのアクティブなメンバーではない
    pub async fn execute(
        &self,
        reactor: &ConnectionIdentity,
        message_id: MessageId,
        emoji: Emoji,
        action: ReactionAction,
    ) -> Result<Message, ReactionError> {
        // 1. メッセージが接続中のルームのものか確認
        let message = self.messages.get_message(&message_id).await?;
        if message.room != reactor.room {
            return Err(ReactionError::WrongRoom {
                message_room: message.room.into_string(),
                connection_room: reactor.room.to_string(),
            });
        }

        // 2. プライベートルームはアクティブなメンバーのみ
        let room = self.rooms.get_room(&message.room).await?;
        if room.is_private() {
            let is_member = self
                .rooms
                .is_active_member(reactor.user.id, &room.name)
                .await
                .unwrap_or(false);
            if !is_member {
                return Err(ReactionError::NotMember(room.name.into_string()));
            }
        }

        // 3. リアクションを更新
        let updated = match action {
            ReactionAction::Add => {
                self.messages
                    .add_reaction(&message_id, &reactor.user, &emoji)
                    .await?
            }
            ReactionAction::Remove => {
                self.messages
                    .remove_reaction(&message_id, reactor.user.id, &emoji)
                    .await?
            }
            ReactionAction::Toggle => {
                self.messages
                    .toggle_reaction(&message_id, &reactor.user, &emoji)
                    .await?
            }
        };

        tracing::debug!(
            room = %updated.room,
            message_id = %message_id,
            "Reaction {} {:?} by '{}'",
            emoji.as_str(),
            action,
            reactor.user.name
        );

        // 4. 集計済みのメッセージをブロードキャスト
        self.message_pusher
            .broadcast(updated.room.clone(), Envelope::ReactionUpdate(updated.clone()))?;

        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{
            ConnectionId, MessageKind, NewMessage, RoomName, UserId, UserProfile,
            pusher::MockMessagePusher,
        },
        infrastructure::repository::{InMemoryMessageRepository, InMemoryRoomRepository},
    };

    struct Fixture {
        messages: Arc<InMemoryMessageRepository>,
        rooms: Arc<InMemoryRoomRepository>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                messages: Arc::new(InMemoryMessageRepository::new()),
                rooms: Arc::new(InMemoryRoomRepository::new()),
            }
        }

        fn usecase(&self, pusher: MockMessagePusher) -> ReactToMessageUseCase {
            ReactToMessageUseCase::new(self.messages.clone(), self.rooms.clone(), Arc::new(pusher))
        }

        async fn post(&self, author: &ConnectionIdentity) -> MessageId {
            self.rooms.create_or_get_room(&author.room).await.unwrap();
            self.messages
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
    }

    fn identity(user_id: u64, name: &str, room: &str) -> ConnectionIdentity {
        ConnectionIdentity::new(
            ConnectionId::generate(),
            UserProfile::new(UserId::new(user_id), name, ""),
            RoomName::new(room).unwrap(),
        )
    }

    fn thumbs_up() -> Emoji {
        Emoji::new("👍").unwrap()
    }

    fn recording_pusher() -> (MockMessagePusher, Arc<std::sync::Mutex<Vec<Envelope>>>) {
        let sent = Arc::new(std::sync::Mutex::new(Vec::new()));
        let log = sent.clone();
        let mut pusher = MockMessagePusher::new();
        pusher.expect_broadcast().returning(move |_, envelope| {
            log.lock().unwrap().push(envelope);
            Ok(())
        });
        (pusher, sent)
    }

    #[tokio::test]
    async fn test_toggle_twice_broadcasts_two_full_updates() {
        // テスト項目: toggle を 2 回行うと reaction_update が 2 回送られ、2 回目は 👍 が 0 件になる
        // given (前提条件):
        let fixture = Fixture::new();
        let alice = identity(1, "alice", "general");
        let bob = identity(2, "bob", "general");
        let id = fixture.post(&bob).await;
        let (pusher, sent) = recording_pusher();
        let usecase = fixture.usecase(pusher);

        // when (操作):
        usecase
            .execute(&alice, id.clone(), thumbs_up(), ReactionAction::Toggle)
            .await
            .unwrap();
        usecase
            .execute(&alice, id.clone(), thumbs_up(), ReactionAction::Toggle)
            .await
            .unwrap();

        // then (期待する結果):
        let sent = sent.lock().unwrap();
        assert_eq!(sent.len(), 2);
        let Envelope::ReactionUpdate(first) = &sent[0] else {
            panic!("expected reaction update");
        };
        let summary = first.reaction_summary();
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].count, 1);
        assert_eq!(summary[0].user_names, vec!["alice"]);
        let Envelope::ReactionUpdate(second) = &sent[1] else {
            panic!("expected reaction update");
        };
        assert!(second.reaction_summary().is_empty());
    }

    #[tokio::test]
    async fn test_add_and_remove_are_idempotent() {
        // テスト項目: add の重複と存在しないリアクションの remove は状態を変えない
        // given (前提条件):
        let fixture = Fixture::new();
        let alice = identity(1, "alice", "general");
        let id = fixture.post(&alice).await;
        let (pusher, sent) = recording_pusher();
        let usecase = fixture.usecase(pusher);

        // when (操作):
        usecase
            .execute(&alice, id.clone(), thumbs_up(), ReactionAction::Add)
            .await
            .unwrap();
        let after_add = usecase
            .execute(&alice, id.clone(), thumbs_up(), ReactionAction::Add)
            .await
            .unwrap();
        usecase
            .execute(&alice, id.clone(), thumbs_up(), ReactionAction::Remove)
            .await
            .unwrap();
        let after_remove = usecase
            .execute(&alice, id.clone(), thumbs_up(), ReactionAction::Remove)
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(after_add.reactions.len(), 1);
        assert!(after_remove.reactions.is_empty());
        assert_eq!(sent.lock().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_reaction_from_other_room_is_rejected() {
        // テスト項目: 別のルームのメッセージへのリアクションは拒否される
        // given (前提条件):
        let fixture = Fixture::new();
        let bob = identity(2, "bob", "random");
        let id = fixture.post(&bob).await;
        let mut pusher = MockMessagePusher::new();
        pusher.expect_broadcast().never();
        let usecase = fixture.usecase(pusher);

        // when (操作):
        let result = usecase
            .execute(&identity(1, "alice", "general"), id, thumbs_up(), ReactionAction::Toggle)
            .await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(ReactionError::WrongRoom {
                message_room: "random".to_string(),
                connection_room: "general".to_string(),
            })
        );
    }

    #[tokio::test]
    async fn test_private_room_requires_active_membership() {
        // テスト項目: プライベートルームでは退出済みのメンバーはリアクションできない
        // given (前提条件):
        let fixture = Fixture::new();
        let secret = RoomName::new("secret").unwrap();
        fixture
            .rooms
            .create_private_room(&secret, String::new(), UserId::new(1), vec![UserId::new(2)])
            .await
            .unwrap();
        let alice = identity(1, "alice", "secret");
        let bob = identity(2, "bob", "secret");
        let id = fixture.post(&alice).await;
        fixture.rooms.leave_room(UserId::new(2), &secret).await.unwrap();
        let mut pusher = MockMessagePusher::new();
        pusher.expect_broadcast().never();
        let usecase = fixture.usecase(pusher);

        // when (操作):
        let result = usecase
            .execute(&bob, id, thumbs_up(), ReactionAction::Toggle)
            .await;

        // then (期待する結果):
        assert_eq!(result, Err(ReactionError::NotMember("secret".to_string())));
    }

    #[tokio::test]
    async fn test_missing_message() {
        // テスト項目: 存在しないメッセージへのリアクションは MessageNotFound になる
        // given (前提条件):
        let fixture = Fixture::new();
        let usecase = fixture.usecase(MockMessagePusher::new());

        // when (操作):
        let result = usecase
            .execute(
                &identity(1, "alice", "general"),
                MessageId::new("gone").unwrap(),
                thumbs_up(),
                ReactionAction::Toggle,
            )
            .await;

        // then (期待する結果):
        assert_eq!(result, Err(ReactionError::MessageNotFound("gone".to_string())));
    }
}
