//! UseCase: 入退室イベントの処理
//!
//! ハブのアクターから通知される `MembershipEvent` を受け取り、
//! 永続化されたメンバーシップの更新、join / leave メッセージの保存と
//! ブロードキャスト、全接続への `room_update` の送信を行う。
//!
//! アクターの外で動くため、ここでの永続化がハブの処理を止めることはない。
//! ブロードキャストはハブのキューに積まれ、既に積まれているメッセージの後に届く。
//!
//! ## テスト作業記録
//!
//! - join / leave それぞれで、メンバーシップ更新 → メッセージ保存 → ブロードキャスト →
//!   在室状況の送信が行われることを確認
//! - メンバーシップ更新の失敗ではメッセージ保存を止めないこと、
//!   メッセージ保存の失敗ではブロードキャストしないことを確認

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::{
    domain::{
        ConnectionIdentity, Envelope, MessageKind, MessagePusher, MessageRepository, NewMessage,
        RoomRepository,
    },
    hub::MembershipEvent,
};

use super::presence::PresenceNotifier;

/// 入退室イベントのユースケース
pub struct MembershipUseCase {
    rooms: Arc<dyn RoomRepository>,
    messages: Arc<dyn MessageRepository>,
    message_pusher: Arc<dyn MessagePusher>,
    presence: Arc<PresenceNotifier>,
}

impl MembershipUseCase {
    pub fn new(
        rooms: Arc<dyn RoomRepository>,
        messages: Arc<dyn MessageRepository>,
        message_pusher: Arc<dyn MessagePusher>,
        presence: Arc<PresenceNotifier>,
    ) -> Self {
        Self {
            rooms,
            messages,
            message_pusher,
            presence,
        }
    }

    /// イベントチャンネルが閉じる（ハブが停止する）まで処理を続ける
    pub async fn run(self: Arc<Self>, mut events: mpsc::UnboundedReceiver<MembershipEvent>) {
        while let Some(event) = events.recv().await {
            self.handle(event).await;
        }
        tracing::debug!("Membership event stream closed");
    }

    /// 1 件のイベントを処理する
    pub async fn handle(&self, event: MembershipEvent) {
        match event {
            MembershipEvent::Joined(identity) => {
                if let Err(e) = self.rooms.join_room(identity.user.id, &identity.room).await {
                    tracing::warn!(
                        user_id = %identity.user.id,
                        room = %identity.room,
                        "Failed to activate membership: {}",
                        e
                    );
                }
                self.announce(&identity, MessageKind::Join).await;
            }
            MembershipEvent::Left(identity) => {
                if let Err(e) = self.rooms.leave_room(identity.user.id, &identity.room).await {
                    tracing::warn!(
                        user_id = %identity.user.id,
                        room = %identity.room,
                        "Failed to deactivate membership: {}",
                        e
                    );
                }
                self.announce(&identity, MessageKind::Leave).await;
            }
        }

        self.presence.push_to_all().await;
    }

    /// join / leave のシステムメッセージを保存してブロードキャストする
    async fn announce(&self, identity: &ConnectionIdentity, kind: MessageKind) {
        let new_message = NewMessage::system(identity.user.clone(), identity.room.clone(), kind);
        let message = match self.messages.create_message(new_message).await {
            Ok(message) => message,
            Err(e) => {
                tracing::error!(
                    connection_id = %identity.id,
                    room = %identity.room,
                    "Failed to persist {:?} message: {}",
                    kind,
                    e
                );
                return;
            }
        };

        if let Err(e) = self
            .message_pusher
            .broadcast(message.room.clone(), Envelope::Message(message))
        {
            tracing::debug!(room = %identity.room, "System message not broadcast: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use hiroba_shared::time::FixedClock;

    use super::*;
    use crate::{
        domain::{
            ConnectionId, RepositoryError, RoomName, UserId, UserProfile, pusher::MockMessagePusher,
            repository::MockMessageRepository,
        },
        infrastructure::repository::{InMemoryMessageRepository, InMemoryRoomRepository},
    };

    fn alice_in(room: &str) -> ConnectionIdentity {
        ConnectionIdentity::new(
            ConnectionId::generate(),
            UserProfile::new(UserId::new(1), "alice", ""),
            RoomName::new(room).unwrap(),
        )
    }

    /// broadcast を記録し、接続は 0 件として振る舞う MockMessagePusher
    fn recording_pusher() -> (MockMessagePusher, Arc<Mutex<Vec<Envelope>>>) {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let log = sent.clone();
        let mut pusher = MockMessagePusher::new();
        pusher.expect_broadcast().returning(move |_, envelope| {
            log.lock().unwrap().push(envelope);
            Ok(())
        });
        pusher.expect_connections().returning(Vec::new);
        (pusher, sent)
    }

    fn usecase(
        rooms: Arc<dyn RoomRepository>,
        messages: Arc<dyn MessageRepository>,
        pusher: MockMessagePusher,
    ) -> MembershipUseCase {
        let pusher: Arc<dyn MessagePusher> = Arc::new(pusher);
        let presence = Arc::new(PresenceNotifier::new(
            rooms.clone(),
            pusher.clone(),
            Arc::new(FixedClock::new(0)),
        ));
        MembershipUseCase::new(rooms, messages, pusher, presence)
    }

    #[tokio::test]
    async fn test_join_persists_and_broadcasts_system_message() {
        // テスト項目: join でメンバーシップが有効になり、join メッセージが保存・ブロードキャストされる
        // given (前提条件):
        let rooms = Arc::new(InMemoryRoomRepository::new());
        let general = RoomName::new("general").unwrap();
        rooms.create_or_get_room(&general).await.unwrap();
        let messages = Arc::new(InMemoryMessageRepository::new());
        let (pusher, sent) = recording_pusher();
        let usecase = usecase(rooms.clone(), messages.clone(), pusher);

        // when (操作):
        usecase
            .handle(MembershipEvent::Joined(alice_in("general")))
            .await;

        // then (期待する結果):
        assert!(rooms.is_active_member(UserId::new(1), &general).await.unwrap());
        let sent = sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        let Envelope::Message(message) = &sent[0] else {
            panic!("expected message envelope");
        };
        assert_eq!(message.kind, MessageKind::Join);
        assert_eq!(message.text, "alice joined the room");
        let history = messages.list_room_messages(&general, 10, 0).await.unwrap();
        assert_eq!(history, vec![message.clone()]);
    }

    #[tokio::test]
    async fn test_leave_deactivates_membership() {
        // テスト項目: leave でメンバーシップが無効になり、leave メッセージがブロードキャストされる
        // given (前提条件):
        let rooms = Arc::new(InMemoryRoomRepository::new());
        let general = RoomName::new("general").unwrap();
        rooms.create_or_get_room(&general).await.unwrap();
        rooms.join_room(UserId::new(1), &general).await.unwrap();
        let (pusher, sent) = recording_pusher();
        let usecase = usecase(rooms.clone(), Arc::new(InMemoryMessageRepository::new()), pusher);

        // when (操作):
        usecase.handle(MembershipEvent::Left(alice_in("general"))).await;

        // then (期待する結果):
        assert!(!rooms.is_active_member(UserId::new(1), &general).await.unwrap());
        let sent = sent.lock().unwrap();
        let Envelope::Message(message) = &sent[0] else {
            panic!("expected message envelope");
        };
        assert_eq!(message.kind, MessageKind::Leave);
        assert_eq!(message.text, "alice left the room");
    }

    #[tokio::test]
    async fn test_persistence_failure_skips_broadcast_but_pushes_presence() {
        // テスト項目: システムメッセージの保存に失敗した場合はブロードキャストせず、在室状況だけ送る
        // given (前提条件):
        let rooms = Arc::new(InMemoryRoomRepository::new());
        rooms
            .create_or_get_room(&RoomName::new("general").unwrap())
            .await
            .unwrap();
        let mut messages = MockMessageRepository::new();
        messages
            .expect_create_message()
            .returning(|_| Err(RepositoryError::Storage("disk full".to_string())));
        let mut pusher = MockMessagePusher::new();
        pusher.expect_broadcast().never();
        pusher.expect_connections().times(1).returning(Vec::new);
        let usecase = usecase(rooms, Arc::new(messages), pusher);

        // when (操作):
        usecase
            .handle(MembershipEvent::Joined(alice_in("general")))
            .await;

        // then (期待する結果): 呼び出し回数は mock が検証する
    }

    #[tokio::test]
    async fn test_run_consumes_until_channel_closes() {
        // テスト項目: イベントチャンネルが閉じるまで順に処理し、閉じたら終了する
        // given (前提条件):
        let rooms = Arc::new(InMemoryRoomRepository::new());
        rooms
            .create_or_get_room(&RoomName::new("general").unwrap())
            .await
            .unwrap();
        let (pusher, sent) = recording_pusher();
        let usecase = Arc::new(usecase(rooms, Arc::new(InMemoryMessageRepository::new()), pusher));
        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(MembershipEvent::Joined(alice_in("general"))).unwrap();
        tx.send(MembershipEvent::Left(alice_in("general"))).unwrap();
        drop(tx);

        // when (操作):
        usecase.run(rx).await;

        // then (期待する結果):
        let kinds: Vec<MessageKind> = sent
            .lock()
            .unwrap()
            .iter()
            .map(|envelope| match envelope {
                Envelope::Message(message) => message.kind,
                other => panic!("unexpected envelope: {other:?}"),
            })
            .collect();
        assert_eq!(kinds, vec![MessageKind::Join, MessageKind::Leave]);
    }
}
