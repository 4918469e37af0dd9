//! The live connection record.
//!
//! A `Connection` binds one authenticated user to one room and one outbound
//! transport. Writes to the transport go through a per-connection lock so
//! that a message fan-out and a presence push aimed at the same socket can
//! never interleave frames.

use std::{
    sync::atomic::{AtomicBool, Ordering},
    time::Duration,
};

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{
    entity::UserProfile,
    error::MessagePushError,
    value_object::{ConnectionId, RoomName},
};

/// Outbound half of a live transport (one WebSocket, or a test double).
#[async_trait]
pub trait PusherChannel: Send {
    /// Write one text frame.
    async fn send_text(&mut self, text: &str) -> Result<(), MessagePushError>;

    /// Close the transport. Must be safe to call on a broken transport.
    async fn close(&mut self);
}

/// Immutable identity of a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionIdentity {
    pub id: ConnectionId,
    pub user: UserProfile,
    pub room: RoomName,
}

impl ConnectionIdentity {
    pub fn new(id: ConnectionId, user: UserProfile, room: RoomName) -> Self {
        Self { id, user, room }
    }
}

/// Upper bound for closing a transport, including waiting for its write lock.
pub const DEFAULT_CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// One live connection bound to exactly one room.
pub struct Connection {
    identity: ConnectionIdentity,
    channel: Mutex<Box<dyn PusherChannel>>,
    /// Set once no further writes are accepted
    closed: AtomicBool,
    /// Set once the transport close has been started
    transport_closed: AtomicBool,
    close_timeout: Duration,
}

impl Connection {
    pub fn new(identity: ConnectionIdentity, channel: Box<dyn PusherChannel>) -> Self {
        Self {
            identity,
            channel: Mutex::new(channel),
            closed: AtomicBool::new(false),
            transport_closed: AtomicBool::new(false),
            close_timeout: DEFAULT_CLOSE_TIMEOUT,
        }
    }

    pub fn with_close_timeout(mut self, close_timeout: Duration) -> Self {
        self.close_timeout = close_timeout;
        self
    }

    pub fn identity(&self) -> &ConnectionIdentity {
        &self.identity
    }

    pub fn id(&self) -> &ConnectionId {
        &self.identity.id
    }

    pub fn user(&self) -> &UserProfile {
        &self.identity.user
    }

    pub fn room(&self) -> &RoomName {
        &self.identity.room
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Write one text frame under this connection's write lock.
    ///
    /// # Errors
    ///
    /// - `MessagePushError::Closed` if the connection was closed
    /// - `MessagePushError::Timeout` if the write exceeded `write_timeout`
    /// - whatever the transport reports otherwise
    pub async fn send(&self, text: &str, write_timeout: Duration) -> Result<(), MessagePushError> {
        if self.is_closed() {
            return Err(MessagePushError::Closed(self.id().to_string()));
        }

        let mut channel = self.channel.lock().await;
        // may have been closed while waiting for the lock
        if self.is_closed() {
            return Err(MessagePushError::Closed(self.id().to_string()));
        }
        match tokio::time::timeout(write_timeout, channel.send_text(text)).await {
            Ok(result) => result,
            Err(_) => Err(MessagePushError::Timeout(self.id().to_string())),
        }
    }

    /// Reject every later write without touching the transport.
    pub fn mark_closed(&self) {
        self.closed.store(true, Ordering::Release);
    }

    /// Close the transport. Only the first call reaches the channel, and it
    /// gives up after the close timeout.
    pub async fn close(&self) {
        self.mark_closed();
        if self.transport_closed.swap(true, Ordering::AcqRel) {
            return;
        }

        let close = async {
            let mut channel = self.channel.lock().await;
            channel.close().await;
        };
        if tokio::time::timeout(self.close_timeout, close).await.is_err() {
            tracing::debug!(connection_id = %self.id(), "Transport close timed out");
        }
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("identity", &self.identity)
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Test doubles for `PusherChannel`.

    use std::sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    };

    use tokio::sync::mpsc;

    use super::*;
    use crate::domain::value_object::UserId;

    /// Channel that forwards every frame to an mpsc receiver.
    pub struct RecordingChannel {
        frames: mpsc::UnboundedSender<String>,
        fail: Arc<AtomicBool>,
        closes: Arc<AtomicUsize>,
    }

    /// Handles that let a test observe a `RecordingChannel`.
    pub struct ChannelProbe {
        pub frames: mpsc::UnboundedReceiver<String>,
        pub fail: Arc<AtomicBool>,
        pub closes: Arc<AtomicUsize>,
    }

    impl ChannelProbe {
        /// Drain every frame received so far.
        pub fn drain(&mut self) -> Vec<String> {
            let mut frames = Vec::new();
            while let Ok(frame) = self.frames.try_recv() {
                frames.push(frame);
            }
            frames
        }

        pub fn close_count(&self) -> usize {
            self.closes.load(Ordering::SeqCst)
        }
    }

    pub fn recording_channel() -> (RecordingChannel, ChannelProbe) {
        let (tx, rx) = mpsc::unbounded_channel();
        let fail = Arc::new(AtomicBool::new(false));
        let closes = Arc::new(AtomicUsize::new(0));
        (
            RecordingChannel {
                frames: tx,
                fail: fail.clone(),
                closes: closes.clone(),
            },
            ChannelProbe {
                frames: rx,
                fail,
                closes,
            },
        )
    }

    #[async_trait]
    impl PusherChannel for RecordingChannel {
        async fn send_text(&mut self, text: &str) -> Result<(), MessagePushError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(MessagePushError::PushFailed("broken pipe".to_string()));
            }
            self.frames
                .send(text.to_string())
                .map_err(|e| MessagePushError::PushFailed(e.to_string()))
        }

        async fn close(&mut self) {
            self.closes.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Channel whose writes and close never complete.
    pub struct HangingChannel;

    #[async_trait]
    impl PusherChannel for HangingChannel {
        async fn send_text(&mut self, _text: &str) -> Result<(), MessagePushError> {
            std::future::pending::<()>().await;
            Ok(())
        }

        async fn close(&mut self) {
            std::future::pending::<()>().await;
        }
    }

    /// Channel that writes each frame in two halves with a yield between
    /// them, so unserialized writers would interleave.
    pub struct SplitWriteChannel {
        pub parts: Arc<std::sync::Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl PusherChannel for SplitWriteChannel {
        async fn send_text(&mut self, text: &str) -> Result<(), MessagePushError> {
            self.push(format!("{text}:head"));
            tokio::task::yield_now().await;
            self.push(format!("{text}:tail"));
            Ok(())
        }

        async fn close(&mut self) {}
    }

    impl SplitWriteChannel {
        fn push(&self, part: String) {
            self.parts.lock().unwrap().push(part);
        }
    }

    /// Connection for `user_name` in `room` over an arbitrary channel.
    pub fn connection_over(
        user_id: u64,
        user_name: &str,
        room: &str,
        channel: Box<dyn PusherChannel>,
    ) -> Connection {
        let identity = ConnectionIdentity::new(
            ConnectionId::generate(),
            UserProfile::new(UserId::new(user_id), user_name, ""),
            RoomName::new(room).unwrap(),
        );
        Connection::new(identity, channel)
    }

    /// Channel whose writes never complete.
    pub struct StalledChannel;

    #[async_trait]
    impl PusherChannel for StalledChannel {
        async fn send_text(&mut self, _text: &str) -> Result<(), MessagePushError> {
            std::future::pending::<()>().await;
            Ok(())
        }

        async fn close(&mut self) {}
    }

    /// Build a connection for `user_name` (user id `user_id`) in `room`.
    pub fn test_connection(
        user_id: u64,
        user_name: &str,
        room: &str,
    ) -> (Arc<Connection>, ChannelProbe) {
        let (channel, probe) = recording_channel();
        let identity = ConnectionIdentity::new(
            ConnectionId::generate(),
            UserProfile::new(
                UserId::new(user_id),
                user_name,
                format!("https://avatars.test/{user_name}.png"),
            ),
            RoomName::new(room).unwrap(),
        );
        (Arc::new(Connection::new(identity, Box::new(channel))), probe)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{testing::*, *};

    const TIMEOUT: Duration = Duration::from_millis(200);

    #[tokio::test]
    async fn test_send_writes_to_channel() {
        // テスト項目: send したテキストがチャンネルに書き込まれる
        // given (前提条件):
        let (connection, mut probe) = test_connection(1, "alice", "general");

        // when (操作):
        let result = connection.send("hello", TIMEOUT).await;

        // then (期待する結果):
        assert!(result.is_ok());
        assert_eq!(probe.drain(), vec!["hello".to_string()]);
    }

    #[tokio::test]
    async fn test_send_after_close_fails() {
        // テスト項目: close 後の send は Closed エラーになり、close は一度だけ伝播する
        // given (前提条件):
        let (connection, probe) = test_connection(1, "alice", "general");

        // when (操作):
        connection.close().await;
        connection.close().await;
        let result = connection.send("hello", TIMEOUT).await;

        // then (期待する結果):
        assert!(matches!(result, Err(MessagePushError::Closed(_))));
        assert_eq!(probe.close_count(), 1);
        assert!(connection.is_closed());
    }

    #[tokio::test]
    async fn test_send_times_out_on_stalled_channel() {
        // テスト項目: 書き込みが終わらない場合はタイムアウトエラーになる
        // given (前提条件):
        let connection = connection_over(1, "alice", "general", Box::new(StalledChannel));

        // when (操作):
        let result = connection.send("hello", Duration::from_millis(20)).await;

        // then (期待する結果):
        assert!(matches!(result, Err(MessagePushError::Timeout(_))));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_sends_do_not_interleave() {
        // テスト項目: 同一接続への並行書き込みがフレーム単位で直列化される
        // given (前提条件): 1 フレームを 2 回に分けて書き込むチャンネル
        let parts = Arc::new(std::sync::Mutex::new(Vec::new()));
        let channel = SplitWriteChannel {
            parts: Arc::clone(&parts),
        };
        let connection = Arc::new(connection_over(1, "alice", "general", Box::new(channel)));

        // when (操作):
        let mut handles = Vec::new();
        for i in 0..20 {
            let connection = Arc::clone(&connection);
            handles.push(tokio::spawn(async move {
                connection.send(&format!("frame-{i}"), TIMEOUT).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        // then (期待する結果): head の直後には必ず同じフレームの tail が続く
        let parts = parts.lock().unwrap().clone();
        assert_eq!(parts.len(), 40);
        for pair in parts.chunks(2) {
            let head = pair[0].strip_suffix(":head").unwrap();
            assert_eq!(pair[1], format!("{head}:tail"));
        }
    }

    #[tokio::test]
    async fn test_close_gives_up_on_hanging_transport() {
        // テスト項目: クローズが終わらないトランスポートでも close はタイムアウトで戻る
        // given (前提条件):
        let connection = connection_over(1, "alice", "general", Box::new(HangingChannel))
            .with_close_timeout(Duration::from_millis(50));

        // when (操作):
        let returned = tokio::time::timeout(Duration::from_secs(2), connection.close()).await;

        // then (期待する結果):
        assert!(returned.is_ok());
        assert!(connection.is_closed());
    }

    #[tokio::test]
    async fn test_mark_closed_rejects_writes_without_closing_transport() {
        // テスト項目: mark_closed 後の send は Closed になり、トランスポートは閉じられない
        // given (前提条件):
        let (connection, probe) = test_connection(1, "alice", "general");

        // when (操作):
        connection.mark_closed();
        let result = connection.send("hello", TIMEOUT).await;

        // then (期待する結果):
        assert!(matches!(result, Err(MessagePushError::Closed(_))));
        assert_eq!(probe.close_count(), 0);

        // 後から close してもトランスポートには一度だけ届く
        connection.close().await;
        connection.close().await;
        assert_eq!(probe.close_count(), 1);
    }
}
