//! Hub Actor.
//!
//! A single task owns every structural change to the [`RoomDirectory`].
//! Register, unregister and broadcast requests are posted to one ordered
//! queue and executed one at a time, so envelopes reach a room in the order
//! their broadcasts were enqueued.
//!
//! Membership changes are reported on a separate event channel. The
//! consumer of that channel (persistence of join/leave messages, presence
//! pushes) runs outside the actor, and whatever it broadcasts goes back
//! through the same queue.
//!
//! The actor never waits on a transport close: evicted connections are
//! marked closed in place and their transports are closed on a separate
//! task, so one dead peer cannot stall requests for other rooms.

mod broadcast;
mod directory;

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use futures_util::future::join_all;
use tokio::{
    sync::{Mutex, RwLock, mpsc},
    task::JoinHandle,
};

use crate::{
    domain::{
        Connection, ConnectionIdentity, Envelope, MessagePushError, MessagePusher, RoomName,
        RoomPresence,
    },
    infrastructure::dto::encode_envelope,
};

pub use broadcast::{BroadcastEngine, BroadcastReport};
pub use directory::RoomDirectory;

/// Default upper bound for a single per-connection write.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct HubConfig {
    pub write_timeout: Duration,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            write_timeout: DEFAULT_WRITE_TIMEOUT,
        }
    }
}

/// Room membership change, emitted after the directory was updated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MembershipEvent {
    Joined(ConnectionIdentity),
    Left(ConnectionIdentity),
}

enum HubCommand {
    Register(Arc<Connection>),
    Unregister(Arc<Connection>),
    Broadcast { room: RoomName, envelope: Envelope },
    Shutdown,
}

/// Cloneable handle to a running hub.
#[derive(Clone)]
pub struct Hub {
    commands: mpsc::UnboundedSender<HubCommand>,
    directory: Arc<RwLock<RoomDirectory>>,
    engine: Arc<BroadcastEngine>,
    task: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl Hub {
    /// Spawn the hub actor.
    ///
    /// Returns the handle and the receiver of membership events. The actor
    /// runs until [`Hub::shutdown`] is called or every handle is dropped.
    pub fn start(config: HubConfig) -> (Self, mpsc::UnboundedReceiver<MembershipEvent>) {
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let directory = Arc::new(RwLock::new(RoomDirectory::new()));
        let engine = Arc::new(BroadcastEngine::new(
            Arc::clone(&directory),
            config.write_timeout,
        ));

        let actor = HubActor {
            commands: commands_rx,
            requeue: commands_tx.downgrade(),
            directory: Arc::clone(&directory),
            engine: Arc::clone(&engine),
            events: events_tx,
        };
        let task = tokio::spawn(actor.run());

        tracing::info!(
            write_timeout_ms = config.write_timeout.as_millis() as u64,
            "Hub started"
        );

        let hub = Self {
            commands: commands_tx,
            directory,
            engine,
            task: Arc::new(Mutex::new(Some(task))),
        };
        (hub, events_rx)
    }

    /// Stop the actor and wait for it to close every remaining connection.
    ///
    /// Requests already queued are processed first. Calling this more than
    /// once is harmless.
    pub async fn shutdown(&self) {
        let _ = self.commands.send(HubCommand::Shutdown);

        let task = self.task.lock().await.take();
        if let Some(task) = task
            && let Err(e) = task.await
        {
            tracing::error!("Hub task ended abnormally: {}", e);
        }
    }

    pub fn is_running(&self) -> bool {
        !self.commands.is_closed()
    }

    fn post(&self, command: HubCommand) -> Result<(), MessagePushError> {
        self.commands
            .send(command)
            .map_err(|_| MessagePushError::HubStopped)
    }
}

#[async_trait]
impl MessagePusher for Hub {
    fn register_client(&self, connection: Arc<Connection>) -> Result<(), MessagePushError> {
        self.post(HubCommand::Register(connection))
    }

    fn unregister_client(&self, connection: Arc<Connection>) -> Result<(), MessagePushError> {
        self.post(HubCommand::Unregister(connection))
    }

    fn broadcast(&self, room: RoomName, envelope: Envelope) -> Result<(), MessagePushError> {
        self.post(HubCommand::Broadcast { room, envelope })
    }

    async fn push_to(
        &self,
        connection: &Connection,
        envelope: &Envelope,
    ) -> Result<(), MessagePushError> {
        let payload =
            encode_envelope(envelope).map_err(|e| MessagePushError::PushFailed(e.to_string()))?;
        self.engine.send_to(connection, &payload).await
    }

    async fn room_presence(&self, room: &RoomName) -> Option<RoomPresence> {
        self.directory.read().await.presence(room)
    }

    async fn all_presence(&self) -> Vec<RoomPresence> {
        self.directory.read().await.all_presence()
    }

    async fn connections(&self) -> Vec<Arc<Connection>> {
        self.directory.read().await.connections()
    }
}

struct HubActor {
    commands: mpsc::UnboundedReceiver<HubCommand>,
    /// Used to schedule forced unregisters without keeping the queue alive
    requeue: mpsc::WeakUnboundedSender<HubCommand>,
    directory: Arc<RwLock<RoomDirectory>>,
    engine: Arc<BroadcastEngine>,
    events: mpsc::UnboundedSender<MembershipEvent>,
}

impl HubActor {
    async fn run(mut self) {
        while let Some(command) = self.commands.recv().await {
            match command {
                HubCommand::Register(connection) => self.register(connection).await,
                HubCommand::Unregister(connection) => self.unregister(connection).await,
                HubCommand::Broadcast { room, envelope } => {
                    self.broadcast(&room, &envelope).await
                }
                HubCommand::Shutdown => break,
            }
        }

        self.close_all().await;
        tracing::info!("Hub stopped");
    }

    async fn register(&self, connection: Arc<Connection>) {
        let (replaced, count) = {
            let mut directory = self.directory.write().await;
            let replaced = directory.insert(Arc::clone(&connection));
            (replaced, directory.members(connection.room()).len())
        };

        if replaced.is_some() {
            tracing::debug!(
                connection_id = %connection.id(),
                room = %connection.room(),
                "Connection re-registered, previous entry replaced"
            );
            return;
        }

        tracing::info!(
            connection_id = %connection.id(),
            user_id = %connection.user().id,
            room = %connection.room(),
            "'{}' joined room (now {} connections)",
            connection.user().name,
            count
        );
        self.emit(MembershipEvent::Joined(connection.identity().clone()));
    }

    async fn unregister(&self, connection: Arc<Connection>) {
        let removed = {
            let mut directory = self.directory.write().await;
            directory.remove(&connection)
        };

        let Some(removed) = removed else {
            tracing::debug!(
                connection_id = %connection.id(),
                "Unregister for unknown connection ignored"
            );
            return;
        };

        removed.mark_closed();
        let closing = Arc::clone(&removed);
        tokio::spawn(async move { closing.close().await });

        tracing::info!(
            connection_id = %removed.id(),
            user_id = %removed.user().id,
            room = %removed.room(),
            "'{}' left room",
            removed.user().name
        );
        self.emit(MembershipEvent::Left(removed.identity().clone()));
    }

    async fn broadcast(&self, room: &RoomName, envelope: &Envelope) {
        // encoded once, written to every member
        let payload = match encode_envelope(envelope) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(room = %room, "Failed to encode envelope: {}", e);
                return;
            }
        };

        let report = self.engine.broadcast_to_room(room, &payload).await;

        for failed in report.failed {
            // later broadcasts already queued for this room skip it at once
            failed.mark_closed();
            match self.requeue.upgrade() {
                Some(queue) => {
                    let _ = queue.send(HubCommand::Unregister(failed));
                }
                None => {
                    // every handle is gone; the directory is drained on exit
                    break;
                }
            }
        }
    }

    async fn close_all(&self) {
        let remaining = self.directory.write().await.drain();
        if !remaining.is_empty() {
            tracing::info!("Closing {} remaining connections", remaining.len());
        }
        join_all(remaining.iter().map(|connection| connection.close())).await;
    }

    fn emit(&self, event: MembershipEvent) {
        if self.events.send(event).is_err() {
            tracing::debug!("Membership event dropped, no consumer");
        }
    }
}
