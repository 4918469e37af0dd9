//! Broadcast Engine: fan one payload out to every member of a room.

use std::{sync::Arc, time::Duration};

use futures_util::future::join_all;
use tokio::sync::RwLock;

use crate::domain::{Connection, MessagePushError, RoomName};

use super::directory::RoomDirectory;

/// Outcome of one room broadcast.
#[derive(Debug, Default)]
pub struct BroadcastReport {
    pub delivered: usize,
    /// Members whose write failed; the caller evicts them.
    pub failed: Vec<Arc<Connection>>,
}

pub struct BroadcastEngine {
    directory: Arc<RwLock<RoomDirectory>>,
    write_timeout: Duration,
}

impl BroadcastEngine {
    pub fn new(directory: Arc<RwLock<RoomDirectory>>, write_timeout: Duration) -> Self {
        Self {
            directory,
            write_timeout,
        }
    }

    /// Write `payload` once to every current member of `room`.
    ///
    /// The member set is snapshotted under the read lock. Writes run
    /// concurrently, each under the member's own write lock, and a failing
    /// member never stops delivery to the others. An unknown or empty room
    /// yields an empty report.
    pub async fn broadcast_to_room(&self, room: &RoomName, payload: &str) -> BroadcastReport {
        let members = {
            let directory = self.directory.read().await;
            directory.members(room)
        };

        if members.is_empty() {
            tracing::debug!(room = %room, "no members to broadcast to");
            return BroadcastReport::default();
        }

        let results = join_all(members.iter().map(|member| async move {
            let result = member.send(payload, self.write_timeout).await;
            (member, result)
        }))
        .await;

        let mut report = BroadcastReport::default();
        for (member, result) in results {
            match result {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    tracing::warn!(
                        connection_id = %member.id(),
                        room = %room,
                        "failed to deliver broadcast: {}",
                        e
                    );
                    report.failed.push(Arc::clone(member));
                }
            }
        }

        tracing::debug!(
            room = %room,
            delivered = report.delivered,
            failed = report.failed.len(),
            "broadcast finished"
        );
        report
    }

    /// Write `payload` to a single connection.
    pub async fn send_to(
        &self,
        connection: &Connection,
        payload: &str,
    ) -> Result<(), MessagePushError> {
        connection.send(payload, self.write_timeout).await
    }
}
