//! Presence logic for live rooms.
//!
//! Pure functions over connection identities, kept free of locks and I/O so
//! they are easy to test.

use serde::{Deserialize, Serialize};

use super::{connection::ConnectionIdentity, value_object::RoomName};

/// Live presence of one room: how many connections, and whose.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomPresence {
    pub room: RoomName,
    pub count: usize,
    pub member_names: Vec<String>,
}

impl RoomPresence {
    pub fn empty(room: RoomName) -> Self {
        Self {
            room,
            count: 0,
            member_names: Vec::new(),
        }
    }
}

/// Build the presence snapshot of `room` from its member identities.
///
/// `count` is the number of connections; a user connected twice is counted
/// (and listed) twice. Names are sorted for consistent ordering.
pub fn build_room_presence<'a>(
    room: &RoomName,
    members: impl IntoIterator<Item = &'a ConnectionIdentity>,
) -> RoomPresence {
    let mut member_names: Vec<String> = members
        .into_iter()
        .map(|identity| identity.user.name.clone())
        .collect();
    member_names.sort();

    RoomPresence {
        room: room.clone(),
        count: member_names.len(),
        member_names,
    }
}

/// Sort presence snapshots by room name.
pub fn sort_by_room(presences: &mut [RoomPresence]) {
    presences.sort_by(|a, b| a.room.cmp(&b.room));
}
