//! Room Directory: live room name → member connections.
//!
//! Only the hub actor mutates the directory. Everything else takes the read
//! side of the surrounding `RwLock`.

use std::{collections::HashMap, sync::Arc};

use crate::domain::{
    Connection, ConnectionId, RoomName, RoomPresence, build_room_presence, presence::sort_by_room,
};

#[derive(Debug, Default)]
pub struct RoomDirectory {
    rooms: HashMap<RoomName, HashMap<ConnectionId, Arc<Connection>>>,
    /// Reverse index so that a connection id sits in exactly one room
    locations: HashMap<ConnectionId, RoomName>,
}

impl RoomDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `connection` to its room, creating the room on first join.
    ///
    /// Returns the entry that was replaced when the same connection id was
    /// already registered.
    pub fn insert(&mut self, connection: Arc<Connection>) -> Option<Arc<Connection>> {
        let id = connection.id().clone();
        let room = connection.room().clone();

        let replaced = match self.locations.get(&id).cloned() {
            Some(previous_room) => self.detach(&previous_room, &id),
            None => None,
        };

        self.rooms
            .entry(room.clone())
            .or_default()
            .insert(id.clone(), connection);
        self.locations.insert(id, room);

        replaced
    }

    /// Remove `connection` from its room. The room is deleted once empty.
    ///
    /// An entry registered under the same id by a different connection object
    /// is left untouched.
    pub fn remove(&mut self, connection: &Connection) -> Option<Arc<Connection>> {
        let id = connection.id();
        let room = self.locations.get(id)?.clone();

        let is_same = self
            .rooms
            .get(&room)
            .and_then(|members| members.get(id))
            .is_some_and(|registered| std::ptr::eq(Arc::as_ptr(registered), connection));
        if !is_same {
            return None;
        }

        self.detach(&room, id)
    }

    fn detach(&mut self, room: &RoomName, id: &ConnectionId) -> Option<Arc<Connection>> {
        let members = self.rooms.get_mut(room)?;
        let removed = members.remove(id);
        if members.is_empty() {
            self.rooms.remove(room);
        }
        if removed.is_some() {
            self.locations.remove(id);
        }
        removed
    }

    #[cfg(test)]
    fn contains(&self, id: &ConnectionId) -> bool {
        self.locations.contains_key(id)
    }

    #[cfg(test)]
    fn has_room(&self, room: &RoomName) -> bool {
        self.rooms.contains_key(room)
    }

    #[cfg(test)]
    fn room_count(&self) -> usize {
        self.rooms.len()
    }

    #[cfg(test)]
    fn connection_count(&self) -> usize {
        self.locations.len()
    }

    /// Snapshot of the members of `room` (empty if the room does not exist).
    pub fn members(&self, room: &RoomName) -> Vec<Arc<Connection>> {
        self.rooms
            .get(room)
            .map(|members| members.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn presence(&self, room: &RoomName) -> Option<RoomPresence> {
        self.rooms.get(room).map(|members| {
            build_room_presence(room, members.values().map(|c| c.identity()))
        })
    }

    /// Presence of every live room, ordered by room name.
    pub fn all_presence(&self) -> Vec<RoomPresence> {
        let mut presences: Vec<RoomPresence> = self
            .rooms
            .iter()
            .map(|(room, members)| {
                build_room_presence(room, members.values().map(|c| c.identity()))
            })
            .collect();
        sort_by_room(&mut presences);
        presences
    }

    pub fn connections(&self) -> Vec<Arc<Connection>> {
        self.rooms
            .values()
            .flat_map(|members| members.values().cloned())
            .collect()
    }

    /// Remove every connection, leaving the directory empty.
    pub fn drain(&mut self) -> Vec<Arc<Connection>> {
        self.locations.clear();
        self.rooms
            .drain()
            .flat_map(|(_, members)| members.into_values())
            .collect()
    }
}
