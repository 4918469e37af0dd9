//! InMemory Room Repository 実装
//!
//! ドメイン層が定義する RoomRepository trait の具体的な実装。
//! HashMap をインメモリ DB として使用します。
//!
//! ## アクセス規則
//!
//! - 公開ルーム: 誰でもアクセスできる
//! - プライベートルーム: 一度でもメンバーになったユーザー（非アクティブを含む）
//!   がアクセスできる。`revoke_membership` でメンバーシップごと削除される

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use hiroba_shared::time::{Clock, SystemClock};
use tokio::sync::RwLock;

use crate::domain::{
    MemberRole, RepositoryError, Room, RoomMembership, RoomName, RoomRepository,
    RoomVisibility, Timestamp, UserId,
};

struct RoomRecord {
    room: Room,
    members: HashMap<UserId, RoomMembership>,
}

/// インメモリ Room Repository 実装
pub struct InMemoryRoomRepository {
    rooms: RwLock<HashMap<RoomName, RoomRecord>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryRoomRepository {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            clock,
        }
    }

    fn now(&self) -> Timestamp {
        Timestamp::new(self.clock.now_millis())
    }

    fn membership(&self, user_id: UserId, role: MemberRole) -> RoomMembership {
        RoomMembership {
            user_id,
            role,
            is_active: true,
            joined_at: self.now(),
        }
    }

    async fn insert_new(
        &self,
        name: &RoomName,
        description: String,
        visibility: RoomVisibility,
        creator: UserId,
        members: Vec<UserId>,
    ) -> Result<Room, RepositoryError> {
        let mut rooms = self.rooms.write().await;
        if rooms.contains_key(name) {
            return Err(RepositoryError::RoomAlreadyExists(name.to_string()));
        }

        let room = Room {
            name: name.clone(),
            description,
            visibility,
            creator_id: Some(creator),
            created_at: self.now(),
        };

        let mut memberships = HashMap::new();
        memberships.insert(creator, self.membership(creator, MemberRole::Creator));
        for member in members.into_iter().filter(|id| *id != creator) {
            memberships
                .entry(member)
                .or_insert_with(|| self.membership(member, MemberRole::Member));
        }

        rooms.insert(
            name.clone(),
            RoomRecord {
                room: room.clone(),
                members: memberships,
            },
        );

        tracing::info!(room = %name, "Created {:?} room", visibility);
        Ok(room)
    }
}

impl Default for InMemoryRoomRepository {
    fn default() -> Self {
        Self::new()
    }
}

fn not_found(name: &RoomName) -> RepositoryError {
    RepositoryError::RoomNotFound(name.to_string())
}

#[async_trait]
impl RoomRepository for InMemoryRoomRepository {
    async fn create_or_get_room(&self, name: &RoomName) -> Result<Room, RepositoryError> {
        let mut rooms = self.rooms.write().await;
        if let Some(record) = rooms.get(name) {
            return Ok(record.room.clone());
        }

        let room = Room {
            name: name.clone(),
            description: String::new(),
            visibility: RoomVisibility::Public,
            creator_id: None,
            created_at: self.now(),
        };
        rooms.insert(
            name.clone(),
            RoomRecord {
                room: room.clone(),
                members: HashMap::new(),
            },
        );

        tracing::info!(room = %name, "Created public room on first join");
        Ok(room)
    }

    async fn create_public_room(
        &self,
        name: &RoomName,
        description: String,
        creator: UserId,
    ) -> Result<Room, RepositoryError> {
        self.insert_new(name, description, RoomVisibility::Public, creator, Vec::new())
            .await
    }

    async fn create_private_room(
        &self,
        name: &RoomName,
        description: String,
        creator: UserId,
        members: Vec<UserId>,
    ) -> Result<Room, RepositoryError> {
        self.insert_new(name, description, RoomVisibility::Private, creator, members)
            .await
    }

    async fn get_room(&self, name: &RoomName) -> Result<Room, RepositoryError> {
        let rooms = self.rooms.read().await;
        rooms
            .get(name)
            .map(|record| record.room.clone())
            .ok_or_else(|| not_found(name))
    }

    async fn can_access(&self, user_id: UserId, room: &RoomName) -> Result<bool, RepositoryError> {
        let rooms = self.rooms.read().await;
        let record = rooms.get(room).ok_or_else(|| not_found(room))?;

        if !record.room.is_private() {
            return Ok(true);
        }
        Ok(record.members.contains_key(&user_id))
    }

    async fn is_active_member(
        &self,
        user_id: UserId,
        room: &RoomName,
    ) -> Result<bool, RepositoryError> {
        let rooms = self.rooms.read().await;
        let record = rooms.get(room).ok_or_else(|| not_found(room))?;
        Ok(record
            .members
            .get(&user_id)
            .is_some_and(|membership| membership.is_active))
    }

    async fn join_room(&self, user_id: UserId, room: &RoomName) -> Result<(), RepositoryError> {
        let joined_at = self.now();
        let mut rooms = self.rooms.write().await;
        let record = rooms.get_mut(room).ok_or_else(|| not_found(room))?;

        record
            .members
            .entry(user_id)
            .and_modify(|membership| membership.is_active = true)
            .or_insert(RoomMembership {
                user_id,
                role: MemberRole::Member,
                is_active: true,
                joined_at,
            });
        Ok(())
    }

    async fn leave_room(&self, user_id: UserId, room: &RoomName) -> Result<(), RepositoryError> {
        let mut rooms = self.rooms.write().await;
        let record = rooms.get_mut(room).ok_or_else(|| not_found(room))?;

        if let Some(membership) = record.members.get_mut(&user_id) {
            membership.is_active = false;
        }
        Ok(())
    }

    async fn revoke_membership(
        &self,
        user_id: UserId,
        room: &RoomName,
    ) -> Result<(), RepositoryError> {
        let mut rooms = self.rooms.write().await;
        let record = rooms.get_mut(room).ok_or_else(|| not_found(room))?;

        if record.members.remove(&user_id).is_some() {
            tracing::info!(room = %room, user_id = %user_id, "Membership revoked");
        }
        Ok(())
    }
}
