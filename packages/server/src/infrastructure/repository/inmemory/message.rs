//! InMemory Message Repository 実装
//!
//! ドメイン層が定義する MessageRepository trait の具体的な実装。
//! 作成順の連番をキーにした BTreeMap をインメモリ DB として使用します。
//!
//! 返信の参照は公開 ID ではなく内部の連番で保持し、返信元が削除されたら
//! 参照だけを外します（送信者とテキストのスナップショットは残る）。

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use async_trait::async_trait;
use hiroba_shared::time::{Clock, SystemClock};
use tokio::sync::RwLock;

use crate::domain::{
    Emoji, Message, MessageId, MessageRepository, NewMessage, Reaction, RepositoryError,
    RoomName, Timestamp, UserId, UserProfile,
};

struct StoredMessage {
    message: Message,
    /// 返信元の内部連番
    reply_to_seq: Option<u64>,
}

#[derive(Default)]
struct MessageStore {
    next_seq: u64,
    rows: BTreeMap<u64, StoredMessage>,
    /// 公開 ID → 内部連番
    index: HashMap<MessageId, u64>,
}

impl MessageStore {
    fn seq_of(&self, id: &MessageId) -> Result<u64, RepositoryError> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| RepositoryError::MessageNotFound(id.to_string()))
    }

    fn row_mut(&mut self, id: &MessageId) -> Result<&mut StoredMessage, RepositoryError> {
        let seq = self.seq_of(id)?;
        self.rows
            .get_mut(&seq)
            .ok_or_else(|| RepositoryError::MessageNotFound(id.to_string()))
    }
}

/// インメモリ Message Repository 実装
pub struct InMemoryMessageRepository {
    store: RwLock<MessageStore>,
    clock: Arc<dyn Clock>,
}

impl InMemoryMessageRepository {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// 作成時刻に使う時計を指定して作成
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            store: RwLock::new(MessageStore::default()),
            clock,
        }
    }

    fn now(&self) -> Timestamp {
        Timestamp::new(self.clock.now_millis())
    }
}

impl Default for InMemoryMessageRepository {
    fn default() -> Self {
        Self::new()
    }
}

fn has_reaction(message: &Message, user_id: UserId, emoji: &Emoji) -> bool {
    message
        .reactions
        .iter()
        .any(|r| r.user_id == user_id && &r.emoji == emoji)
}

fn push_reaction(
    message: &mut Message,
    user: &UserProfile,
    emoji: &Emoji,
    created_at: Timestamp,
) {
    if !has_reaction(message, user.id, emoji) {
        message.reactions.push(Reaction {
            user_id: user.id,
            user_name: user.name.clone(),
            emoji: emoji.clone(),
            created_at,
        });
    }
}

fn drop_reaction(message: &mut Message, user_id: UserId, emoji: &Emoji) {
    message
        .reactions
        .retain(|r| !(r.user_id == user_id && &r.emoji == emoji));
}

#[async_trait]
impl MessageRepository for InMemoryMessageRepository {
    async fn create_message(&self, new_message: NewMessage) -> Result<Message, RepositoryError> {
        let created_at = self.now();
        let mut store = self.store.write().await;

        // 解決できない返信 ID は参照なしのスナップショットとして保存する
        let mut reply_to = new_message.reply_to;
        let reply_to_seq = match reply_to.as_mut() {
            Some(reply) => {
                let seq = reply
                    .message_id
                    .as_ref()
                    .and_then(|id| store.index.get(id).copied());
                if seq.is_none() {
                    reply.message_id = None;
                }
                seq
            }
            None => None,
        };

        let message = Message {
            id: MessageId::generate(),
            sender: new_message.sender,
            room: new_message.room,
            text: new_message.text,
            kind: new_message.kind,
            media: new_message.media,
            reply_to,
            reactions: Vec::new(),
            created_at,
        };

        let seq = store.next_seq;
        store.next_seq += 1;
        store.index.insert(message.id.clone(), seq);
        store.rows.insert(
            seq,
            StoredMessage {
                message: message.clone(),
                reply_to_seq,
            },
        );

        Ok(message)
    }

    async fn get_message(&self, id: &MessageId) -> Result<Message, RepositoryError> {
        let store = self.store.read().await;
        let seq = store.seq_of(id)?;
        store
            .rows
            .get(&seq)
            .map(|row| row.message.clone())
            .ok_or_else(|| RepositoryError::MessageNotFound(id.to_string()))
    }

    async fn delete_message(
        &self,
        id: &MessageId,
        requester: UserId,
    ) -> Result<(), RepositoryError> {
        let mut store = self.store.write().await;
        let seq = store.seq_of(id)?;

        let is_owner = store
            .rows
            .get(&seq)
            .is_some_and(|row| row.message.sender.id == requester);
        if !is_owner {
            return Err(RepositoryError::NotMessageOwner(id.to_string()));
        }

        // 返信の参照を外す（リアクションはメッセージと一緒に消える）
        for row in store.rows.values_mut() {
            if row.reply_to_seq == Some(seq) {
                row.reply_to_seq = None;
                if let Some(reply) = row.message.reply_to.as_mut() {
                    reply.message_id = None;
                }
            }
        }

        store.rows.remove(&seq);
        store.index.remove(id);

        Ok(())
    }

    async fn add_reaction(
        &self,
        id: &MessageId,
        user: &UserProfile,
        emoji: &Emoji,
    ) -> Result<Message, RepositoryError> {
        let created_at = self.now();
        let mut store = self.store.write().await;
        let row = store.row_mut(id)?;
        push_reaction(&mut row.message, user, emoji, created_at);

        Ok(row.message.clone())
    }

    async fn remove_reaction(
        &self,
        id: &MessageId,
        user_id: UserId,
        emoji: &Emoji,
    ) -> Result<Message, RepositoryError> {
        let mut store = self.store.write().await;
        let row = store.row_mut(id)?;
        drop_reaction(&mut row.message, user_id, emoji);

        Ok(row.message.clone())
    }

    async fn toggle_reaction(
        &self,
        id: &MessageId,
        user: &UserProfile,
        emoji: &Emoji,
    ) -> Result<Message, RepositoryError> {
        let created_at = self.now();
        // 判定と更新は同じ書き込みロックの中で行う
        let mut store = self.store.write().await;
        let row = store.row_mut(id)?;

        if has_reaction(&row.message, user.id, emoji) {
            drop_reaction(&mut row.message, user.id, emoji);
        } else {
            push_reaction(&mut row.message, user, emoji, created_at);
        }

        Ok(row.message.clone())
    }

    async fn list_room_messages(
        &self,
        room: &RoomName,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Message>, RepositoryError> {
        let store = self.store.read().await;
        Ok(store
            .rows
            .values()
            .filter(|row| &row.message.room == room)
            .skip(offset)
            .take(limit)
            .map(|row| row.message.clone())
            .collect())
    }
}
