//! UseCase: メッセージ送信処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - SendMessageUseCase::execute() メソッド
//! - テキスト / メディアメッセージの保存とブロードキャスト、返信先の解決
//!
//! ### なぜこのテストが必要か
//! - 保存に失敗したメッセージがブロードキャストされないことを保証
//! - 返信先の ID は一度だけ解決され、解決できなくてもスナップショットは保存される
//!
//! ### どのような状況を想定しているか
//! - 正常系：テキストメッセージ、キャプション付きメディア
//! - エッジケース：存在しない返信先
//! - 異常系：保存の失敗

use std::sync::Arc;

use crate::domain::{
    ConnectionIdentity, Envelope, Message, MessageKind, MessagePusher, MessageRepository,
    NewMessage, PostMessage, ReplyRequest, ReplySnapshot,
};

use super::error::SendMessageError;

/// メッセージ送信のユースケース
pub struct SendMessageUseCase {
    /// Repository（メッセージの永続化）
    messages: Arc<dyn MessageRepository>,
    /// MessagePusher（ハブ）
    message_pusher: Arc<dyn MessagePusher>,
}

impl SendMessageUseCase {
    /// 新しい SendMessageUseCase を作成
    pub fn new(
        messages: Arc<dyn MessageRepository>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            messages,
            message_pusher,
        }
    }

    /// メッセージ送信を実行
    ///
    /// # Arguments
    ///
    /// * `sender` - 送信元の接続（送信者とルーム）
    /// * `post` - 送信するメッセージ
    ///
    /// # Returns
    ///
    /// * `Ok(Message)` - 保存されたメッセージ（ブロードキャストはキューに積まれた）
    /// * `Err(SendMessageError)` - 保存またはブロードキャストの依頼に失敗
    pub async fn execute(
        &self,
        sender: &ConnectionIdentity,
        post: PostMessage,
    ) -> Result<Message, SendMessageError> {
        // 1. 返信先を解決
        let reply_to = match post.reply_to().cloned() {
            Some(reply) => Some(self.resolve_reply(reply).await),
            None => None,
        };

        // 2. メッセージを保存
        let new_message = match post {
            PostMessage::Text { text, .. } => NewMessage {
                sender: sender.user.clone(),
                room: sender.room.clone(),
                text: text.into_string(),
                kind: MessageKind::Message,
                media: None,
                reply_to,
            },
            PostMessage::Media { media, caption, .. } => NewMessage {
                sender: sender.user.clone(),
                room: sender.room.clone(),
                text: caption,
                kind: MessageKind::Media,
                media: Some(media),
                reply_to,
            },
        };
        let message = self.messages.create_message(new_message).await?;

        tracing::debug!(
            room = %message.room,
            message_id = %message.id,
            "Message from '{}' persisted",
            message.sender.name
        );

        // 3. ルームにブロードキャスト
        self.message_pusher
            .broadcast(message.room.clone(), Envelope::Message(message.clone()))?;

        Ok(message)
    }

    /// 返信先の公開 ID を解決する。解決できなければ参照なしのスナップショットになる
    async fn resolve_reply(&self, reply: ReplyRequest) -> ReplySnapshot {
        let resolved = match &reply.message_id {
            Some(id) => match self.messages.get_message(id).await {
                Ok(original) => Some(original.id),
                Err(e) => {
                    tracing::debug!("Reply target not resolved: {}", e);
                    None
                }
            },
            None => None,
        };
        reply.into_snapshot(resolved)
    }
}
