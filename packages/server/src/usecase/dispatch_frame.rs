//! UseCase: 受信フレームの振り分け
//!
//! 参加済みの接続から受信した全てのフレームについて、処理の前にアクセスを
//! 再検証する。再検証に失敗した接続には拒否エンベロープを一度だけ送り、
//! ハブから登録解除する。以降、その接続のフレームは処理しない。
//!
//! ドメインのエラー（他人のメッセージの削除、存在しないメッセージへの
//! リアクション、空のテキストなど）はそのフレームを捨てるだけで、
//! 接続は開いたまま、応答も返さない。
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - FrameDispatcher::dispatch() メソッド
//! - アクセスの再検証とフレーム種別ごとの振り分け
//!
//! ### なぜこのテストが必要か
//! - メンバーシップを取り消された接続が、拒否エンベロープ 1 回と登録解除の後に
//!   何も処理されないことを保証
//! - ping はブロードキャストされず、request_room_update は要求した接続にだけ送られる
//!
//! ### どのような状況を想定しているか
//! - 正常系：message / delete / reaction / ping / request_room_update
//! - 異常系：アクセスの取り消し、再検証の失敗、不正なフレーム、ドメインエラー

use std::sync::Arc;

use crate::domain::{Connection, Envelope, InboundCommand, MessagePusher};

use super::{
    access::AccessRevalidator, delete_message::DeleteMessageUseCase, presence::PresenceNotifier,
    react_to_message::ReactToMessageUseCase, send_message::SendMessageUseCase,
};

/// フレーム処理後の接続の扱い
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// 読み込みを続ける
    Continue,
    /// アクセスが拒否され、登録解除を依頼した。読み込みを止める
    Denied,
}

/// 受信フレームの振り分け
pub struct FrameDispatcher {
    revalidator: Arc<AccessRevalidator>,
    send_message: Arc<SendMessageUseCase>,
    delete_message: Arc<DeleteMessageUseCase>,
    react_to_message: Arc<ReactToMessageUseCase>,
    presence: Arc<PresenceNotifier>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl FrameDispatcher {
    pub fn new(
        revalidator: Arc<AccessRevalidator>,
        send_message: Arc<SendMessageUseCase>,
        delete_message: Arc<DeleteMessageUseCase>,
        react_to_message: Arc<ReactToMessageUseCase>,
        presence: Arc<PresenceNotifier>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            revalidator,
            send_message,
            delete_message,
            react_to_message,
            presence,
            message_pusher,
        }
    }

    /// 1 フレームを処理する
    ///
    /// `command` が `None` のフレームはデコードできなかったもので、
    /// アクセスの再検証だけを行って捨てる。
    pub async fn dispatch(
        &self,
        connection: &Arc<Connection>,
        command: Option<InboundCommand>,
    ) -> DispatchOutcome {
        let identity = connection.identity();

        // 1. アクセスの再検証
        match self
            .revalidator
            .can_access(identity.user.id, &identity.room)
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                self.deny(connection).await;
                return DispatchOutcome::Denied;
            }
            Err(e) => {
                tracing::warn!(
                    connection_id = %identity.id,
                    room = %identity.room,
                    "Access revalidation failed, dropping frame: {}",
                    e
                );
                return DispatchOutcome::Continue;
            }
        }

        let Some(command) = command else {
            return DispatchOutcome::Continue;
        };

        // 2. フレーム種別ごとの処理
        match command {
            InboundCommand::Ping => {
                tracing::trace!(connection_id = %identity.id, "Ping");
            }
            InboundCommand::RequestRoomUpdate => {
                if let Err(e) = self.presence.push_room_update(connection).await {
                    tracing::debug!(
                        connection_id = %identity.id,
                        "Room update not delivered: {}",
                        e
                    );
                }
            }
            InboundCommand::Post(post) => {
                if let Err(e) = self.send_message.execute(identity, post).await {
                    tracing::warn!(
                        connection_id = %identity.id,
                        room = %identity.room,
                        "Message dropped: {}",
                        e
                    );
                }
            }
            InboundCommand::Delete { message_id } => {
                if let Err(e) = self.delete_message.execute(identity, message_id).await {
                    tracing::warn!(
                        connection_id = %identity.id,
                        room = %identity.room,
                        "Delete dropped: {}",
                        e
                    );
                }
            }
            InboundCommand::React {
                message_id,
                emoji,
                action,
            } => {
                if let Err(e) = self
                    .react_to_message
                    .execute(identity, message_id, emoji, action)
                    .await
                {
                    tracing::warn!(
                        connection_id = %identity.id,
                        room = %identity.room,
                        "Reaction dropped: {}",
                        e
                    );
                }
            }
        }

        DispatchOutcome::Continue
    }

    /// 拒否エンベロープを送り、登録解除を依頼する
    async fn deny(&self, connection: &Arc<Connection>) {
        tracing::warn!(
            connection_id = %connection.id(),
            user_id = %connection.user().id,
            room = %connection.room(),
            "Access revoked, closing connection"
        );
        if let Err(e) = self
            .message_pusher
            .push_to(connection, &Envelope::AccessDenied)
            .await
        {
            tracing::debug!("Denial not delivered: {}", e);
        }
        if let Err(e) = self.message_pusher.unregister_client(Arc::clone(connection)) {
            tracing::debug!("Hub unavailable ({}), closing directly", e);
            connection.close().await;
        }
    }
}
