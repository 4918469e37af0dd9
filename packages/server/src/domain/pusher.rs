//! MessagePusher trait 定義
//!
//! ユースケース層がハブに依頼する操作のインターフェース。
//! 登録・登録解除・ブロードキャストはハブのキューに積まれて直列に実行され、
//! 単一接続への送信と在室状況の参照は呼び出し元のタスクで実行される。

use std::sync::Arc;

use async_trait::async_trait;

use super::{
    connection::Connection, envelope::Envelope, error::MessagePushError,
    presence::RoomPresence, value_object::RoomName,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// 接続をルームに登録する（キューに積むだけで完了は待たない）
    fn register_client(&self, connection: Arc<Connection>) -> Result<(), MessagePushError>;

    /// 接続をルームから外し、トランスポートを閉じる（未登録なら何もしない）
    fn unregister_client(&self, connection: Arc<Connection>) -> Result<(), MessagePushError>;

    /// ルームの全メンバーにエンベロープを一度ずつ送信する
    fn broadcast(&self, room: RoomName, envelope: Envelope) -> Result<(), MessagePushError>;

    /// 単一の接続に送信する
    async fn push_to(
        &self,
        connection: &Connection,
        envelope: &Envelope,
    ) -> Result<(), MessagePushError>;

    /// ルームの在室状況（ルームがなければ None）
    async fn room_presence(&self, room: &RoomName) -> Option<RoomPresence>;

    /// 全ルームの在室状況（ルーム名順）
    async fn all_presence(&self) -> Vec<RoomPresence>;

    /// 全ての接続
    async fn connections(&self) -> Vec<Arc<Connection>>;
}
