//! Shared application state.

use std::sync::Arc;

use crate::usecase::{
    ConnectParticipantUseCase, DisconnectParticipantUseCase, FrameDispatcher, RoomCatalogUseCase,
};

/// Shared application state
pub struct AppState {
    /// ConnectParticipantUseCase（参加者接続のユースケース）
    pub connect_participant_usecase: Arc<ConnectParticipantUseCase>,
    /// DisconnectParticipantUseCase（参加者切断のユースケース）
    pub disconnect_participant_usecase: Arc<DisconnectParticipantUseCase>,
    /// FrameDispatcher（受信フレームの振り分け）
    pub frame_dispatcher: Arc<FrameDispatcher>,
    /// RoomCatalogUseCase（ルーム一覧・履歴・作成）
    pub room_catalog_usecase: Arc<RoomCatalogUseCase>,
}
