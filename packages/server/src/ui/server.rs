//! Server execution logic.

use std::{future::Future, sync::Arc};

use axum::{
    Router,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::{
    hub::Hub,
    usecase::{
        ConnectParticipantUseCase, DisconnectParticipantUseCase, FrameDispatcher,
        RoomCatalogUseCase,
    },
};

use super::{
    handler::{
        create_private_room, create_public_room, get_room_messages, get_rooms, health_check,
        websocket_handler,
    },
    signal::shutdown_signal,
    state::AppState,
};

/// Room chat server
///
/// Owns the use cases served by the router and the hub they push through.
/// The hub is shut down once the HTTP server stops.
///
/// # Example
///
/// ```ignore
/// let app = app::build(&config);
/// app.server.run(&config.host, config.port).await?;
/// ```
pub struct Server {
    /// ConnectParticipantUseCase（参加者接続のユースケース）
    connect_participant_usecase: Arc<ConnectParticipantUseCase>,
    /// DisconnectParticipantUseCase（参加者切断のユースケース）
    disconnect_participant_usecase: Arc<DisconnectParticipantUseCase>,
    /// FrameDispatcher（受信フレームの振り分け）
    frame_dispatcher: Arc<FrameDispatcher>,
    /// RoomCatalogUseCase（ルーム一覧・履歴・作成）
    room_catalog_usecase: Arc<RoomCatalogUseCase>,
    /// Hub（ライブ接続の管理とブロードキャスト）
    hub: Hub,
}

impl Server {
    pub fn new(
        connect_participant_usecase: Arc<ConnectParticipantUseCase>,
        disconnect_participant_usecase: Arc<DisconnectParticipantUseCase>,
        frame_dispatcher: Arc<FrameDispatcher>,
        room_catalog_usecase: Arc<RoomCatalogUseCase>,
        hub: Hub,
    ) -> Self {
        Self {
            connect_participant_usecase,
            disconnect_participant_usecase,
            frame_dispatcher,
            room_catalog_usecase,
            hub,
        }
    }

    /// Build the router with every endpoint.
    pub fn router(&self) -> Router {
        let app_state = Arc::new(AppState {
            connect_participant_usecase: Arc::clone(&self.connect_participant_usecase),
            disconnect_participant_usecase: Arc::clone(&self.disconnect_participant_usecase),
            frame_dispatcher: Arc::clone(&self.frame_dispatcher),
            room_catalog_usecase: Arc::clone(&self.room_catalog_usecase),
        });

        Router::new()
            // WebSocket エンドポイント
            .route("/ws", get(websocket_handler))
            // HTTP エンドポイント
            .route("/api/health", get(health_check))
            .route("/api/rooms", get(get_rooms))
            .route("/api/rooms/public", post(create_public_room))
            .route("/api/rooms/private", post(create_private_room))
            .route("/api/rooms/{room}/messages", get(get_room_messages))
            .layer(TraceLayer::new_for_http())
            .with_state(app_state)
    }

    /// Serve on an already bound listener until `shutdown` resolves, then
    /// stop the hub.
    ///
    /// # Errors
    ///
    /// Returns an error if serving fails.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = self.router();

        tracing::info!("Hiroba server listening on {}", listener.local_addr()?);

        let result = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await;

        // 残っている接続はハブが閉じる
        self.hub.shutdown().await;
        result?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }

    /// Run the server until SIGINT / SIGTERM.
    ///
    /// # Arguments
    ///
    /// * `host` - The host address to bind to (e.g., "127.0.0.1")
    /// * `port` - The port number to bind to (e.g., 8080)
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(self, host: &str, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        let bind_addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&bind_addr).await?;

        tracing::info!("Connect to: ws://{}/ws", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        self.serve(listener, shutdown_signal()).await?;
        Ok(())
    }
}
