//! WebSocket connection handlers.
//!
//! One task per connection: join handshake, then a read loop that hands
//! every frame to the `FrameDispatcher`. Outbound writes never happen here;
//! they go through the hub and the connection's own write lock.

use std::sync::Arc;

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures_util::stream::{SplitStream, StreamExt};
use serde::Deserialize;

use crate::{
    domain::{
        Connection, ConnectionId, ConnectionIdentity, InboundCommand, PusherChannel, RoomName,
        UserId, UserProfile,
    },
    infrastructure::{
        dto::websocket::{InboundFrame, JoinRoomRequest},
        transport::WebSocketChannel,
    },
    ui::state::AppState,
    usecase::{ConnectError, DispatchOutcome},
};

/// Identity of the session opening the socket.
///
/// Stands in for the identity provider: the values are taken as already
/// authenticated.
#[derive(Debug, Deserialize)]
pub struct WsIdentityQuery {
    pub user_id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub avatar: String,
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<WsIdentityQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    let user = match UserProfile::from_session(
        UserId::new(query.user_id),
        &query.name,
        &query.email,
        &query.avatar,
    ) {
        Ok(user) => user,
        Err(e) => {
            tracing::warn!(user_id = query.user_id, "Rejecting upgrade: {}", e);
            return Err(StatusCode::BAD_REQUEST);
        }
    };

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, user)))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, user: UserProfile) {
    let (sender, mut receiver) = socket.split();
    let mut channel = WebSocketChannel::new(sender);

    // 1. 最初のフレームで参加するルームを受け取る
    let Some(room) = read_join_request(&mut receiver).await else {
        tracing::info!(user_id = %user.id, "Join handshake failed, closing socket");
        channel.close().await;
        return;
    };

    let identity = ConnectionIdentity::new(ConnectionId::generate(), user, room);
    let connection = Arc::new(Connection::new(identity, Box::new(channel)));
    tracing::info!(
        connection_id = %connection.id(),
        user_id = %connection.user().id,
        room = %connection.room(),
        "Client '{}' joining",
        connection.user().name
    );

    // 2. アクセス確認とハブへの登録
    match state
        .connect_participant_usecase
        .execute(Arc::clone(&connection))
        .await
    {
        Ok(()) => {}
        Err(ConnectError::AccessDenied(_)) => return,
        Err(e) => {
            tracing::error!(connection_id = %connection.id(), "Failed to connect: {}", e);
            connection.close().await;
            return;
        }
    }

    // 3. 読み込みループ
    while let Some(msg) = receiver.next().await {
        let msg = match msg {
            Ok(msg) => msg,
            Err(e) => {
                tracing::debug!(connection_id = %connection.id(), "WebSocket error: {}", e);
                break;
            }
        };

        match msg {
            Message::Text(text) => {
                let command = decode_frame(text.as_str(), &connection);
                let outcome = state
                    .frame_dispatcher
                    .dispatch(&connection, command)
                    .await;
                if outcome == DispatchOutcome::Denied {
                    // 登録解除はディスパッチャーが依頼済み
                    return;
                }
            }
            Message::Close(_) => {
                tracing::info!(connection_id = %connection.id(), "Client requested close");
                break;
            }
            _ => {}
        }
    }

    // 4. 切断
    state
        .disconnect_participant_usecase
        .execute(Arc::clone(&connection))
        .await;
    tracing::info!(connection_id = %connection.id(), "Client disconnected");
}

/// Wait for the join frame. `None` if the socket closed first or the frame
/// was not a valid join request.
async fn read_join_request(receiver: &mut SplitStream<WebSocket>) -> Option<RoomName> {
    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                let request = match serde_json::from_str::<JoinRoomRequest>(text.as_str()) {
                    Ok(request) => request,
                    Err(e) => {
                        tracing::warn!("Malformed join frame: {}", e);
                        return None;
                    }
                };
                return match RoomName::new(request.room) {
                    Ok(room) => Some(room),
                    Err(e) => {
                        tracing::warn!("Invalid room in join frame: {}", e);
                        None
                    }
                };
            }
            Ok(Message::Ping(_) | Message::Pong(_)) => continue,
            Ok(_) => return None,
            Err(e) => {
                tracing::debug!("WebSocket error before join: {}", e);
                return None;
            }
        }
    }
    None
}

/// Decode one text frame. Undecodable frames are logged and become `None`.
fn decode_frame(text: &str, connection: &Connection) -> Option<InboundCommand> {
    let frame = match serde_json::from_str::<InboundFrame>(text) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::warn!(connection_id = %connection.id(), "Malformed frame: {}", e);
            return None;
        }
    };

    match InboundCommand::try_from(frame) {
        Ok(command) => Some(command),
        Err(e) => {
            tracing::warn!(connection_id = %connection.id(), "Invalid frame: {}", e);
            None
        }
    }
}
