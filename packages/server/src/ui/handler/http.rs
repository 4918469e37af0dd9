//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use crate::{
    domain::{RepositoryError, RoomName, UserId},
    infrastructure::dto::{
        http::{
            CreatePrivateRoomRequest, CreatePublicRoomRequest, ErrorResponse, HealthResponse,
            HistoryQuery, HistoryResponse, RoomDto, RoomListResponse,
        },
        websocket::{MessageEnvelope, RoomPresenceDto},
    },
    ui::state::AppState,
};

type ErrorReply = (StatusCode, Json<ErrorResponse>);

fn error_reply(status: StatusCode, error: impl ToString) -> ErrorReply {
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
}

fn repository_error_reply(e: RepositoryError) -> ErrorReply {
    let status = match e {
        RepositoryError::RoomAlreadyExists(_) => StatusCode::CONFLICT,
        RepositoryError::RoomNotFound(_) | RepositoryError::MessageNotFound(_) => {
            StatusCode::NOT_FOUND
        }
        RepositoryError::NotMessageOwner(_) => StatusCode::FORBIDDEN,
        RepositoryError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error_reply(status, e)
}

fn parse_room_name(name: String) -> Result<RoomName, ErrorReply> {
    RoomName::new(name).map_err(|e| error_reply(StatusCode::BAD_REQUEST, e))
}

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Get live rooms and who is in them
pub async fn get_rooms(State(state): State<Arc<AppState>>) -> Json<RoomListResponse> {
    let rooms = state.room_catalog_usecase.live_rooms().await;

    // Domain Model から DTO への変換
    Json(RoomListResponse {
        rooms: rooms.iter().map(RoomPresenceDto::from).collect(),
    })
}

/// Get persisted history of a room, oldest first
pub async fn get_room_messages(
    State(state): State<Arc<AppState>>,
    Path(room): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, ErrorReply> {
    let room = parse_room_name(room)?;
    let messages = state
        .room_catalog_usecase
        .history(&room, query.limit, query.offset)
        .await
        .map_err(repository_error_reply)?;

    Ok(Json(HistoryResponse {
        room: room.into_string(),
        messages: messages.iter().map(MessageEnvelope::from).collect(),
    }))
}

/// Create a public room
pub async fn create_public_room(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreatePublicRoomRequest>,
) -> Result<(StatusCode, Json<RoomDto>), ErrorReply> {
    let name = parse_room_name(request.name)?;
    let room = state
        .room_catalog_usecase
        .create_public_room(&name, request.description, UserId::new(request.creator_id))
        .await
        .map_err(repository_error_reply)?;

    Ok((StatusCode::CREATED, Json(RoomDto::from(&room))))
}

/// Create a private room with an initial member list
pub async fn create_private_room(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreatePrivateRoomRequest>,
) -> Result<(StatusCode, Json<RoomDto>), ErrorReply> {
    let name = parse_room_name(request.name)?;
    let members = request.member_ids.into_iter().map(UserId::new).collect();
    let room = state
        .room_catalog_usecase
        .create_private_room(
            &name,
            request.description,
            UserId::new(request.creator_id),
            members,
        )
        .await
        .map_err(repository_error_reply)?;

    Ok((StatusCode::CREATED, Json(RoomDto::from(&room))))
}
