//! Request handlers.

mod http;
mod websocket;

pub use http::{
    create_private_room, create_public_room, get_room_messages, get_rooms, health_check,
};
pub use websocket::websocket_handler;
