//! Live transports behind `PusherChannel`.

pub mod websocket;

pub use websocket::WebSocketChannel;
