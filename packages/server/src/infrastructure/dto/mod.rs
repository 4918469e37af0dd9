//! Data Transfer Objects (DTOs) for the chat hub.
//!
//! DTOs are organized by protocol:
//! - `websocket`: WebSocket frame and envelope DTOs
//! - `http`: HTTP API request / response DTOs

pub mod conversion;
pub mod http;
pub mod websocket;

pub use conversion::{FrameError, encode_envelope};
