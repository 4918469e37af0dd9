//! Infrastructure layer: wire DTOs, persistence and transports.

pub mod dto;
pub mod repository;
pub mod transport;
