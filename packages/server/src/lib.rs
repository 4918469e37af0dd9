//! Hiroba server library.
//!
//! Room-based group chat: a hub actor that owns live room membership, a
//! broadcast engine that fans envelopes out to every member of a room, and
//! the use cases and handlers around them.

// layers
pub mod domain;
pub mod hub;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

pub mod app;
pub mod config;
