//! Terminal client for a STOMP-over-SockJS chat server with rooms, presence
//! and private messages.
//!
//! LAYOUT
//! ======
//! - [`transport`]: WebSocket connect, STOMP handshake, background reader.
//! - [`api`]: REST room endpoints.
//! - [`session`]: connection state machine and room switching.
//! - [`render`] / [`view`]: message rendering and the screen model.
//! - [`terminal`] / [`app`]: line input and printed output.

pub mod api;
pub mod app;
pub mod color;
pub mod config;
pub mod error;
pub mod model;
pub mod render;
pub mod session;
pub mod terminal;
pub mod topics;
pub mod transport;
pub mod view;

pub use error::{ChatError, ValidationError};
