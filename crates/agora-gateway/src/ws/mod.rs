//! WebSocket module for real-time rooms.
//!
//! Supports:
//! - joinChat / leaveChat, joinWhiteboard / leaveWhiteboard
//! - updateWhiteboard relayed to the rest of the board's room
//! - callUser / answerCall signaling between connections
//! - Message size limits and rate limiting

pub mod handler;

pub use handler::{ws_upgrade, WebSocketHandler};
