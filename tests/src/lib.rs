//! # Agora Test Suite
//!
//! End-to-end tests that start a real gateway on an ephemeral port and talk
//! to it the way a browser client does: JSON over HTTP and events over `/ws`.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── harness.rs      # Live server, HTTP helpers, WebSocket client
//!     ├── rest_flows.rs   # Users, chats, polls, persistence
//!     └── realtime.rs     # Rooms, whiteboards, call signaling
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p agora-tests
//! cargo test -p agora-tests integration::realtime::
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

#[cfg(test)]
mod integration;
