//! # Agora Gateway
//!
//! HTTP and WebSocket front door for Agora.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        AGORA GATEWAY                         │
//! ├──────────────────────────────────────────────────────────────┤
//! │   /messaging  /chat  /user  /whiteboard          /ws         │
//! │        │        │      │         │                 │         │
//! │  ┌─────┴────────┴──────┴─────────┴─────┐   ┌───────┴──────┐  │
//! │  │ Tracing → CORS → Timeout → Body cap │   │ WebSocket    │  │
//! │  └─────────────────┬───────────────────┘   │ handler      │  │
//! │                    │                       └───────┬──────┘  │
//! │           Services (agora-storage)                 │         │
//! │                    │                               │         │
//! │                    └───────── publish ─────▶  Event bus      │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! REST handlers call the storage services, answer with the updated
//! resource and publish a real-time event on the bus. Each WebSocket
//! connection subscribes to the bus and sees only the envelopes addressed
//! to it: everyone, a room it has joined, or the connection itself.
//!
//! ## Usage
//!
//! ```ignore
//! use agora_gateway::{AgoraGateway, GatewayConfig};
//!
//! let mut gateway = AgoraGateway::new(GatewayConfig::default(), services, None)?;
//! let addr = gateway.start().await?;
//! ```

#![warn(clippy::all)]
#![deny(unsafe_code)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod adapters;
pub mod domain;
pub mod middleware;
pub mod ports;
pub mod router;
pub mod routes;
pub mod service;
pub mod ws;

#[cfg(test)]
pub(crate) mod test_utils;

// Re-exports for public API
pub use adapters::TokenInfoVerifier;
pub use domain::config::{parse_duration, GatewayConfig, WebSocketConfig};
pub use domain::error::{ApiError, GatewayError};
pub use ports::{GoogleIdentityVerifier, VerifyError};
pub use router::{build_router, AppState};
pub use service::AgoraGateway;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
