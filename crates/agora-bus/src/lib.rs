//! # Agora Bus - Real-time Fan-out
//!
//! Every outbound real-time event is published once as an [`Envelope`] that
//! names its audience. Each WebSocket connection holds a [`Subscription`]
//! that filters the shared broadcast stream down to what it should see.
//!
//! ```text
//! ┌──────────────┐  publish(Envelope)  ┌──────────────┐
//! │ HTTP routes  │ ──────────────────▶ │  Event Bus   │
//! │ WS handlers  │                     │ (broadcast)  │
//! └──────────────┘                     └──────┬───────┘
//!                                             │ recv()
//!                     ┌───────────────────────┼───────────────────────┐
//!                     ▼                       ▼                       ▼
//!              Subscription(c1)        Subscription(c2)        Subscription(c3)
//!                     │                       │                       │
//!                     └──── RoomRegistry::is_member(room, conn) ──────┘
//! ```
//!
//! Room membership is evaluated when an envelope is received, not when it is
//! published, so a connection that leaves a room stops seeing its traffic
//! immediately.

#![allow(clippy::missing_const_for_fn)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod connection;
pub mod envelope;
pub mod publisher;
pub mod rooms;
pub mod subscriber;

pub use connection::ConnectionId;
pub use envelope::{Audience, Envelope};
pub use publisher::{EventPublisher, InMemoryEventBus};
pub use rooms::{RoomError, RoomRegistry};
pub use subscriber::{Subscription, SubscriptionError};

/// Maximum envelopes buffered per subscriber before it starts lagging.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

/// Default cap on simultaneous room memberships for one connection.
pub const DEFAULT_MAX_ROOMS_PER_CONNECTION: usize = 256;
