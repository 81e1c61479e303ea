//! # Event Publisher
//!
//! Publishing side of the bus.

use crate::connection::ConnectionId;
use crate::envelope::Envelope;
use crate::rooms::RoomRegistry;
use crate::subscriber::Subscription;
use crate::DEFAULT_CHANNEL_CAPACITY;
use agora_types::ServerEvent;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, trace};

/// Interface HTTP routes and WebSocket handlers use to emit real-time events.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish an envelope to the bus.
    ///
    /// # Returns
    ///
    /// The number of live subscriptions the envelope was handed to. This is
    /// not the number that will deliver it; audience filtering happens on the
    /// receiving side.
    async fn publish(&self, envelope: Envelope) -> usize;

    /// Total envelopes published.
    fn events_published(&self) -> u64;

    async fn to_everyone(&self, event: ServerEvent) -> usize {
        self.publish(Envelope::to_everyone(event)).await
    }

    async fn to_room(&self, room: &str, event: ServerEvent) -> usize {
        self.publish(Envelope::to_room(room, event)).await
    }

    async fn to_room_except(&self, room: &str, sender: ConnectionId, event: ServerEvent) -> usize {
        self.publish(Envelope::to_room_except(room, sender, event)).await
    }

    async fn to_connection(&self, conn: ConnectionId, event: ServerEvent) -> usize {
        self.publish(Envelope::to_connection(conn, event)).await
    }
}

/// In-memory bus over `tokio::sync::broadcast`.
///
/// Suitable for a single server process. Room membership lives in the
/// shared [`RoomRegistry`].
pub struct InMemoryEventBus {
    sender: broadcast::Sender<Arc<Envelope>>,
    rooms: Arc<RoomRegistry>,
    events_published: AtomicU64,
    capacity: usize,
}

impl InMemoryEventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_registry(capacity, Arc::new(RoomRegistry::default()))
    }

    #[must_use]
    pub fn with_registry(capacity: usize, rooms: Arc<RoomRegistry>) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            rooms,
            events_published: AtomicU64::new(0),
            capacity,
        }
    }

    /// Subscribe a connection. The subscription yields only envelopes
    /// addressed to `conn`.
    #[must_use]
    pub fn subscribe(&self, conn: ConnectionId) -> Subscription {
        debug!(connection_id = %conn, "New subscription created");
        Subscription::new(conn, self.sender.subscribe(), self.rooms.clone())
    }

    pub fn rooms(&self) -> &Arc<RoomRegistry> {
        &self.rooms
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventBus {
    async fn publish(&self, envelope: Envelope) -> usize {
        let event = envelope.event.name();
        let audience = format!("{:?}", envelope.audience);

        self.events_published.fetch_add(1, Ordering::Relaxed);

        match self.sender.send(Arc::new(envelope)) {
            Ok(receiver_count) => {
                debug!(
                    event = event,
                    audience = %audience,
                    receivers = receiver_count,
                    "Event published"
                );
                receiver_count
            }
            Err(_) => {
                // Nobody connected. Normal for HTTP-only traffic.
                trace!(event = event, audience = %audience, "Event dropped (no receivers)");
                0
            }
        }
    }

    fn events_published(&self) -> u64 {
        self.events_published.load(Ordering::Relaxed)
    }
}
