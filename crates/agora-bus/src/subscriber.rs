//! # Event Subscriber
//!
//! Receiving side of the bus: one [`Subscription`] per WebSocket connection.

use crate::connection::ConnectionId;
use crate::envelope::Envelope;
use crate::rooms::RoomRegistry;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::debug;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    #[error("Event bus closed")]
    Closed,
}

pub struct Subscription {
    conn: ConnectionId,
    receiver: broadcast::Receiver<Arc<Envelope>>,
    rooms: Arc<RoomRegistry>,
}

impl Subscription {
    pub(crate) fn new(
        conn: ConnectionId,
        receiver: broadcast::Receiver<Arc<Envelope>>,
        rooms: Arc<RoomRegistry>,
    ) -> Self {
        Self {
            conn,
            receiver,
            rooms,
        }
    }

    /// Next envelope addressed to this connection.
    ///
    /// # Returns
    ///
    /// - `Some(envelope)` - The next deliverable envelope
    /// - `None` - The bus was dropped
    pub async fn recv(&mut self) -> Option<Arc<Envelope>> {
        loop {
            let envelope = match self.receiver.recv().await {
                Ok(e) => e,
                Err(broadcast::error::RecvError::Closed) => return None,
                Err(broadcast::error::RecvError::Lagged(count)) => {
                    debug!(
                        connection_id = %self.conn,
                        lagged = count,
                        "Subscriber lagged, some events dropped"
                    );
                    continue;
                }
            };

            if envelope.is_addressed_to(&self.conn, &self.rooms) {
                return Some(envelope);
            }
        }
    }

    /// Non-blocking variant of [`Subscription::recv`].
    ///
    /// # Returns
    ///
    /// - `Ok(Some(envelope))` - A deliverable envelope was queued
    /// - `Ok(None)` - Nothing deliverable right now
    /// - `Err(SubscriptionError::Closed)` - The bus was dropped
    pub fn try_recv(&mut self) -> Result<Option<Arc<Envelope>>, SubscriptionError> {
        loop {
            let envelope = match self.receiver.try_recv() {
                Ok(e) => e,
                Err(broadcast::error::TryRecvError::Empty) => return Ok(None),
                Err(broadcast::error::TryRecvError::Closed) => {
                    return Err(SubscriptionError::Closed)
                }
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
            };

            if envelope.is_addressed_to(&self.conn, &self.rooms) {
                return Ok(Some(envelope));
            }
        }
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.conn
    }
}
