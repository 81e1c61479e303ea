//! Audience-addressed events.

use crate::connection::ConnectionId;
use crate::rooms::RoomRegistry;
use agora_types::ServerEvent;

/// Who an envelope is for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Audience {
    Everyone,
    Room(String),
    Connection(ConnectionId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub audience: Audience,
    /// Never delivered to this connection, even when it is in the audience.
    pub except: Option<ConnectionId>,
    pub event: ServerEvent,
}

impl Envelope {
    pub fn to_everyone(event: ServerEvent) -> Self {
        Self {
            audience: Audience::Everyone,
            except: None,
            event,
        }
    }

    pub fn to_room(room: impl Into<String>, event: ServerEvent) -> Self {
        Self {
            audience: Audience::Room(room.into()),
            except: None,
            event,
        }
    }

    /// Room broadcast that skips the connection that caused it.
    pub fn to_room_except(room: impl Into<String>, sender: ConnectionId, event: ServerEvent) -> Self {
        Self {
            audience: Audience::Room(room.into()),
            except: Some(sender),
            event,
        }
    }

    pub fn to_connection(conn: ConnectionId, event: ServerEvent) -> Self {
        Self {
            audience: Audience::Connection(conn),
            except: None,
            event,
        }
    }

    /// Delivery rule, evaluated on the receiving side.
    pub fn is_addressed_to(&self, conn: &ConnectionId, registry: &RoomRegistry) -> bool {
        if self.except.as_ref() == Some(conn) {
            return false;
        }
        match &self.audience {
            Audience::Everyone => true,
            Audience::Room(room) => registry.is_member(room, conn),
            Audience::Connection(target) => target == conn,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event() -> ServerEvent {
        ServerEvent::Error("x".into())
    }

    #[test]
    fn test_everyone() {
        let registry = RoomRegistry::default();
        let envelope = Envelope::to_everyone(event());
        assert!(envelope.is_addressed_to(&ConnectionId::new(), &registry));
    }

    #[test]
    fn test_room_membership_checked() {
        let registry = RoomRegistry::default();
        let member = ConnectionId::new();
        let outsider = ConnectionId::new();
        registry.join(member, "board").unwrap();

        let envelope = Envelope::to_room("board", event());
        assert!(envelope.is_addressed_to(&member, &registry));
        assert!(!envelope.is_addressed_to(&outsider, &registry));

        registry.leave(member, "board");
        assert!(!envelope.is_addressed_to(&member, &registry));
    }

    #[test]
    fn test_except_sender() {
        let registry = RoomRegistry::default();
        let sender = ConnectionId::new();
        let peer = ConnectionId::new();
        registry.join(sender, "board").unwrap();
        registry.join(peer, "board").unwrap();

        let envelope = Envelope::to_room_except("board", sender, event());
        assert!(!envelope.is_addressed_to(&sender, &registry));
        assert!(envelope.is_addressed_to(&peer, &registry));
    }

    #[test]
    fn test_direct() {
        let registry = RoomRegistry::default();
        let target = ConnectionId::new();
        let envelope = Envelope::to_connection(target, event());
        assert!(envelope.is_addressed_to(&target, &registry));
        assert!(!envelope.is_addressed_to(&ConnectionId::new(), &registry));
    }
}
