//! Room membership registry.
//!
//! Rooms are named sets of connections. Chat rooms are named by chat id and
//! whiteboard rooms by unique link; the registry does not care which.

use crate::connection::ConnectionId;
use crate::DEFAULT_MAX_ROOMS_PER_CONNECTION;
use dashmap::DashMap;
use std::collections::HashSet;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RoomError {
    #[error("Too many rooms joined (limit {limit})")]
    TooManyRooms { limit: usize },
}

pub struct RoomRegistry {
    /// Members by room name
    rooms: DashMap<String, HashSet<ConnectionId>>,
    /// Rooms by connection
    by_connection: DashMap<ConnectionId, HashSet<String>>,
    max_rooms_per_connection: usize,
}

impl RoomRegistry {
    pub fn new(max_rooms_per_connection: usize) -> Self {
        Self {
            rooms: DashMap::new(),
            by_connection: DashMap::new(),
            max_rooms_per_connection,
        }
    }

    /// Add `conn` to `room`.
    ///
    /// Returns `Ok(false)` when the connection was already a member.
    ///
    /// # Errors
    ///
    /// `RoomError::TooManyRooms` when the connection is at its room cap.
    pub fn join(&self, conn: ConnectionId, room: &str) -> Result<bool, RoomError> {
        {
            let mut joined = self.by_connection.entry(conn).or_default();
            if joined.contains(room) {
                return Ok(false);
            }
            if joined.len() >= self.max_rooms_per_connection {
                return Err(RoomError::TooManyRooms {
                    limit: self.max_rooms_per_connection,
                });
            }
            joined.insert(room.to_string());
        }

        self.rooms.entry(room.to_string()).or_default().insert(conn);

        debug!(connection_id = %conn, room = %room, "Joined room");
        Ok(true)
    }

    /// Remove `conn` from `room`. Returns whether it was a member.
    pub fn leave(&self, conn: ConnectionId, room: &str) -> bool {
        let was_member = self
            .by_connection
            .get_mut(&conn)
            .map(|mut joined| joined.remove(room))
            .unwrap_or(false);

        if was_member {
            self.drop_member(room, &conn);
            debug!(connection_id = %conn, room = %room, "Left room");
        }
        was_member
    }

    /// Remove `conn` from every room. Returns the rooms it was in.
    pub fn remove_connection(&self, conn: &ConnectionId) -> Vec<String> {
        let Some((_, joined)) = self.by_connection.remove(conn) else {
            return Vec::new();
        };

        for room in &joined {
            self.drop_member(room, conn);
        }

        debug!(
            connection_id = %conn,
            rooms = joined.len(),
            "Removed connection from all rooms"
        );
        joined.into_iter().collect()
    }

    pub fn is_member(&self, room: &str, conn: &ConnectionId) -> bool {
        self.rooms
            .get(room)
            .map(|members| members.contains(conn))
            .unwrap_or(false)
    }

    pub fn members(&self, room: &str) -> Vec<ConnectionId> {
        self.rooms
            .get(room)
            .map(|members| members.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn rooms_of(&self, conn: &ConnectionId) -> Vec<String> {
        self.by_connection
            .get(conn)
            .map(|joined| joined.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of non-empty rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Number of connections in at least one room.
    pub fn connection_count(&self) -> usize {
        self.by_connection.iter().filter(|e| !e.is_empty()).count()
    }

    pub fn max_rooms_per_connection(&self) -> usize {
        self.max_rooms_per_connection
    }

    fn drop_member(&self, room: &str, conn: &ConnectionId) {
        if let Some(mut members) = self.rooms.get_mut(room) {
            members.remove(conn);
        }
        self.rooms.remove_if(room, |_, members| members.is_empty());
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ROOMS_PER_CONNECTION)
    }
}
