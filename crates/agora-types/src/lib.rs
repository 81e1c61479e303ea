//! # Agora Types
//!
//! Domain entities and real-time event shapes shared by every crate in the
//! workspace.
//!
//! ## Clusters
//!
//! - **Accounts**: `User`, `SafeUser`, `NewUser`, `UserUpdate`, `GoogleCredentials`
//! - **Messaging**: `Message`, `StoredMessage`, `Poll`, `MessageType`
//! - **Chats**: `Chat`, `PopulatedChat`, `Permission`, `Role`
//! - **Whiteboards**: `Whiteboard`, `WhiteboardContent`, `Pixel`, `AccessType`
//! - **Real-time**: `ServerEvent`, `ClientEvent`
//!
//! ## Wire Conventions
//!
//! Field names are camelCase and document identifiers serialise as `_id`,
//! matching what existing web clients already send and expect.

pub mod chat;
pub mod ids;
pub mod message;
pub mod realtime;
pub mod user;
pub mod whiteboard;

pub use chat::{Chat, ChatMessage, ChatUpdateKind, NewChat, Permission, PopulatedChat, Role};
pub use ids::DocumentId;
pub use message::{Message, MessageType, Poll, PollError, PollOption, StoredMessage};
pub use realtime::{ClientEvent, ServerEvent};
pub use user::{
    GoogleCredentials, NewUser, PasswordHash, SafeUser, User, UserSummary, UserUpdate,
    UserUpdateKind,
};
pub use whiteboard::{
    AccessType, NewWhiteboard, Pixel, Whiteboard, WhiteboardContent, WhiteboardUpdate,
};
