//! # Domain Errors
//!
//! Three layers, innermost first:
//!
//! - [`KVStoreError`] - the key-value backend failed
//! - [`StoreError`] - a document could not be stored or decoded
//! - [`ServiceError`] - an application operation was refused or failed
//!
//! [`ServiceError::kind`] is what outer layers branch on.

use agora_types::PollError;
use thiserror::Error;

/// Key-value store errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum KVStoreError {
    #[error("KV store I/O error: {message}")]
    IOError { message: String },
    #[error("KV store corruption: {message}")]
    CorruptionError { message: String },
}

impl From<std::io::Error> for KVStoreError {
    fn from(err: std::io::Error) -> Self {
        KVStoreError::IOError {
            message: err.to_string(),
        }
    }
}

/// Document store errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error(transparent)]
    Backend(#[from] KVStoreError),

    #[error("Malformed {collection} document {key}: {message}")]
    Serialization {
        collection: &'static str,
        key: String,
        message: String,
    },

    #[error("Duplicate {collection} key {key}")]
    Conflict { collection: &'static str, key: String },
}

/// Coarse classification used to map failures onto transport status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    Invalid,
    Forbidden,
    Unauthorized,
    Storage,
}

/// Errors returned by the application services.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ServiceError {
    #[error("User not found")]
    UserNotFound,

    #[error("Username {0} is already taken")]
    UsernameTaken(String),

    #[error("Google account is already linked to another user")]
    GoogleIdTaken,

    #[error("{0}")]
    InvalidUser(String),

    #[error("Invalid username or password")]
    AuthenticationFailed,

    #[error("Message sender is invalid or does not exist.")]
    InvalidSender,

    #[error("Message not found")]
    MessageNotFound,

    #[error("Message is not a poll")]
    NotAPoll,

    #[error(transparent)]
    InvalidPollOption(#[from] PollError),

    #[error("Chat not found")]
    ChatNotFound,

    #[error("User does not exist.")]
    UserDoesNotExist,

    #[error("Chat not found or user not a participant.")]
    ChatOrParticipantNotFound,

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Whiteboard with link {0} already exists")]
    WhiteboardExists(String),

    #[error("Whiteboard not found")]
    WhiteboardNotFound,

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::UserNotFound
            | ServiceError::MessageNotFound
            | ServiceError::ChatNotFound
            | ServiceError::UserDoesNotExist
            | ServiceError::ChatOrParticipantNotFound
            | ServiceError::WhiteboardNotFound => ErrorKind::NotFound,
            ServiceError::UsernameTaken(_)
            | ServiceError::GoogleIdTaken
            | ServiceError::WhiteboardExists(_) => ErrorKind::Conflict,
            ServiceError::InvalidUser(_)
            | ServiceError::InvalidSender
            | ServiceError::NotAPoll
            | ServiceError::InvalidPollOption(_) => ErrorKind::Invalid,
            ServiceError::PermissionDenied(_) => ErrorKind::Forbidden,
            ServiceError::AuthenticationFailed => ErrorKind::Unauthorized,
            ServiceError::Storage(_) => ErrorKind::Storage,
        }
    }
}

impl From<KVStoreError> for ServiceError {
    fn from(err: KVStoreError) -> Self {
        ServiceError::Storage(StoreError::Backend(err))
    }
}
