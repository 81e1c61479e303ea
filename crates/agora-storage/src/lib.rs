//! # Agora Storage
//!
//! Persistence layer and application services.
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - Errors, collections, password hashing
//! - `ports/` - Port traits (inbound service APIs, outbound key-value SPI)
//! - `adapters/` - In-memory and file-backed key-value stores, time sources
//! - `documents` - Typed JSON document collections over a key-value store
//! - `service/` - User, message, chat and whiteboard services
//!
//! ## Consistency
//!
//! Every read-modify-write runs under the document store's write lock, so
//! concurrent votes, role changes or participant additions on the same
//! document never overwrite each other. Otherwise last write wins.
//!
//! ## Usage
//!
//! ```ignore
//! use agora_storage::{DocumentStore, Services};
//! use std::sync::Arc;
//!
//! let store = Arc::new(DocumentStore::in_memory());
//! let services = Services::new(store);
//! let user = services.users.save_user(new_user)?;
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod adapters;
pub mod documents;
pub mod domain;
pub mod ports;
pub mod service;

#[cfg(test)]
pub(crate) mod test_utils;

pub use adapters::storage::{FileBackedKVStore, InMemoryKVStore};
pub use adapters::time::{FixedTimeSource, SystemTimeSource};
pub use documents::{DocumentStore, Transaction};
pub use domain::collections::Collection;
pub use domain::errors::{ErrorKind, KVStoreError, ServiceError, StoreError};
pub use ports::inbound::{ChatApi, MessageApi, UserApi, WhiteboardApi};
pub use ports::outbound::{BatchOperation, KeyValueStore, TimeSource};
pub use service::{ChatService, MessageService, Services, UserService, WhiteboardService};
