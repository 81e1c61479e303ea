//! # Domain
//!
//! - `collections` - Document collections and their key prefixes
//! - `errors` - Store and service error types
//! - `password` - Salted password hashing

pub mod collections;
pub mod errors;
pub mod password;
