//! # Adapters
//!
//! - `storage` - `KeyValueStore` implementations
//! - `time` - `TimeSource` implementations

pub mod storage;
pub mod time;
