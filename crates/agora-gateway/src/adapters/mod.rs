//! Adapters for the gateway's outbound ports.

pub mod google;

pub use google::TokenInfoVerifier;
