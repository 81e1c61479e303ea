//! Ports the gateway depends on.

pub mod outbound;

pub use outbound::{GoogleIdentityVerifier, VerifyError};
