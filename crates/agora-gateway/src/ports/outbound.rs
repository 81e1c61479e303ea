//! Outbound ports for the gateway.

use agora_types::GoogleCredentials;
use async_trait::async_trait;

/// Reasons a Google credential is not accepted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerifyError {
    /// Token rejected by Google or issued for another client
    #[error("Invalid Google credential: {0}")]
    Invalid(String),

    /// Google could not be reached or answered garbage
    #[error("Google verification unavailable: {0}")]
    Unavailable(String),
}

/// Verifies a Google ID token and extracts the identity it asserts.
#[async_trait]
pub trait GoogleIdentityVerifier: Send + Sync {
    async fn verify(&self, credential: &str) -> Result<GoogleCredentials, VerifyError>;
}
