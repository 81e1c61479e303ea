//! Google ID token verification through the `tokeninfo` endpoint.

use crate::ports::outbound::{GoogleIdentityVerifier, VerifyError};
use agora_types::GoogleCredentials;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Claims returned by `tokeninfo?id_token=`.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenInfo {
    pub aud: String,
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    /// Google sends `"true"`/`"false"` strings; accept booleans too.
    #[serde(default)]
    pub email_verified: serde_json::Value,
    #[serde(default)]
    pub picture: Option<String>,
}

impl TokenInfo {
    fn is_email_verified(&self) -> bool {
        match &self.email_verified {
            serde_json::Value::Bool(b) => *b,
            serde_json::Value::String(s) => s.eq_ignore_ascii_case("true"),
            _ => false,
        }
    }

    /// Check the audience and email claims and map them to credentials.
    pub fn into_credentials(self, client_id: &str) -> Result<GoogleCredentials, VerifyError> {
        if self.aud != client_id {
            return Err(VerifyError::Invalid("audience mismatch".into()));
        }
        if !self.is_email_verified() {
            return Err(VerifyError::Invalid("email not verified".into()));
        }
        let email = self
            .email
            .filter(|e| !e.is_empty())
            .ok_or_else(|| VerifyError::Invalid("token carries no email".into()))?;
        if self.sub.is_empty() {
            return Err(VerifyError::Invalid("token carries no subject".into()));
        }

        Ok(GoogleCredentials {
            google_id: self.sub,
            email,
            picture: self.picture.filter(|p| !p.is_empty()),
        })
    }
}

/// Verifier backed by Google's `tokeninfo` endpoint.
pub struct TokenInfoVerifier {
    client: reqwest::Client,
    client_id: String,
    tokeninfo_url: String,
}

impl TokenInfoVerifier {
    pub fn new(
        client_id: impl Into<String>,
        tokeninfo_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, VerifyError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| VerifyError::Unavailable(e.to_string()))?;
        Ok(Self {
            client,
            client_id: client_id.into(),
            tokeninfo_url: tokeninfo_url.into(),
        })
    }
}

#[async_trait]
impl GoogleIdentityVerifier for TokenInfoVerifier {
    async fn verify(&self, credential: &str) -> Result<GoogleCredentials, VerifyError> {
        let response = self
            .client
            .get(&self.tokeninfo_url)
            .query(&[("id_token", credential)])
            .send()
            .await
            .map_err(|e| VerifyError::Unavailable(e.to_string()))?;

        let status = response.status();
        if status.is_client_error() {
            debug!(status = status.as_u16(), "Google rejected ID token");
            return Err(VerifyError::Invalid(format!("tokeninfo returned {}", status)));
        }
        if !status.is_success() {
            return Err(VerifyError::Unavailable(format!(
                "tokeninfo returned {}",
                status
            )));
        }

        let info: TokenInfo = response
            .json()
            .await
            .map_err(|e| VerifyError::Unavailable(e.to_string()))?;

        info.into_credentials(&self.client_id)
    }
}
