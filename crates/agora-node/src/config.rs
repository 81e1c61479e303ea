//! Node configuration loaded from the environment.

use agora_gateway::{parse_duration, GatewayConfig};
use agora_storage::{DocumentStore, KVStoreError};
use std::net::IpAddr;
use std::path::PathBuf;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} has an invalid value {value:?}: {reason}")]
    InvalidVar {
        var: &'static str,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    fn invalid(var: &'static str, value: &str, reason: impl ToString) -> Self {
        ConfigError::InvalidVar {
            var,
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Everything the binary needs to assemble a node.
#[derive(Debug, Clone, Default)]
pub struct NodeConfig {
    pub gateway: GatewayConfig,
    /// Snapshot file for the document store. `None` keeps data in memory.
    pub data_path: Option<PathBuf>,
}

impl NodeConfig {
    /// Load configuration from the process environment.
    ///
    /// - `PORT`: listen port (default 8000)
    /// - `HOST`: listen address (default 0.0.0.0)
    /// - `CLIENT_URL`: allowed CORS origin (default http://localhost:3000)
    /// - `AGORA_DATA_PATH`: document store snapshot file
    /// - `GOOGLE_CLIENT_ID`: enables Google sign-in
    /// - `AGORA_WS_MAX_MESSAGE_SIZE`: bytes per WebSocket frame
    /// - `AGORA_WS_RATE_LIMIT`: frames per second per connection
    /// - `AGORA_REQUEST_TIMEOUT`: e.g. `10s`, `500ms`
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut gateway = GatewayConfig::default();

        if let Some(port) = var("PORT") {
            gateway.http.port = port
                .trim()
                .parse()
                .map_err(|e| ConfigError::invalid("PORT", &port, e))?;
        }
        if let Some(host) = var("HOST") {
            gateway.http.host = host
                .trim()
                .parse::<IpAddr>()
                .map_err(|e| ConfigError::invalid("HOST", &host, e))?;
        }
        if let Some(url) = var("CLIENT_URL") {
            gateway.cors.allowed_origins = vec![url.trim().trim_end_matches('/').to_string()];
        }
        if let Some(client_id) = var("GOOGLE_CLIENT_ID") {
            gateway.google.client_id = Some(client_id.trim().to_string());
        }
        if let Some(size) = var("AGORA_WS_MAX_MESSAGE_SIZE") {
            gateway.websocket.max_message_size = size
                .trim()
                .parse()
                .map_err(|e| ConfigError::invalid("AGORA_WS_MAX_MESSAGE_SIZE", &size, e))?;
        }
        if let Some(limit) = var("AGORA_WS_RATE_LIMIT") {
            gateway.websocket.rate_limit = limit
                .trim()
                .parse()
                .map_err(|e| ConfigError::invalid("AGORA_WS_RATE_LIMIT", &limit, e))?;
        }
        if let Some(timeout) = var("AGORA_REQUEST_TIMEOUT") {
            gateway.timeouts.request = parse_duration(timeout.trim())
                .map_err(|e| ConfigError::invalid("AGORA_REQUEST_TIMEOUT", &timeout, e))?;
        }

        Ok(Self {
            gateway,
            data_path: var("AGORA_DATA_PATH").map(PathBuf::from),
        })
    }

    /// Open the document store this config points at.
    pub fn open_store(&self) -> Result<DocumentStore, KVStoreError> {
        match &self.data_path {
            Some(path) => {
                info!(path = %path.display(), "Using file-backed document store");
                DocumentStore::open_file(path)
            }
            None => {
                info!("AGORA_DATA_PATH not set, using in-memory document store");
                Ok(DocumentStore::in_memory())
            }
        }
    }
}
