//! Gateway error types.
//!
//! Route failures are [`ApiError`]s. The messaging, chat and user routes
//! answer with a plain-text body, the whiteboard routes with
//! `{"error": "..."}`; web clients branch on exactly these shapes.

use agora_storage::{ErrorKind, ServiceError};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::fmt;
use std::net::SocketAddr;

/// Body shape of an error response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorFormat {
    /// `text/plain` body holding the message
    Text,
    /// `{"error": message}`
    Json,
}

/// HTTP error returned by a route handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub format: ErrorFormat,
}

impl ApiError {
    pub fn text(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            format: ErrorFormat::Text,
        }
    }

    pub fn json(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            format: ErrorFormat::Json,
        }
    }

    /// 400 with a text body
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::text(StatusCode::BAD_REQUEST, message)
    }

    /// 500 with a text body
    pub fn internal(message: impl Into<String>) -> Self {
        Self::text(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// `"<context>: <error>"`, 403 for permission denials and 500 otherwise.
    pub fn service(context: &str, err: &ServiceError) -> Self {
        let status = match err.kind() {
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::text(status, format!("{}: {}", context, err))
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.status.as_u16(), self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = self.status.as_u16(), error = %self.message, "Request failed");
        } else {
            tracing::debug!(status = self.status.as_u16(), error = %self.message, "Request rejected");
        }

        match self.format {
            ErrorFormat::Text => (self.status, self.message).into_response(),
            ErrorFormat::Json => (
                self.status,
                Json(serde_json::json!({ "error": self.message })),
            )
                .into_response(),
        }
    }
}

/// Gateway lifecycle errors
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Serve(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<super::config::ConfigError> for GatewayError {
    fn from(err: super::config::ConfigError) -> Self {
        GatewayError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[test]
    fn test_service_error_status() {
        let denied = ApiError::service(
            "Error changing user role",
            &ServiceError::PermissionDenied("only admins can change roles".into()),
        );
        assert_eq!(denied.status, StatusCode::FORBIDDEN);
        assert_eq!(
            denied.message,
            "Error changing user role: Permission denied: only admins can change roles"
        );

        let missing = ApiError::service("Error retrieving chat", &ServiceError::ChatNotFound);
        assert_eq!(missing.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(missing.message, "Error retrieving chat: Chat not found");
    }

    #[tokio::test]
    async fn test_response_bodies() {
        let text = ApiError::bad_request("Invalid request").into_response();
        assert_eq!(text.status(), StatusCode::BAD_REQUEST);
        let body = to_bytes(text.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"Invalid request");

        let json = ApiError::json(StatusCode::INTERNAL_SERVER_ERROR, "Failed to delete whiteboard")
            .into_response();
        let body = to_bytes(json.into_body(), usize::MAX).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value, serde_json::json!({"error": "Failed to delete whiteboard"}));
    }
}
