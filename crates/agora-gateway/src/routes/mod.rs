//! REST routes, one module per resource.
//!
//! Handlers validate the request body, call the service, publish the
//! matching real-time update and answer with the updated resource.

pub mod chat;
pub mod messaging;
pub mod user;
pub mod whiteboard;

use crate::domain::error::ApiError;
use agora_storage::ServiceError;
use agora_types::DocumentId;
use axum::extract::rejection::JsonRejection;
use axum::Json;
use tracing::debug;

/// Unwrap a JSON body, answering with `on_error` when it does not parse.
pub(crate) fn json_body<T>(
    body: Result<Json<T>, JsonRejection>,
    on_error: impl FnOnce() -> ApiError,
) -> Result<T, ApiError> {
    match body {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => {
            debug!(reason = %rejection.body_text(), "Rejected request body");
            Err(on_error())
        }
    }
}

/// Keep a string field only when it holds something.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// An id that does not parse cannot name a stored chat.
pub(crate) fn chat_id(raw: &str) -> Result<DocumentId, ServiceError> {
    raw.parse().map_err(|_| ServiceError::ChatNotFound)
}

pub(crate) fn message_id(raw: &str) -> Result<DocumentId, ServiceError> {
    raw.parse().map_err(|_| ServiceError::MessageNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(Some("ada".into())), Some("ada".into()));
        assert_eq!(non_blank(Some("  ".into())), None);
        assert_eq!(non_blank(None), None);
    }

    #[test]
    fn test_bad_ids_map_to_not_found() {
        assert_eq!(chat_id("nope"), Err(ServiceError::ChatNotFound));
        assert_eq!(message_id("nope"), Err(ServiceError::MessageNotFound));
        let id = DocumentId::new();
        assert_eq!(chat_id(&id.to_string()), Ok(id));
    }
}
