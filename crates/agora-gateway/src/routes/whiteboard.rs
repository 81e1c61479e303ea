//! `/whiteboard`: shared boards addressed by unique link.
//!
//! Errors here carry `{"error": "..."}` bodies.

use super::{json_body, non_blank};
use crate::domain::error::ApiError;
use crate::router::AppState;
use agora_types::{AccessType, NewWhiteboard, Whiteboard, WhiteboardContent};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::warn;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/addWhiteboard", post(add_whiteboard))
        .route("/byOwner/:owner", get(get_by_owner))
        .route("/:uniqueLink", get(get_whiteboard).delete(delete_whiteboard))
}

fn failure(message: &str) -> ApiError {
    ApiError::json(StatusCode::INTERNAL_SERVER_ERROR, message)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddWhiteboardRequest {
    #[serde(default)]
    owner: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    content: Option<WhiteboardContent>,
    #[serde(default)]
    unique_link: Option<String>,
    #[serde(default)]
    access_type: Option<AccessType>,
    #[serde(default)]
    date_created: Option<DateTime<Utc>>,
}

/// An empty image string is no content at all.
fn has_content(content: &WhiteboardContent) -> bool {
    !matches!(content, WhiteboardContent::Image(image) if image.trim().is_empty())
}

async fn add_whiteboard(
    State(state): State<AppState>,
    body: Result<Json<AddWhiteboardRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Whiteboard>), ApiError> {
    let invalid = || ApiError::json(StatusCode::BAD_REQUEST, "Invalid request");
    let request = json_body(body, invalid)?;

    let (Some(owner), Some(title), Some(content), Some(unique_link), Some(access_type)) = (
        non_blank(request.owner),
        non_blank(request.title),
        request.content.filter(has_content),
        non_blank(request.unique_link),
        request.access_type,
    ) else {
        return Err(invalid());
    };

    let board = state
        .whiteboards
        .save_whiteboard(NewWhiteboard {
            owner,
            title,
            content,
            unique_link: Some(unique_link),
            access_type,
            date_created: request.date_created,
        })
        .map_err(|e| {
            warn!(error = %e, "Failed to create whiteboard");
            failure("Failed to create whiteboard")
        })?;

    Ok((StatusCode::CREATED, Json(board)))
}

async fn get_whiteboard(
    State(state): State<AppState>,
    Path(unique_link): Path<String>,
) -> Result<Json<Whiteboard>, ApiError> {
    state
        .whiteboards
        .get_whiteboard_by_link(&unique_link)
        .map(Json)
        .map_err(|e| {
            warn!(link = %unique_link, error = %e, "Failed to retrieve whiteboard");
            failure("Failed to retrieve whiteboard")
        })
}

async fn get_by_owner(
    State(state): State<AppState>,
    Path(owner): Path<String>,
) -> Json<Vec<Whiteboard>> {
    Json(state.whiteboards.get_whiteboards_by_owner(&owner))
}

async fn delete_whiteboard(
    State(state): State<AppState>,
    Path(unique_link): Path<String>,
) -> Result<StatusCode, ApiError> {
    state
        .whiteboards
        .delete_whiteboard_by_link(&unique_link)
        .map(|_| StatusCode::OK)
        .map_err(|e| {
            warn!(link = %unique_link, error = %e, "Failed to delete whiteboard");
            failure("Failed to delete whiteboard")
        })
}
