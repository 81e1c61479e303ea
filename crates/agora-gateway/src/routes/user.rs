//! `/user`: accounts, sign-in and profile updates.

use super::{json_body, non_blank};
use crate::domain::error::ApiError;
use crate::ports::VerifyError;
use crate::router::AppState;
use agora_bus::EventPublisher;
use agora_storage::{ErrorKind, ServiceError};
use agora_types::{NewUser, SafeUser, ServerEvent, UserUpdate, UserUpdateKind};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, patch, post};
use axum::{Json, Router};
use serde::Deserialize;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/google-login", post(google_login))
        .route("/getUser/:username", get(get_user))
        .route("/getUsers", get(get_users))
        .route("/deleteUser/:username", delete(delete_user))
        .route("/resetPassword", patch(reset_password))
        .route("/updateBiography", patch(update_biography))
        .route("/updateSocketId", patch(update_socket_id))
}

fn invalid_user_body() -> ApiError {
    ApiError::bad_request("Invalid user body")
}

/// 404 "User not found" for a missing account, `"<context>: <e>"` otherwise.
fn user_error(context: &str, err: ServiceError) -> ApiError {
    match err.kind() {
        ErrorKind::NotFound => ApiError::text(StatusCode::NOT_FOUND, "User not found"),
        _ => ApiError::service(context, &err),
    }
}

async fn publish_user_update(state: &AppState, user: &SafeUser, kind: UserUpdateKind) {
    state
        .bus
        .to_everyone(ServerEvent::UserUpdate {
            user: user.clone(),
            kind,
        })
        .await;
}

#[derive(Debug, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    password: Option<String>,
    #[serde(default)]
    biography: Option<String>,
}

async fn signup(
    State(state): State<AppState>,
    body: Result<Json<Credentials>, JsonRejection>,
) -> Result<Json<SafeUser>, ApiError> {
    let request = json_body(body, invalid_user_body)?;
    let (Some(username), Some(password)) =
        (non_blank(request.username), non_blank(request.password))
    else {
        return Err(invalid_user_body());
    };

    let user = state
        .users
        .save_user(NewUser {
            username,
            password: Some(password),
            biography: request.biography,
            ..Default::default()
        })
        .map_err(|e| {
            let message = format!("Error when saving user: {}", e);
            match e.kind() {
                ErrorKind::Conflict => ApiError::text(StatusCode::CONFLICT, message),
                _ => ApiError::internal(message),
            }
        })?;

    publish_user_update(&state, &user, UserUpdateKind::Created).await;
    Ok(Json(user))
}

async fn login(
    State(state): State<AppState>,
    body: Result<Json<Credentials>, JsonRejection>,
) -> Result<Json<SafeUser>, ApiError> {
    let request = json_body(body, invalid_user_body)?;
    let (Some(username), Some(password)) =
        (non_blank(request.username), non_blank(request.password))
    else {
        return Err(invalid_user_body());
    };

    state
        .users
        .login_user(&username, &password)
        .map(Json)
        .map_err(|e| match e.kind() {
            ErrorKind::Unauthorized => ApiError::text(StatusCode::UNAUTHORIZED, "Login failed"),
            _ => ApiError::service("Error when logging in", &e),
        })
}

#[derive(Debug, Deserialize)]
pub struct GoogleLoginRequest {
    #[serde(default)]
    credential: Option<String>,
}

async fn google_login(
    State(state): State<AppState>,
    body: Result<Json<GoogleLoginRequest>, JsonRejection>,
) -> Result<Json<SafeUser>, ApiError> {
    let invalid = || ApiError::bad_request("Invalid request");
    let credential = non_blank(json_body(body, invalid)?.credential).ok_or_else(invalid)?;

    let verifier = state.google.as_ref().ok_or_else(|| {
        ApiError::text(
            StatusCode::SERVICE_UNAVAILABLE,
            "Google login is not configured",
        )
    })?;

    let identity = verifier.verify(&credential).await.map_err(|e| match e {
        VerifyError::Invalid(_) => {
            ApiError::text(StatusCode::UNAUTHORIZED, "Invalid Google credential")
        }
        VerifyError::Unavailable(_) => ApiError::text(StatusCode::SERVICE_UNAVAILABLE, e.to_string()),
    })?;

    state
        .users
        .login_with_google(identity)
        .map(Json)
        .map_err(|e| ApiError::service("Error when logging in with Google", &e))
}

async fn get_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<SafeUser>, ApiError> {
    state
        .users
        .get_user_by_username(&username)
        .map(Json)
        .map_err(|e| user_error("Error when retrieving user", e))
}

async fn get_users(State(state): State<AppState>) -> Result<Json<Vec<SafeUser>>, ApiError> {
    state
        .users
        .get_users_list()
        .map(Json)
        .map_err(|e| ApiError::service("Error when retrieving users", &e))
}

async fn delete_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<SafeUser>, ApiError> {
    let user = state
        .users
        .delete_user_by_username(&username)
        .map_err(|e| user_error("Error when deleting user", e))?;

    publish_user_update(&state, &user, UserUpdateKind::Deleted).await;
    Ok(Json(user))
}

async fn reset_password(
    State(state): State<AppState>,
    body: Result<Json<Credentials>, JsonRejection>,
) -> Result<Json<SafeUser>, ApiError> {
    let request = json_body(body, invalid_user_body)?;
    let (Some(username), Some(password)) =
        (non_blank(request.username), non_blank(request.password))
    else {
        return Err(invalid_user_body());
    };

    state
        .users
        .update_user(
            &username,
            UserUpdate {
                password: Some(password),
                ..Default::default()
            },
        )
        .map(Json)
        .map_err(|e| user_error("Error when resetting password", e))
}

#[derive(Debug, Deserialize)]
pub struct BiographyRequest {
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    biography: Option<String>,
}

async fn update_biography(
    State(state): State<AppState>,
    body: Result<Json<BiographyRequest>, JsonRejection>,
) -> Result<Json<SafeUser>, ApiError> {
    let request = json_body(body, invalid_user_body)?;
    // An empty biography is a valid way to clear it.
    let (Some(username), Some(biography)) = (non_blank(request.username), request.biography)
    else {
        return Err(invalid_user_body());
    };

    let user = state
        .users
        .update_user(
            &username,
            UserUpdate {
                biography: Some(biography),
                ..Default::default()
            },
        )
        .map_err(|e| user_error("Error when updating biography", e))?;

    publish_user_update(&state, &user, UserUpdateKind::Updated).await;
    Ok(Json(user))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocketIdRequest {
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    socket_id: Option<String>,
}

async fn update_socket_id(
    State(state): State<AppState>,
    body: Result<Json<SocketIdRequest>, JsonRejection>,
) -> Result<Json<SafeUser>, ApiError> {
    let request = json_body(body, invalid_user_body)?;
    let (Some(username), Some(socket_id)) =
        (non_blank(request.username), non_blank(request.socket_id))
    else {
        return Err(invalid_user_body());
    };

    state
        .users
        .update_user(
            &username,
            UserUpdate {
                socket_id: Some(socket_id),
                ..Default::default()
            },
        )
        .map(Json)
        .map_err(|e| user_error("Error when updating socket id", e))
}
