//! `/messaging`: the global message board and poll votes.

use super::{chat_id, json_body, message_id, non_blank};
use crate::domain::error::ApiError;
use crate::router::AppState;
use agora_bus::EventPublisher;
use agora_types::{ChatUpdateKind, Message, MessageType, ServerEvent, StoredMessage};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Deserialize;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/addMessage", post(add_message))
        .route("/getMessages", get(get_messages))
        .route("/voteOnPoll", patch(vote_on_poll))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddMessageRequest {
    #[serde(default)]
    message_to_add: Option<BoardMessage>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BoardMessage {
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    msg_from: Option<String>,
    #[serde(default)]
    msg_date_time: Option<DateTime<Utc>>,
}

impl BoardMessage {
    fn into_message(self) -> Option<Message> {
        Some(Message {
            msg: non_blank(self.msg)?,
            msg_from: non_blank(self.msg_from)?,
            msg_date_time: self.msg_date_time?,
            kind: MessageType::Global,
            poll: None,
        })
    }
}

async fn add_message(
    State(state): State<AppState>,
    body: Result<Json<AddMessageRequest>, JsonRejection>,
) -> Result<Json<StoredMessage>, ApiError> {
    let request = json_body(body, || ApiError::bad_request("Invalid request"))?;
    let message = request
        .message_to_add
        .ok_or_else(|| ApiError::bad_request("Invalid request"))?
        .into_message()
        .ok_or_else(|| ApiError::bad_request("Invalid message body"))?;

    let stored = state
        .messages
        .save_message(message)
        .map_err(|e| ApiError::service("Error when adding a message", &e))?;

    state
        .bus
        .to_everyone(ServerEvent::MessageUpdate {
            msg: stored.clone(),
        })
        .await;

    Ok(Json(stored))
}

async fn get_messages(State(state): State<AppState>) -> Result<Json<Vec<StoredMessage>>, ApiError> {
    state
        .messages
        .get_messages()
        .map(Json)
        .map_err(|e| ApiError::service("Error when retrieving messages", &e))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    #[serde(default, rename = "chatID")]
    chat_id: Option<String>,
    #[serde(default, rename = "messageID")]
    message_id: Option<String>,
    #[serde(default)]
    option_index: Option<usize>,
    #[serde(default)]
    username: Option<String>,
}

async fn vote_on_poll(
    State(state): State<AppState>,
    body: Result<Json<VoteRequest>, JsonRejection>,
) -> Result<Json<StoredMessage>, ApiError> {
    let request = json_body(body, || ApiError::bad_request("Invalid request"))?;
    let (Some(raw_chat_id), Some(raw_message_id), Some(option_index), Some(username)) = (
        non_blank(request.chat_id),
        non_blank(request.message_id),
        request.option_index,
        non_blank(request.username),
    ) else {
        return Err(ApiError::bad_request("Invalid request"));
    };

    let context = "Error when voting on a poll";
    let chat_id = chat_id(&raw_chat_id).map_err(|e| ApiError::service(context, &e))?;
    let message_id = message_id(&raw_message_id).map_err(|e| ApiError::service(context, &e))?;

    let message = state
        .messages
        .vote_on_poll(&message_id, option_index, &username)
        .map_err(|e| ApiError::service(context, &e))?;

    let chat = state
        .chats
        .get_chat(&chat_id)
        .and_then(|chat| state.chats.populate(chat))
        .map_err(|e| ApiError::service(context, &e))?;

    state
        .bus
        .to_room(
            &chat_id.to_string(),
            ServerEvent::chat_update(chat, ChatUpdateKind::NewMessage),
        )
        .await;
    state
        .bus
        .to_everyone(ServerEvent::MessageUpdate {
            msg: message.clone(),
        })
        .await;

    Ok(Json(message))
}
