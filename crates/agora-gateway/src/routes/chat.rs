//! `/chat`: chats, their messages, participants and roles.

use super::{chat_id, json_body, message_id, non_blank};
use crate::domain::error::ApiError;
use crate::router::AppState;
use agora_bus::EventPublisher;
use agora_telemetry::log_chat_event;
use agora_types::{
    ChatUpdateKind, Message, MessageType, NewChat, Permission, Poll, PopulatedChat, Role,
    ServerEvent,
};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::routing::{delete, get, patch, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::warn;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/createChat", post(create_chat))
        .route("/getChatsByUser/:username", get(get_chats_by_user))
        .route("/:chatId", get(get_chat))
        .route("/:chatId/addMessage", post(add_message))
        .route("/:chatId/addParticipant", post(add_participant))
        .route("/:chatId/changeUserRole", patch(change_user_role))
        .route("/:chatId/message/:messageId", delete(delete_message))
}

/// A chat message as posted by a client.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessageRequest {
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    msg_from: Option<String>,
    #[serde(default)]
    msg_date_time: Option<DateTime<Utc>>,
    #[serde(default, rename = "type")]
    kind: Option<MessageType>,
    #[serde(default)]
    poll: Option<Poll>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateChatRequest {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    participants: Vec<String>,
    #[serde(default)]
    messages: Vec<ChatMessageRequest>,
    #[serde(default)]
    permissions: Option<Vec<Permission>>,
}

async fn create_chat(
    State(state): State<AppState>,
    body: Result<Json<CreateChatRequest>, JsonRejection>,
) -> Result<Json<PopulatedChat>, ApiError> {
    let invalid = || ApiError::bad_request("Invalid chat creation request");
    let request = json_body(body, invalid)?;

    if request.participants.is_empty() {
        return Err(invalid());
    }
    let permissions = request.permissions.ok_or_else(invalid)?;

    let now = Utc::now();
    let messages = request
        .messages
        .into_iter()
        .map(|m| {
            Some(Message {
                msg: non_blank(m.msg)?,
                msg_from: non_blank(m.msg_from)?,
                msg_date_time: m.msg_date_time.unwrap_or(now),
                kind: MessageType::Direct,
                poll: None,
            })
        })
        .collect::<Option<Vec<_>>>()
        .ok_or_else(invalid)?;

    let context = "Error creating a chat";
    let chat = state
        .chats
        .save_chat(NewChat {
            title: request.title.unwrap_or_default(),
            participants: request.participants,
            messages,
            permissions,
        })
        .and_then(|chat| state.chats.populate(chat))
        .map_err(|e| ApiError::service(context, &e))?;

    log_chat_event!(info, "Chat created", chat.id, participants = chat.participants.len());

    state
        .bus
        .to_everyone(ServerEvent::chat_update(chat.clone(), ChatUpdateKind::Created))
        .await;

    Ok(Json(chat))
}

async fn add_message(
    State(state): State<AppState>,
    Path(raw_chat_id): Path<String>,
    body: Result<Json<ChatMessageRequest>, JsonRejection>,
) -> Result<Json<PopulatedChat>, ApiError> {
    let missing = || ApiError::bad_request("Missing chatId, msg, msgFrom or type");
    let request = json_body(body, missing)?;

    let (Some(msg), Some(msg_from), Some(kind)) =
        (non_blank(request.msg), non_blank(request.msg_from), request.kind)
    else {
        return Err(missing());
    };
    if kind == MessageType::Poll && request.poll.is_none() {
        return Err(ApiError::bad_request("Poll messages require a poll"));
    }

    let message = Message {
        msg,
        msg_from,
        msg_date_time: request.msg_date_time.unwrap_or_else(Utc::now),
        kind,
        poll: if kind == MessageType::Poll {
            request.poll
        } else {
            None
        },
    };

    let context = "Error adding a message to chat";
    let chat = chat_id(&raw_chat_id)
        .and_then(|id| {
            // Confirm the chat exists before the message is written.
            state.chats.get_chat(&id)?;
            let stored = state.messages.save_message(message)?;
            state.chats.add_message_to_chat(&id, &stored.id)
        })
        .and_then(|chat| state.chats.populate(chat))
        .map_err(|e| ApiError::service(context, &e))?;

    state
        .bus
        .to_room(
            &raw_chat_id,
            ServerEvent::chat_update(chat.clone(), ChatUpdateKind::NewMessage),
        )
        .await;
    // Participants outside the room are notified through the global stream.
    state
        .bus
        .to_everyone(ServerEvent::chat_update(
            chat.clone(),
            ChatUpdateKind::Notification,
        ))
        .await;

    Ok(Json(chat))
}

async fn get_chat(
    State(state): State<AppState>,
    Path(raw_chat_id): Path<String>,
) -> Result<Json<PopulatedChat>, ApiError> {
    chat_id(&raw_chat_id)
        .and_then(|id| state.chats.get_chat(&id))
        .and_then(|chat| state.chats.populate(chat))
        .map(Json)
        .map_err(|e| ApiError::service("Error retrieving chat", &e))
}

#[derive(Debug, Deserialize)]
pub struct AddParticipantRequest {
    #[serde(default)]
    username: Option<String>,
}

async fn add_participant(
    State(state): State<AppState>,
    Path(raw_chat_id): Path<String>,
    body: Result<Json<AddParticipantRequest>, JsonRejection>,
) -> Result<Json<PopulatedChat>, ApiError> {
    let missing = || ApiError::bad_request("Missing chatId or userId");
    let username = non_blank(json_body(body, missing)?.username).ok_or_else(missing)?;

    let chat = chat_id(&raw_chat_id)
        .and_then(|id| state.chats.add_participant_to_chat(&id, &username))
        .and_then(|chat| state.chats.populate(chat))
        .map_err(|e| ApiError::service("Error adding participant to chat", &e))?;

    log_chat_event!(info, "Participant added", chat.id, username = %username);

    state
        .bus
        .to_everyone(ServerEvent::chat_update(
            chat.clone(),
            ChatUpdateKind::NewParticipant,
        ))
        .await;

    Ok(Json(chat))
}

async fn get_chats_by_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<Vec<PopulatedChat>>, ApiError> {
    let chats = state.chats.get_chats_by_participants(&[username]);
    chats
        .into_iter()
        .map(|chat| state.chats.populate(chat))
        .collect::<Result<Vec<_>, _>>()
        .map(Json)
        .map_err(|e| {
            warn!(error = %e, "Failed to populate chats");
            ApiError::internal("Error retrieving chat: Failed populating all retrieved chats")
        })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRoleRequest {
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    role: Option<Role>,
    #[serde(default)]
    acting_user: Option<String>,
}

async fn change_user_role(
    State(state): State<AppState>,
    Path(raw_chat_id): Path<String>,
    body: Result<Json<ChangeRoleRequest>, JsonRejection>,
) -> Result<Json<PopulatedChat>, ApiError> {
    let missing = || ApiError::bad_request("Missing required fields: chatId, username or role");
    let request = json_body(body, missing)?;
    let (Some(username), Some(role)) = (non_blank(request.username), request.role) else {
        return Err(missing());
    };
    let acting_user = non_blank(request.acting_user);

    let chat = chat_id(&raw_chat_id)
        .and_then(|id| {
            state
                .chats
                .change_user_role(&id, &username, role, acting_user.as_deref())
        })
        .and_then(|chat| state.chats.populate(chat))
        .map_err(|e| ApiError::service("Error changing user role", &e))?;

    log_chat_event!(info, "Role changed", chat.id, username = %username, role = ?role);

    state
        .bus
        .to_room(
            &raw_chat_id,
            ServerEvent::chat_update(chat.clone(), ChatUpdateKind::ChangeUserRole),
        )
        .await;

    Ok(Json(chat))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteMessageQuery {
    #[serde(default)]
    acting_user: Option<String>,
}

async fn delete_message(
    State(state): State<AppState>,
    Path((raw_chat_id, raw_message_id)): Path<(String, String)>,
    Query(query): Query<DeleteMessageQuery>,
) -> Result<Json<PopulatedChat>, ApiError> {
    let acting_user = non_blank(query.acting_user);

    let chat = chat_id(&raw_chat_id)
        .and_then(|cid| Ok((cid, message_id(&raw_message_id)?)))
        .and_then(|(cid, mid)| {
            state
                .chats
                .delete_chat_message(&cid, &mid, acting_user.as_deref())
        })
        .and_then(|chat| state.chats.populate(chat))
        .map_err(|e| ApiError::service("Error deleting message from chat", &e))?;

    state
        .bus
        .to_room(
            &raw_chat_id,
            ServerEvent::chat_update(chat.clone(), ChatUpdateKind::Deleted),
        )
        .await;

    Ok(Json(chat))
}

#[cfg(test)]
mod tests {
    use crate::test_utils::{poll_chat, TestApp};
    use agora_types::{ChatUpdateKind, ServerEvent};
    use axum::http::StatusCode;
    use serde_json::json;

    async fn create_chat(app: &TestApp) -> String {
        let (status, body) = app
            .post(
                "/chat/createChat",
                json!({
                    "title": "Lunch",
                    "participants": ["ada", "bob"],
                    "messages": [{"msg": "hi bob", "msgFrom": "ada"}],
                    "permissions": [
                        {"user": "ada", "role": "admin"},
                        {"user": "bob", "role": "user"}
                    ]
                }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{}", body);
        body["_id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_create_chat_populates_and_broadcasts() {
        let app = TestApp::new();
        app.register("ada").await;
        app.register("bob").await;
        let mut listener = app.listener();

        let id = create_chat(&app).await;

        match listener.next_event().await {
            ServerEvent::ChatUpdate { chat, kind } => {
                assert_eq!(kind, ChatUpdateKind::Created);
                assert_eq!(chat.id.to_string(), id);
                assert_eq!(chat.messages.len(), 1);
                assert_eq!(chat.messages[0].message.message.msg, "hi bob");
                assert_eq!(chat.messages[0].user.as_ref().unwrap().username, "ada");
            }
            other => panic!("unexpected event {:?}", other),
        }

        let (status, body) = app.get(&format!("/chat/{}", id)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["messages"][0]["type"], "direct");
        assert_eq!(body["messages"][0]["user"]["username"], "ada");
    }

    #[tokio::test]
    async fn test_create_chat_validation() {
        let app = TestApp::new();
        for body in [
            json!({"participants": [], "permissions": []}),
            json!({"participants": ["ada"]}),
            json!({"participants": ["ada"], "permissions": [{"user": "ada", "role": "owner"}]}),
        ] {
            let (status, text) = app.post("/chat/createChat", body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(text, "Invalid chat creation request");
        }

        let (status, text) = app
            .post(
                "/chat/createChat",
                json!({
                    "participants": ["ghost"],
                    "messages": [{"msg": "boo", "msgFrom": "ghost"}],
                    "permissions": []
                }),
            )
            .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            text,
            "Error creating a chat: Message sender is invalid or does not exist."
        );
    }

    #[tokio::test]
    async fn test_add_message_updates_room_and_notifies_everyone() {
        let app = TestApp::new();
        app.register("ada").await;
        app.register("bob").await;
        let id = create_chat(&app).await;

        let mut member = app.listener();
        member.join(&id);
        let mut outsider = app.listener();

        let (status, body) = app
            .post(
                &format!("/chat/{}/addMessage", id),
                json!({"msg": "second", "msgFrom": "bob", "type": "direct"}),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["messages"].as_array().unwrap().len(), 2);

        assert!(matches!(
            member.next_event().await,
            ServerEvent::ChatUpdate {
                kind: ChatUpdateKind::NewMessage,
                ..
            }
        ));
        assert!(matches!(
            member.next_event().await,
            ServerEvent::ChatUpdate {
                kind: ChatUpdateKind::Notification,
                ..
            }
        ));

        // Outside the room only the notification arrives.
        match outsider.next_event().await {
            ServerEvent::ChatUpdate { chat, kind } => {
                assert_eq!(kind, ChatUpdateKind::Notification);
                assert_eq!(chat.id.to_string(), id);
                assert_eq!(chat.participants, vec!["ada", "bob"]);
                assert_eq!(chat.messages.last().unwrap().message.message.msg_from, "bob");
            }
            other => panic!("unexpected event {:?}", other),
        }
        outsider.assert_silent().await;
        member.assert_silent().await;
    }

    #[tokio::test]
    async fn test_add_message_validation() {
        let app = TestApp::new();
        app.register("ada").await;
        app.register("bob").await;
        let id = create_chat(&app).await;
        let uri = format!("/chat/{}/addMessage", id);

        let (status, text) = app.post(&uri, json!({"msg": "x", "msgFrom": "ada"})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(text, "Missing chatId, msg, msgFrom or type");

        let (status, text) = app
            .post(&uri, json!({"msg": "x", "msgFrom": "ada", "type": "poll"}))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(text, "Poll messages require a poll");

        let (status, text) = app
            .post(
                "/chat/not-a-chat/addMessage",
                json!({"msg": "x", "msgFrom": "ada", "type": "direct"}),
            )
            .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(text, "Error adding a message to chat: Chat not found");
    }

    #[tokio::test]
    async fn test_participants_and_listing() {
        let app = TestApp::new();
        app.register("ada").await;
        app.register("bob").await;
        app.register("cy").await;
        let id = create_chat(&app).await;
        let mut listener = app.listener();

        let uri = format!("/chat/{}/addParticipant", id);
        let (status, body) = app.post(&uri, json!({"username": "cy"})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["participants"], json!(["ada", "bob", "cy"]));
        assert!(matches!(
            listener.next_event().await,
            ServerEvent::ChatUpdate {
                kind: ChatUpdateKind::NewParticipant,
                ..
            }
        ));

        let (status, text) = app.post(&uri, json!({})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(text, "Missing chatId or userId");

        let (status, text) = app.post(&uri, json!({"username": "ghost"})).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(text, "Error adding participant to chat: User does not exist.");

        let (status, body) = app.get("/chat/getChatsByUser/cy").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);

        let (_, body) = app.get("/chat/getChatsByUser/nobody").await;
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn test_change_user_role_permissions() {
        let app = TestApp::new();
        app.register("ada").await;
        app.register("bob").await;
        let id = create_chat(&app).await;
        let uri = format!("/chat/{}/changeUserRole", id);

        let (status, text) = app
            .patch(&uri, json!({"username": "ada", "role": "user", "actingUser": "bob"}))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(text.as_str().unwrap().starts_with("Error changing user role: "));

        let mut listener = app.listener();
        listener.join(&id);
        let (status, body) = app
            .patch(&uri, json!({"username": "bob", "role": "moderator", "actingUser": "ada"}))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["permissions"][1], json!({"user": "bob", "role": "moderator"}));
        assert!(matches!(
            listener.next_event().await,
            ServerEvent::ChatUpdate {
                kind: ChatUpdateKind::ChangeUserRole,
                ..
            }
        ));

        let (status, text) = app.patch(&uri, json!({"username": "bob"})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(text, "Missing required fields: chatId, username or role");

        let (status, text) = app
            .patch(&uri, json!({"username": "zed", "role": "admin"}))
            .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            text,
            "Error changing user role: Chat not found or user not a participant."
        );
    }

    #[tokio::test]
    async fn test_delete_message() {
        let app = TestApp::new();
        let (chat_id, message_id) = poll_chat(&app).await;
        let uri = format!("/chat/{}/message/{}", chat_id, message_id);

        let (status, _) = app.delete(&format!("{}?actingUser=bob", uri)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let mut listener = app.listener();
        listener.join(&chat_id);
        let (status, body) = app.delete(&format!("{}?actingUser=ada", uri)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["messages"]
            .as_array()
            .unwrap()
            .iter()
            .all(|m| m["_id"] != message_id.as_str()));
        assert!(matches!(
            listener.next_event().await,
            ServerEvent::ChatUpdate {
                kind: ChatUpdateKind::Deleted,
                ..
            }
        ));
    }
}
