//! Shared fixtures for the gateway's unit tests.

use crate::domain::config::GatewayConfig;
use crate::ports::{GoogleIdentityVerifier, VerifyError};
use crate::router::{build_router, AppState};
use agora_bus::{ConnectionId, InMemoryEventBus, RoomRegistry, Subscription, DEFAULT_CHANNEL_CAPACITY};
use agora_storage::{DocumentStore, Services};
use agora_types::{GoogleCredentials, NewUser, ServerEvent};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

pub(crate) struct TestApp {
    pub state: AppState,
    pub router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        Self::build(GatewayConfig::default(), None)
    }

    pub fn with_google(verifier: Arc<dyn GoogleIdentityVerifier>) -> Self {
        Self::build(GatewayConfig::default(), Some(verifier))
    }

    pub fn with_config(config: GatewayConfig) -> Self {
        Self::build(config, None)
    }

    fn build(config: GatewayConfig, google: Option<Arc<dyn GoogleIdentityVerifier>>) -> Self {
        let services = Services::new(Arc::new(DocumentStore::in_memory()));
        let rooms = Arc::new(RoomRegistry::new(
            config.websocket.max_rooms_per_connection,
        ));
        let bus = Arc::new(InMemoryEventBus::with_registry(
            DEFAULT_CHANNEL_CAPACITY,
            rooms,
        ));
        let state = AppState::new(services, bus, google, config.websocket.clone());
        let router = build_router(state.clone(), &config);
        Self { state, router }
    }

    /// Store a user with the password "password".
    pub async fn register(&self, username: &str) {
        self.state
            .users
            .save_user(NewUser {
                username: username.into(),
                password: Some("password".into()),
                ..Default::default()
            })
            .unwrap();
    }

    /// A fresh connection subscribed to the bus.
    pub fn listener(&self) -> Listener {
        self.listener_for(ConnectionId::new())
    }

    pub fn listener_for(&self, conn: ConnectionId) -> Listener {
        Listener {
            sub: self.state.bus.subscribe(conn),
            rooms: Arc::clone(self.state.bus.rooms()),
            conn,
        }
    }

    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
        (status, value)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(body)).await
    }

    pub async fn patch(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::PATCH, uri, Some(body)).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, None).await
    }
}

/// A bus subscriber standing in for a WebSocket client.
pub(crate) struct Listener {
    sub: Subscription,
    rooms: Arc<RoomRegistry>,
    conn: ConnectionId,
}

impl Listener {
    pub fn join(&self, room: &str) {
        self.rooms.join(self.conn, room).unwrap();
    }

    pub async fn next_event(&mut self) -> ServerEvent {
        let envelope = tokio::time::timeout(Duration::from_secs(1), self.sub.recv())
            .await
            .expect("no event within 1s")
            .expect("bus closed");
        envelope.event.clone()
    }

    pub async fn assert_silent(&mut self) {
        if let Ok(Some(envelope)) =
            tokio::time::timeout(Duration::from_millis(100), self.sub.recv()).await
        {
            panic!("unexpected event {:?}", envelope.event);
        }
    }
}

/// Chat between ada (admin) and bob holding one poll. Returns the chat id
/// and the poll message id.
pub(crate) async fn poll_chat(app: &TestApp) -> (String, String) {
    app.register("ada").await;
    app.register("bob").await;

    let (status, chat) = app
        .post(
            "/chat/createChat",
            json!({
                "title": "Lunch",
                "participants": ["ada", "bob"],
                "permissions": [
                    {"user": "ada", "role": "admin"},
                    {"user": "bob", "role": "user"}
                ]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", chat);
    let chat_id = chat["_id"].as_str().unwrap().to_string();

    let (status, chat) = app
        .post(
            &format!("/chat/{}/addMessage", chat_id),
            json!({
                "msg": "Lunch?",
                "msgFrom": "ada",
                "type": "poll",
                "poll": {
                    "question": "Where to?",
                    "options": [{"optionText": "Pizza"}, {"optionText": "Sushi"}]
                }
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", chat);
    let message_id = chat["messages"]
        .as_array()
        .and_then(|messages| messages.last())
        .and_then(|m| m["_id"].as_str())
        .unwrap()
        .to_string();

    (chat_id, message_id)
}

/// Accepts exactly one token, as ada@example.com.
pub(crate) struct StaticVerifier {
    token: String,
}

impl StaticVerifier {
    pub fn accepting(token: &str) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl GoogleIdentityVerifier for StaticVerifier {
    async fn verify(&self, credential: &str) -> Result<GoogleCredentials, VerifyError> {
        if credential == self.token {
            Ok(GoogleCredentials {
                google_id: "g-1".into(),
                email: "ada@example.com".into(),
                picture: None,
            })
        } else {
            Err(VerifyError::Invalid("token rejected".into()))
        }
    }
}
