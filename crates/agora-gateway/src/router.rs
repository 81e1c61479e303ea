//! Application state and router assembly.

use crate::domain::config::{GatewayConfig, WebSocketConfig};
use crate::middleware::{create_cors_layer, TracingLayer};
use crate::ports::GoogleIdentityVerifier;
use crate::routes;
use crate::ws;
use agora_bus::InMemoryEventBus;
use agora_storage::{ChatApi, MessageApi, Services, UserApi, WhiteboardApi};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserApi>,
    pub messages: Arc<dyn MessageApi>,
    pub chats: Arc<dyn ChatApi>,
    pub whiteboards: Arc<dyn WhiteboardApi>,
    pub bus: Arc<InMemoryEventBus>,
    pub google: Option<Arc<dyn GoogleIdentityVerifier>>,
    pub websocket: Arc<WebSocketConfig>,
}

impl AppState {
    pub fn new(
        services: Services,
        bus: Arc<InMemoryEventBus>,
        google: Option<Arc<dyn GoogleIdentityVerifier>>,
        websocket: WebSocketConfig,
    ) -> Self {
        Self {
            users: services.users,
            messages: services.messages,
            chats: services.chats,
            whiteboards: services.whiteboards,
            bus,
            google,
            websocket: Arc::new(websocket),
        }
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    version: &'static str,
}

async fn hello() -> &'static str {
    "hello world"
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Build the full application: REST routes, `/ws`, and the middleware stack.
pub fn build_router(state: AppState, config: &GatewayConfig) -> Router {
    let middleware = ServiceBuilder::new()
        .layer(TracingLayer::new())
        .layer(RequestBodyLimitLayer::new(config.limits.max_request_size))
        .layer(create_cors_layer(&config.cors))
        .layer(TimeoutLayer::new(config.timeouts.request));

    Router::new()
        .route("/", get(hello))
        .route("/health", get(health_check))
        .route("/ws", get(ws::ws_upgrade))
        .nest("/messaging", routes::messaging::router())
        .nest("/chat", routes::chat::router())
        .nest("/user", routes::user::router())
        .nest("/whiteboard", routes::whiteboard::router())
        .layer(middleware)
        .with_state(state)
}
