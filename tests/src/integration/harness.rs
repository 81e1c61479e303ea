//! Live server fixture and clients.

use agora_gateway::{AgoraGateway, GatewayConfig, GoogleIdentityVerifier};
use agora_storage::{DocumentStore, Services};
use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

const EVENT_TIMEOUT: Duration = Duration::from_secs(2);
const SILENCE_WINDOW: Duration = Duration::from_millis(200);

/// A gateway serving on 127.0.0.1 with an ephemeral port.
pub struct TestServer {
    gateway: AgoraGateway,
    addr: SocketAddr,
    http: reqwest::Client,
}

impl TestServer {
    pub async fn start() -> Self {
        Self::with_store(DocumentStore::in_memory(), None).await
    }

    pub async fn with_data_file(path: &Path) -> Self {
        Self::with_store(DocumentStore::open_file(path).unwrap(), None).await
    }

    pub async fn with_google(verifier: Arc<dyn GoogleIdentityVerifier>) -> Self {
        Self::with_store(DocumentStore::in_memory(), Some(verifier)).await
    }

    async fn with_store(store: DocumentStore, google: Option<Arc<dyn GoogleIdentityVerifier>>) -> Self {
        let mut config = GatewayConfig::default();
        config.http.host = IpAddr::V4(Ipv4Addr::LOCALHOST);
        config.http.port = 0;

        let services = Services::new(Arc::new(store));
        let mut gateway = AgoraGateway::new(config, services, google).unwrap();
        let addr = gateway.start().await.unwrap();

        Self {
            gateway,
            addr,
            http: reqwest::Client::new(),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn stop(mut self) {
        self.gateway.shutdown();
        self.gateway.wait().await.unwrap();
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> (u16, Value) {
        let response = request.send().await.unwrap();
        let status = response.status().as_u16();
        let text = response.text().await.unwrap();
        let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
        (status, body)
    }

    pub async fn get(&self, path: &str) -> (u16, Value) {
        self.send(self.http.get(self.url(path))).await
    }

    pub async fn post(&self, path: &str, body: Value) -> (u16, Value) {
        self.send(self.http.post(self.url(path)).json(&body)).await
    }

    pub async fn patch(&self, path: &str, body: Value) -> (u16, Value) {
        self.send(self.http.patch(self.url(path)).json(&body)).await
    }

    pub async fn delete(&self, path: &str) -> (u16, Value) {
        self.send(self.http.delete(self.url(path))).await
    }

    pub async fn signup(&self, username: &str) -> Value {
        let (status, body) = self
            .post(
                "/user/signup",
                json!({"username": username, "password": "correct horse"}),
            )
            .await;
        assert_eq!(status, 200, "{}", body);
        body
    }

    /// Create a chat between `admin` and `member`. Returns the chat id.
    pub async fn create_chat(&self, admin: &str, member: &str) -> String {
        let (status, body) = self
            .post(
                "/chat/createChat",
                json!({
                    "title": format!("{} and {}", admin, member),
                    "participants": [admin, member],
                    "permissions": [
                        {"user": admin, "role": "admin"},
                        {"user": member, "role": "user"}
                    ]
                }),
            )
            .await;
        assert_eq!(status, 200, "{}", body);
        body["_id"].as_str().unwrap().to_string()
    }

    /// Open `/ws` and consume the `connected` greeting.
    pub async fn connect(&self) -> WsClient {
        let url = format!("ws://{}/ws", self.addr);
        let (stream, _) = tokio_tungstenite::connect_async(url).await.unwrap();
        let mut client = WsClient {
            stream,
            socket_id: String::new(),
        };

        let greeting = client.next_event().await;
        assert_eq!(greeting["event"], "connected");
        client.socket_id = greeting["data"]["socketId"].as_str().unwrap().to_string();
        client
    }
}

pub struct WsClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    socket_id: String,
}

impl WsClient {
    pub fn socket_id(&self) -> &str {
        &self.socket_id
    }

    pub async fn emit(&mut self, event: &str, data: Value) {
        let frame = json!({"event": event, "data": data}).to_string();
        self.stream.send(Message::Text(frame.into())).await.unwrap();
    }

    async fn read_event(&mut self) -> Option<Value> {
        loop {
            match self.stream.next().await? {
                Ok(Message::Text(text)) => return Some(serde_json::from_str(text.as_str()).unwrap()),
                Ok(Message::Close(_)) | Err(_) => return None,
                Ok(_) => continue,
            }
        }
    }

    pub async fn next_event(&mut self) -> Value {
        tokio::time::timeout(EVENT_TIMEOUT, self.read_event())
            .await
            .expect("no event within timeout")
            .expect("connection closed")
    }

    /// Next event with the given name, skipping others.
    pub async fn next_named(&mut self, name: &str) -> Value {
        loop {
            let event = self.next_event().await;
            if event["event"] == name {
                return event;
            }
        }
    }

    pub async fn assert_silent(&mut self) {
        if let Ok(Some(event)) = tokio::time::timeout(SILENCE_WINDOW, self.read_event()).await {
            panic!("unexpected event {}", event);
        }
    }

    /// Join a room and wait for the acknowledgement.
    pub async fn join_chat(&mut self, chat_id: &str) {
        self.emit("joinChat", json!(chat_id)).await;
        let ack = self.next_named("joined").await;
        assert_eq!(ack["data"], chat_id);
    }

    pub async fn close(mut self) {
        let _ = self.stream.close(None).await;
    }
}
