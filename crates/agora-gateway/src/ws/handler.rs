//! WebSocket session handling.
//!
//! Each connection gets:
//! - a reader loop that handles inbound frames one at a time, and
//! - a writer task that forwards bus envelopes addressed to the connection
//!   together with direct replies from the reader.
//!
//! Security features:
//! - Message size limits (default 8MB, whiteboard snapshots are large)
//! - Per-connection frame rate limiting
//! - Room membership cap per connection
//! - Idle timeout

use crate::router::AppState;
use agora_bus::{ConnectionId, EventPublisher, Subscription};
use agora_telemetry::log_connection_event;
use agora_types::{ClientEvent, ServerEvent, WhiteboardUpdate};
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

/// Replies queued per connection before the reader waits on the writer.
const REPLY_BUFFER: usize = 64;

const JOIN_WHITEBOARD_FAILED: &str = "Failed to join whiteboard";
const UPDATE_WHITEBOARD_FAILED: &str = "Failed to update whiteboard";

/// `GET /ws`
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    // Frames up to twice the limit reach the handler and get an `error`
    // reply; anything larger is dropped by the protocol layer.
    let protocol_limit = state.websocket.max_message_size.saturating_mul(2);
    ws.max_message_size(protocol_limit)
        .max_frame_size(protocol_limit)
        .on_upgrade(move |socket| WebSocketHandler::new(state).handle(socket))
}

/// Frames handed from the reader to the writer.
#[derive(Debug)]
enum Outbound {
    Event(ServerEvent),
    Pong(Vec<u8>),
}

/// WebSocket connection handler
pub struct WebSocketHandler {
    state: AppState,
    connection_id: ConnectionId,
    /// Message counter for rate limiting
    message_count: u32,
    /// Rate limit window start
    rate_limit_window: Instant,
}

impl WebSocketHandler {
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            connection_id: ConnectionId::new(),
            message_count: 0,
            rate_limit_window: Instant::now(),
        }
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    /// Check rate limit, returns true if the frame is allowed
    fn check_rate_limit(&mut self) -> bool {
        let now = Instant::now();

        // Reset window every second
        if now.duration_since(self.rate_limit_window) >= Duration::from_secs(1) {
            self.rate_limit_window = now;
            self.message_count = 0;
        }

        self.message_count = self.message_count.saturating_add(1);
        self.message_count <= self.state.websocket.rate_limit
    }

    /// Check frame size, returns an error reply if too large
    fn check_message_size(&self, size: usize) -> Option<ServerEvent> {
        let max = self.state.websocket.max_message_size;
        if size > max {
            warn!(
                connection_id = %self.connection_id,
                size = size,
                max = max,
                "Message exceeds size limit"
            );
            Some(ServerEvent::Error(format!(
                "Message too large: {} bytes (max: {})",
                size, max
            )))
        } else {
            None
        }
    }

    /// Handle one inbound text frame. Returns the direct reply, if any.
    pub async fn handle_text(&mut self, text: &str) -> Option<ServerEvent> {
        if let Some(error) = self.check_message_size(text.len()) {
            return Some(error);
        }

        if !self.check_rate_limit() {
            return Some(ServerEvent::Error("Rate limit exceeded".into()));
        }

        match serde_json::from_str::<ClientEvent>(text) {
            Ok(event) => self.dispatch(event).await,
            Err(e) => {
                debug!(connection_id = %self.connection_id, error = %e, "Unparseable frame");
                Some(ServerEvent::Error(format!("Invalid event: {}", e)))
            }
        }
    }

    /// Apply a parsed client event.
    pub async fn dispatch(&self, event: ClientEvent) -> Option<ServerEvent> {
        let rooms = self.state.bus.rooms();
        let conn = self.connection_id;

        match event {
            ClientEvent::JoinChat(chat_id) => match rooms.join(conn, &chat_id) {
                Ok(_) => {
                    log_connection_event!(debug, "Joined chat room", conn, chat_id = %chat_id);
                    Some(ServerEvent::Joined(chat_id))
                }
                Err(e) => Some(ServerEvent::Error(e.to_string())),
            },

            ClientEvent::LeaveChat(chat_id) => {
                rooms.leave(conn, &chat_id);
                Some(ServerEvent::Left(chat_id))
            }

            ClientEvent::JoinWhiteboard(link) => {
                let board = match self.state.whiteboards.get_whiteboard_by_link(&link) {
                    Ok(board) => board,
                    Err(e) => {
                        debug!(connection_id = %conn, link = %link, error = %e, "Whiteboard join failed");
                        return Some(ServerEvent::WhiteboardError(JOIN_WHITEBOARD_FAILED.into()));
                    }
                };
                if let Err(e) = rooms.join(conn, &link) {
                    debug!(connection_id = %conn, link = %link, error = %e, "Whiteboard join failed");
                    return Some(ServerEvent::WhiteboardError(JOIN_WHITEBOARD_FAILED.into()));
                }
                log_connection_event!(debug, "Joined whiteboard room", conn, link = %link);
                Some(ServerEvent::WhiteboardContent(board.content))
            }

            ClientEvent::LeaveWhiteboard(link) => {
                rooms.leave(conn, &link);
                Some(ServerEvent::Left(link))
            }

            ClientEvent::UpdateWhiteboard(link, content) => {
                match self.state.whiteboards.get_whiteboard_by_link(&link) {
                    Ok(board) if board.is_editable() => {}
                    Ok(_) => {
                        debug!(connection_id = %conn, link = %link, "Update to read-only whiteboard");
                        return Some(ServerEvent::WhiteboardError(UPDATE_WHITEBOARD_FAILED.into()));
                    }
                    Err(e) => {
                        debug!(connection_id = %conn, link = %link, error = %e, "Whiteboard update failed");
                        return Some(ServerEvent::WhiteboardError(UPDATE_WHITEBOARD_FAILED.into()));
                    }
                }

                self.state
                    .bus
                    .to_room_except(&link, conn, ServerEvent::WhiteboardContent(content.clone()))
                    .await;

                let update = WhiteboardUpdate {
                    content: Some(content),
                    ..Default::default()
                };
                match self.state.whiteboards.update_whiteboard(&link, update) {
                    Ok(_) => None,
                    Err(e) => {
                        warn!(connection_id = %conn, link = %link, error = %e, "Failed to persist whiteboard");
                        Some(ServerEvent::WhiteboardError(UPDATE_WHITEBOARD_FAILED.into()))
                    }
                }
            }

            ClientEvent::CallUser {
                user_to_call,
                signal_data,
                from,
                name,
            } => {
                let Ok(target) = user_to_call.parse::<ConnectionId>() else {
                    return Some(ServerEvent::Error(format!(
                        "Unknown connection: {}",
                        user_to_call
                    )));
                };
                self.state
                    .bus
                    .to_connection(
                        target,
                        ServerEvent::CallUser {
                            signal: signal_data,
                            from,
                            name,
                        },
                    )
                    .await;
                None
            }

            ClientEvent::AnswerCall { to, signal } => {
                let Ok(target) = to.parse::<ConnectionId>() else {
                    return Some(ServerEvent::Error(format!("Unknown connection: {}", to)));
                };
                self.state
                    .bus
                    .to_connection(target, ServerEvent::CallAccepted(signal))
                    .await;
                None
            }
        }
    }

    /// Drop room memberships and release the socket id held by a user.
    pub fn disconnect(&self) {
        let left = self.state.bus.rooms().remove_connection(&self.connection_id);

        match self
            .state
            .users
            .remove_socket_by_socket_id(&self.connection_id.to_string())
        {
            Ok(user) => debug!(
                connection_id = %self.connection_id,
                username = %user.username,
                "Cleared socket id"
            ),
            Err(e) => debug!(
                connection_id = %self.connection_id,
                error = %e,
                "No socket id to clear"
            ),
        }

        log_connection_event!(info, "WebSocket connection closed", self.connection_id, rooms_left = left.len());
    }

    /// Handle a WebSocket connection
    pub async fn handle(mut self, socket: WebSocket) {
        log_connection_event!(info, "New WebSocket connection", self.connection_id);

        let (sink, mut stream) = socket.split();
        let subscription = self.state.bus.subscribe(self.connection_id);
        let (reply_tx, reply_rx) = mpsc::channel::<Outbound>(REPLY_BUFFER);

        // Queued before the writer starts, so it is always the first frame.
        let greeting = ServerEvent::Connected {
            socket_id: self.connection_id.to_string(),
        };
        if reply_tx.send(Outbound::Event(greeting)).await.is_err() {
            return;
        }

        let mut writer = tokio::spawn(write_loop(
            self.connection_id,
            sink,
            subscription,
            reply_rx,
            self.state.websocket.ping_interval,
        ));

        let idle_timeout = self.state.websocket.idle_timeout;

        loop {
            let frame = match tokio::time::timeout(idle_timeout, stream.next()).await {
                Err(_) => {
                    log_connection_event!(info, "Closing idle WebSocket connection", self.connection_id);
                    break;
                }
                Ok(None) => break,
                Ok(Some(Err(e))) => {
                    warn!(connection_id = %self.connection_id, error = %e, "WebSocket error");
                    break;
                }
                Ok(Some(Ok(frame))) => frame,
            };

            let outbound = match frame {
                Message::Text(text) => self.handle_text(&text).await.map(Outbound::Event),
                Message::Binary(data) => {
                    if let Some(error) = self.check_message_size(data.len()) {
                        Some(Outbound::Event(error))
                    } else {
                        match String::from_utf8(data) {
                            Ok(text) => self.handle_text(&text).await.map(Outbound::Event),
                            Err(_) => Some(Outbound::Event(ServerEvent::Error(
                                "Binary frames must be UTF-8 JSON".into(),
                            ))),
                        }
                    }
                }
                Message::Ping(data) => Some(Outbound::Pong(data)),
                Message::Pong(_) => None,
                Message::Close(_) => {
                    debug!(connection_id = %self.connection_id, "WebSocket close received");
                    break;
                }
            };

            if let Some(outbound) = outbound {
                if reply_tx.send(outbound).await.is_err() {
                    // Writer is gone, so is the client.
                    break;
                }
            }
        }

        drop(reply_tx);
        if tokio::time::timeout(Duration::from_secs(1), &mut writer)
            .await
            .is_err()
        {
            writer.abort();
        }

        self.disconnect();
    }
}

async fn write_loop(
    connection_id: ConnectionId,
    mut sink: SplitSink<WebSocket, Message>,
    mut subscription: Subscription,
    mut replies: mpsc::Receiver<Outbound>,
    ping_interval: Duration,
) {
    let mut ping = tokio::time::interval(ping_interval);
    ping.tick().await;

    loop {
        let frame = tokio::select! {
            biased;

            reply = replies.recv() => match reply {
                Some(Outbound::Event(event)) => encode(connection_id, &event),
                Some(Outbound::Pong(data)) => Some(Message::Pong(data)),
                None => break,
            },

            envelope = subscription.recv() => match envelope {
                Some(envelope) => encode(connection_id, &envelope.event),
                None => break,
            },

            _ = ping.tick() => Some(Message::Ping(Vec::new())),
        };

        if let Some(frame) = frame {
            if let Err(e) = sink.send(frame).await {
                debug!(connection_id = %connection_id, error = %e, "WebSocket send failed");
                break;
            }
        }
    }

    let _ = sink.close().await;
}

fn encode(connection_id: ConnectionId, event: &ServerEvent) -> Option<Message> {
    match serde_json::to_string(event) {
        Ok(text) => Some(Message::Text(text)),
        Err(e) => {
            error!(connection_id = %connection_id, event = event.name(), error = %e, "Failed to encode event");
            None
        }
    }
}
