//! Real-time wire protocol.
//!
//! Every frame is a JSON object `{ "event": <name>, "data": <payload> }`.
//! Call signaling payloads are opaque JSON relayed between peers untouched.

use crate::chat::{ChatUpdateKind, PopulatedChat};
use crate::message::StoredMessage;
use crate::user::{SafeUser, UserUpdateKind};
use crate::whiteboard::WhiteboardContent;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Server to client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    Connected {
        #[serde(rename = "socketId")]
        socket_id: String,
    },
    MessageUpdate {
        msg: StoredMessage,
    },
    ChatUpdate {
        chat: Box<PopulatedChat>,
        #[serde(rename = "type")]
        kind: ChatUpdateKind,
    },
    UserUpdate {
        user: SafeUser,
        #[serde(rename = "type")]
        kind: UserUpdateKind,
    },
    WhiteboardContent(WhiteboardContent),
    WhiteboardError(String),
    CallUser {
        signal: Value,
        from: String,
        name: String,
    },
    CallAccepted(Value),
    Joined(String),
    Left(String),
    Error(String),
}

impl ServerEvent {
    pub fn chat_update(chat: PopulatedChat, kind: ChatUpdateKind) -> Self {
        ServerEvent::ChatUpdate {
            chat: Box::new(chat),
            kind,
        }
    }

    /// Wire name, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::Connected { .. } => "connected",
            ServerEvent::MessageUpdate { .. } => "messageUpdate",
            ServerEvent::ChatUpdate { .. } => "chatUpdate",
            ServerEvent::UserUpdate { .. } => "userUpdate",
            ServerEvent::WhiteboardContent(_) => "whiteboardContent",
            ServerEvent::WhiteboardError(_) => "whiteboardError",
            ServerEvent::CallUser { .. } => "callUser",
            ServerEvent::CallAccepted(_) => "callAccepted",
            ServerEvent::Joined(_) => "joined",
            ServerEvent::Left(_) => "left",
            ServerEvent::Error(_) => "error",
        }
    }
}

/// Client to server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientEvent {
    JoinChat(String),
    LeaveChat(String),
    JoinWhiteboard(String),
    LeaveWhiteboard(String),
    /// `[uniqueLink, content]`
    UpdateWhiteboard(String, WhiteboardContent),
    CallUser {
        #[serde(rename = "userToCall")]
        user_to_call: String,
        #[serde(rename = "signalData")]
        signal_data: Value,
        from: String,
        name: String,
    },
    AnswerCall {
        to: String,
        signal: Value,
    },
}

impl ClientEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::JoinChat(_) => "joinChat",
            ClientEvent::LeaveChat(_) => "leaveChat",
            ClientEvent::JoinWhiteboard(_) => "joinWhiteboard",
            ClientEvent::LeaveWhiteboard(_) => "leaveWhiteboard",
            ClientEvent::UpdateWhiteboard(..) => "updateWhiteboard",
            ClientEvent::CallUser { .. } => "callUser",
            ClientEvent::AnswerCall { .. } => "answerCall",
        }
    }
}
