//! Chats, participants and per-chat roles.

use crate::ids::DocumentId;
use crate::message::{Message, StoredMessage};
use crate::user::UserSummary;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role a participant holds inside one chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Moderator,
    Admin,
}

impl Role {
    /// Moderators and admins may delete other people's messages.
    pub fn can_moderate(self) -> bool {
        matches!(self, Role::Moderator | Role::Admin)
    }

    pub fn can_manage_roles(self) -> bool {
        self == Role::Admin
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub user: String,
    pub role: Role,
}

impl Permission {
    pub fn new(user: impl Into<String>, role: Role) -> Self {
        Self {
            user: user.into(),
            role,
        }
    }
}

/// Stored chat document. `messages` holds message ids in posting order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chat {
    #[serde(rename = "_id")]
    pub id: DocumentId,
    #[serde(default)]
    pub title: String,
    pub participants: Vec<String>,
    #[serde(default)]
    pub messages: Vec<DocumentId>,
    #[serde(default)]
    pub permissions: Vec<Permission>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Chat {
    pub fn role_of(&self, username: &str) -> Option<Role> {
        self.permissions
            .iter()
            .find(|p| p.user == username)
            .map(|p| p.role)
    }

    pub fn has_participant(&self, username: &str) -> bool {
        self.participants.iter().any(|p| p == username)
    }

    /// True when every name in `usernames` is a participant.
    pub fn includes_all<S: AsRef<str>>(&self, usernames: &[S]) -> bool {
        usernames.iter().all(|u| self.has_participant(u.as_ref()))
    }
}

/// A stored message joined with its sender. `user` is `null` when the
/// sender account no longer exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(flatten)]
    pub message: StoredMessage,
    pub user: Option<UserSummary>,
}

/// Chat with message ids resolved to messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopulatedChat {
    #[serde(rename = "_id")]
    pub id: DocumentId,
    pub title: String,
    pub participants: Vec<String>,
    pub messages: Vec<ChatMessage>,
    pub permissions: Vec<Permission>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PopulatedChat {
    pub fn from_chat(chat: Chat, messages: Vec<ChatMessage>) -> Self {
        Self {
            id: chat.id,
            title: chat.title,
            participants: chat.participants,
            messages,
            permissions: chat.permissions,
            created_at: chat.created_at,
            updated_at: chat.updated_at,
        }
    }
}

/// Chat creation input. Messages are saved before the chat itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewChat {
    #[serde(default)]
    pub title: String,
    pub participants: Vec<String>,
    #[serde(default)]
    pub messages: Vec<Message>,
    pub permissions: Vec<Permission>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChatUpdateKind {
    Created,
    NewMessage,
    Deleted,
    ChangeUserRole,
    Notification,
    NewParticipant,
}

impl ChatUpdateKind {
    /// Updates every connected client sees, as opposed to chat room members.
    pub fn is_public(self) -> bool {
        matches!(
            self,
            ChatUpdateKind::Created | ChatUpdateKind::NewParticipant | ChatUpdateKind::Notification
        )
    }
}
