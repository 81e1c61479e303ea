//! User accounts.
//!
//! `User` is the stored record and may carry password material. Anything
//! that leaves the server goes through [`SafeUser`].

use crate::ids::DocumentId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Salted password hash, hex encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordHash {
    pub salt: String,
    pub hash: String,
}

/// Stored user record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: DocumentId,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<PasswordHash>,
    pub date_joined: DateTime<Utc>,
    #[serde(default)]
    pub biography: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub socket_id: Option<String>,
}

impl User {
    /// True when the account can only sign in through Google.
    pub fn is_google_only(&self) -> bool {
        self.password_hash.is_none()
    }

    pub fn to_safe(&self) -> SafeUser {
        SafeUser::from(self)
    }
}

/// User as exposed to clients. Carries no password material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafeUser {
    #[serde(rename = "_id")]
    pub id: DocumentId,
    pub username: String,
    pub date_joined: DateTime<Utc>,
    #[serde(default)]
    pub biography: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub socket_id: Option<String>,
}

impl From<&User> for SafeUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            date_joined: user.date_joined,
            biography: user.biography.clone(),
            google_id: user.google_id.clone(),
            email: user.email.clone(),
            avatar_url: user.avatar_url.clone(),
            socket_id: user.socket_id.clone(),
        }
    }
}

impl From<User> for SafeUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            date_joined: user.date_joined,
            biography: user.biography,
            google_id: user.google_id,
            email: user.email,
            avatar_url: user.avatar_url,
            socket_id: user.socket_id,
        }
    }
}

/// Sender summary attached to populated chat messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    #[serde(rename = "_id")]
    pub id: DocumentId,
    pub username: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
        }
    }
}

/// Registration input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub username: String,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub biography: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub google_id: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// Partial update. `None` fields are left untouched; the username cannot be
/// changed through this type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub biography: Option<String>,
    #[serde(default)]
    pub google_id: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub socket_id: Option<String>,
}

impl UserUpdate {
    pub fn is_empty(&self) -> bool {
        self.password.is_none()
            && self.biography.is_none()
            && self.google_id.is_none()
            && self.avatar_url.is_none()
            && self.socket_id.is_none()
    }
}

/// Identity asserted by a verified Google ID token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleCredentials {
    pub google_id: String,
    pub email: String,
    #[serde(default)]
    pub picture: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UserUpdateKind {
    Created,
    Deleted,
    Updated,
}
