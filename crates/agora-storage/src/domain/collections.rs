//! Document collections.

use std::fmt;

/// A named collection. Documents live under `<collection>:<key>`.
///
/// | Collection | Keyed by |
/// |------------|----------|
/// | `user` | username |
/// | `message` | message id |
/// | `chat` | chat id |
/// | `whiteboard` | unique link |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    User,
    Message,
    Chat,
    Whiteboard,
}

impl Collection {
    pub fn name(self) -> &'static str {
        match self {
            Collection::User => "user",
            Collection::Message => "message",
            Collection::Chat => "chat",
            Collection::Whiteboard => "whiteboard",
        }
    }

    pub fn prefix(self) -> Vec<u8> {
        format!("{}:", self.name()).into_bytes()
    }

    pub fn key(self, key: &str) -> Vec<u8> {
        format!("{}:{}", self.name(), key).into_bytes()
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
