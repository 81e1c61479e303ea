//! # Inbound Ports (Driving Ports)
//!
//! The service APIs the gateway calls. Implementations take `&self`; the
//! shared document store handles locking.

use crate::domain::errors::ServiceError;
use agora_types::{
    Chat, DocumentId, GoogleCredentials, Message, NewChat, NewUser, NewWhiteboard, PopulatedChat,
    Role, SafeUser, StoredMessage, UserUpdate, Whiteboard, WhiteboardUpdate,
};

/// User accounts.
pub trait UserApi: Send + Sync {
    /// Register a user.
    ///
    /// ## Errors
    ///
    /// - `InvalidUser`: Blank username, or neither password nor Google id given
    /// - `UsernameTaken`: Username already registered
    /// - `GoogleIdTaken`: Google id already linked to another account
    fn save_user(&self, user: NewUser) -> Result<SafeUser, ServiceError>;

    fn get_user_by_username(&self, username: &str) -> Result<SafeUser, ServiceError>;

    fn get_user_by_google_id(&self, google_id: &str) -> Result<SafeUser, ServiceError>;

    fn get_user_by_email(&self, email: &str) -> Result<SafeUser, ServiceError>;

    /// All users, oldest account first.
    fn get_users_list(&self) -> Result<Vec<SafeUser>, ServiceError>;

    /// Check a username/password pair.
    ///
    /// ## Errors
    ///
    /// - `AuthenticationFailed`: Unknown user, wrong password, or an account
    ///   that has no password (Google-only)
    fn login_user(&self, username: &str, password: &str) -> Result<SafeUser, ServiceError>;

    /// Delete and return the user.
    fn delete_user_by_username(&self, username: &str) -> Result<SafeUser, ServiceError>;

    /// Apply a partial update. The username cannot change.
    fn update_user(&self, username: &str, update: UserUpdate) -> Result<SafeUser, ServiceError>;

    /// Find or create the account behind a verified Google identity.
    ///
    /// Lookup order: Google id, then email (linking the Google id), then a
    /// new account named after the email's local part.
    fn login_with_google(&self, credentials: GoogleCredentials) -> Result<SafeUser, ServiceError>;

    /// Clear the socket id held by whichever user has it.
    ///
    /// ## Errors
    ///
    /// - `UserNotFound`: No user holds this socket id
    fn remove_socket_by_socket_id(&self, socket_id: &str) -> Result<SafeUser, ServiceError>;
}

/// Message board and chat messages.
pub trait MessageApi: Send + Sync {
    /// ## Errors
    ///
    /// - `InvalidSender`: `msgFrom` is not a registered user
    fn save_message(&self, message: Message) -> Result<StoredMessage, ServiceError>;

    /// Global board messages, oldest first.
    fn get_messages(&self) -> Result<Vec<StoredMessage>, ServiceError>;

    fn get_message(&self, id: &DocumentId) -> Result<StoredMessage, ServiceError>;

    /// Record `username`'s vote, replacing any earlier vote.
    ///
    /// ## Errors
    ///
    /// - `MessageNotFound`
    /// - `NotAPoll`: The message carries no poll
    /// - `InvalidPollOption`: Index past the last option
    fn vote_on_poll(
        &self,
        message_id: &DocumentId,
        option_index: usize,
        username: &str,
    ) -> Result<StoredMessage, ServiceError>;
}

/// Chats, participants and per-chat roles.
pub trait ChatApi: Send + Sync {
    /// Save the initial messages and the chat in one atomic batch.
    ///
    /// ## Errors
    ///
    /// - `InvalidSender`: Any initial message has an unknown sender; nothing
    ///   is written
    fn save_chat(&self, chat: NewChat) -> Result<Chat, ServiceError>;

    fn add_message_to_chat(
        &self,
        chat_id: &DocumentId,
        message_id: &DocumentId,
    ) -> Result<Chat, ServiceError>;

    fn get_chat(&self, chat_id: &DocumentId) -> Result<Chat, ServiceError>;

    /// Chats that include every one of `usernames`. Empty on any failure.
    fn get_chats_by_participants(&self, usernames: &[String]) -> Vec<Chat>;

    /// Add a participant with the `user` role. A no-op for existing members.
    ///
    /// ## Errors
    ///
    /// - `UserDoesNotExist`
    /// - `ChatNotFound`
    fn add_participant_to_chat(&self, chat_id: &DocumentId, username: &str)
        -> Result<Chat, ServiceError>;

    /// ## Errors
    ///
    /// - `ChatOrParticipantNotFound`
    /// - `PermissionDenied`: `acting_user` is given and is not an admin
    fn change_user_role(
        &self,
        chat_id: &DocumentId,
        username: &str,
        role: Role,
        acting_user: Option<&str>,
    ) -> Result<Chat, ServiceError>;

    /// ## Errors
    ///
    /// - `ChatNotFound`
    /// - `PermissionDenied`: `acting_user` is given and is neither a
    ///   moderator/admin nor the message's author
    fn delete_chat_message(
        &self,
        chat_id: &DocumentId,
        message_id: &DocumentId,
        acting_user: Option<&str>,
    ) -> Result<Chat, ServiceError>;

    /// Resolve message ids and attach sender summaries.
    fn populate(&self, chat: Chat) -> Result<PopulatedChat, ServiceError>;
}

/// Shared whiteboards, addressed by unique link.
pub trait WhiteboardApi: Send + Sync {
    /// ## Errors
    ///
    /// - `WhiteboardExists`: Link already in use
    fn save_whiteboard(&self, whiteboard: NewWhiteboard) -> Result<Whiteboard, ServiceError>;

    fn get_whiteboard_by_link(&self, link: &str) -> Result<Whiteboard, ServiceError>;

    /// Empty on any failure.
    fn get_whiteboards_by_owner(&self, owner: &str) -> Vec<Whiteboard>;

    fn update_whiteboard(
        &self,
        link: &str,
        update: WhiteboardUpdate,
    ) -> Result<Whiteboard, ServiceError>;

    fn delete_whiteboard_by_link(&self, link: &str) -> Result<Whiteboard, ServiceError>;
}
