use super::messages::stage_message;
use crate::documents::DocumentStore;
use crate::domain::collections::Collection;
use crate::domain::errors::ServiceError;
use crate::ports::inbound::ChatApi;
use crate::ports::outbound::TimeSource;
use agora_types::{
    Chat, ChatMessage, DocumentId, NewChat, Permission, PopulatedChat, Role, StoredMessage, User,
    UserSummary,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct ChatService {
    store: Arc<DocumentStore>,
    clock: Arc<dyn TimeSource>,
}

impl ChatService {
    pub fn new(store: Arc<DocumentStore>, clock: Arc<dyn TimeSource>) -> Self {
        Self { store, clock }
    }

    fn chats_by_participants(&self, usernames: &[String]) -> Result<Vec<Chat>, ServiceError> {
        let mut chats: Vec<Chat> = self
            .store
            .scan::<Chat>(Collection::Chat)?
            .into_iter()
            .filter(|chat| chat.includes_all(usernames))
            .collect();
        chats.sort_by_key(|chat| chat.created_at);
        Ok(chats)
    }
}

impl ChatApi for ChatService {
    fn save_chat(&self, new: NewChat) -> Result<Chat, ServiceError> {
        let now = self.clock.now();

        let chat = self.store.transaction(|tx| {
            let mut message_ids = Vec::with_capacity(new.messages.len());
            for message in new.messages {
                message_ids.push(stage_message(tx, message)?.id);
            }

            let chat = Chat {
                id: DocumentId::new(),
                title: new.title,
                participants: new.participants,
                messages: message_ids,
                permissions: new.permissions,
                created_at: now,
                updated_at: now,
            };
            tx.insert(Collection::Chat, &chat.id.to_string(), &chat)?;
            Ok::<_, ServiceError>(chat)
        })?;

        info!(
            chat_id = %chat.id,
            participants = chat.participants.len(),
            messages = chat.messages.len(),
            "Chat created"
        );
        Ok(chat)
    }

    fn add_message_to_chat(
        &self,
        chat_id: &DocumentId,
        message_id: &DocumentId,
    ) -> Result<Chat, ServiceError> {
        let now = self.clock.now();
        self.store
            .update(Collection::Chat, &chat_id.to_string(), |chat: &mut Chat| {
                chat.messages.push(*message_id);
                chat.updated_at = now;
                Ok::<_, ServiceError>(chat.clone())
            })?
            .ok_or(ServiceError::ChatNotFound)
    }

    fn get_chat(&self, chat_id: &DocumentId) -> Result<Chat, ServiceError> {
        self.store
            .get(Collection::Chat, &chat_id.to_string())?
            .ok_or(ServiceError::ChatNotFound)
    }

    fn get_chats_by_participants(&self, usernames: &[String]) -> Vec<Chat> {
        self.chats_by_participants(usernames).unwrap_or_else(|e| {
            warn!(error = %e, "Failed to list chats by participants");
            Vec::new()
        })
    }

    fn add_participant_to_chat(
        &self,
        chat_id: &DocumentId,
        username: &str,
    ) -> Result<Chat, ServiceError> {
        let now = self.clock.now();
        let key = chat_id.to_string();

        self.store.transaction(|tx| {
            if !tx.exists(Collection::User, username)? {
                return Err(ServiceError::UserDoesNotExist);
            }
            let mut chat = tx
                .get::<Chat>(Collection::Chat, &key)?
                .ok_or(ServiceError::ChatNotFound)?;

            if chat.has_participant(username) {
                return Ok(chat);
            }

            chat.participants.push(username.to_string());
            chat.permissions.push(Permission::new(username, Role::User));
            chat.updated_at = now;
            tx.upsert(Collection::Chat, &key, &chat)?;
            debug!(chat_id = %chat_id, username = %username, "Participant added");
            Ok(chat)
        })
    }

    fn change_user_role(
        &self,
        chat_id: &DocumentId,
        username: &str,
        role: Role,
        acting_user: Option<&str>,
    ) -> Result<Chat, ServiceError> {
        let now = self.clock.now();
        let chat = self
            .store
            .update(Collection::Chat, &chat_id.to_string(), |chat: &mut Chat| {
                if chat.role_of(username).is_none() {
                    return Err(ServiceError::ChatOrParticipantNotFound);
                }
                if let Some(actor) = acting_user {
                    if !chat.role_of(actor).is_some_and(Role::can_manage_roles) {
                        return Err(ServiceError::PermissionDenied(format!(
                            "{actor} is not an admin of this chat"
                        )));
                    }
                }
                for permission in chat.permissions.iter_mut().filter(|p| p.user == username) {
                    permission.role = role;
                }
                chat.updated_at = now;
                Ok(chat.clone())
            })?
            .ok_or(ServiceError::ChatOrParticipantNotFound)?;

        info!(chat_id = %chat_id, username = %username, role = ?role, "Chat role changed");
        Ok(chat)
    }

    fn delete_chat_message(
        &self,
        chat_id: &DocumentId,
        message_id: &DocumentId,
        acting_user: Option<&str>,
    ) -> Result<Chat, ServiceError> {
        let now = self.clock.now();
        let key = chat_id.to_string();

        self.store.transaction(|tx| {
            let mut chat = tx
                .get::<Chat>(Collection::Chat, &key)?
                .ok_or(ServiceError::ChatNotFound)?;

            if let Some(actor) = acting_user {
                let moderates = chat.role_of(actor).is_some_and(Role::can_moderate);
                let authored = tx
                    .get::<StoredMessage>(Collection::Message, &message_id.to_string())?
                    .is_some_and(|m| m.message.msg_from == actor);
                if !moderates && !authored {
                    return Err(ServiceError::PermissionDenied(format!(
                        "{actor} may not delete this message"
                    )));
                }
            }

            chat.messages.retain(|id| id != message_id);
            chat.updated_at = now;
            tx.upsert(Collection::Chat, &key, &chat)?;
            debug!(chat_id = %chat_id, message_id = %message_id, "Message removed from chat");
            Ok(chat)
        })
    }

    fn populate(&self, chat: Chat) -> Result<PopulatedChat, ServiceError> {
        let mut senders: HashMap<String, Option<UserSummary>> = HashMap::new();
        let mut messages = Vec::with_capacity(chat.messages.len());

        for id in &chat.messages {
            let Some(message) = self
                .store
                .get::<StoredMessage>(Collection::Message, &id.to_string())?
            else {
                debug!(chat_id = %chat.id, message_id = %id, "Skipping dangling message id");
                continue;
            };

            let sender = message.message.msg_from.clone();
            let user = match senders.get(&sender) {
                Some(cached) => cached.clone(),
                None => {
                    let summary = self
                        .store
                        .get::<User>(Collection::User, &sender)?
                        .as_ref()
                        .map(UserSummary::from);
                    senders.insert(sender, summary.clone());
                    summary
                }
            };
            messages.push(ChatMessage { message, user });
        }

        Ok(PopulatedChat::from_chat(chat, messages))
    }
}
