use crate::documents::{DocumentStore, Transaction};
use crate::domain::collections::Collection;
use crate::domain::errors::ServiceError;
use crate::ports::inbound::MessageApi;
use agora_types::{DocumentId, Message, MessageType, StoredMessage};
use std::sync::Arc;
use tracing::debug;

pub struct MessageService {
    store: Arc<DocumentStore>,
}

impl MessageService {
    pub fn new(store: Arc<DocumentStore>) -> Self {
        Self { store }
    }
}

/// Validate the sender and stage the message inside `tx`.
pub(crate) fn stage_message(
    tx: &mut Transaction<'_>,
    message: Message,
) -> Result<StoredMessage, ServiceError> {
    if !tx.exists(Collection::User, &message.msg_from)? {
        return Err(ServiceError::InvalidSender);
    }
    let stored = StoredMessage::new(DocumentId::new(), message);
    tx.insert(Collection::Message, &stored.id.to_string(), &stored)?;
    Ok(stored)
}

impl MessageApi for MessageService {
    fn save_message(&self, message: Message) -> Result<StoredMessage, ServiceError> {
        let stored = self.store.transaction(|tx| stage_message(tx, message))?;
        debug!(
            message_id = %stored.id,
            from = %stored.message.msg_from,
            kind = ?stored.message.kind,
            "Message saved"
        );
        Ok(stored)
    }

    fn get_messages(&self) -> Result<Vec<StoredMessage>, ServiceError> {
        let mut messages: Vec<StoredMessage> = self
            .store
            .scan::<StoredMessage>(Collection::Message)?
            .into_iter()
            .filter(|m| m.message.kind == MessageType::Global)
            .collect();
        messages.sort_by_key(|m| m.message.msg_date_time);
        Ok(messages)
    }

    fn get_message(&self, id: &DocumentId) -> Result<StoredMessage, ServiceError> {
        self.store
            .get(Collection::Message, &id.to_string())?
            .ok_or(ServiceError::MessageNotFound)
    }

    fn vote_on_poll(
        &self,
        message_id: &DocumentId,
        option_index: usize,
        username: &str,
    ) -> Result<StoredMessage, ServiceError> {
        let updated = self
            .store
            .update(Collection::Message, &message_id.to_string(), |stored: &mut StoredMessage| {
                if stored.message.kind != MessageType::Poll {
                    return Err(ServiceError::NotAPoll);
                }
                let Some(poll) = stored.message.poll.as_mut() else {
                    return Err(ServiceError::NotAPoll);
                };
                poll.vote(username, option_index)?;
                Ok(stored.clone())
            })?
            .ok_or(ServiceError::MessageNotFound)?;

        debug!(
            message_id = %message_id,
            username = %username,
            option = option_index,
            "Poll vote recorded"
        );
        Ok(updated)
    }
}
