//! Messages and polls.

use crate::ids::DocumentId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    /// Posted on the global message board.
    Global,
    /// Posted inside a chat.
    Direct,
    /// A chat message carrying a poll.
    Poll,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollOption {
    pub option_text: String,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PollError {
    #[error("Poll option {index} is out of range ({options} options)")]
    OptionOutOfRange { index: usize, options: usize },
}

/// A poll attached to a message.
///
/// `votes` maps a username to the index of the option they picked, so each
/// user holds at most one vote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Poll {
    pub question: String,
    pub options: Vec<PollOption>,
    #[serde(default)]
    pub votes: BTreeMap<String, usize>,
}

impl Poll {
    pub fn new(question: impl Into<String>, options: impl IntoIterator<Item = String>) -> Self {
        Self {
            question: question.into(),
            options: options
                .into_iter()
                .map(|option_text| PollOption { option_text })
                .collect(),
            votes: BTreeMap::new(),
        }
    }

    /// Record `username`'s vote, replacing any earlier one.
    ///
    /// Returns the previously chosen option, if any.
    pub fn vote(&mut self, username: impl Into<String>, index: usize) -> Result<Option<usize>, PollError> {
        if index >= self.options.len() {
            return Err(PollError::OptionOutOfRange {
                index,
                options: self.options.len(),
            });
        }
        Ok(self.votes.insert(username.into(), index))
    }

    /// Vote count per option. Stale out-of-range votes are ignored.
    pub fn tally(&self) -> Vec<usize> {
        let mut counts = vec![0; self.options.len()];
        for &index in self.votes.values() {
            if let Some(count) = counts.get_mut(index) {
                *count += 1;
            }
        }
        counts
    }

    pub fn vote_of(&self, username: &str) -> Option<usize> {
        self.votes.get(username).copied()
    }
}

/// A message as submitted, before it has an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub msg: String,
    pub msg_from: String,
    pub msg_date_time: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: MessageType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poll: Option<Poll>,
}

impl Message {
    pub fn is_poll(&self) -> bool {
        self.kind == MessageType::Poll && self.poll.is_some()
    }
}

/// A persisted message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredMessage {
    #[serde(rename = "_id")]
    pub id: DocumentId,
    #[serde(flatten)]
    pub message: Message,
}

impl StoredMessage {
    pub fn new(id: DocumentId, message: Message) -> Self {
        Self { id, message }
    }
}
