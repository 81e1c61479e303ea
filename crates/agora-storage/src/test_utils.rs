//! Shared fixtures for service tests.

use crate::adapters::time::FixedTimeSource;
use crate::documents::DocumentStore;
use crate::ports::inbound::UserApi;
use crate::service::{ChatService, MessageService, Services, UserService, WhiteboardService};
use agora_types::{Message, MessageType, NewUser, Poll};
use chrono::{DateTime, TimeZone, Utc};
use std::sync::Arc;

pub fn fixed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub struct Fixture {
    pub store: Arc<DocumentStore>,
    pub clock: Arc<FixedTimeSource>,
    pub users: Arc<UserService>,
    pub messages: Arc<MessageService>,
    pub chats: Arc<ChatService>,
    pub whiteboards: Arc<WhiteboardService>,
}

impl Fixture {
    pub fn register(&self, username: &str) {
        self.users
            .save_user(NewUser {
                username: username.into(),
                password: Some("password".into()),
                ..Default::default()
            })
            .expect("register user");
    }
}

pub fn fixture() -> Fixture {
    let store = Arc::new(DocumentStore::in_memory());
    let clock = Arc::new(FixedTimeSource::new(fixed_time()));
    let services = Services::with_time_source(store.clone(), clock.clone());
    Fixture {
        store,
        clock,
        users: services.users,
        messages: services.messages,
        chats: services.chats,
        whiteboards: services.whiteboards,
    }
}

pub fn message_from(username: &str, kind: MessageType) -> Message {
    Message {
        msg: format!("hello from {username}"),
        msg_from: username.into(),
        msg_date_time: fixed_time(),
        kind,
        poll: None,
    }
}

pub fn poll_message(username: &str) -> Message {
    Message {
        msg: "POLL".into(),
        msg_from: username.into(),
        msg_date_time: fixed_time(),
        kind: MessageType::Poll,
        poll: Some(Poll::new(
            "Pizza or sushi?",
            vec!["Pizza".to_string(), "Sushi".to_string()],
        )),
    }
}
