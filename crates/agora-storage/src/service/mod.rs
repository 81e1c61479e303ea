//! # Application Services
//!
//! One service per aggregate, all sharing a single [`DocumentStore`].
//!
//! | Service | Collection(s) written |
//! |---------|-----------------------|
//! | `UserService` | `user` |
//! | `MessageService` | `message` |
//! | `ChatService` | `chat`, `message` (initial messages) |
//! | `WhiteboardService` | `whiteboard` |

mod chats;
mod messages;
mod users;
mod whiteboards;

pub use chats::ChatService;
pub use messages::MessageService;
pub use users::UserService;
pub use whiteboards::WhiteboardService;

use crate::adapters::time::SystemTimeSource;
use crate::documents::DocumentStore;
use crate::ports::outbound::TimeSource;
use std::sync::Arc;

/// All services over one store.
#[derive(Clone)]
pub struct Services {
    pub users: Arc<UserService>,
    pub messages: Arc<MessageService>,
    pub chats: Arc<ChatService>,
    pub whiteboards: Arc<WhiteboardService>,
}

impl Services {
    pub fn new(store: Arc<DocumentStore>) -> Self {
        Self::with_time_source(store, Arc::new(SystemTimeSource))
    }

    pub fn with_time_source(store: Arc<DocumentStore>, clock: Arc<dyn TimeSource>) -> Self {
        Self {
            users: Arc::new(UserService::new(store.clone(), clock.clone())),
            messages: Arc::new(MessageService::new(store.clone())),
            chats: Arc::new(ChatService::new(store.clone(), clock.clone())),
            whiteboards: Arc::new(WhiteboardService::new(store, clock)),
        }
    }
}
