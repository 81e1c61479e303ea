use crate::documents::DocumentStore;
use crate::domain::collections::Collection;
use crate::domain::errors::{ServiceError, StoreError};
use crate::ports::inbound::WhiteboardApi;
use crate::ports::outbound::TimeSource;
use agora_types::{NewWhiteboard, Whiteboard, WhiteboardUpdate};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub struct WhiteboardService {
    store: Arc<DocumentStore>,
    clock: Arc<dyn TimeSource>,
}

impl WhiteboardService {
    pub fn new(store: Arc<DocumentStore>, clock: Arc<dyn TimeSource>) -> Self {
        Self { store, clock }
    }

    fn by_owner(&self, owner: &str) -> Result<Vec<Whiteboard>, ServiceError> {
        let mut boards: Vec<Whiteboard> = self
            .store
            .scan::<Whiteboard>(Collection::Whiteboard)?
            .into_iter()
            .filter(|b| b.owner == owner)
            .collect();
        boards.sort_by_key(|b| b.date_created);
        Ok(boards)
    }
}

impl WhiteboardApi for WhiteboardService {
    fn save_whiteboard(&self, new: NewWhiteboard) -> Result<Whiteboard, ServiceError> {
        let unique_link = new
            .unique_link
            .filter(|link| !link.trim().is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let board = Whiteboard {
            owner: new.owner,
            title: new.title,
            date_created: new.date_created.unwrap_or_else(|| self.clock.now()),
            content: new.content,
            unique_link,
            access_type: new.access_type,
        };

        self.store
            .insert(Collection::Whiteboard, &board.unique_link, &board)
            .map_err(|e| match e {
                StoreError::Conflict { .. } => {
                    ServiceError::WhiteboardExists(board.unique_link.clone())
                }
                other => other.into(),
            })?;

        info!(link = %board.unique_link, owner = %board.owner, "Whiteboard created");
        Ok(board)
    }

    fn get_whiteboard_by_link(&self, link: &str) -> Result<Whiteboard, ServiceError> {
        self.store
            .get(Collection::Whiteboard, link)?
            .ok_or(ServiceError::WhiteboardNotFound)
    }

    fn get_whiteboards_by_owner(&self, owner: &str) -> Vec<Whiteboard> {
        self.by_owner(owner).unwrap_or_else(|e| {
            warn!(owner = %owner, error = %e, "Failed to list whiteboards");
            Vec::new()
        })
    }

    fn update_whiteboard(
        &self,
        link: &str,
        update: WhiteboardUpdate,
    ) -> Result<Whiteboard, ServiceError> {
        let board = self
            .store
            .update(Collection::Whiteboard, link, |board: &mut Whiteboard| {
                if let Some(title) = update.title {
                    board.title = title;
                }
                if let Some(content) = update.content {
                    board.content = content;
                }
                if let Some(access_type) = update.access_type {
                    board.access_type = access_type;
                }
                Ok::<_, ServiceError>(board.clone())
            })?
            .ok_or(ServiceError::WhiteboardNotFound)?;
        debug!(link = %link, "Whiteboard updated");
        Ok(board)
    }

    fn delete_whiteboard_by_link(&self, link: &str) -> Result<Whiteboard, ServiceError> {
        let board = self
            .store
            .remove(Collection::Whiteboard, link)?
            .ok_or(ServiceError::WhiteboardNotFound)?;
        info!(link = %link, "Whiteboard deleted");
        Ok(board)
    }
}
