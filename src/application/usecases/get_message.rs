use std::sync::Arc;

use uuid::Uuid;

use crate::domain::{
    errors::DomainError,
    models::{Message, MessageEvent},
    repositories::MessageRepository,
};

pub struct MessageWithEvents {
    pub message: Message,
    pub events: Vec<MessageEvent>,
}

pub struct GetMessageUseCase {
    repo: Arc<dyn MessageRepository>,
}

impl GetMessageUseCase {
    pub fn new(repo: Arc<dyn MessageRepository>) -> Self {
        Self { repo }
    }

    pub async fn execute(&self, uuid: Uuid) -> Result<MessageWithEvents, DomainError> {
        let message = self
            .repo
            .get(uuid)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("message not found: {uuid}")))?;
        let events = self.repo.list_events(uuid).await?;
        Ok(MessageWithEvents { message, events })
    }
}
