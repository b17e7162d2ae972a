use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::models::{
    Channel, Message, MessageEvent, MessageStatus, NewMessage, NewMessageEvent, Provider,
    Template,
};

/// Message and audit-trail persistence. Reads may be served by a replica,
/// writes always go to the primary.
#[async_trait]
pub trait MessageRepository: Send + Sync {
    async fn insert(&self, message: NewMessage) -> anyhow::Result<Message>;

    /// Inserts the row unless one with the same UUID exists. The flag reports
    /// whether this call created it.
    async fn ensure(&self, message: NewMessage) -> anyhow::Result<(Message, bool)>;

    async fn get(&self, uuid: Uuid) -> anyhow::Result<Option<Message>>;

    async fn update_status(&self, uuid: Uuid, status: MessageStatus) -> anyhow::Result<()>;

    async fn append_event(&self, event: NewMessageEvent) -> anyhow::Result<MessageEvent>;

    async fn list_events(&self, uuid: Uuid) -> anyhow::Result<Vec<MessageEvent>>;
}

#[async_trait]
pub trait TemplateRepository: Send + Sync {
    async fn find_active(
        &self,
        reference: &str,
        tenant: &str,
        channel: Channel,
    ) -> anyhow::Result<Option<Template>>;
}

#[async_trait]
pub trait ProviderRepository: Send + Sync {
    async fn find_active(
        &self,
        reference: &str,
        channel: Channel,
    ) -> anyhow::Result<Option<Provider>>;
}
