use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::{
    models::{
        Channel, Message, MessageEvent, MessageStatus, NewMessage, NewMessageEvent, Provider,
        Template,
    },
    repositories::{MessageRepository, ProviderRepository, TemplateRepository},
};

#[derive(Default)]
struct MessageStore {
    next_id: i64,
    messages: HashMap<Uuid, Message>,
    events: Vec<MessageEvent>,
}

impl MessageStore {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn build(&mut self, message: NewMessage) -> Message {
        let now = Utc::now();
        Message {
            id: self.next_id(),
            uuid: message.uuid,
            channel: message.channel,
            identifiers: message.identifiers,
            categories: message.categories,
            refno: message.refno,
            status: MessageStatus::Accepted,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Default, Clone)]
pub struct InMemoryMessageRepository {
    store: Arc<RwLock<MessageStore>>,
}

impl InMemoryMessageRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.store.read().await.messages.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl MessageRepository for InMemoryMessageRepository {
    async fn insert(&self, message: NewMessage) -> anyhow::Result<Message> {
        let mut store = self.store.write().await;
        if store.messages.contains_key(&message.uuid) {
            anyhow::bail!("duplicate message uuid {}", message.uuid);
        }
        let message = store.build(message);
        store.messages.insert(message.uuid, message.clone());
        Ok(message)
    }

    async fn ensure(&self, message: NewMessage) -> anyhow::Result<(Message, bool)> {
        let mut store = self.store.write().await;
        if let Some(existing) = store.messages.get_mut(&message.uuid) {
            existing.updated_at = Utc::now();
            return Ok((existing.clone(), false));
        }
        let message = store.build(message);
        store.messages.insert(message.uuid, message.clone());
        Ok((message, true))
    }

    async fn get(&self, uuid: Uuid) -> anyhow::Result<Option<Message>> {
        Ok(self.store.read().await.messages.get(&uuid).cloned())
    }

    async fn update_status(&self, uuid: Uuid, status: MessageStatus) -> anyhow::Result<()> {
        let mut store = self.store.write().await;
        if let Some(message) = store.messages.get_mut(&uuid) {
            message.status = status;
            message.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn append_event(&self, event: NewMessageEvent) -> anyhow::Result<MessageEvent> {
        let mut store = self.store.write().await;
        let now = Utc::now();
        let event = MessageEvent {
            id: store.next_id(),
            uuid: Uuid::new_v4(),
            message_id: event.message_id,
            status: event.status,
            reason: event.reason,
            metadata: event.metadata,
            timestamp: now,
            created_at: now,
        };
        store.events.push(event.clone());
        Ok(event)
    }

    async fn list_events(&self, uuid: Uuid) -> anyhow::Result<Vec<MessageEvent>> {
        let store = self.store.read().await;
        Ok(store
            .events
            .iter()
            .filter(|event| event.message_id == uuid)
            .cloned()
            .collect())
    }
}

#[derive(Default, Clone)]
pub struct InMemoryTemplateRepository {
    templates: Arc<RwLock<HashMap<Uuid, Template>>>,
}

impl InMemoryTemplateRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn put(&self, template: Template) {
        self.templates.write().await.insert(template.uuid, template);
    }
}

#[async_trait]
impl TemplateRepository for InMemoryTemplateRepository {
    async fn find_active(
        &self,
        reference: &str,
        tenant: &str,
        channel: Channel,
    ) -> anyhow::Result<Option<Template>> {
        let uuid = Uuid::parse_str(reference).ok();
        let templates = self.templates.read().await;
        Ok(templates
            .values()
            .find(|template| {
                let matches_ref = match uuid {
                    Some(uuid) => template.uuid == uuid,
                    None => template.code == reference,
                };
                matches_ref
                    && template.tenant == tenant
                    && template.channel == channel
                    && template.is_active()
            })
            .cloned())
    }
}

#[derive(Default, Clone)]
pub struct InMemoryProviderRepository {
    providers: Arc<RwLock<HashMap<Uuid, Provider>>>,
}

impl InMemoryProviderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn put(&self, provider: Provider) {
        self.providers.write().await.insert(provider.uuid, provider);
    }
}

#[async_trait]
impl ProviderRepository for InMemoryProviderRepository {
    async fn find_active(
        &self,
        reference: &str,
        channel: Channel,
    ) -> anyhow::Result<Option<Provider>> {
        let Ok(uuid) = Uuid::parse_str(reference) else {
            return Ok(None);
        };
        let providers = self.providers.read().await;
        Ok(providers
            .get(&uuid)
            .filter(|provider| provider.channel == channel && provider.is_active())
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::Identifiers;

    fn new_message(uuid: Uuid) -> NewMessage {
        NewMessage {
            uuid,
            channel: Channel::Sms,
            identifiers: Identifiers {
                tenant: "acme".into(),
                ..Default::default()
            },
            categories: vec!["otp".into()],
            refno: "REF-9".into(),
        }
    }

    #[tokio::test]
    async fn ensure_only_inserts_once() {
        let repo = InMemoryMessageRepository::new();
        let uuid = Uuid::new_v4();

        let (first, inserted) = repo.ensure(new_message(uuid)).await.unwrap();
        assert!(inserted);
        let (second, inserted) = repo.ensure(new_message(uuid)).await.unwrap();
        assert!(!inserted);

        assert_eq!(first.id, second.id);
        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_uuid() {
        let repo = InMemoryMessageRepository::new();
        let uuid = Uuid::new_v4();
        repo.insert(new_message(uuid)).await.unwrap();
        assert!(repo.insert(new_message(uuid)).await.is_err());
    }

    #[tokio::test]
    async fn events_are_listed_in_append_order() {
        let repo = InMemoryMessageRepository::new();
        let uuid = Uuid::new_v4();
        repo.insert(new_message(uuid)).await.unwrap();
        repo.append_event(NewMessageEvent::sent(uuid, "+15550001"))
            .await
            .unwrap();
        repo.append_event(NewMessageEvent::rejected(uuid, "boom"))
            .await
            .unwrap();
        repo.append_event(NewMessageEvent::rejected(Uuid::new_v4(), "other"))
            .await
            .unwrap();

        let events = repo.list_events(uuid).await.unwrap();
        let statuses: Vec<_> = events.iter().map(|event| event.status).collect();
        assert_eq!(statuses, vec![MessageStatus::Sent, MessageStatus::Rejected]);
    }
}
