mod common;

use std::sync::Arc;

use async_trait::async_trait;
use delivery::{
    application::{services::event_bus::MessageBus, usecases::produce_message::ProduceMessageUseCase},
    domain::{
        errors::DomainError,
        events::Envelope,
        models::{
            Channel, Message, MessageEvent, MessageStatus, NewMessage, NewMessageEvent,
            WhatsAppMessage,
        },
        repositories::MessageRepository,
    },
    infrastructure::{
        messaging::in_memory::InMemoryBus,
        repositories::in_memory::InMemoryMessageRepository,
    },
};
use serde_json::Value;
use tokio::sync::Mutex;
use uuid::Uuid;

use common::{Harness, ScriptedVendor, whatsapp};

/// Bus that records, at publish time, whether the row was already stored.
struct OrderCheckingBus {
    messages: InMemoryMessageRepository,
    observed: Mutex<Vec<(Uuid, bool)>>,
}

#[async_trait]
impl MessageBus for OrderCheckingBus {
    async fn publish(&self, _channel: Channel, payload: Vec<u8>) -> anyhow::Result<()> {
        let envelope: Envelope<Value> = serde_json::from_slice(&payload)?;
        let stored = self.messages.get(envelope.uuid).await?.is_some();
        self.observed.lock().await.push((envelope.uuid, stored));
        Ok(())
    }
}

struct FailingBus;

#[async_trait]
impl MessageBus for FailingBus {
    async fn publish(&self, _channel: Channel, _payload: Vec<u8>) -> anyhow::Result<()> {
        anyhow::bail!("no responders available")
    }
}

/// Store that refuses every insert.
struct ReadOnlyMessages;

#[async_trait]
impl MessageRepository for ReadOnlyMessages {
    async fn insert(&self, _message: NewMessage) -> anyhow::Result<Message> {
        anyhow::bail!("cannot execute INSERT in a read-only transaction")
    }

    async fn ensure(&self, _message: NewMessage) -> anyhow::Result<(Message, bool)> {
        anyhow::bail!("cannot execute INSERT in a read-only transaction")
    }

    async fn get(&self, _uuid: Uuid) -> anyhow::Result<Option<Message>> {
        Ok(None)
    }

    async fn update_status(&self, _uuid: Uuid, _status: MessageStatus) -> anyhow::Result<()> {
        Ok(())
    }

    async fn append_event(&self, _event: NewMessageEvent) -> anyhow::Result<MessageEvent> {
        anyhow::bail!("cannot execute INSERT in a read-only transaction")
    }

    async fn list_events(&self, _uuid: Uuid) -> anyhow::Result<Vec<MessageEvent>> {
        Ok(Vec::new())
    }
}

async fn sample() -> Vec<WhatsAppMessage> {
    let harness = Harness::new(ScriptedVendor::healthy());
    let (template, provider) = harness
        .seed(Channel::WhatsApp, "Hi", serde_json::json!({ "twilio": "HX1" }))
        .await;
    let mut first = whatsapp(&template, &provider, &["+15550001"]);
    first.refno = "REF-A".into();
    let mut second = whatsapp(&template, &provider, &["+15550002"]);
    second.refno = "REF-B".into();
    vec![first, second]
}

#[tokio::test]
async fn row_exists_before_the_envelope_is_published() {
    let messages = InMemoryMessageRepository::new();
    let bus = Arc::new(OrderCheckingBus {
        messages: messages.clone(),
        observed: Mutex::default(),
    });
    let producer = ProduceMessageUseCase::new(Arc::new(messages.clone()), bus.clone());

    let produced = producer.execute_batch(sample().await).await.unwrap();

    let refnos: Vec<_> = produced.iter().map(|p| p.refno.as_str()).collect();
    assert_eq!(refnos, vec!["REF-A", "REF-B"], "input order is kept");

    let observed = bus.observed.lock().await.clone();
    assert_eq!(observed.len(), 2);
    for ((uuid, stored), response) in observed.iter().zip(&produced) {
        assert_eq!(*uuid, response.uuid);
        assert!(stored, "row for {uuid} was missing at publish time");
    }

    let stored = messages.get(produced[0].uuid).await.unwrap().unwrap();
    assert_eq!(stored.status, MessageStatus::Accepted);
    assert_eq!(stored.channel, Channel::WhatsApp);
    assert_eq!(stored.identifiers.tenant, common::TENANT);
}

#[tokio::test]
async fn failed_insert_publishes_nothing() {
    let bus = InMemoryBus::new();
    let producer = ProduceMessageUseCase::new(Arc::new(ReadOnlyMessages), Arc::new(bus.clone()));

    let mut messages = sample().await;
    let err = producer.execute(messages.remove(0)).await.err().unwrap();

    assert!(matches!(err, DomainError::Infrastructure(_)));
    assert_eq!(bus.pending(Channel::WhatsApp).await, 0);
}

#[tokio::test]
async fn failed_publish_is_reported_and_leaves_the_row_accepted() {
    let messages = InMemoryMessageRepository::new();
    let producer = ProduceMessageUseCase::new(Arc::new(messages.clone()), Arc::new(FailingBus));

    let mut batch = sample().await;
    let err = producer.execute(batch.remove(0)).await.err().unwrap();

    assert!(err.to_string().contains("no responders"));
    assert_eq!(messages.len().await, 1);
}

#[tokio::test]
async fn invalid_message_in_batch_produces_nothing() {
    let messages = InMemoryMessageRepository::new();
    let bus = InMemoryBus::new();
    let producer = ProduceMessageUseCase::new(Arc::new(messages.clone()), Arc::new(bus.clone()));

    let mut batch = sample().await;
    batch[1].categories.clear();
    let err = producer.execute_batch(batch).await.err().unwrap();

    match err {
        DomainError::Validation(reason) => {
            assert_eq!(reason, "messages[1]: at least one category is required")
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(messages.is_empty().await);
    assert_eq!(bus.pending(Channel::WhatsApp).await, 0);
}

#[tokio::test]
async fn published_envelope_carries_the_message_body() {
    let messages = InMemoryMessageRepository::new();
    let bus = InMemoryBus::new();
    let producer = ProduceMessageUseCase::new(Arc::new(messages), Arc::new(bus.clone()));

    let mut batch = sample().await;
    let response = producer.execute(batch.remove(0)).await.unwrap();

    let raw = bus.pop(Channel::WhatsApp).await.unwrap();
    let envelope: Envelope<WhatsAppMessage> = serde_json::from_slice(&raw).unwrap();
    assert_eq!(envelope.uuid, response.uuid);
    assert_eq!(envelope.message.refno, "REF-A");
    assert_eq!(envelope.message.to[0].telephone, "+15550001");
}
