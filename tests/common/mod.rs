#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use delivery::{
    application::{
        handlers::delivery::DeliveryPipeline,
        services::channels::{
            Attachment, ChannelAdapter, EmailClient, ProviderFactory, SmsClient, WhatsAppClient,
        },
    },
    domain::{
        errors::DomainError,
        events::Envelope,
        models::{
            Channel, DeliveryStatus, EmailMessage, Identifiers, MessageEvent, MessageStatus,
            Provider, RecordStatus, SmsMessage, Template, WhatsAppMessage,
        },
    },
    infrastructure::repositories::in_memory::{
        InMemoryMessageRepository, InMemoryProviderRepository, InMemoryTemplateRepository,
    },
};
use serde_json::{Value, json};
use tokio::sync::Mutex;
use uuid::Uuid;

pub const TENANT: &str = "acme";

/// One outbound call as seen by a fake vendor.
#[derive(Debug, Clone, PartialEq)]
pub struct SentCall {
    pub to: String,
    pub vendor_template_id: String,
    pub body: String,
    pub subject: Option<String>,
    pub attachments: usize,
}

/// Vendor double that fails for a fixed set of recipients.
#[derive(Default)]
pub struct ScriptedVendor {
    failing: HashSet<String>,
    calls: Mutex<Vec<SentCall>>,
}

impl ScriptedVendor {
    pub fn failing_for(recipients: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            failing: recipients.iter().map(|r| r.to_string()).collect(),
            calls: Mutex::default(),
        })
    }

    pub fn healthy() -> Arc<Self> {
        Self::failing_for(&[])
    }

    pub async fn calls(&self) -> Vec<SentCall> {
        self.calls.lock().await.clone()
    }

    async fn attempt(&self, call: SentCall) -> Result<(), DomainError> {
        let failing = self.failing.contains(&call.to);
        self.calls.lock().await.push(call);
        if failing {
            Err(DomainError::ProviderCall {
                status: 400,
                message: "fake API error: unreachable handset".into(),
            })
        } else {
            Ok(())
        }
    }

    fn status(message_id: &str) -> DeliveryStatus {
        DeliveryStatus {
            message_id: message_id.to_string(),
            status: "delivered".into(),
            details: String::new(),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

#[async_trait]
impl WhatsAppClient for ScriptedVendor {
    async fn send_text(&self, to: &str, body: &str) -> Result<(), DomainError> {
        self.attempt(SentCall {
            to: to.into(),
            vendor_template_id: String::new(),
            body: body.into(),
            subject: None,
            attachments: 0,
        })
        .await
    }

    async fn send_media(&self, to: &str, _media_url: &str, caption: &str) -> Result<(), DomainError> {
        self.attempt(SentCall {
            to: to.into(),
            vendor_template_id: String::new(),
            body: caption.into(),
            subject: None,
            attachments: 1,
        })
        .await
    }

    async fn send_template(
        &self,
        to: &str,
        vendor_template_id: &str,
        _params: &HashMap<String, String>,
        rendered: &str,
    ) -> Result<(), DomainError> {
        self.attempt(SentCall {
            to: to.into(),
            vendor_template_id: vendor_template_id.into(),
            body: rendered.into(),
            subject: None,
            attachments: 0,
        })
        .await
    }

    async fn get_status(&self, message_id: &str) -> Result<DeliveryStatus, DomainError> {
        Ok(Self::status(message_id))
    }
}

#[async_trait]
impl SmsClient for ScriptedVendor {
    async fn send(&self, to: &str, body: &str) -> Result<(), DomainError> {
        WhatsAppClient::send_text(self, to, body).await
    }

    async fn send_bulk(&self, to: &[String], body: &str) -> Result<(), DomainError> {
        let mut last = Ok(());
        for number in to {
            if let Err(err) = SmsClient::send(self, number, body).await {
                last = Err(err);
            }
        }
        last
    }

    async fn send_template(
        &self,
        to: &str,
        vendor_template_id: &str,
        params: &HashMap<String, String>,
        rendered: &str,
    ) -> Result<(), DomainError> {
        WhatsAppClient::send_template(self, to, vendor_template_id, params, rendered).await
    }

    async fn get_status(&self, message_id: &str) -> Result<DeliveryStatus, DomainError> {
        Ok(Self::status(message_id))
    }
}

#[async_trait]
impl EmailClient for ScriptedVendor {
    async fn send(
        &self,
        to: &[String],
        subject: &str,
        body: &str,
        _is_html: bool,
    ) -> Result<(), DomainError> {
        self.send_with_attachments(to, subject, body, true, &[]).await
    }

    async fn send_with_attachments(
        &self,
        to: &[String],
        subject: &str,
        body: &str,
        _is_html: bool,
        attachments: &[Attachment],
    ) -> Result<(), DomainError> {
        self.attempt(SentCall {
            to: to.join(","),
            vendor_template_id: String::new(),
            body: body.into(),
            subject: Some(subject.into()),
            attachments: attachments.len(),
        })
        .await
    }

    async fn get_status(&self, message_id: &str) -> Result<DeliveryStatus, DomainError> {
        Ok(Self::status(message_id))
    }
}

/// Hands out the same scripted vendor for every provider of its channel.
pub struct FakeFactory {
    pub vendor: Arc<ScriptedVendor>,
    pub broken: bool,
}

impl ProviderFactory for FakeFactory {
    fn create(&self, provider: &Provider) -> Result<ChannelAdapter, DomainError> {
        if self.broken {
            return Err(DomainError::ProviderConfig(
                "auth token not set in provider configuration".into(),
            ));
        }
        Ok(match provider.channel {
            Channel::WhatsApp => ChannelAdapter::WhatsApp(self.vendor.clone()),
            Channel::Sms => ChannelAdapter::Sms(self.vendor.clone()),
            Channel::Email => ChannelAdapter::Email(self.vendor.clone()),
        })
    }
}

pub struct Harness {
    pub messages: InMemoryMessageRepository,
    pub templates: InMemoryTemplateRepository,
    pub providers: InMemoryProviderRepository,
    pub vendor: Arc<ScriptedVendor>,
    pub pipeline: Arc<DeliveryPipeline>,
}

impl Harness {
    pub fn new(vendor: Arc<ScriptedVendor>) -> Self {
        Self::build(vendor, false)
    }

    pub fn with_broken_factory() -> Self {
        Self::build(ScriptedVendor::healthy(), true)
    }

    fn build(vendor: Arc<ScriptedVendor>, broken: bool) -> Self {
        let messages = InMemoryMessageRepository::new();
        let templates = InMemoryTemplateRepository::new();
        let providers = InMemoryProviderRepository::new();
        let pipeline = Arc::new(DeliveryPipeline::new(
            Arc::new(messages.clone()),
            Arc::new(templates.clone()),
            Arc::new(providers.clone()),
            Arc::new(FakeFactory {
                vendor: vendor.clone(),
                broken,
            }),
        ));
        Self {
            messages,
            templates,
            providers,
            vendor,
            pipeline,
        }
    }

    /// Seeds an active template and a TWILIO provider for `channel`.
    pub async fn seed(&self, channel: Channel, content: &str, template_ids: Value) -> (Template, Provider) {
        let template = template(channel, content, template_ids);
        let provider = provider(channel, "TWILIO");
        self.templates.put(template.clone()).await;
        self.providers.put(provider.clone()).await;
        (template, provider)
    }

    pub async fn status(&self, uuid: Uuid) -> Option<MessageStatus> {
        use delivery::domain::repositories::MessageRepository;
        self.messages.get(uuid).await.ok().flatten().map(|m| m.status)
    }

    pub async fn events(&self, uuid: Uuid) -> Vec<MessageEvent> {
        use delivery::domain::repositories::MessageRepository;
        self.messages.list_events(uuid).await.unwrap_or_default()
    }
}

pub fn template(channel: Channel, content: &str, template_ids: Value) -> Template {
    Template {
        uuid: Uuid::new_v4(),
        code: "WELCOME".into(),
        name: "Welcome aboard".into(),
        subject: None,
        content: content.into(),
        status: RecordStatus::Active,
        channel,
        template_ids: template_ids.as_object().cloned().unwrap_or_default(),
        tenant: TENANT.into(),
    }
}

pub fn provider(channel: Channel, implementation: &str) -> Provider {
    Provider {
        uuid: Uuid::new_v4(),
        code: "primary".into(),
        provider: implementation.into(),
        name: format!("{implementation} {}", channel.label()),
        config: json!({}),
        secure_config: json!({}),
        status: RecordStatus::Active,
        channel,
        tenant: TENANT.into(),
    }
}

pub fn identifiers() -> Identifiers {
    Identifiers {
        tenant: TENANT.into(),
        ..Identifiers::default()
    }
}

pub fn whatsapp(template: &Template, provider: &Provider, phones: &[&str]) -> WhatsAppMessage {
    serde_json::from_value(json!({
        "template": template.uuid.to_string(),
        "to": phones.iter().map(|p| json!({ "name": "Jane", "telephone": p })).collect::<Vec<_>>(),
        "provider": provider.uuid.to_string(),
        "refno": "REF-WA-1",
        "categories": ["onboarding"],
        "identifiers": identifiers(),
        "params": { "name": "Jane" },
    }))
    .expect("valid whatsapp message")
}

pub fn sms(template: &Template, provider: &Provider, phones: &[&str]) -> SmsMessage {
    serde_json::from_value(json!({
        "template": template.uuid.to_string(),
        "to": phones.iter().map(|p| json!({ "telephone": p })).collect::<Vec<_>>(),
        "provider": provider.uuid.to_string(),
        "refno": "REF-SMS-1",
        "categories": ["auth"],
        "identifiers": identifiers(),
        "params": { "code": "4711" },
    }))
    .expect("valid sms message")
}

pub fn email(template: &Template, provider: &Provider, addresses: &[&str]) -> EmailMessage {
    serde_json::from_value(json!({
        "template": template.uuid.to_string(),
        "to": addresses.iter().map(|a| json!({ "email": a })).collect::<Vec<_>>(),
        "provider": provider.uuid.to_string(),
        "refno": "REF-MAIL-1",
        "categories": ["billing"],
        "identifiers": identifiers(),
        "params": { "name": "Jane" },
    }))
    .expect("valid email message")
}

pub fn payload<M: serde::Serialize>(uuid: Uuid, message: M) -> Vec<u8> {
    serde_json::to_vec(&Envelope::new(uuid, message)).expect("serializable envelope")
}
