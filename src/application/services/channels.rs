use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{
    errors::DomainError,
    models::{Channel, DeliveryStatus, Provider},
};

/// Decoded email attachment ready to hand to a vendor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub content_type: String,
    pub content: Vec<u8>,
}

#[async_trait]
pub trait WhatsAppClient: Send + Sync {
    async fn send_text(&self, to: &str, body: &str) -> Result<(), DomainError>;

    async fn send_media(&self, to: &str, media_url: &str, caption: &str)
    -> Result<(), DomainError>;

    /// Sends a vendor-side approved template. `rendered` is the locally
    /// rendered body, kept for vendors that accept free text as a fallback.
    async fn send_template(
        &self,
        to: &str,
        vendor_template_id: &str,
        params: &HashMap<String, String>,
        rendered: &str,
    ) -> Result<(), DomainError>;

    async fn get_status(&self, message_id: &str) -> Result<DeliveryStatus, DomainError>;
}

#[async_trait]
pub trait SmsClient: Send + Sync {
    async fn send(&self, to: &str, body: &str) -> Result<(), DomainError>;

    /// Sends the same body to every number; the last failure wins.
    async fn send_bulk(&self, to: &[String], body: &str) -> Result<(), DomainError>;

    async fn send_template(
        &self,
        to: &str,
        vendor_template_id: &str,
        params: &HashMap<String, String>,
        rendered: &str,
    ) -> Result<(), DomainError>;

    async fn get_status(&self, message_id: &str) -> Result<DeliveryStatus, DomainError>;
}

#[async_trait]
pub trait EmailClient: Send + Sync {
    async fn send(
        &self,
        to: &[String],
        subject: &str,
        body: &str,
        is_html: bool,
    ) -> Result<(), DomainError>;

    async fn send_with_attachments(
        &self,
        to: &[String],
        subject: &str,
        body: &str,
        is_html: bool,
        attachments: &[Attachment],
    ) -> Result<(), DomainError>;

    async fn get_status(&self, message_id: &str) -> Result<DeliveryStatus, DomainError>;
}

/// Concrete adapter built for one provider record, tagged by capability.
#[derive(Clone)]
pub enum ChannelAdapter {
    WhatsApp(Arc<dyn WhatsAppClient>),
    Sms(Arc<dyn SmsClient>),
    Email(Arc<dyn EmailClient>),
}

impl ChannelAdapter {
    pub fn channel(&self) -> Channel {
        match self {
            ChannelAdapter::WhatsApp(_) => Channel::WhatsApp,
            ChannelAdapter::Sms(_) => Channel::Sms,
            ChannelAdapter::Email(_) => Channel::Email,
        }
    }

    pub fn into_whatsapp(self) -> Option<Arc<dyn WhatsAppClient>> {
        match self {
            ChannelAdapter::WhatsApp(client) => Some(client),
            _ => None,
        }
    }

    pub fn into_sms(self) -> Option<Arc<dyn SmsClient>> {
        match self {
            ChannelAdapter::Sms(client) => Some(client),
            _ => None,
        }
    }

    pub fn into_email(self) -> Option<Arc<dyn EmailClient>> {
        match self {
            ChannelAdapter::Email(client) => Some(client),
            _ => None,
        }
    }
}

/// Builds the adapter for a provider record, resolving its secrets.
pub trait ProviderFactory: Send + Sync {
    fn create(&self, provider: &Provider) -> Result<ChannelAdapter, DomainError>;
}
