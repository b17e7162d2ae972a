use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{
    channel::{Channel, ChannelMessage, validate_common},
    message::Identifiers,
};
use crate::domain::errors::DomainError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailMessage {
    pub template: String,
    pub to: Vec<EmailRecipient>,
    pub provider: String,
    pub refno: String,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub identifiers: Identifiers,
    #[serde(default)]
    pub params: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<AttachmentMetadata>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailRecipient {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub email: String,
}

/// Attachment as carried on the wire; `content` is base64.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentMetadata {
    pub filename: String,
    pub content_type: String,
    pub content: String,
}

impl ChannelMessage for EmailMessage {
    const CHANNEL: Channel = Channel::Email;

    fn template(&self) -> &str {
        &self.template
    }

    fn provider(&self) -> &str {
        &self.provider
    }

    fn refno(&self) -> &str {
        &self.refno
    }

    fn categories(&self) -> &[String] {
        &self.categories
    }

    fn identifiers(&self) -> &Identifiers {
        &self.identifiers
    }

    fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    fn recipient_count(&self) -> usize {
        self.to.len()
    }

    fn validate(&self) -> Result<(), DomainError> {
        validate_common(self)?;
        if self.to.iter().any(|r| r.email.trim().is_empty()) {
            return Err(DomainError::Validation(
                "every recipient needs an email address".into(),
            ));
        }
        Ok(())
    }
}
