use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{
    channel::{Channel, ChannelMessage},
    message::Identifiers,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhatsAppMessage {
    pub template: String,
    pub to: Vec<WhatsAppRecipient>,
    pub provider: String,
    pub refno: String,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub identifiers: Identifiers,
    #[serde(default)]
    pub params: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachments: Option<WhatsAppAttachments>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhatsAppRecipient {
    #[serde(default)]
    pub name: String,
    pub telephone: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WhatsAppAttachments {
    #[serde(default)]
    pub inline: Vec<WhatsAppInlineAttachment>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhatsAppInlineAttachment {
    pub filename: String,
    #[serde(rename = "type")]
    pub media_type: String,
    pub content: String,
    #[serde(default)]
    pub content_id: String,
}

impl ChannelMessage for WhatsAppMessage {
    const CHANNEL: Channel = Channel::WhatsApp;

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
}
