use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{
    channel::{Channel, ChannelMessage},
    message::Identifiers,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmsMessage {
    pub template: String,
    pub to: Vec<SmsRecipient>,
    pub provider: String,
    pub refno: String,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub identifiers: Identifiers,
    #[serde(default)]
    pub params: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmsRecipient {
    pub telephone: String,
}

impl ChannelMessage for SmsMessage {
    const CHANNEL: Channel = Channel::Sms;

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
