use std::collections::HashMap;

use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::domain::{errors::DomainError, models::Identifiers};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Channel {
    #[serde(rename = "WHATSAPP")]
    WhatsApp,
    #[serde(rename = "SMS")]
    Sms,
    #[serde(rename = "EMAIL")]
    Email,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::WhatsApp, Channel::Sms, Channel::Email];

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::WhatsApp => "WHATSAPP",
            Channel::Sms => "SMS",
            Channel::Email => "EMAIL",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value.to_ascii_uppercase().as_str() {
            "WHATSAPP" => Some(Channel::WhatsApp),
            "SMS" => Some(Channel::Sms),
            "EMAIL" => Some(Channel::Email),
            _ => None,
        }
    }

    /// Human-facing name used in log lines and rejection reasons.
    pub fn label(&self) -> &'static str {
        match self {
            Channel::WhatsApp => "WhatsApp",
            Channel::Sms => "SMS",
            Channel::Email => "Email",
        }
    }

    /// Topic suffix used on the broker, one per channel.
    pub fn topic(&self) -> &'static str {
        match self {
            Channel::WhatsApp => "whatsapp",
            Channel::Sms => "sms",
            Channel::Email => "email",
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Common view over the channel-specific request shapes carried in an envelope.
pub trait ChannelMessage: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const CHANNEL: Channel;

    fn template(&self) -> &str;
    fn provider(&self) -> &str;
    fn refno(&self) -> &str;
    fn categories(&self) -> &[String];
    fn identifiers(&self) -> &Identifiers;
    fn params(&self) -> &HashMap<String, String>;
    fn recipient_count(&self) -> usize;

    fn tenant(&self) -> &str {
        &self.identifiers().tenant
    }

    fn validate(&self) -> Result<(), DomainError> {
        validate_common(self)
    }
}

/// Presence checks shared by every channel.
pub fn validate_common<M: ChannelMessage + ?Sized>(message: &M) -> Result<(), DomainError> {
    if message.template().trim().is_empty() {
        return Err(DomainError::Validation("template is required".into()));
    }
    if message.recipient_count() == 0 {
        return Err(DomainError::Validation(
            "at least one recipient is required".into(),
        ));
    }
    if message.provider().trim().is_empty() {
        return Err(DomainError::Validation("provider is required".into()));
    }
    if message.refno().trim().is_empty() {
        return Err(DomainError::Validation("refno is required".into()));
    }
    if message.categories().is_empty() {
        return Err(DomainError::Validation(
            "at least one category is required".into(),
        ));
    }
    if message.tenant().trim().is_empty() {
        return Err(DomainError::Validation(
            "tenant identifier is required".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_round_trips_through_wire_names() {
        for channel in Channel::ALL {
            let json = serde_json::to_string(&channel).unwrap();
            assert_eq!(json, format!("\"{}\"", channel.as_str()));
            assert_eq!(Channel::from_str(channel.as_str()), Some(channel));
        }
        assert_eq!(Channel::from_str("whatsapp"), Some(Channel::WhatsApp));
        assert_eq!(Channel::from_str("fax"), None);
    }
}
