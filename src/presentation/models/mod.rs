use poem_openapi::Enum;

use crate::domain::models::{Channel, MessageStatus};

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
pub enum ChannelKind {
    #[oai(rename = "WHATSAPP")]
    WhatsApp,
    #[oai(rename = "SMS")]
    Sms,
    #[oai(rename = "EMAIL")]
    Email,
}

impl From<Channel> for ChannelKind {
    fn from(value: Channel) -> Self {
        match value {
            Channel::WhatsApp => ChannelKind::WhatsApp,
            Channel::Sms => ChannelKind::Sms,
            Channel::Email => ChannelKind::Email,
        }
    }
}

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
pub enum MessageStatusDto {
    #[oai(rename = "ACCEPTED")]
    Accepted,
    #[oai(rename = "SENT")]
    Sent,
    #[oai(rename = "DELIVERED")]
    Delivered,
    #[oai(rename = "READ")]
    Read,
    #[oai(rename = "REJECTED")]
    Rejected,
}

impl From<MessageStatus> for MessageStatusDto {
    fn from(value: MessageStatus) -> Self {
        match value {
            MessageStatus::Accepted => MessageStatusDto::Accepted,
            MessageStatus::Sent => MessageStatusDto::Sent,
            MessageStatus::Delivered => MessageStatusDto::Delivered,
            MessageStatus::Read => MessageStatusDto::Read,
            MessageStatus::Rejected => MessageStatusDto::Rejected,
        }
    }
}
