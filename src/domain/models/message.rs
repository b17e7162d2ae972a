use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::channel::Channel;

/// Lifecycle of a message and of each audit event recorded for it.
///
/// `Delivered` and `Read` are only written by delivery-receipt collaborators.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum MessageStatus {
    Accepted,
    Sent,
    Delivered,
    Read,
    Rejected,
}

impl MessageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageStatus::Accepted => "ACCEPTED",
            MessageStatus::Sent => "SENT",
            MessageStatus::Delivered => "DELIVERED",
            MessageStatus::Read => "READ",
            MessageStatus::Rejected => "REJECTED",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "ACCEPTED" => Some(MessageStatus::Accepted),
            "SENT" => Some(MessageStatus::Sent),
            "DELIVERED" => Some(MessageStatus::Delivered),
            "READ" => Some(MessageStatus::Read),
            "REJECTED" => Some(MessageStatus::Rejected),
            _ => None,
        }
    }
}

/// Caller-supplied correlation keys. Unknown keys are preserved as-is.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Identifiers {
    #[serde(default)]
    pub tenant: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_code: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub uuid: Uuid,
    pub channel: Channel,
    pub identifiers: Identifiers,
    pub categories: Vec<String>,
    pub refno: String,
    pub status: MessageStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row to be written for a freshly accepted batch request.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub uuid: Uuid,
    pub channel: Channel,
    pub identifiers: Identifiers,
    pub categories: Vec<String>,
    pub refno: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_keep_unknown_keys() {
        let raw = r#"{"tenant":"acme","eventId":"e-1","actionCode":"WELCOME","region":"eu"}"#;
        let identifiers: Identifiers = serde_json::from_str(raw).unwrap();

        assert_eq!(identifiers.tenant, "acme");
        assert_eq!(identifiers.event_id.as_deref(), Some("e-1"));
        assert_eq!(identifiers.action_id, None);
        assert_eq!(identifiers.extra.get("region"), Some(&Value::from("eu")));

        let back = serde_json::to_value(&identifiers).unwrap();
        assert_eq!(back["region"], "eu");
        assert_eq!(back["actionCode"], "WELCOME");
    }

    #[test]
    fn status_parses_only_wire_names() {
        for status in [
            MessageStatus::Accepted,
            MessageStatus::Sent,
            MessageStatus::Delivered,
            MessageStatus::Read,
            MessageStatus::Rejected,
        ] {
            assert_eq!(MessageStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(MessageStatus::from_str("SENT"), Some(MessageStatus::Sent));
        assert_eq!(MessageStatus::from_str("sent"), None);
    }
}
