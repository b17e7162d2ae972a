use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use uuid::Uuid;

use super::message::MessageStatus;

pub const CREATED_DURING_PROCESSING: &str =
    "Message created during processing due to missing record";

/// Append-only audit record attached to a message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageEvent {
    pub id: i64,
    pub uuid: Uuid,
    pub message_id: Uuid,
    pub status: MessageStatus,
    pub reason: Option<String>,
    pub metadata: Option<Value>,
    pub timestamp: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewMessageEvent {
    pub message_id: Uuid,
    pub status: MessageStatus,
    pub reason: Option<String>,
    pub metadata: Option<Value>,
}

impl NewMessageEvent {
    pub fn accepted(message_id: Uuid, reason: &str) -> Self {
        Self {
            message_id,
            status: MessageStatus::Accepted,
            reason: Some(reason.to_string()),
            metadata: None,
        }
    }

    pub fn sent(message_id: Uuid, recipient: &str) -> Self {
        Self {
            message_id,
            status: MessageStatus::Sent,
            reason: Some("Message sent successfully".to_string()),
            metadata: Some(json!({ "recipient": recipient })),
        }
    }

    pub fn rejected(message_id: Uuid, reason: impl Into<String>) -> Self {
        Self {
            message_id,
            status: MessageStatus::Rejected,
            reason: Some(reason.into()),
            metadata: None,
        }
    }

    pub fn rejected_for(message_id: Uuid, recipient: &str, reason: impl Into<String>) -> Self {
        Self {
            metadata: Some(json!({ "recipient": recipient })),
            ..Self::rejected(message_id, reason)
        }
    }
}
