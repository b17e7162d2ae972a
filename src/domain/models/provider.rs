use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::{channel::Channel, template::RecordStatus};

/// Tenant- and channel-scoped configuration of one vendor integration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provider {
    pub uuid: Uuid,
    pub code: String,
    /// Vendor implementation discriminator, e.g. `TWILIO`.
    pub provider: String,
    pub name: String,
    /// Plaintext settings: base URL, sender identity, account id.
    pub config: Value,
    /// `{"encrypted": "<base64>"}` produced by the secure config codec.
    pub secure_config: Value,
    pub status: RecordStatus,
    pub channel: Channel,
    pub tenant: String,
}

impl Provider {
    pub fn is_active(&self) -> bool {
        self.status == RecordStatus::Active
    }
}

/// Vendor-reported state of a single sent message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeliveryStatus {
    pub message_id: String,
    pub status: String,
    pub details: String,
    pub timestamp: String,
}
