use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::channel::Channel;
use crate::domain::errors::DomainError;

/// Activation flag shared by templates and providers; stored as 0/1.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RecordStatus {
    Inactive,
    Active,
}

impl RecordStatus {
    pub fn as_i16(&self) -> i16 {
        match self {
            RecordStatus::Inactive => 0,
            RecordStatus::Active => 1,
        }
    }

    pub fn from_i16(value: i16) -> Self {
        if value == 1 {
            RecordStatus::Active
        } else {
            RecordStatus::Inactive
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Template {
    pub uuid: Uuid,
    pub code: String,
    pub name: String,
    pub subject: Option<String>,
    pub content: String,
    pub status: RecordStatus,
    pub channel: Channel,
    /// Vendor implementation name (lower-case) to vendor-side template id.
    pub template_ids: Map<String, Value>,
    pub tenant: String,
}

impl Template {
    pub fn is_active(&self) -> bool {
        self.status == RecordStatus::Active
    }

    /// Looks up the vendor template id registered for `provider_name`.
    pub fn vendor_template_id(&self, provider_name: &str) -> Result<&str, DomainError> {
        let key = provider_name.to_lowercase();
        match self.template_ids.get(&key) {
            None => Err(DomainError::NotFound(format!(
                "template ID not found for provider {provider_name}"
            ))),
            Some(Value::String(id)) if !id.trim().is_empty() => Ok(id.as_str()),
            Some(_) => Err(DomainError::ProviderConfig(format!(
                "invalid template ID format for provider {provider_name}"
            ))),
        }
    }
}
