use poem_openapi::Object;
use serde_json::Value;
use uuid::Uuid;

use crate::presentation::models::{ChannelKind, MessageStatusDto};

#[derive(Object, Debug)]
pub struct ProduceResultDto {
    pub refno: String,
    pub uuid: Uuid,
}

#[derive(Object)]
#[oai(rename_all = "camelCase")]
pub struct MessageDto {
    pub uuid: Uuid,
    pub channel: ChannelKind,
    pub refno: String,
    pub status: MessageStatusDto,
    pub categories: Vec<String>,
    pub identifiers: Value,
    pub created_at: String,
    pub updated_at: String,
    pub events: Vec<MessageEventDto>,
}

#[derive(Object)]
#[oai(rename_all = "camelCase")]
pub struct MessageEventDto {
    pub uuid: Uuid,
    pub status: MessageStatusDto,
    pub reason: Option<String>,
    pub metadata: Option<Value>,
    pub timestamp: String,
}

#[derive(Object)]
pub struct HealthDto {
    pub status: String,
    pub version: String,
}
