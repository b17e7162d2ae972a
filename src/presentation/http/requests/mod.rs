use std::collections::HashMap;

use poem_openapi::Object;
use serde_json::Value;

#[derive(Object, Debug)]
pub struct WhatsAppBatchRequestDto {
    pub messages: Vec<WhatsAppMessageDto>,
}

#[derive(Object, Debug)]
pub struct SmsBatchRequestDto {
    pub messages: Vec<SmsMessageDto>,
}

#[derive(Object, Debug)]
pub struct EmailBatchRequestDto {
    pub messages: Vec<EmailMessageDto>,
}

#[derive(Object, Debug)]
#[oai(rename_all = "camelCase")]
pub struct WhatsAppMessageDto {
    pub template: String,
    pub to: Vec<WhatsAppRecipientDto>,
    pub provider: String,
    pub refno: String,
    #[oai(default)]
    pub categories: Vec<String>,
    #[oai(default)]
    pub identifiers: HashMap<String, Value>,
    #[oai(default)]
    pub params: HashMap<String, String>,
    pub attachments: Option<WhatsAppAttachmentsDto>,
}

#[derive(Object, Debug)]
pub struct WhatsAppRecipientDto {
    #[oai(default)]
    pub name: String,
    pub telephone: String,
}

#[derive(Object, Debug)]
pub struct WhatsAppAttachmentsDto {
    #[oai(default)]
    pub inline: Vec<WhatsAppInlineAttachmentDto>,
}

#[derive(Object, Debug)]
#[oai(rename_all = "camelCase")]
pub struct WhatsAppInlineAttachmentDto {
    pub filename: String,
    #[oai(rename = "type")]
    pub media_type: String,
    pub content: String,
    #[oai(default)]
    pub content_id: String,
}

#[derive(Object, Debug)]
#[oai(rename_all = "camelCase")]
pub struct SmsMessageDto {
    pub template: String,
    pub to: Vec<SmsRecipientDto>,
    pub provider: String,
    pub refno: String,
    #[oai(default)]
    pub categories: Vec<String>,
    #[oai(default)]
    pub identifiers: HashMap<String, Value>,
    #[oai(default)]
    pub params: HashMap<String, String>,
}

#[derive(Object, Debug)]
pub struct SmsRecipientDto {
    pub telephone: String,
}

#[derive(Object, Debug)]
#[oai(rename_all = "camelCase")]
pub struct EmailMessageDto {
    pub template: String,
    pub to: Vec<EmailRecipientDto>,
    pub provider: String,
    pub refno: String,
    #[oai(default)]
    pub categories: Vec<String>,
    #[oai(default)]
    pub identifiers: HashMap<String, Value>,
    #[oai(default)]
    pub params: HashMap<String, String>,
    pub subject: Option<String>,
    #[oai(default)]
    pub attachments: Vec<EmailAttachmentDto>,
}

#[derive(Object, Debug)]
pub struct EmailRecipientDto {
    pub name: Option<String>,
    pub email: String,
}

#[derive(Object, Debug)]
#[oai(rename_all = "camelCase")]
pub struct EmailAttachmentDto {
    pub filename: String,
    pub content_type: String,
    /// Base64-encoded file content.
    pub content: String,
}
