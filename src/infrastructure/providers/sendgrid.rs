use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, error, info};

use super::{call_error, mask_secret, open_secrets, parse_config, require, transport_error};
use crate::{
    application::services::{
        channels::{Attachment, EmailClient},
        secure_config::SecureConfigCodec,
    },
    domain::{
        errors::DomainError,
        models::{DeliveryStatus, Provider},
    },
};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendGridConfig {
    #[serde(default)]
    from: String,
    #[serde(default)]
    account_id: String,
    #[serde(default)]
    base_url: String,
}

#[derive(Debug, Default, Deserialize)]
struct SendGridSecrets {
    #[serde(default)]
    apikey: String,
}

#[derive(Debug, Default, Deserialize)]
struct SendGridErrorBody {
    #[serde(default)]
    errors: Vec<SendGridError>,
}

#[derive(Debug, Deserialize)]
struct SendGridError {
    #[serde(default)]
    message: String,
    #[serde(default)]
    field: Option<String>,
    #[serde(default)]
    help: Option<Value>,
}

pub struct SendGrid {
    http: Client,
    base_url: String,
    from: String,
    account_id: String,
    api_key: String,
}

impl SendGrid {
    pub fn from_provider(
        provider: &Provider,
        codec: &SecureConfigCodec,
        http: Client,
    ) -> Result<Self, DomainError> {
        let config: SendGridConfig = parse_config(&provider.config)?;
        let secrets: SendGridSecrets = open_secrets(codec, &provider.secure_config)?;

        require(&secrets.apikey, "API key")?;
        require(&config.from, "from email")?;
        require(&config.base_url, "base URL")?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            from: config.from,
            account_id: config.account_id,
            api_key: secrets.apikey.trim().to_string(),
        })
    }

    async fn post_mail(&self, payload: Value) -> Result<(), DomainError> {
        let endpoint = format!("{}/v3/mail/send", self.base_url);
        info!(
            endpoint = %endpoint,
            account_id = %self.account_id,
            api_key = %mask_secret(&self.api_key),
            recipients = recipient_count(&payload),
            subject = %payload["subject"].as_str().unwrap_or_default(),
            "sending sendgrid mail"
        );
        debug!(body = %redact(&payload.to_string(), &self.api_key), "sendgrid mail payload");

        let response = self
            .http
            .post(&endpoint)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|err| transport_error("sendgrid", err))?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if status.as_u16() >= 400 {
            if let Ok(parsed) = serde_json::from_str::<SendGridErrorBody>(&body) {
                for detail in &parsed.errors {
                    error!(
                        message = %detail.message,
                        field = ?detail.field,
                        help = ?detail.help,
                        "sendgrid rejected the request"
                    );
                }
            }
            return Err(call_error("sendgrid", status, &body));
        }

        debug!(status = status.as_u16(), "sendgrid accepted mail");
        Ok(())
    }
}

fn redact(text: &str, secret: &str) -> String {
    if secret.is_empty() {
        text.to_string()
    } else {
        text.replace(secret, "[REDACTED]")
    }
}

fn recipient_count(payload: &Value) -> usize {
    payload["personalizations"]
        .as_array()
        .map_or(0, |personalizations| {
            personalizations
                .iter()
                .map(|p| p["to"].as_array().map_or(0, Vec::len))
                .sum()
        })
}

fn mail_payload(
    from: &str,
    to: &[String],
    subject: &str,
    body: &str,
    is_html: bool,
    attachments: &[Attachment],
) -> Value {
    let content_type = if is_html { "text/html" } else { "text/plain" };
    let recipients: Vec<Value> = to.iter().map(|email| json!({ "email": email })).collect();

    let mut payload = json!({
        "personalizations": [{ "to": recipients }],
        "from": { "email": from },
        "subject": subject,
        "content": [{ "type": content_type, "value": body }],
    });
    if !attachments.is_empty() {
        payload["attachments"] = attachments
            .iter()
            .map(|attachment| {
                json!({
                    "content": BASE64.encode(&attachment.content),
                    "type": attachment.content_type,
                    "filename": attachment.filename,
                    "disposition": "attachment",
                })
            })
            .collect();
    }
    payload
}

#[async_trait]
impl EmailClient for SendGrid {
    async fn send(
        &self,
        to: &[String],
        subject: &str,
        body: &str,
        is_html: bool,
    ) -> Result<(), DomainError> {
        self.post_mail(mail_payload(&self.from, to, subject, body, is_html, &[]))
            .await
    }

    async fn send_with_attachments(
        &self,
        to: &[String],
        subject: &str,
        body: &str,
        is_html: bool,
        attachments: &[Attachment],
    ) -> Result<(), DomainError> {
        self.post_mail(mail_payload(&self.from, to, subject, body, is_html, attachments))
            .await
    }

    async fn get_status(&self, message_id: &str) -> Result<DeliveryStatus, DomainError> {
        Ok(DeliveryStatus {
            message_id: message_id.to_string(),
            status: "unknown".into(),
            details: "SendGrid provider does not support status retrieval by message ID".into(),
            timestamp: Utc::now().to_rfc3339(),
        })
    }
}
