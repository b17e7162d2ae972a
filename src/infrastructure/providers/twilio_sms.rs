use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::Client;
use tracing::warn;

use super::twilio::TwilioAccount;
use crate::{
    application::services::{channels::SmsClient, secure_config::SecureConfigCodec},
    domain::{
        errors::DomainError,
        models::{DeliveryStatus, Provider},
    },
};

pub struct TwilioSms {
    account: TwilioAccount,
    from: String,
}

impl TwilioSms {
    pub fn from_provider(
        provider: &Provider,
        codec: &SecureConfigCodec,
        http: Client,
    ) -> Result<Self, DomainError> {
        let (account, from) = TwilioAccount::from_provider(provider, codec, http)?;
        Ok(Self { account, from })
    }
}

#[async_trait]
impl SmsClient for TwilioSms {
    async fn send(&self, to: &str, body: &str) -> Result<(), DomainError> {
        self.account
            .create_message(&[
                ("From", self.from.clone()),
                ("To", to.to_string()),
                ("Body", body.to_string()),
            ])
            .await
    }

    async fn send_bulk(&self, to: &[String], body: &str) -> Result<(), DomainError> {
        let mut last_error = None;
        for number in to {
            if let Err(err) = self.send(number, body).await {
                warn!(recipient = %number, error = %err, "bulk sms recipient failed");
                last_error = Some(err);
            }
        }
        last_error.map_or(Ok(()), Err)
    }

    /// Plain SMS has no vendor-side templates; the rendered text is the body.
    async fn send_template(
        &self,
        to: &str,
        _vendor_template_id: &str,
        _params: &HashMap<String, String>,
        rendered: &str,
    ) -> Result<(), DomainError> {
        if rendered.is_empty() {
            return Err(DomainError::Render(
                "rendered content is empty, nothing to send".into(),
            ));
        }
        self.send(to, rendered).await
    }

    async fn get_status(&self, message_id: &str) -> Result<DeliveryStatus, DomainError> {
        self.account.fetch_status(message_id).await
    }
}
