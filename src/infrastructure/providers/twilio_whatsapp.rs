use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use reqwest::Client;
use tracing::warn;

use super::twilio::{TwilioAccount, with_prefix};
use crate::{
    application::services::{channels::WhatsAppClient, secure_config::SecureConfigCodec},
    domain::{
        errors::DomainError,
        models::{DeliveryStatus, Provider},
    },
};

const SCHEME: &str = "whatsapp:";

pub struct TwilioWhatsApp {
    account: TwilioAccount,
    from: String,
}

impl TwilioWhatsApp {
    pub fn from_provider(
        provider: &Provider,
        codec: &SecureConfigCodec,
        http: Client,
    ) -> Result<Self, DomainError> {
        let (account, from) = TwilioAccount::from_provider(provider, codec, http)?;
        Ok(Self {
            account,
            from: with_prefix(&from, SCHEME),
        })
    }
}

/// `ContentVariables` for a Twilio content template, `{}` when empty.
fn content_variables(params: &HashMap<String, String>) -> Result<String, DomainError> {
    let ordered: BTreeMap<&String, &String> = params.iter().collect();
    serde_json::to_string(&ordered).map_err(|err| {
        DomainError::ProviderConfig(format!("failed to marshal template parameters: {err}"))
    })
}

#[async_trait]
impl WhatsAppClient for TwilioWhatsApp {
    async fn send_text(&self, to: &str, body: &str) -> Result<(), DomainError> {
        self.account
            .create_message(&[
                ("From", self.from.clone()),
                ("To", with_prefix(to, SCHEME)),
                ("Body", body.to_string()),
            ])
            .await
    }

    async fn send_media(
        &self,
        to: &str,
        media_url: &str,
        caption: &str,
    ) -> Result<(), DomainError> {
        let mut form = vec![
            ("From", self.from.clone()),
            ("To", with_prefix(to, SCHEME)),
        ];
        if !caption.is_empty() {
            form.push(("Body", caption.to_string()));
        }
        form.push(("MediaUrl", media_url.to_string()));
        self.account.create_message(&form).await
    }

    /// Twilio renders approved templates itself from `ContentVariables`, so
    /// the locally rendered body is not sent.
    async fn send_template(
        &self,
        to: &str,
        vendor_template_id: &str,
        params: &HashMap<String, String>,
        _rendered: &str,
    ) -> Result<(), DomainError> {
        if !vendor_template_id.starts_with("HX") {
            warn!(
                content_sid = %vendor_template_id,
                "ContentSid may not be a Twilio WhatsApp template id, these usually start with 'HX'"
            );
        }
        self.account
            .create_message(&[
                ("From", self.from.clone()),
                ("To", with_prefix(to, SCHEME)),
                ("ContentSid", vendor_template_id.to_string()),
                ("ContentVariables", content_variables(params)?),
            ])
            .await
    }

    async fn get_status(&self, message_id: &str) -> Result<DeliveryStatus, DomainError> {
        self.account.fetch_status(message_id).await
    }
}
