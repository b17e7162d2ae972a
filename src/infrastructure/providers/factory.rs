use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use tracing::{debug, error};

use super::{http_client, sendgrid::SendGrid, twilio_sms::TwilioSms, twilio_whatsapp::TwilioWhatsApp};
use crate::{
    application::services::{
        channels::{ChannelAdapter, ProviderFactory},
        secure_config::SecureConfigCodec,
    },
    domain::{
        errors::DomainError,
        models::{Channel, Provider},
    },
};

/// Picks the vendor implementation from the provider's channel and its
/// case-insensitive implementation name.
pub struct VendorProviderFactory {
    codec: SecureConfigCodec,
    http: Client,
}

impl VendorProviderFactory {
    pub fn new(codec: SecureConfigCodec, timeout: Duration) -> anyhow::Result<Arc<Self>> {
        Ok(Arc::new(Self {
            codec,
            http: http_client(timeout)?,
        }))
    }
}

impl ProviderFactory for VendorProviderFactory {
    fn create(&self, provider: &Provider) -> Result<ChannelAdapter, DomainError> {
        debug!(
            provider_uuid = %provider.uuid,
            provider_code = %provider.code,
            provider = %provider.provider,
            channel = %provider.channel,
            "creating provider adapter"
        );

        let implementation = provider.provider.to_uppercase();
        let adapter = match (provider.channel, implementation.as_str()) {
            (Channel::WhatsApp, "TWILIO") => ChannelAdapter::WhatsApp(Arc::new(
                TwilioWhatsApp::from_provider(provider, &self.codec, self.http.clone())?,
            )),
            (Channel::Sms, "TWILIO") => ChannelAdapter::Sms(Arc::new(TwilioSms::from_provider(
                provider,
                &self.codec,
                self.http.clone(),
            )?)),
            (Channel::Email, "SENDGRID" | "TWILIO") => ChannelAdapter::Email(Arc::new(
                SendGrid::from_provider(provider, &self.codec, self.http.clone())?,
            )),
            (channel, _) => {
                let reason = format!(
                    "unsupported {} provider implementation: {}",
                    channel.label(),
                    provider.provider
                );
                error!(provider_uuid = %provider.uuid, "{reason}");
                return Err(DomainError::ProviderConfig(reason));
            }
        };
        Ok(adapter)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use uuid::Uuid;

    use super::*;
    use crate::{
        application::services::secure_config::EncryptionKey,
        domain::models::RecordStatus,
    };

    fn factory() -> Arc<VendorProviderFactory> {
        let codec = SecureConfigCodec::new(EncryptionKey::from_slice(&[3u8; 32]).unwrap());
        VendorProviderFactory::new(codec, Duration::from_secs(10)).unwrap()
    }

    fn provider(factory: &VendorProviderFactory, channel: Channel, implementation: &str) -> Provider {
        Provider {
            uuid: Uuid::new_v4(),
            code: "main".into(),
            provider: implementation.into(),
            name: implementation.into(),
            config: json!({
                "accountSid": "AC1",
                "fromNumber": "+15550100",
                "from": "noreply@acme.test",
                "baseUrl": "https://api.sendgrid.com",
            }),
            secure_config: factory
                .codec
                .seal_json(&json!({ "authToken": "tok_live_1", "apikey": "SG.key" }))
                .unwrap(),
            status: RecordStatus::Active,
            channel,
            tenant: "acme".into(),
        }
    }

    #[test]
    fn dispatches_on_channel_and_implementation() {
        let factory = factory();
        let cases = [
            (Channel::WhatsApp, "twilio", Channel::WhatsApp),
            (Channel::Sms, "Twilio", Channel::Sms),
            (Channel::Email, "sendgrid", Channel::Email),
            (Channel::Email, "TWILIO", Channel::Email),
        ];
        for (channel, implementation, expected) in cases {
            let adapter = factory
                .create(&provider(&factory, channel, implementation))
                .unwrap_or_else(|err| panic!("{implementation}: {err}"));
            assert_eq!(adapter.channel(), expected);
        }
    }

    #[test]
    fn unknown_implementation_is_an_error() {
        let factory = factory();
        let err = factory
            .create(&provider(&factory, Channel::Sms, "MessageBird"))
            .err()
            .unwrap();
        assert_eq!(
            err.to_string(),
            "unsupported SMS provider implementation: MessageBird"
        );
    }
}
