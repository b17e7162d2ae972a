//! Account-level Twilio plumbing shared by the WhatsApp and SMS adapters.

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error, info};

use super::{call_error, mask_secret, open_secrets, parse_config, require, transport_error};
use crate::{
    application::services::secure_config::SecureConfigCodec,
    domain::{
        errors::DomainError,
        models::{DeliveryStatus, Provider},
    },
};

pub const DEFAULT_BASE_URL: &str = "https://api.twilio.com/2010-04-01";

const INVALID_PARAMETER: i64 = 20422;

const PLACEHOLDER_TOKENS: [&str; 5] = [
    "your-auth-token-here",
    "your_auth_token_here",
    "your_auth_token",
    "your-auth-token",
    "auth_token_here",
];

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TwilioConfig {
    #[serde(default)]
    base_url: String,
    #[serde(default)]
    from_number: String,
    #[serde(default)]
    account_sid: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TwilioSecrets {
    #[serde(default)]
    auth_token: String,
}

#[derive(Debug, Deserialize)]
struct TwilioErrorBody {
    code: Option<i64>,
    #[serde(default)]
    message: String,
    #[serde(default)]
    more_info: String,
}

#[derive(Debug, Default, Deserialize)]
struct TwilioMessageResource {
    #[serde(default)]
    status: String,
    #[serde(default)]
    error_code: Value,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    date_updated: Option<String>,
}

pub struct TwilioAccount {
    http: Client,
    base_url: String,
    account_sid: String,
    auth_token: String,
    /// Provider implementation name, quoted back in error hints.
    provider_name: String,
}

impl TwilioAccount {
    /// Builds the account from a provider record and returns it together
    /// with the configured sender number.
    pub fn from_provider(
        provider: &Provider,
        codec: &SecureConfigCodec,
        http: Client,
    ) -> Result<(Self, String), DomainError> {
        let config: TwilioConfig = parse_config(&provider.config)?;
        let secrets: TwilioSecrets = open_secrets(codec, &provider.secure_config)?;

        require(&config.account_sid, "account SID")?;
        require(&secrets.auth_token, "auth token")?;
        if PLACEHOLDER_TOKENS
            .iter()
            .any(|placeholder| secrets.auth_token.contains(placeholder))
        {
            return Err(DomainError::ProviderConfig(
                "auth token contains placeholder value, please update with a real Twilio auth token"
                    .into(),
            ));
        }
        require(&config.from_number, "from number")?;

        let base_url = if config.base_url.trim().is_empty() {
            DEFAULT_BASE_URL.to_string()
        } else {
            config.base_url.trim_end_matches('/').to_string()
        };

        let account = Self {
            http,
            base_url,
            account_sid: config.account_sid,
            auth_token: secrets.auth_token.trim().to_string(),
            provider_name: provider.provider.clone(),
        };
        Ok((account, config.from_number))
    }

    fn messages_url(&self) -> String {
        format!("{}/Accounts/{}/Messages.json", self.base_url, self.account_sid)
    }

    pub async fn create_message(&self, form: &[(&str, String)]) -> Result<(), DomainError> {
        let endpoint = self.messages_url();
        info!(
            endpoint = %endpoint,
            account_sid = %self.account_sid,
            auth_token = %mask_secret(&self.auth_token),
            fields = ?form.iter().map(|(key, _)| *key).collect::<Vec<_>>(),
            "sending twilio message"
        );

        let response = self
            .http
            .post(&endpoint)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(form)
            .send()
            .await
            .map_err(|err| transport_error("twilio", err))?;

        let status = response.status();
        if status == StatusCode::OK || status == StatusCode::CREATED {
            debug!(status = status.as_u16(), "twilio accepted message");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        error!(status = status.as_u16(), body = %body, "twilio API returned an error response");
        Err(fold_error(status, &body, &self.provider_name))
    }

    pub async fn fetch_status(&self, message_id: &str) -> Result<DeliveryStatus, DomainError> {
        let endpoint = format!(
            "{}/Accounts/{}/Messages/{}.json",
            self.base_url, self.account_sid, message_id
        );
        let response = self
            .http
            .get(&endpoint)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .send()
            .await
            .map_err(|err| transport_error("twilio", err))?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if status != StatusCode::OK {
            return Err(call_error("twilio", status, &body));
        }

        let resource: TwilioMessageResource = serde_json::from_str(&body).map_err(|err| {
            DomainError::ProviderCall {
                status: status.as_u16(),
                message: format!("twilio returned an unreadable message resource: {err}"),
            }
        })?;
        Ok(delivery_status(message_id, resource))
    }
}

/// Folds a non-success Twilio response into one error value.
fn fold_error(status: StatusCode, body: &str, provider_name: &str) -> DomainError {
    match serde_json::from_str::<TwilioErrorBody>(body) {
        Ok(parsed) if parsed.code == Some(INVALID_PARAMETER) => DomainError::ProviderCall {
            status: status.as_u16(),
            message: format!(
                "twilio API invalid parameter error (code 20422) - likely an invalid template ID. \
                 Check that the template ID is correctly configured for provider '{provider_name}' \
                 and is a valid Twilio template ID. Response: {body}"
            ),
        },
        Ok(parsed) => {
            debug!(
                code = ?parsed.code,
                message = %parsed.message,
                more_info = %parsed.more_info,
                "twilio error details"
            );
            call_error("twilio", status, body)
        }
        Err(_) => call_error("twilio", status, body),
    }
}

fn delivery_status(message_id: &str, resource: TwilioMessageResource) -> DeliveryStatus {
    let error_code = match &resource.error_code {
        Value::Null => None,
        Value::String(code) if code.is_empty() => None,
        Value::String(code) => Some(code.clone()),
        other => Some(other.to_string()),
    };
    let details = error_code
        .map(|code| {
            format!(
                "Error code: {code}, Error message: {}",
                resource.error_message.unwrap_or_default()
            )
        })
        .unwrap_or_default();

    DeliveryStatus {
        message_id: message_id.to_string(),
        status: resource.status,
        details,
        timestamp: resource.date_updated.unwrap_or_default(),
    }
}

pub(crate) fn with_prefix(number: &str, prefix: &str) -> String {
    if number.starts_with(prefix) {
        number.to_string()
    } else {
        format!("{prefix}{number}")
    }
}
