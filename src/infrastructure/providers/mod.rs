//! Vendor adapters behind the channel capability traits.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{
    application::services::secure_config::SecureConfigCodec,
    domain::errors::DomainError,
};

pub mod factory;
pub mod sendgrid;
pub mod twilio;
pub mod twilio_sms;
pub mod twilio_whatsapp;

pub fn http_client(timeout: Duration) -> anyhow::Result<Client> {
    Ok(Client::builder()
        .user_agent("delivery-service")
        .timeout(timeout)
        .build()?)
}

/// Keeps just enough of a credential to tell two apart in logs.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() > 8 {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}...{tail}")
    } else if chars.len() > 4 {
        let tail: String = chars[chars.len() - 2..].iter().collect();
        format!("****{tail}")
    } else {
        "****".to_string()
    }
}

pub(crate) fn parse_config<T: DeserializeOwned>(config: &Value) -> Result<T, DomainError> {
    serde_json::from_value(config.clone())
        .map_err(|err| DomainError::ProviderConfig(format!("failed to parse provider config: {err}")))
}

pub(crate) fn open_secrets<T: DeserializeOwned>(
    codec: &SecureConfigCodec,
    secure_config: &Value,
) -> Result<T, DomainError> {
    codec.open_json(secure_config).map_err(|err| {
        DomainError::ProviderConfig(format!("failed to decrypt provider secure config: {err}"))
    })
}

pub(crate) fn require(value: &str, what: &str) -> Result<(), DomainError> {
    if value.trim().is_empty() {
        return Err(DomainError::ProviderConfig(format!(
            "{what} not set in provider configuration"
        )));
    }
    Ok(())
}

pub(crate) fn transport_error(vendor: &str, err: reqwest::Error) -> DomainError {
    DomainError::ProviderCall {
        status: err.status().map_or(0, |status| status.as_u16()),
        message: format!("{vendor} request failed: {err}"),
    }
}

pub(crate) fn call_error(vendor: &str, status: StatusCode, body: &str) -> DomainError {
    DomainError::ProviderCall {
        status: status.as_u16(),
        message: format!("{vendor} API error: {body}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_secrets_by_length() {
        assert_eq!(mask_secret("SG.abcdefghijkl"), "SG.a...ijkl");
        assert_eq!(mask_secret("abcdef"), "****ef");
        assert_eq!(mask_secret("abc"), "****");
    }

    #[test]
    fn call_errors_keep_status_and_body() {
        let err = call_error("twilio", StatusCode::BAD_REQUEST, "{\"code\":21211}");
        assert_eq!(
            err.to_string(),
            "twilio API error: {\"code\":21211}, status code: 400"
        );
    }

    #[test]
    fn blank_required_values_are_config_errors() {
        assert!(require("AC123", "account SID").is_ok());
        let err = require("  ", "account SID").unwrap_err();
        assert_eq!(err.to_string(), "account SID not set in provider configuration");
    }
}
