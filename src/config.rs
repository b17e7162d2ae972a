use std::env::var;
use std::time::Duration;

use dotenvy::dotenv;
use thiserror::Error;

use crate::{
    application::services::secure_config::EncryptionKey,
    infrastructure::messaging::jetstream::JetstreamConfig,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} env param is not set")]
    Missing(&'static str),
    #[error("{name} env param is invalid: {value}")]
    Invalid { name: &'static str, value: String },
    #[error("ENCRYPTION_KEY must be exactly 32 bytes, got {0}")]
    InvalidEncryptionKey(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

pub struct Config {
    pub port: u16,
    pub scheme: String,
    pub host: String,
    pub database_url: String,
    pub database_reader_url: String,
    pub database_max_connections: u32,
    pub jetstream: JetstreamConfig,
    pub whatsapp_workers: usize,
    pub sms_workers: usize,
    pub email_workers: usize,
    pub encryption_key: EncryptionKey,
    pub vendor_timeout: Duration,
    pub log_format: LogFormat,
}

impl Config {
    pub fn try_parse() -> Result<Config, ConfigError> {
        let _ = dotenv();
        Self::from_lookup(|name| var(name).ok())
    }

    /// Builds the config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Config, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Lookup(lookup);

        let database_url = env.required("DATABASE_URL")?;
        let database_reader_url = env
            .optional("DATABASE_READER_URL")
            .unwrap_or_else(|| database_url.clone());

        let raw_key = env.required("ENCRYPTION_KEY")?;
        let encryption_key = EncryptionKey::from_slice(raw_key.as_bytes())
            .map_err(|_| ConfigError::InvalidEncryptionKey(raw_key.len()))?;

        let log_format = match env.optional("LOG_FORMAT").as_deref() {
            Some(format) if format.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Ok(Config {
            port: env.parsed_required("PORT")?,
            scheme: env.required("SCHEME")?,
            host: env.required("HOST")?,
            database_url,
            database_reader_url,
            database_max_connections: env.parsed("DATABASE_MAX_CONNECTIONS", 10)?,
            jetstream: JetstreamConfig {
                url: env
                    .optional("NATS_URL")
                    .unwrap_or_else(|| "nats://localhost:4222".into()),
                stream: env.optional("NATS_STREAM").unwrap_or_else(|| "DELIVERY".into()),
                subject_prefix: env
                    .optional("NATS_SUBJECT_PREFIX")
                    .unwrap_or_else(|| "delivery".into()),
                pull_batch: env.parsed("NATS_PULL_BATCH", 1)?,
                ack_wait_seconds: env.parsed("NATS_ACK_WAIT_SECONDS", 30)?,
                fetch_expires_seconds: env.parsed("NATS_FETCH_EXPIRES_SECONDS", 5)?,
                max_deliver: env.parsed("NATS_MAX_DELIVER", 5)?,
                nak_delay_seconds: env.parsed("NATS_NAK_DELAY_SECONDS", 5)?,
            },
            whatsapp_workers: env.parsed("WHATSAPP_WORKERS", 3)?,
            sms_workers: env.parsed("SMS_WORKERS", 3)?,
            email_workers: env.parsed("EMAIL_WORKERS", 1)?,
            encryption_key,
            vendor_timeout: Duration::from_secs(env.parsed("VENDOR_TIMEOUT_SECONDS", 10)?),
            log_format,
        })
    }
}

struct Lookup<F>(F);

impl<F> Lookup<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn optional(&self, name: &str) -> Option<String> {
        (self.0)(name).filter(|value| !value.trim().is_empty())
    }

    fn required(&self, name: &'static str) -> Result<String, ConfigError> {
        self.optional(name).ok_or(ConfigError::Missing(name))
    }

    fn parsed_required<T: std::str::FromStr>(&self, name: &'static str) -> Result<T, ConfigError> {
        let value = self.required(name)?;
        value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value })
    }

    fn parsed<T: std::str::FromStr>(&self, name: &'static str, default: T) -> Result<T, ConfigError> {
        match self.optional(name) {
            Some(value) => value
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid { name, value }),
            None => Ok(default),
        }
    }
}
