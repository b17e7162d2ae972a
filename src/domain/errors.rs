use thiserror::Error;

/// Failure taxonomy of the delivery pipeline.
///
/// Everything except `Infrastructure` is terminal for the envelope being
/// processed: it is recorded as a rejection and acknowledged.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Render(String),
    #[error("{0}")]
    ProviderConfig(String),
    #[error("{message}, status code: {status}")]
    ProviderCall { status: u16, message: String },
    #[error(transparent)]
    Infrastructure(#[from] anyhow::Error),
}

impl DomainError {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, DomainError::Infrastructure(_))
    }
}
