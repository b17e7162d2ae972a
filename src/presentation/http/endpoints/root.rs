use std::sync::Arc;

use poem::http::StatusCode;
use poem_openapi::Tags;
use tracing::error;

use crate::{
    application::usecases::{get_message::GetMessageUseCase, produce_message::ProduceMessageUseCase},
    domain::errors::DomainError,
};

#[derive(Clone)]
pub struct ApiState {
    pub produce_usecase: Arc<ProduceMessageUseCase>,
    pub get_message_usecase: Arc<GetMessageUseCase>,
}

pub struct Endpoints;

/// Enum of API sections (tags)
#[derive(Tags)]
pub enum EndpointsTags {
    Health,
    Delivery,
    Messages,
}

pub(crate) fn domain_error(err: DomainError) -> poem::Error {
    let status = match &err {
        DomainError::Validation(_) => StatusCode::BAD_REQUEST,
        DomainError::NotFound(_) => StatusCode::NOT_FOUND,
        _ => {
            error!(error = %err, "request failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    poem::Error::from_string(err.to_string(), status)
}
