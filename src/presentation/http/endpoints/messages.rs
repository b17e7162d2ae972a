use std::sync::Arc;

use poem::Result as PoemResult;
use poem_openapi::{OpenApi, param::Path, payload::Json};
use uuid::Uuid;

use crate::presentation::http::{
    endpoints::root::{ApiState, EndpointsTags, domain_error},
    mappers::map_message,
    responses::MessageDto,
};

#[derive(Clone)]
pub struct MessagesEndpoints {
    state: Arc<ApiState>,
}

impl MessagesEndpoints {
    pub fn new(state: Arc<ApiState>) -> Self {
        Self { state }
    }
}

#[OpenApi]
impl MessagesEndpoints {
    /// Current status of a message together with its event history.
    #[oai(path = "/messages/:uuid", method = "get", tag = EndpointsTags::Messages)]
    pub async fn get_message(&self, uuid: Path<Uuid>) -> PoemResult<Json<MessageDto>> {
        let found = self
            .state
            .get_message_usecase
            .execute(uuid.0)
            .await
            .map_err(domain_error)?;

        Ok(Json(map_message(found)))
    }
}
