use std::sync::Arc;

use poem::Result as PoemResult;
use poem_openapi::{OpenApi, payload::Json};

use crate::{
    domain::{errors::DomainError, models::ChannelMessage},
    presentation::http::{
        endpoints::root::{ApiState, EndpointsTags, domain_error},
        mappers::{map_batch, map_email, map_produced, map_sms, map_whatsapp},
        requests::{EmailBatchRequestDto, SmsBatchRequestDto, WhatsAppBatchRequestDto},
        responses::ProduceResultDto,
    },
};

/// Batch ingress: one `{refno, uuid}` per input message, in input order.
#[derive(Clone)]
pub struct DeliveryEndpoints {
    state: Arc<ApiState>,
}

impl DeliveryEndpoints {
    pub fn new(state: Arc<ApiState>) -> Self {
        Self { state }
    }

    async fn produce<M: ChannelMessage>(
        &self,
        messages: Result<Vec<M>, DomainError>,
    ) -> PoemResult<Json<Vec<ProduceResultDto>>> {
        let messages = messages.map_err(domain_error)?;
        if messages.is_empty() {
            return Err(domain_error(DomainError::Validation(
                "messages array cannot be empty".into(),
            )));
        }

        let produced = self
            .state
            .produce_usecase
            .execute_batch(messages)
            .await
            .map_err(domain_error)?;

        Ok(Json(produced.into_iter().map(map_produced).collect()))
    }
}

#[OpenApi]
impl DeliveryEndpoints {
    #[oai(path = "/whatsapp", method = "post", tag = EndpointsTags::Delivery)]
    pub async fn send_whatsapp(
        &self,
        request: Json<WhatsAppBatchRequestDto>,
    ) -> PoemResult<Json<Vec<ProduceResultDto>>> {
        self.produce(map_batch(request.0.messages, map_whatsapp))
            .await
    }

    #[oai(path = "/sms", method = "post", tag = EndpointsTags::Delivery)]
    pub async fn send_sms(
        &self,
        request: Json<SmsBatchRequestDto>,
    ) -> PoemResult<Json<Vec<ProduceResultDto>>> {
        self.produce(map_batch(request.0.messages, map_sms)).await
    }

    #[oai(path = "/email", method = "post", tag = EndpointsTags::Delivery)]
    pub async fn send_email(
        &self,
        request: Json<EmailBatchRequestDto>,
    ) -> PoemResult<Json<Vec<ProduceResultDto>>> {
        self.produce(map_batch(request.0.messages, map_email)).await
    }
}
