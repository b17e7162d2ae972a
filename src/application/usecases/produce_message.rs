use std::sync::Arc;

use tracing::{error, info};
use uuid::Uuid;

use crate::{
    application::services::event_bus::MessageBus,
    domain::{
        errors::DomainError,
        events::Envelope,
        models::{ChannelMessage, NewMessage},
        repositories::MessageRepository,
    },
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProduceMessageResponse {
    pub uuid: Uuid,
    pub refno: String,
}

/// Accepts a channel message: persists an ACCEPTED row, then publishes the
/// envelope to the channel topic. The row always exists before the envelope
/// can be observed by a consumer.
pub struct ProduceMessageUseCase {
    messages: Arc<dyn MessageRepository>,
    bus: Arc<dyn MessageBus>,
}

impl ProduceMessageUseCase {
    pub fn new(messages: Arc<dyn MessageRepository>, bus: Arc<dyn MessageBus>) -> Self {
        Self { messages, bus }
    }

    pub async fn execute<M: ChannelMessage>(
        &self,
        message: M,
    ) -> Result<ProduceMessageResponse, DomainError> {
        message.validate()?;
        self.produce(message).await
    }

    /// Validates every message before producing any of them, then produces
    /// them in input order.
    pub async fn execute_batch<M: ChannelMessage>(
        &self,
        messages: Vec<M>,
    ) -> Result<Vec<ProduceMessageResponse>, DomainError> {
        for (index, message) in messages.iter().enumerate() {
            message.validate().map_err(|err| match err {
                DomainError::Validation(reason) => {
                    DomainError::Validation(format!("messages[{index}]: {reason}"))
                }
                other => other,
            })?;
        }

        let mut responses = Vec::with_capacity(messages.len());
        for message in messages {
            responses.push(self.produce(message).await?);
        }
        Ok(responses)
    }

    async fn produce<M: ChannelMessage>(
        &self,
        message: M,
    ) -> Result<ProduceMessageResponse, DomainError> {
        let uuid = Uuid::new_v4();
        let refno = message.refno().to_string();

        self.messages
            .insert(NewMessage {
                uuid,
                channel: M::CHANNEL,
                identifiers: message.identifiers().clone(),
                categories: message.categories().to_vec(),
                refno: refno.clone(),
            })
            .await?;

        let payload = serde_json::to_vec(&Envelope::new(uuid, message))
            .map_err(|err| DomainError::Infrastructure(err.into()))?;

        if let Err(err) = self.bus.publish(M::CHANNEL, payload).await {
            error!(
                message_uuid = %uuid,
                channel = %M::CHANNEL,
                error = ?err,
                "publish failed after insert, message is stranded at ACCEPTED"
            );
            return Err(DomainError::Infrastructure(err));
        }

        info!(message_uuid = %uuid, channel = %M::CHANNEL, refno = %refno, "message accepted");
        Ok(ProduceMessageResponse { uuid, refno })
    }
}
