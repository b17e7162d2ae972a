use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::{Disposition, EnvelopeHandler};
use crate::{
    application::services::channels::{ChannelAdapter, ProviderFactory},
    domain::{
        errors::DomainError,
        events::Envelope,
        models::{
            CREATED_DURING_PROCESSING, Channel, ChannelMessage, MessageStatus, NewMessage,
            NewMessageEvent, Provider, Template,
        },
        repositories::{MessageRepository, ProviderRepository, TemplateRepository},
    },
};

/// Everything resolved for an envelope before any recipient is contacted.
pub struct Prepared<C: ?Sized> {
    pub template: Template,
    pub provider: Provider,
    pub vendor_template_id: String,
    pub client: Arc<C>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryTally {
    pub sent: usize,
    pub rejected: usize,
}

impl DeliveryTally {
    pub fn final_status(&self) -> MessageStatus {
        if self.sent > 0 {
            MessageStatus::Sent
        } else {
            MessageStatus::Rejected
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Rejected before any recipient was attempted.
    Rejected { reason: String },
    Completed(DeliveryTally),
}

/// Channel-independent steps of consuming one envelope: message row
/// reconciliation, template and provider resolution, adapter construction
/// and the status/event bookkeeping around per-recipient sends.
pub struct DeliveryPipeline {
    messages: Arc<dyn MessageRepository>,
    templates: Arc<dyn TemplateRepository>,
    providers: Arc<dyn ProviderRepository>,
    factory: Arc<dyn ProviderFactory>,
}

impl DeliveryPipeline {
    pub fn new(
        messages: Arc<dyn MessageRepository>,
        templates: Arc<dyn TemplateRepository>,
        providers: Arc<dyn ProviderRepository>,
        factory: Arc<dyn ProviderFactory>,
    ) -> Self {
        Self {
            messages,
            templates,
            providers,
            factory,
        }
    }

    pub async fn prepare<M, C>(
        &self,
        envelope: &Envelope<M>,
        select: fn(ChannelAdapter) -> Option<Arc<C>>,
    ) -> Result<Prepared<C>, DomainError>
    where
        M: ChannelMessage,
        C: ?Sized,
    {
        let message = &envelope.message;
        self.ensure_message(envelope).await?;

        let template = self
            .templates
            .find_active(message.template(), message.tenant(), M::CHANNEL)
            .await?
            .filter(Template::is_active)
            .ok_or_else(|| {
                DomainError::NotFound(format!(
                    "template not found or inactive: {}",
                    message.template()
                ))
            })?;

        let provider = self
            .providers
            .find_active(message.provider(), M::CHANNEL)
            .await?
            .filter(Provider::is_active)
            .ok_or_else(|| {
                DomainError::NotFound(format!(
                    "provider not found or inactive: {}",
                    message.provider()
                ))
            })?;

        let vendor_template_id = template.vendor_template_id(&provider.provider)?.to_string();

        let adapter = self.factory.create(&provider).map_err(|err| match err {
            err @ DomainError::Infrastructure(_) => err,
            other => DomainError::ProviderConfig(format!(
                "failed to create {} provider: {other}",
                M::CHANNEL.label()
            )),
        })?;
        let built_for = adapter.channel();
        let client = select(adapter).ok_or_else(|| {
            DomainError::ProviderConfig(format!(
                "failed to create {} provider: {} builds a {} adapter",
                M::CHANNEL.label(),
                provider.provider,
                built_for.label()
            ))
        })?;

        self.messages
            .update_status(envelope.uuid, MessageStatus::Accepted)
            .await?;

        info!(
            message_uuid = %envelope.uuid,
            channel = %M::CHANNEL,
            template = %template.code,
            provider = %provider.provider,
            vendor_template_id = %vendor_template_id,
            "envelope prepared for delivery"
        );

        Ok(Prepared {
            template,
            provider,
            vendor_template_id,
            client,
        })
    }

    /// Makes sure a row exists for the envelope's UUID. The upsert keeps
    /// concurrent redeliveries from producing duplicate rows.
    async fn ensure_message<M: ChannelMessage>(
        &self,
        envelope: &Envelope<M>,
    ) -> Result<(), DomainError> {
        if self.messages.get(envelope.uuid).await?.is_some() {
            return Ok(());
        }

        let message = &envelope.message;
        let (_, inserted) = self
            .messages
            .ensure(NewMessage {
                uuid: envelope.uuid,
                channel: M::CHANNEL,
                identifiers: message.identifiers().clone(),
                categories: message.categories().to_vec(),
                refno: message.refno().to_string(),
            })
            .await?;

        if inserted {
            warn!(
                message_uuid = %envelope.uuid,
                channel = %M::CHANNEL,
                "message row missing, created during processing"
            );
            self.messages
                .append_event(NewMessageEvent::accepted(
                    envelope.uuid,
                    CREATED_DURING_PROCESSING,
                ))
                .await?;
        }
        Ok(())
    }

    pub async fn reject(&self, uuid: Uuid, reason: &str) -> Result<(), DomainError> {
        self.messages
            .update_status(uuid, MessageStatus::Rejected)
            .await?;
        self.messages
            .append_event(NewMessageEvent::rejected(uuid, reason))
            .await?;
        Ok(())
    }

    /// Records the outcome of one recipient. Store failures are logged and
    /// swallowed so the rest of the batch still goes out.
    pub async fn record(
        &self,
        uuid: Uuid,
        recipient: &str,
        outcome: Result<(), String>,
        tally: &mut DeliveryTally,
    ) {
        let event = match outcome {
            Ok(()) => {
                tally.sent += 1;
                info!(message_uuid = %uuid, recipient = %recipient, "recipient sent");
                NewMessageEvent::sent(uuid, recipient)
            }
            Err(reason) => {
                tally.rejected += 1;
                warn!(message_uuid = %uuid, recipient = %recipient, %reason, "recipient rejected");
                NewMessageEvent::rejected_for(uuid, recipient, reason)
            }
        };
        if let Err(err) = self.messages.append_event(event).await {
            error!(message_uuid = %uuid, recipient = %recipient, error = ?err, "failed to append message event");
        }
    }

    /// Writes the aggregate status once every recipient has been attempted.
    pub async fn finish(&self, uuid: Uuid, tally: DeliveryTally) {
        if tally.sent == 0 && tally.rejected == 0 {
            let event = NewMessageEvent::rejected(uuid, "no recipients to deliver to");
            if let Err(err) = self.messages.append_event(event).await {
                error!(message_uuid = %uuid, error = ?err, "failed to append message event");
            }
        }

        let status = tally.final_status();
        match self.messages.update_status(uuid, status).await {
            Ok(()) => info!(
                message_uuid = %uuid,
                status = %status.as_str(),
                sent = tally.sent,
                rejected = tally.rejected,
                "delivery finished"
            ),
            Err(err) => error!(
                message_uuid = %uuid,
                status = %status.as_str(),
                error = ?err,
                "failed to update final message status"
            ),
        }
    }
}

/// The channel-specific half of a consumer: which adapter capability it
/// needs and how it walks the recipient list.
#[async_trait]
pub trait ChannelDispatch: Send + Sync + 'static {
    type Message: ChannelMessage;
    type Client: ?Sized + Send + Sync;

    fn select(adapter: ChannelAdapter) -> Option<Arc<Self::Client>>;

    async fn deliver(
        &self,
        pipeline: &DeliveryPipeline,
        envelope: &Envelope<Self::Message>,
        prepared: &Prepared<Self::Client>,
    ) -> DeliveryTally;
}

pub struct DispatchHandler<D: ChannelDispatch> {
    pipeline: Arc<DeliveryPipeline>,
    dispatch: D,
}

impl<D: ChannelDispatch> DispatchHandler<D> {
    pub fn new(pipeline: Arc<DeliveryPipeline>, dispatch: D) -> Self {
        Self {
            pipeline,
            dispatch,
        }
    }

    /// Runs one envelope to completion. Only infrastructure failures come
    /// back as `Err`; everything else ends in a recorded outcome.
    pub async fn process(
        &self,
        envelope: &Envelope<D::Message>,
    ) -> Result<DeliveryOutcome, DomainError> {
        let prepared = match self.pipeline.prepare(envelope, D::select).await {
            Ok(prepared) => prepared,
            Err(err) if err.is_terminal() => {
                let reason = err.to_string();
                warn!(
                    message_uuid = %envelope.uuid,
                    channel = %<D::Message as ChannelMessage>::CHANNEL,
                    %reason,
                    "message rejected"
                );
                self.pipeline.reject(envelope.uuid, &reason).await?;
                return Ok(DeliveryOutcome::Rejected { reason });
            }
            Err(err) => return Err(err),
        };

        let tally = self
            .dispatch
            .deliver(&self.pipeline, envelope, &prepared)
            .await;
        self.pipeline.finish(envelope.uuid, tally).await;
        Ok(DeliveryOutcome::Completed(tally))
    }
}

#[async_trait]
impl<D: ChannelDispatch> EnvelopeHandler for DispatchHandler<D> {
    fn channel(&self) -> Channel {
        <D::Message as ChannelMessage>::CHANNEL
    }

    async fn handle(&self, payload: &[u8]) -> Disposition {
        let envelope: Envelope<D::Message> = match serde_json::from_slice(payload) {
            Ok(envelope) => envelope,
            Err(err) => {
                error!(channel = %self.channel(), error = %err, "malformed envelope");
                return Disposition::Nack;
            }
        };

        match self.process(&envelope).await {
            Ok(_) => Disposition::Ack,
            Err(err) => {
                error!(
                    message_uuid = %envelope.uuid,
                    channel = %self.channel(),
                    error = ?err,
                    "envelope processing failed, leaving it for redelivery"
                );
                Disposition::Nack
            }
        }
    }
}
