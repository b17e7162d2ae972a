use std::sync::Arc;

use async_trait::async_trait;

use super::delivery::{ChannelDispatch, DeliveryPipeline, DeliveryTally, DispatchHandler, Prepared};
use crate::{
    application::services::{
        channels::{ChannelAdapter, WhatsAppClient},
        template_renderer,
    },
    domain::{events::Envelope, models::WhatsAppMessage},
};

pub type WhatsAppHandler = DispatchHandler<WhatsAppDispatch>;

pub struct WhatsAppDispatch;

#[async_trait]
impl ChannelDispatch for WhatsAppDispatch {
    type Message = WhatsAppMessage;
    type Client = dyn WhatsAppClient;

    fn select(adapter: ChannelAdapter) -> Option<Arc<dyn WhatsAppClient>> {
        adapter.into_whatsapp()
    }

    async fn deliver(
        &self,
        pipeline: &DeliveryPipeline,
        envelope: &Envelope<Self::Message>,
        prepared: &Prepared<Self::Client>,
    ) -> DeliveryTally {
        let message = &envelope.message;
        let mut tally = DeliveryTally::default();

        for recipient in &message.to {
            let telephone = recipient.telephone.as_str();
            let outcome = match template_renderer::render(&prepared.template.content, &message.params) {
                Ok(body) => prepared
                    .client
                    .send_template(telephone, &prepared.vendor_template_id, &message.params, &body)
                    .await
                    .map_err(|err| format!("Failed to send WhatsApp message to {telephone}: {err}")),
                Err(err) => Err(format!("Failed to render template for {telephone}: {err}")),
            };
            pipeline
                .record(envelope.uuid, telephone, outcome, &mut tally)
                .await;
        }

        tally
    }
}
