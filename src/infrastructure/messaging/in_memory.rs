use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    application::{
        handlers::{Disposition, EnvelopeHandler},
        services::event_bus::MessageBus,
    },
    domain::models::Channel,
};

/// Process-local topic per channel. Nacked envelopes go back to the tail of
/// their queue, mirroring broker redelivery.
#[derive(Default, Clone)]
pub struct InMemoryBus {
    topics: Arc<RwLock<HashMap<Channel, VecDeque<Vec<u8>>>>>,
}

impl InMemoryBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn pending(&self, channel: Channel) -> usize {
        self.topics
            .read()
            .await
            .get(&channel)
            .map_or(0, VecDeque::len)
    }

    pub async fn pop(&self, channel: Channel) -> Option<Vec<u8>> {
        self.topics.write().await.get_mut(&channel)?.pop_front()
    }

    /// Delivers up to `limit` queued envelopes to `handler`, one at a time.
    pub async fn deliver(&self, handler: &dyn EnvelopeHandler, limit: usize) -> Vec<Disposition> {
        let channel = handler.channel();
        let mut dispositions = Vec::new();
        for _ in 0..limit {
            let Some(payload) = self.pop(channel).await else {
                break;
            };
            let disposition = handler.handle(&payload).await;
            if disposition == Disposition::Nack {
                self.topics
                    .write()
                    .await
                    .entry(channel)
                    .or_default()
                    .push_back(payload);
            }
            dispositions.push(disposition);
        }
        dispositions
    }
}

#[async_trait]
impl MessageBus for InMemoryBus {
    async fn publish(&self, channel: Channel, payload: Vec<u8>) -> anyhow::Result<()> {
        self.topics
            .write()
            .await
            .entry(channel)
            .or_default()
            .push_back(payload);
        Ok(())
    }
}
