use async_trait::async_trait;

use crate::domain::models::Channel;

/// Durable per-channel topic the producer publishes envelopes to.
#[async_trait]
pub trait MessageBus: Send + Sync {
    async fn publish(&self, channel: Channel, payload: Vec<u8>) -> anyhow::Result<()>;
}
