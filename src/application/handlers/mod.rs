use async_trait::async_trait;

use crate::domain::models::Channel;

pub mod delivery;
pub mod email;
pub mod sms;
pub mod whatsapp;

/// What the worker should tell the broker once an envelope is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Ack,
    Nack,
}

#[async_trait]
pub trait EnvelopeHandler: Send + Sync {
    fn channel(&self) -> Channel;
    async fn handle(&self, payload: &[u8]) -> Disposition;
}
