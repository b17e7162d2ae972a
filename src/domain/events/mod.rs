use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Queue payload pairing a message UUID with its channel-specific body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<M> {
    pub uuid: Uuid,
    pub message: M,
}

impl<M> Envelope<M> {
    pub fn new(uuid: Uuid, message: M) -> Self {
        Self { uuid, message }
    }
}
