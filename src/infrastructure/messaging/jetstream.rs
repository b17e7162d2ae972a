use std::sync::Arc;
use std::time::Duration;

use async_nats::jetstream::{
    self, AckKind,
    consumer::{AckPolicy, PullConsumer, pull},
};
use tokio::task::JoinHandle;
use tokio_stream::StreamExt;
use tracing::{debug, error, info, warn};

use crate::{
    application::{
        handlers::{Disposition, EnvelopeHandler},
        services::event_bus::MessageBus,
    },
    domain::models::Channel,
};

#[derive(Clone, Debug)]
pub struct JetstreamConfig {
    pub url: String,
    pub stream: String,
    pub subject_prefix: String,
    pub pull_batch: usize,
    pub ack_wait_seconds: u64,
    pub fetch_expires_seconds: u64,
    /// Deliveries per envelope before the broker gives up on it.
    pub max_deliver: i64,
    pub nak_delay_seconds: u64,
}

impl JetstreamConfig {
    pub fn subject(&self, channel: Channel) -> String {
        format!("{}.{}", self.subject_prefix, channel.topic())
    }

    /// Durable consumer shared by every worker of one channel.
    pub fn durable(&self, channel: Channel) -> String {
        format!("{}-{}", self.subject_prefix, channel.topic())
    }

    pub fn consumer(&self, channel: Channel) -> pull::Config {
        let durable = self.durable(channel);
        pull::Config {
            durable_name: Some(durable),
            filter_subject: self.subject(channel),
            ack_policy: AckPolicy::Explicit,
            ack_wait: Duration::from_secs(self.ack_wait_seconds),
            max_deliver: self.max_deliver,
            ..Default::default()
        }
    }
}

const FETCH_BACKOFF_MIN: Duration = Duration::from_millis(250);
const FETCH_BACKOFF_MAX: Duration = Duration::from_secs(30);

fn next_backoff(current: Duration) -> Duration {
    (current * 2).min(FETCH_BACKOFF_MAX)
}

/// One stream holds every channel topic; each channel gets its own
/// durable pull consumer filtered to its subject.
pub struct JetstreamBus {
    context: jetstream::Context,
    stream: jetstream::stream::Stream,
    config: JetstreamConfig,
}

impl JetstreamBus {
    pub async fn connect(config: &JetstreamConfig) -> anyhow::Result<Arc<Self>> {
        let client = async_nats::connect(&config.url).await?;
        let context = jetstream::new(client);

        let stream = context
            .get_or_create_stream(jetstream::stream::Config {
                name: config.stream.clone(),
                subjects: Channel::ALL
                    .iter()
                    .map(|channel| config.subject(*channel))
                    .collect(),
                ..Default::default()
            })
            .await?;

        info!(url = %config.url, stream = %config.stream, "connected to jetstream");

        Ok(Arc::new(Self {
            context,
            stream,
            config: config.clone(),
        }))
    }

    pub async fn worker_pool(
        &self,
        handler: Arc<dyn EnvelopeHandler>,
        workers: usize,
    ) -> anyhow::Result<Vec<JoinHandle<()>>> {
        let channel = handler.channel();
        let durable = self.config.durable(channel);
        let consumer: PullConsumer = self
            .stream
            .get_or_create_consumer(&durable, self.config.consumer(channel))
            .await?;

        info!(
            %channel,
            durable = %durable,
            workers,
            max_deliver = self.config.max_deliver,
            "starting consumer workers"
        );

        Ok((0..workers.max(1))
            .map(|id| {
                JetstreamWorker {
                    id,
                    consumer: consumer.clone(),
                    pull_batch: self.config.pull_batch.max(1),
                    expires: Duration::from_secs(self.config.fetch_expires_seconds.max(1)),
                    nak_delay: Duration::from_secs(self.config.nak_delay_seconds),
                }
                .spawn(handler.clone())
            })
            .collect())
    }
}

#[async_trait::async_trait]
impl MessageBus for JetstreamBus {
    async fn publish(&self, channel: Channel, payload: Vec<u8>) -> anyhow::Result<()> {
        self.context
            .publish(self.config.subject(channel), payload.into())
            .await?
            .await?;
        Ok(())
    }
}

pub struct JetstreamWorker {
    id: usize,
    consumer: PullConsumer,
    pull_batch: usize,
    expires: Duration,
    nak_delay: Duration,
}

impl JetstreamWorker {
    /// The task runs until it is aborted; fetch failures are retried.
    pub fn spawn(self, handler: Arc<dyn EnvelopeHandler>) -> JoinHandle<()> {
        tokio::spawn(self.run(handler))
    }

    async fn run(self, handler: Arc<dyn EnvelopeHandler>) {
        let channel = handler.channel();
        let mut backoff = FETCH_BACKOFF_MIN;
        loop {
            let fetched = self
                .consumer
                .batch()
                .max_messages(self.pull_batch)
                .expires(self.expires)
                .messages()
                .await;
            let mut batch = match fetched {
                Ok(batch) => {
                    backoff = FETCH_BACKOFF_MIN;
                    batch
                }
                Err(err) => {
                    warn!(
                        %channel,
                        worker = self.id,
                        error = ?err,
                        retry_in_ms = backoff.as_millis() as u64,
                        "jetstream fetch failed"
                    );
                    tokio::time::sleep(backoff).await;
                    backoff = next_backoff(backoff);
                    continue;
                }
            };
            while let Some(message) = batch.next().await {
                match message {
                    Ok(msg) => {
                        if let Err(err) = self.process_message(msg, handler.as_ref()).await {
                            error!(%channel, worker = self.id, error = ?err, "failed to settle message");
                        }
                    }
                    Err(err) => {
                        warn!(%channel, worker = self.id, error = ?err, "jetstream batch error");
                    }
                }
            }
        }
    }

    async fn process_message(
        &self,
        message: jetstream::Message,
        handler: &dyn EnvelopeHandler,
    ) -> anyhow::Result<()> {
        match handler.handle(&message.payload).await {
            Disposition::Ack => {
                message
                    .ack()
                    .await
                    .map_err(|e| anyhow::anyhow!("failed to ack message: {}", e))?;
            }
            Disposition::Nack => {
                debug!(subject = %message.subject, delay = ?self.nak_delay, "negatively acknowledging message");
                message
                    .ack_with(AckKind::Nak(Some(self.nak_delay)))
                    .await
                    .map_err(|e| anyhow::anyhow!("failed to nak message: {}", e))?;
            }
        }
        Ok(())
    }
}
