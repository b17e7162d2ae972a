use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sqlx::{FromRow, Pool, Postgres, types::Json};
use uuid::Uuid;

use crate::domain::{
    models::{
        Channel, Identifiers, Message, MessageEvent, MessageStatus, NewMessage, NewMessageEvent,
        Provider, RecordStatus, Template,
    },
    repositories::{MessageRepository, ProviderRepository, TemplateRepository},
};

pub type PgPool = Pool<Postgres>;

const MESSAGE_COLUMNS: &str =
    "id, uuid, channel, identifiers, categories, refno, status, created_at, updated_at";

/// Writes go to `primary`; lookups by UUID are served from `replica`, which
/// may lag behind.
#[derive(Clone)]
pub struct PostgresMessageRepository {
    primary: PgPool,
    replica: PgPool,
}

impl PostgresMessageRepository {
    pub fn new(primary: PgPool, replica: PgPool) -> Arc<Self> {
        Arc::new(Self { primary, replica })
    }
}

#[async_trait]
impl MessageRepository for PostgresMessageRepository {
    async fn insert(&self, message: NewMessage) -> anyhow::Result<Message> {
        let record = sqlx::query_as::<_, MessageRecord>(&format!(
            r#"
            INSERT INTO messages (uuid, channel, identifiers, categories, refno, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, NOW(), NOW())
            RETURNING {MESSAGE_COLUMNS}
            "#
        ))
        .bind(message.uuid)
        .bind(message.channel.as_str())
        .bind(Json(&message.identifiers))
        .bind(Json(&message.categories))
        .bind(&message.refno)
        .bind(MessageStatus::Accepted.as_str())
        .fetch_one(&self.primary)
        .await?;

        record.try_into()
    }

    async fn ensure(&self, message: NewMessage) -> anyhow::Result<(Message, bool)> {
        // xmax is zero only for a tuple this statement inserted.
        let record = sqlx::query_as::<_, MessageRecord>(&format!(
            r#"
            INSERT INTO messages (uuid, channel, identifiers, categories, refno, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, NOW(), NOW())
            ON CONFLICT (uuid) DO UPDATE
            SET updated_at = EXCLUDED.updated_at
            RETURNING {MESSAGE_COLUMNS}, (xmax = 0) AS inserted
            "#
        ))
        .bind(message.uuid)
        .bind(message.channel.as_str())
        .bind(Json(&message.identifiers))
        .bind(Json(&message.categories))
        .bind(&message.refno)
        .bind(MessageStatus::Accepted.as_str())
        .fetch_one(&self.primary)
        .await?;

        let inserted = record.inserted;
        Ok((record.try_into()?, inserted))
    }

    async fn get(&self, uuid: Uuid) -> anyhow::Result<Option<Message>> {
        let record = sqlx::query_as::<_, MessageRecord>(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages WHERE uuid = $1"
        ))
        .bind(uuid)
        .fetch_optional(&self.replica)
        .await?;
        record.map(Message::try_from).transpose()
    }

    async fn update_status(&self, uuid: Uuid, status: MessageStatus) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE messages
            SET status = $2,
                updated_at = NOW()
            WHERE uuid = $1
            "#,
        )
        .bind(uuid)
        .bind(status.as_str())
        .execute(&self.primary)
        .await?;
        Ok(())
    }

    async fn append_event(&self, event: NewMessageEvent) -> anyhow::Result<MessageEvent> {
        let record = sqlx::query_as::<_, MessageEventRecord>(
            r#"
            INSERT INTO message_events (uuid, message_id, status, reason, metadata, timestamp, created_at)
            VALUES ($1, $2, $3, $4, $5, NOW(), NOW())
            RETURNING id, uuid, message_id, status, reason, metadata, timestamp, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(event.message_id)
        .bind(event.status.as_str())
        .bind(&event.reason)
        .bind(&event.metadata)
        .fetch_one(&self.primary)
        .await?;

        record.try_into()
    }

    async fn list_events(&self, uuid: Uuid) -> anyhow::Result<Vec<MessageEvent>> {
        let rows = sqlx::query_as::<_, MessageEventRecord>(
            r#"
            SELECT id, uuid, message_id, status, reason, metadata, timestamp, created_at
            FROM message_events
            WHERE message_id = $1
            ORDER BY timestamp ASC, id ASC
            "#,
        )
        .bind(uuid)
        .fetch_all(&self.replica)
        .await?;
        rows.into_iter().map(MessageEvent::try_from).collect()
    }
}

#[derive(Clone)]
pub struct PostgresTemplateRepository {
    pool: PgPool,
}

impl PostgresTemplateRepository {
    pub fn new(pool: PgPool) -> Arc<Self> {
        Arc::new(Self { pool })
    }
}

#[async_trait]
impl TemplateRepository for PostgresTemplateRepository {
    /// `reference` is either the template UUID or its tenant-scoped code.
    async fn find_active(
        &self,
        reference: &str,
        tenant: &str,
        channel: Channel,
    ) -> anyhow::Result<Option<Template>> {
        let (lookup, key) = match Uuid::parse_str(reference) {
            Ok(uuid) => ("uuid::text = $1", uuid.to_string()),
            Err(_) => ("code = $1", reference.to_string()),
        };
        let record = sqlx::query_as::<_, TemplateRecord>(&format!(
            r#"
            SELECT uuid, code, name, subject, content, status, channel, template_ids, tenant
            FROM templates
            WHERE {lookup}
              AND tenant = $2
              AND channel = $3
              AND status = $4
            LIMIT 1
            "#
        ))
        .bind(key)
        .bind(tenant)
        .bind(channel.as_str())
        .bind(RecordStatus::Active.as_i16())
        .fetch_optional(&self.pool)
        .await?;
        record.map(Template::try_from).transpose()
    }
}

#[derive(Clone)]
pub struct PostgresProviderRepository {
    pool: PgPool,
}

impl PostgresProviderRepository {
    pub fn new(pool: PgPool) -> Arc<Self> {
        Arc::new(Self { pool })
    }
}

#[async_trait]
impl ProviderRepository for PostgresProviderRepository {
    async fn find_active(
        &self,
        reference: &str,
        channel: Channel,
    ) -> anyhow::Result<Option<Provider>> {
        let Ok(uuid) = Uuid::parse_str(reference) else {
            return Ok(None);
        };
        let record = sqlx::query_as::<_, ProviderRecord>(
            r#"
            SELECT uuid, code, provider, name, config, secure_config, status, channel, tenant
            FROM providers
            WHERE uuid = $1
              AND channel = $2
              AND status = $3
            "#,
        )
        .bind(uuid)
        .bind(channel.as_str())
        .bind(RecordStatus::Active.as_i16())
        .fetch_optional(&self.pool)
        .await?;
        record.map(Provider::try_from).transpose()
    }
}

#[derive(FromRow)]
struct MessageRecord {
    id: i64,
    uuid: Uuid,
    channel: String,
    identifiers: Json<Identifiers>,
    categories: Json<Vec<String>>,
    refno: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[sqlx(default)]
    inserted: bool,
}

impl TryFrom<MessageRecord> for Message {
    type Error = anyhow::Error;

    fn try_from(value: MessageRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.id,
            uuid: value.uuid,
            channel: parse_channel(&value.channel)?,
            identifiers: value.identifiers.0,
            categories: value.categories.0,
            refno: value.refno,
            status: parse_status(&value.status)?,
            created_at: value.created_at,
            updated_at: value.updated_at,
        })
    }
}

#[derive(FromRow)]
struct MessageEventRecord {
    id: i64,
    uuid: Uuid,
    message_id: Uuid,
    status: String,
    reason: Option<String>,
    metadata: Option<Value>,
    timestamp: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl TryFrom<MessageEventRecord> for MessageEvent {
    type Error = anyhow::Error;

    fn try_from(value: MessageEventRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.id,
            uuid: value.uuid,
            message_id: value.message_id,
            status: parse_status(&value.status)?,
            reason: value.reason,
            metadata: value.metadata,
            timestamp: value.timestamp,
            created_at: value.created_at,
        })
    }
}

#[derive(FromRow)]
struct TemplateRecord {
    uuid: Uuid,
    code: String,
    name: String,
    subject: Option<String>,
    content: String,
    status: i16,
    channel: String,
    template_ids: Json<Map<String, Value>>,
    tenant: String,
}

impl TryFrom<TemplateRecord> for Template {
    type Error = anyhow::Error;

    fn try_from(value: TemplateRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            uuid: value.uuid,
            code: value.code,
            name: value.name,
            subject: value.subject,
            content: value.content,
            status: RecordStatus::from_i16(value.status),
            channel: parse_channel(&value.channel)?,
            template_ids: value.template_ids.0,
            tenant: value.tenant,
        })
    }
}

#[derive(FromRow)]
struct ProviderRecord {
    uuid: Uuid,
    code: String,
    provider: String,
    name: String,
    config: Value,
    secure_config: Value,
    status: i16,
    channel: String,
    tenant: String,
}

impl TryFrom<ProviderRecord> for Provider {
    type Error = anyhow::Error;

    fn try_from(value: ProviderRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            uuid: value.uuid,
            code: value.code,
            provider: value.provider,
            name: value.name,
            config: value.config,
            secure_config: value.secure_config,
            status: RecordStatus::from_i16(value.status),
            channel: parse_channel(&value.channel)?,
            tenant: value.tenant,
        })
    }
}

fn parse_channel(value: &str) -> anyhow::Result<Channel> {
    Channel::from_str(value).ok_or_else(|| anyhow::anyhow!("unknown channel {value}"))
}

fn parse_status(value: &str) -> anyhow::Result<MessageStatus> {
    MessageStatus::from_str(value).ok_or_else(|| anyhow::anyhow!("unknown message status {value}"))
}
