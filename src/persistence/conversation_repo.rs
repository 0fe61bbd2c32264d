//! Conversation repository for `SQLite` persistence.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::models::conversation::{Conversation, ConversationStatus};
use crate::{AppError, Result};

use super::db::Database;

/// Repository wrapper around `SQLite` for conversation records.
#[derive(Clone)]
pub struct ConversationRepo {
    db: Arc<Database>,
}

/// Internal row struct for `SQLite` deserialization.
#[derive(sqlx::FromRow)]
struct ConversationRow {
    id: String,
    ticket_id: i64,
    customer_id: Option<i64>,
    agent_id: Option<i64>,
    status: String,
    subject: Option<String>,
    priority: Option<String>,
    tags: String,
    metadata: String,
    created_at: String,
    updated_at: String,
}

impl ConversationRow {
    /// Convert a database row into the domain model.
    fn into_conversation(self) -> Result<Conversation> {
        let status = parse_status(&self.status)?;
        let tags: Vec<String> = serde_json::from_str(&self.tags)
            .map_err(|e| AppError::Db(format!("invalid tags json: {e}")))?;
        let metadata: serde_json::Value = serde_json::from_str(&self.metadata)
            .map_err(|e| AppError::Db(format!("invalid metadata json: {e}")))?;
        let created_at = parse_ts(&self.created_at, "created_at")?;
        let updated_at = parse_ts(&self.updated_at, "updated_at")?;

        Ok(Conversation {
            id: self.id,
            ticket_id: self.ticket_id,
            customer_id: self.customer_id,
            agent_id: self.agent_id,
            status,
            subject: self.subject,
            priority: self.priority,
            tags,
            metadata,
            created_at,
            updated_at,
        })
    }
}

fn parse_status(s: &str) -> Result<ConversationStatus> {
    match s {
        "OPEN" => Ok(ConversationStatus::Open),
        "WAITING" => Ok(ConversationStatus::Waiting),
        "ON_HOLD" => Ok(ConversationStatus::OnHold),
        "RESOLVED" => Ok(ConversationStatus::Resolved),
        "CLOSED" => Ok(ConversationStatus::Closed),
        other => Err(AppError::Db(format!("invalid conversation status: {other}"))),
    }
}

fn parse_ts(raw: &str, field: &str) -> Result<DateTime<Utc>> {
    chrono::DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AppError::Db(format!("invalid {field}: {e}")))
}

impl ConversationRepo {
    /// Create a new repository instance.
    #[must_use]
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Insert or update a conversation record keyed by its deterministic id.
    ///
    /// `created_at` is preserved on conflict so replays do not rewrite
    /// history; every other field converges on the latest event.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the upsert fails.
    pub async fn upsert(&self, conversation: &Conversation) -> Result<()> {
        let tags = serde_json::to_string(&conversation.tags)
            .map_err(|e| AppError::Db(format!("tags serialization: {e}")))?;
        let metadata = serde_json::to_string(&conversation.metadata)
            .map_err(|e| AppError::Db(format!("metadata serialization: {e}")))?;

        sqlx::query(
            "INSERT INTO conversation (id, ticket_id, customer_id, agent_id, status,
             subject, priority, tags, metadata, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
             ON CONFLICT(id) DO UPDATE SET
                customer_id = excluded.customer_id,
                agent_id = excluded.agent_id,
                status = excluded.status,
                subject = excluded.subject,
                priority = excluded.priority,
                tags = excluded.tags,
                metadata = excluded.metadata,
                updated_at = excluded.updated_at",
        )
        .bind(&conversation.id)
        .bind(conversation.ticket_id)
        .bind(conversation.customer_id)
        .bind(conversation.agent_id)
        .bind(conversation.status.as_str())
        .bind(&conversation.subject)
        .bind(&conversation.priority)
        .bind(&tags)
        .bind(&metadata)
        .bind(conversation.created_at.to_rfc3339())
        .bind(conversation.updated_at.to_rfc3339())
        .execute(self.db.as_ref())
        .await?;

        Ok(())
    }

    /// Retrieve a conversation by identifier.
    ///
    /// Returns `Ok(None)` if the conversation does not exist.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn get_by_id(&self, id: &str) -> Result<Option<Conversation>> {
        let row: Option<ConversationRow> =
            sqlx::query_as("SELECT * FROM conversation WHERE id = ?1")
                .bind(id)
                .fetch_optional(self.db.as_ref())
                .await?;

        row.map(ConversationRow::into_conversation).transpose()
    }

    /// Count all stored conversations.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn count(&self) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM conversation")
            .fetch_one(self.db.as_ref())
            .await?;
        Ok(count.0)
    }
}
