//! Message repository for `SQLite` persistence.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::models::message::{Message, MessageSender};
use crate::{AppError, Result};

use super::db::Database;

/// Repository wrapper around `SQLite` for message records.
#[derive(Clone)]
pub struct MessageRepo {
    db: Arc<Database>,
}

/// Internal row struct for `SQLite` deserialization.
#[derive(sqlx::FromRow)]
struct MessageRow {
    id: String,
    conversation_id: String,
    content: String,
    sender: String,
    channel: Option<String>,
    metadata: String,
    created_at: String,
    updated_at: String,
}

impl MessageRow {
    /// Convert a database row into the domain model.
    fn into_message(self) -> Result<Message> {
        let sender = parse_sender(&self.sender)?;
        let metadata: serde_json::Value = serde_json::from_str(&self.metadata)
            .map_err(|e| AppError::Db(format!("invalid metadata json: {e}")))?;
        let created_at = parse_ts(&self.created_at, "created_at")?;
        let updated_at = parse_ts(&self.updated_at, "updated_at")?;

        Ok(Message {
            id: self.id,
            conversation_id: self.conversation_id,
            content: self.content,
            sender,
            channel: self.channel,
            metadata,
            created_at,
            updated_at,
        })
    }
}

fn parse_sender(s: &str) -> Result<MessageSender> {
    match s {
        "AGENT" => Ok(MessageSender::Agent),
        "CUSTOMER" => Ok(MessageSender::Customer),
        other => Err(AppError::Db(format!("invalid message sender: {other}"))),
    }
}

fn parse_ts(raw: &str, field: &str) -> Result<DateTime<Utc>> {
    chrono::DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AppError::Db(format!("invalid {field}: {e}")))
}

impl MessageRepo {
    /// Create a new repository instance.
    #[must_use]
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Insert or update a message record keyed by its deterministic id.
    ///
    /// `created_at` and the sender classification are preserved on
    /// conflict; content, channel, and metadata converge on the latest
    /// event.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the upsert fails.
    pub async fn upsert(&self, message: &Message) -> Result<()> {
        let metadata = serde_json::to_string(&message.metadata)
            .map_err(|e| AppError::Db(format!("metadata serialization: {e}")))?;

        sqlx::query(
            "INSERT INTO message (id, conversation_id, content, sender, channel,
             metadata, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(id) DO UPDATE SET
                content = excluded.content,
                channel = excluded.channel,
                metadata = excluded.metadata,
                updated_at = excluded.updated_at",
        )
        .bind(&message.id)
        .bind(&message.conversation_id)
        .bind(&message.content)
        .bind(message.sender.as_str())
        .bind(&message.channel)
        .bind(&metadata)
        .bind(message.created_at.to_rfc3339())
        .bind(message.updated_at.to_rfc3339())
        .execute(self.db.as_ref())
        .await?;

        Ok(())
    }

    /// Retrieve a message by identifier.
    ///
    /// Returns `Ok(None)` if the message does not exist.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn get_by_id(&self, id: &str) -> Result<Option<Message>> {
        let row: Option<MessageRow> = sqlx::query_as("SELECT * FROM message WHERE id = ?1")
            .bind(id)
            .fetch_optional(self.db.as_ref())
            .await?;

        row.map(MessageRow::into_message).transpose()
    }

    /// List a conversation's messages in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Db` if the query fails.
    pub async fn list_for_conversation(&self, conversation_id: &str) -> Result<Vec<Message>> {
        let rows: Vec<MessageRow> = sqlx::query_as(
            "SELECT * FROM message WHERE conversation_id = ?1 ORDER BY created_at ASC",
        )
        .bind(conversation_id)
        .fetch_all(self.db.as_ref())
        .await?;

        rows.into_iter().map(MessageRow::into_message).collect()
    }

    /// Replace a message's content, leaving sender classification untouched.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the message does not exist and
    /// `AppError::Db` if the update fails.
    pub async fn update_content(&self, id: &str, content: &str) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let result = sqlx::query(
            "UPDATE message SET content = ?1, updated_at = ?2 WHERE id = ?3",
        )
        .bind(content)
        .bind(&now)
        .bind(id)
        .execute(self.db.as_ref())
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("message {id} not found")));
        }
        Ok(())
    }
}
