//! `SQLite` schema bootstrap logic.
//!
//! All table definitions use `CREATE TABLE IF NOT EXISTS` — safe to
//! re-run on every server startup. Produces a convergent result.

use sqlx::SqlitePool;

use crate::Result;

/// Apply all table definitions to the connected `SQLite` database.
///
/// Creates all three tables idempotently. Safe to call on every startup.
///
/// # Errors
///
/// Returns `AppError::Db` if any DDL statement fails.
pub async fn bootstrap_schema(pool: &SqlitePool) -> Result<()> {
    let ddl = r"
CREATE TABLE IF NOT EXISTS installation (
    id              TEXT PRIMARY KEY NOT NULL,
    subdomain       TEXT NOT NULL,
    app_id          TEXT NOT NULL,
    user_id         TEXT NOT NULL,
    webhook_secret  TEXT NOT NULL,
    access_token    TEXT NOT NULL,
    refresh_token   TEXT,
    settings        TEXT NOT NULL DEFAULT '{}',
    created_at      TEXT NOT NULL,
    updated_at      TEXT NOT NULL,
    last_active_at  TEXT
);

CREATE TABLE IF NOT EXISTS conversation (
    id              TEXT PRIMARY KEY NOT NULL,
    ticket_id       INTEGER NOT NULL,
    customer_id     INTEGER,
    agent_id        INTEGER,
    status          TEXT NOT NULL CHECK(status IN ('OPEN','WAITING','ON_HOLD','RESOLVED','CLOSED')),
    subject         TEXT,
    priority        TEXT,
    tags            TEXT NOT NULL DEFAULT '[]',
    metadata        TEXT NOT NULL DEFAULT '{}',
    created_at      TEXT NOT NULL,
    updated_at      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS message (
    id              TEXT PRIMARY KEY NOT NULL,
    conversation_id TEXT NOT NULL,
    content         TEXT NOT NULL,
    sender          TEXT NOT NULL CHECK(sender IN ('AGENT','CUSTOMER')),
    channel         TEXT,
    metadata        TEXT NOT NULL DEFAULT '{}',
    created_at      TEXT NOT NULL,
    updated_at      TEXT NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_installation_triple
    ON installation(subdomain, app_id, user_id);
CREATE INDEX IF NOT EXISTS idx_conversation_ticket ON conversation(ticket_id);
CREATE INDEX IF NOT EXISTS idx_message_conversation ON message(conversation_id);
";

    sqlx::raw_sql(ddl).execute(pool).await?;
    Ok(())
}
