//! `SQLite` persistence: connection bootstrap, schema, and repositories.

pub mod conversation_repo;
pub mod db;
pub mod installation_repo;
pub mod message_repo;
pub mod schema;
