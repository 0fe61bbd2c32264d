#![forbid(unsafe_code)]

//! `deskbridge` — Zendesk-integrated support backend.
//!
//! Ingests signed helpdesk webhook events, reconciles them against
//! stored conversation state, and fans normalized domain events out to a
//! downstream broker. The installation handshake (OAuth-style code
//! exchange) provisions the secrets that gate the webhook trust
//! boundary.

pub mod auth;
pub mod classifier;
pub mod config;
pub mod directory;
pub mod errors;
pub mod http;
pub mod models;
pub mod persistence;
pub mod publish;
pub mod sync;

pub use config::GlobalConfig;
pub use errors::{AppError, Result};
