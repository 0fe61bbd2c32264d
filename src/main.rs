#![forbid(unsafe_code)]

//! `deskbridge` — Zendesk-integrated support backend binary.
//!
//! Bootstraps configuration, the installation directory, the broker
//! publisher, and the HTTP surface for webhooks and the OAuth
//! handshake.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use deskbridge::auth::tokens::TokenAuthority;
use deskbridge::config::GlobalConfig;
use deskbridge::directory::InstallationDirectory;
use deskbridge::http::{server, AppState};
use deskbridge::persistence::db;
use deskbridge::persistence::installation_repo::InstallationRepo;
use deskbridge::publish::broker::BrokerPublisher;
use deskbridge::publish::{DomainEventPublisher, NullPublisher};
use deskbridge::{AppError, Result};

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "deskbridge", about = "Zendesk-integrated support backend", version, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long)]
    config: PathBuf,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Override the configured HTTP port.
    #[arg(long)]
    port: Option<u16>,
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.log_format)?;
    info!("deskbridge server bootstrap");

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))?
        .block_on(run(args))
}

async fn run(args: Cli) -> Result<()> {
    // ── Load configuration ──────────────────────────────
    let mut config = GlobalConfig::load_from_path(&args.config)?;

    if let Some(port) = args.port {
        config.http_port = port;
    }

    // A missing or short signing key is fatal: without it no webhook
    // traffic can be authenticated, so the process refuses to start.
    config.load_signing_key().await?;

    let config = Arc::new(config);
    info!("configuration loaded");

    // ── Initialize database ─────────────────────────────
    let db = Arc::new(db::connect(&config.database_path).await?);
    info!("database connected");

    // ── Warm the installation directory ─────────────────
    let directory = Arc::new(InstallationDirectory::new(InstallationRepo::new(
        Arc::clone(&db),
    )));
    let cached = directory.warm().await?;
    info!(installations = cached, "installation directory warmed");

    // ── Start the broker publisher ──────────────────────
    let ct = CancellationToken::new();
    let (publisher, publisher_handle): (Arc<dyn DomainEventPublisher>, _) =
        if config.broker.url.is_some() {
            let (publisher, handle) = BrokerPublisher::start(&config.broker, ct.clone())?;
            (Arc::new(publisher), Some(handle))
        } else {
            info!("broker not configured; running in local-only mode");
            (Arc::new(NullPublisher::default()), None)
        };

    // ── Build shared application state ──────────────────
    let tokens = Arc::new(TokenAuthority::new(
        &config.signing_key,
        config.tokens.clone(),
        Arc::clone(&directory),
    ));

    let state = Arc::new(AppState {
        config: Arc::clone(&config),
        db,
        directory,
        tokens,
        publisher,
    });

    // ── Serve HTTP ──────────────────────────────────────
    let server_ct = ct.clone();
    let server_state = Arc::clone(&state);
    let server_handle = tokio::spawn(async move {
        if let Err(err) = server::serve(server_state, server_ct).await {
            error!(%err, "http server failed");
        }
    });

    info!("deskbridge ready");

    // ── Wait for shutdown signal ────────────────────────
    shutdown_signal().await;
    info!("shutdown signal received");
    ct.cancel();

    // ── Wait for background tasks ───────────────────────
    let _ = server_handle.await;
    if let Some(handle) = publisher_handle {
        let _ = handle.await;
    }
    info!("deskbridge shut down");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(err) => {
                tracing::warn!(%err, "failed to register SIGTERM handler, using ctrl-c only");
                let _ = ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(err) = ctrl_c.await {
            tracing::error!(%err, "ctrl-c signal handler failed");
        }
    }
}

fn init_tracing(log_format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(env_filter);

    match log_format {
        LogFormat::Text => subscriber
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
    }

    Ok(())
}
