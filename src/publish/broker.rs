//! HTTP broker publisher with a small buffered send queue.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::BrokerConfig;
use crate::models::domain_event::DomainEvent;
use crate::{AppError, Result};

use super::{DomainEventPublisher, PublishStats, StatsSnapshot};

const INITIAL_RETRY_DELAY: Duration = Duration::from_secs(1);
const MAX_RETRY_DELAY: Duration = Duration::from_secs(5);
const MAX_DELIVERY_ATTEMPTS: u32 = 3;

/// Publisher that POSTs domain events as JSON to the configured broker
/// endpoint from a background worker.
///
/// Delivery retries are capped: the webhook acknowledgment contract must
/// never be held hostage by a broken broker, so after the attempt budget
/// an event is counted as failed and dropped rather than blocking the
/// queue indefinitely.
pub struct BrokerPublisher {
    queue_tx: mpsc::Sender<DomainEvent>,
    stats: Arc<PublishStats>,
}

impl BrokerPublisher {
    /// Start the publisher and its background delivery worker.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if no broker URL is configured or the
    /// HTTP client cannot be built.
    pub fn start(config: &BrokerConfig, ct: CancellationToken) -> Result<(Self, JoinHandle<()>)> {
        let url = config
            .url
            .clone()
            .ok_or_else(|| AppError::Config("broker.url is not configured".into()))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(|err| AppError::Config(format!("failed to build broker client: {err}")))?;

        let stats = Arc::new(PublishStats::default());
        let (queue_tx, queue_rx) = mpsc::channel(config.queue_capacity);
        let worker = Self::spawn_worker(client, url, queue_rx, Arc::clone(&stats), ct);

        info!("broker publisher started with buffered queue");

        Ok((Self { queue_tx, stats }, worker))
    }

    fn spawn_worker(
        client: reqwest::Client,
        url: String,
        mut queue_rx: mpsc::Receiver<DomainEvent>,
        stats: Arc<PublishStats>,
        ct: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                let event = tokio::select! {
                    () = ct.cancelled() => break,
                    event = queue_rx.recv() => match event {
                        Some(event) => event,
                        None => break,
                    },
                };

                Self::deliver(&client, &url, &event, &stats).await;
            }
            info!("broker publisher worker exiting");
        })
    }

    /// Attempt delivery with capped exponential backoff.
    async fn deliver(
        client: &reqwest::Client,
        url: &str,
        event: &DomainEvent,
        stats: &PublishStats,
    ) {
        let mut backoff = INITIAL_RETRY_DELAY;
        for attempt in 1..=MAX_DELIVERY_ATTEMPTS {
            match client.post(url).json(event).send().await {
                Ok(response) if response.status().is_success() => {
                    debug!(kind = event.kind(), "published domain event");
                    stats.record_published();
                    return;
                }
                Ok(response) => {
                    warn!(
                        kind = event.kind(),
                        status = %response.status(),
                        attempt,
                        "broker rejected domain event"
                    );
                }
                Err(err) => {
                    warn!(kind = event.kind(), %err, attempt, "broker delivery failed");
                }
            }

            if attempt < MAX_DELIVERY_ATTEMPTS {
                sleep(backoff).await;
                backoff = (backoff * 2).min(MAX_RETRY_DELAY);
            }
        }

        warn!(kind = event.kind(), "dropping domain event after exhausting delivery attempts");
        stats.record_failed();
    }
}

impl DomainEventPublisher for BrokerPublisher {
    fn publish(&self, event: DomainEvent) -> Result<()> {
        let kind = event.kind();
        self.queue_tx.try_send(event).map_err(|err| {
            self.stats.record_dropped();
            AppError::Publish(format!("failed to enqueue {kind}: {err}"))
        })
    }

    fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }
}
