//! Domain event publishing toward the downstream broker.
//!
//! Publishing is a fire-and-record boundary: outcomes are counted and
//! logged, and a failure here never propagates into the webhook
//! acknowledgment path.

pub mod broker;

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use tracing::debug;

use crate::models::domain_event::DomainEvent;
use crate::Result;

/// Hands normalized domain events to the downstream broker.
///
/// `publish` enqueues; delivery happens on a background worker. An error
/// means the event was not accepted into the queue (it was counted as
/// dropped) — callers log it and move on.
pub trait DomainEventPublisher: Send + Sync {
    /// Enqueue an event for delivery.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Publish` if the event could not be queued.
    fn publish(&self, event: DomainEvent) -> Result<()>;

    /// Snapshot of publish counters.
    fn stats(&self) -> StatsSnapshot;
}

/// Monotonic publish counters shared between the queue and its worker.
#[derive(Debug, Default)]
pub struct PublishStats {
    published: AtomicU64,
    failed: AtomicU64,
    dropped: AtomicU64,
}

impl PublishStats {
    pub(crate) fn record_published(&self) {
        self.published.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_dropped(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time snapshot of the counters.
    pub(crate) fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            published: self.published.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time view of the publish counters, surfaced on `/health`.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct StatsSnapshot {
    /// Events delivered to the broker.
    pub published: u64,
    /// Events that exhausted delivery attempts.
    pub failed: u64,
    /// Events rejected at the queue (full or shut down).
    pub dropped: u64,
}

/// Publisher used when no broker is configured.
///
/// Accepts every event and counts it as published so local-only
/// deployments do not alarm on the counters.
#[derive(Debug, Default)]
pub struct NullPublisher {
    stats: PublishStats,
}

impl DomainEventPublisher for NullPublisher {
    fn publish(&self, event: DomainEvent) -> Result<()> {
        debug!(kind = event.kind(), "broker not configured; event discarded");
        self.stats.record_published();
        Ok(())
    }

    fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }
}
