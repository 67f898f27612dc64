//! Bounded recording queue.
//!
//! Request handlers hand events to an [`EventQueue`] with `try_send` and never
//! wait. A single recording task drains the queue into the registry. When the
//! queue is full the newest event is dropped and counted in
//! `http_request_events_dropped`.
//!
//! Scraper requests never enter the queue: they close the current window on
//! the caller's task. Each queued event carries the window epoch it was
//! submitted in, and events from a closed window are discarded when drained.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use apiexp_core::RequestEvent;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::registry::MetricRegistry;

pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

struct Queued {
    epoch: u64,
    event: RequestEvent,
}

#[derive(Clone)]
pub struct EventQueue {
    tx: mpsc::Sender<Queued>,
    registry: Arc<MetricRegistry>,
    epoch: Arc<AtomicU64>,
}

impl EventQueue {
    /// Enqueue without waiting. Returns false if the event was dropped.
    ///
    /// A scraper request is applied immediately and always accepted.
    pub fn submit(&self, event: RequestEvent) -> bool {
        if event.is_scrape(self.registry.scraper_signature()) {
            self.epoch.fetch_add(1, Ordering::AcqRel);
            tracing::debug!(user_agent = %event.user_agent, "scrape request, resetting windows");
            self.registry.reset_windows();
            return true;
        }

        let epoch = self.epoch.load(Ordering::Acquire);
        match self.tx.try_send(Queued { epoch, event }) {
            Ok(()) => true,
            Err(TrySendError::Full(q)) => {
                self.registry.count_dropped();
                tracing::warn!(path = %q.event.path, "recording queue full, event dropped");
                false
            }
            Err(TrySendError::Closed(q)) => {
                tracing::debug!(path = %q.event.path, "recording queue closed, event dropped");
                false
            }
        }
    }
}

fn apply(registry: &MetricRegistry, epoch: &AtomicU64, q: Queued) {
    if q.epoch == epoch.load(Ordering::Acquire) {
        registry.record(q.event);
    }
}

/// Spawn the recording task. On cancellation it drains what is already queued,
/// then exits.
pub fn spawn_recorder(
    registry: Arc<MetricRegistry>,
    capacity: usize,
    cancel: CancellationToken,
) -> (EventQueue, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::channel::<Queued>(capacity.max(1));
    let epoch = Arc::new(AtomicU64::new(0));
    let queue = EventQueue {
        tx,
        registry: Arc::clone(&registry),
        epoch: Arc::clone(&epoch),
    };

    let task = tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                maybe = rx.recv() => match maybe {
                    Some(q) => apply(&registry, &epoch, q),
                    None => break,
                },
                _ = cancel.cancelled() => {
                    rx.close();
                    while let Some(q) = rx.recv().await {
                        apply(&registry, &epoch, q);
                    }
                    break;
                }
            }
        }
    });

    (queue, task)
}
