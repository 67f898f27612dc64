//! In-process metrics engine.
//!
//! Series live in `DashMap`s of atomic f64 values and are rendered by the
//! `/metrics` handler in the Prometheus text format. [`Exporter`] owns the
//! registry together with its background tasks (window reset, uptime ticks,
//! recording queue) and stops them on [`Exporter::shutdown`].

pub mod exposition;
pub mod recorder;
pub mod registry;
pub mod scheduler;
pub mod series;

use std::sync::Arc;
use std::time::Duration;

use apiexp_core::error::Result;
use apiexp_core::MetricDefinition;

use crate::config::MetricsSection;

pub use recorder::EventQueue;
pub use registry::{FamilySnapshot, MetricRegistry};
pub use scheduler::{Background, ResetScheduler, UptimeCounter};

pub struct Exporter {
    registry: Arc<MetricRegistry>,
    events: EventQueue,
    background: Background,
}

impl Exporter {
    /// Register `defs` and spawn the background tasks. Must run inside a
    /// tokio runtime.
    pub fn start(defs: Vec<MetricDefinition>, cfg: &MetricsSection) -> Result<Self> {
        let registry = Arc::new(MetricRegistry::new(defs, cfg.scraper_signature.clone())?);
        let mut background = Background::new();

        let (events, recorder) =
            recorder::spawn_recorder(Arc::clone(&registry), cfg.queue_capacity, background.token());
        background.push("recorder", recorder);

        let reset = ResetScheduler::new(
            Arc::clone(&registry),
            Duration::from_millis(cfg.reset_interval_ms),
        );
        background.push("reset-scheduler", reset.spawn(background.token()));

        let uptime =
            UptimeCounter::new(Arc::clone(&registry), Duration::from_millis(cfg.uptime_tick_ms));
        background.push("uptime-counter", uptime.spawn(background.token()));

        tracing::info!(
            reset_interval_ms = cfg.reset_interval_ms,
            uptime_tick_ms = cfg.uptime_tick_ms,
            queue_capacity = cfg.queue_capacity,
            "metrics exporter started"
        );

        Ok(Self {
            registry,
            events,
            background,
        })
    }

    pub fn registry(&self) -> Arc<MetricRegistry> {
        Arc::clone(&self.registry)
    }

    pub fn events(&self) -> EventQueue {
        self.events.clone()
    }

    /// Stop the background tasks; queued events are recorded first.
    pub async fn shutdown(self) {
        let tasks = self.background.len();
        self.background.shutdown().await;
        tracing::info!(tasks, "metrics exporter stopped");
    }
}
