//! Shared application state for the exporter's HTTP layer.

use std::sync::Arc;

use crate::obs::{EventQueue, Exporter, MetricRegistry};

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    registry: Arc<MetricRegistry>,
    events: EventQueue,
}

impl AppState {
    /// Borrow handles from a started [`Exporter`]; the exporter keeps
    /// ownership of the background tasks.
    pub fn new(exporter: &Exporter) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                registry: exporter.registry(),
                events: exporter.events(),
            }),
        }
    }

    pub fn registry(&self) -> Arc<MetricRegistry> {
        Arc::clone(&self.inner.registry)
    }

    pub fn events(&self) -> EventQueue {
        self.inner.events.clone()
    }
}
