//! Metric registry: a fixed set of definitions, each with its series store.

use apiexp_core::error::Result;
use apiexp_core::metric::{self, validate_definitions};
use apiexp_core::{LabelKey, MetricDefinition, MetricKind, RequestEvent, ValueSource};

use super::exposition;
use super::series::{CounterVec, GaugeVec, SeriesStore};

struct MetricFamily {
    def: MetricDefinition,
    store: SeriesStore,
}

impl MetricFamily {
    fn new(def: MetricDefinition) -> Self {
        let store = match def.kind() {
            MetricKind::Counter => SeriesStore::Counter(CounterVec::default()),
            MetricKind::Gauge => SeriesStore::Gauge(GaugeVec::default()),
        };
        Self { def, store }
    }
}

/// Point-in-time copy of one metric, used for exposition.
#[derive(Debug, Clone, PartialEq)]
pub struct FamilySnapshot {
    pub name: String,
    pub help: String,
    pub kind: MetricKind,
    pub label_names: Vec<&'static str>,
    pub samples: Vec<(LabelKey, f64)>,
}

pub struct MetricRegistry {
    families: Vec<MetricFamily>,
    scraper_signature: String,
}

impl MetricRegistry {
    /// Register `defs`. Fails on duplicate names or invalid label sets.
    pub fn new(defs: Vec<MetricDefinition>, scraper_signature: impl Into<String>) -> Result<Self> {
        validate_definitions(&defs)?;
        Ok(Self {
            families: defs.into_iter().map(MetricFamily::new).collect(),
            scraper_signature: scraper_signature.into(),
        })
    }

    /// Registry with the built-in metric set.
    pub fn with_defaults(scraper_signature: impl Into<String>) -> Result<Self> {
        Self::new(metric::default_definitions(), scraper_signature)
    }

    pub fn scraper_signature(&self) -> &str {
        &self.scraper_signature
    }

    /// Apply one completed request to every request-driven metric.
    ///
    /// Scraper traffic is not counted; it zeroes every windowed series instead.
    pub fn record(&self, event: RequestEvent) {
        if event.is_scrape(&self.scraper_signature) {
            tracing::debug!(user_agent = %event.user_agent, "scrape request, resetting windows");
            self.reset_windows();
            return;
        }

        for f in &self.families {
            let delta = match f.def.source() {
                ValueSource::Requests => 1.0,
                ValueSource::LatencyNanos => event.latency_nanos(),
                ValueSource::UptimeTicks | ValueSource::DroppedEvents => continue,
            };
            f.store.add(LabelKey::derive(f.def.labels(), &event), delta);
        }
    }

    /// Zero every windowed series, keeping label keys.
    pub fn reset_windows(&self) {
        for f in &self.families {
            if let SeriesStore::Gauge(g) = &f.store {
                g.reset();
            }
        }
    }

    /// One uptime tick.
    pub fn tick_uptime(&self) {
        self.bump(ValueSource::UptimeTicks);
    }

    /// One event dropped by a full recording queue.
    pub fn count_dropped(&self) {
        self.bump(ValueSource::DroppedEvents);
    }

    fn bump(&self, source: ValueSource) {
        for f in self.families.iter().filter(|f| f.def.source() == source) {
            f.store.add(LabelKey::empty(), 1.0);
        }
    }

    /// Current value of one series, `None` if the metric or key is unknown.
    pub fn value(&self, name: &str, key: &LabelKey) -> Option<f64> {
        self.families
            .iter()
            .find(|f| f.def.name() == name)
            .and_then(|f| f.store.get(key))
    }

    /// Label keys and values of one metric, sorted by key.
    pub fn samples(&self, name: &str) -> Vec<(LabelKey, f64)> {
        self.families
            .iter()
            .find(|f| f.def.name() == name)
            .map(|f| f.store.samples())
            .unwrap_or_default()
    }

    /// Read-only copy of every metric in registration order.
    pub fn snapshot(&self) -> Vec<FamilySnapshot> {
        self.families
            .iter()
            .map(|f| FamilySnapshot {
                name: f.def.name().to_string(),
                help: f.def.help().to_string(),
                kind: f.def.kind(),
                label_names: f.def.labels().iter().map(|l| l.as_str()).collect(),
                samples: f.store.samples(),
            })
            .collect()
    }

    /// Prometheus text exposition of the current snapshot.
    pub fn render(&self) -> String {
        exposition::render(&self.snapshot())
    }
}
