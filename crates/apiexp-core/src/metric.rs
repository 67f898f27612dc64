//! Metric definitions.
//!
//! A definition is declared once at startup and never changes. Its ordered
//! label list decides how a [`LabelKey`](crate::LabelKey) is built from a
//! [`RequestEvent`](crate::RequestEvent); its [`ValueSource`] decides what
//! quantity feeds it; its [`MetricKind`] decides whether the reset scheduler
//! zeroes it.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::error::{ApiExpError, Result};

pub const HTTP_REQUEST_NUM: &str = "http_request_num";
pub const HTTP_REQUEST_FROM_NUM: &str = "http_request_from_num";
pub const HTTP_REQUEST_STATUS_NUM: &str = "http_request_status_num";
pub const HTTP_REQUEST_LATENCY_TOTAL: &str = "http_request_latency_total";
pub const UPTIME: &str = "uptime";
pub const HTTP_REQUEST_EVENTS_DROPPED: &str = "http_request_events_dropped";

/// Reset behavior of a metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    /// Monotonic for the life of the process.
    Counter,
    /// Windowed: zeroed on every reset tick and on scrape traffic.
    Gauge,
}

impl MetricKind {
    /// Name used on the `# TYPE` exposition line.
    pub fn as_str(self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
        }
    }

    pub fn is_windowed(self) -> bool {
        matches!(self, MetricKind::Gauge)
    }
}

/// Request attributes a metric can be partitioned by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LabelName {
    Ip,
    Method,
    Path,
    Code,
    UserAgent,
}

impl LabelName {
    pub fn as_str(self) -> &'static str {
        match self {
            LabelName::Ip => "ip",
            LabelName::Method => "method",
            LabelName::Path => "path",
            LabelName::Code => "code",
            LabelName::UserAgent => "user_agent",
        }
    }
}

impl fmt::Display for LabelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LabelName {
    type Err = ApiExpError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ip" => Ok(LabelName::Ip),
            "method" => Ok(LabelName::Method),
            "path" => Ok(LabelName::Path),
            "code" => Ok(LabelName::Code),
            "user_agent" => Ok(LabelName::UserAgent),
            other => Err(ApiExpError::UnknownLabel(other.to_string())),
        }
    }
}

/// Which quantity feeds a metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueSource {
    /// +1 per recorded request.
    Requests,
    /// +latency (nanoseconds) per recorded request.
    LatencyNanos,
    /// +1 per uptime tick.
    UptimeTicks,
    /// +1 per event dropped by a full recording queue.
    DroppedEvents,
}

impl ValueSource {
    /// Sources fed by `record`; the others are driven by the runtime itself.
    pub fn is_request_driven(self) -> bool {
        matches!(self, ValueSource::Requests | ValueSource::LatencyNanos)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricDefinition {
    name: String,
    help: String,
    kind: MetricKind,
    source: ValueSource,
    labels: Vec<LabelName>,
}

impl MetricDefinition {
    pub fn new(
        name: impl Into<String>,
        help: impl Into<String>,
        kind: MetricKind,
        source: ValueSource,
        labels: Vec<LabelName>,
    ) -> Self {
        Self {
            name: name.into(),
            help: help.into(),
            kind,
            source,
            labels,
        }
    }

    /// Build a definition from textual label names (`"ip"`, `"path"`, ...).
    pub fn parse_labels(
        name: impl Into<String>,
        help: impl Into<String>,
        kind: MetricKind,
        source: ValueSource,
        labels: &[&str],
    ) -> Result<Self> {
        let labels = labels
            .iter()
            .map(|l| l.parse::<LabelName>())
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(name, help, kind, source, labels))
    }

    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn help(&self) -> &str {
        &self.help
    }
    pub fn kind(&self) -> MetricKind {
        self.kind
    }
    pub fn source(&self) -> ValueSource {
        self.source
    }
    pub fn labels(&self) -> &[LabelName] {
        &self.labels
    }

    /// Check name syntax, label uniqueness and source/label compatibility.
    pub fn validate(&self) -> Result<()> {
        if !is_valid_metric_name(&self.name) {
            return Err(ApiExpError::invalid_metric(
                &self.name,
                "name must match [a-zA-Z_:][a-zA-Z0-9_:]*",
            ));
        }
        let mut seen = HashSet::new();
        for l in &self.labels {
            if !seen.insert(*l) {
                return Err(ApiExpError::invalid_metric(
                    &self.name,
                    format!("label {l} declared twice"),
                ));
            }
        }
        if !self.source.is_request_driven() {
            if !self.labels.is_empty() {
                return Err(ApiExpError::invalid_metric(
                    &self.name,
                    "runtime-driven metrics take no labels",
                ));
            }
            if self.kind != MetricKind::Counter {
                return Err(ApiExpError::invalid_metric(
                    &self.name,
                    "runtime-driven metrics must be counters",
                ));
            }
        }
        Ok(())
    }
}

/// Validate a full definition set: each definition, plus name uniqueness.
pub fn validate_definitions(defs: &[MetricDefinition]) -> Result<()> {
    let mut names = HashSet::new();
    for d in defs {
        d.validate()?;
        if !names.insert(d.name()) {
            return Err(ApiExpError::DuplicateMetric(d.name().to_string()));
        }
    }
    Ok(())
}

fn is_valid_metric_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == ':' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
}

/// The exporter's built-in metric set.
pub fn default_definitions() -> Vec<MetricDefinition> {
    use LabelName::{Code, Ip, Path};

    vec![
        MetricDefinition::new(
            HTTP_REQUEST_NUM,
            "Request numbers in the current window",
            MetricKind::Gauge,
            ValueSource::Requests,
            vec![Path],
        ),
        MetricDefinition::new(
            HTTP_REQUEST_FROM_NUM,
            "Request from IP numbers in the current window",
            MetricKind::Gauge,
            ValueSource::Requests,
            vec![Ip, Path, Code],
        ),
        MetricDefinition::new(
            HTTP_REQUEST_STATUS_NUM,
            "Request status numbers in the current window",
            MetricKind::Gauge,
            ValueSource::Requests,
            vec![Code, Path],
        ),
        MetricDefinition::new(
            HTTP_REQUEST_LATENCY_TOTAL,
            "Total request latency in nanoseconds in the current window",
            MetricKind::Gauge,
            ValueSource::LatencyNanos,
            vec![Path],
        ),
        MetricDefinition::new(
            UPTIME,
            "Uptime in ticks of metrics.uptime_tick_ms (seconds at the default tick)",
            MetricKind::Counter,
            ValueSource::UptimeTicks,
            vec![],
        ),
        MetricDefinition::new(
            HTTP_REQUEST_EVENTS_DROPPED,
            "Request events dropped because the recording queue was full",
            MetricKind::Counter,
            ValueSource::DroppedEvents,
            vec![],
        ),
    ]
}
