use std::net::SocketAddr;

use apiexp_core::error::{ApiExpError, Result};
use serde::Deserialize;

use crate::obs::{recorder, scheduler};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExporterConfig {
    pub version: u32,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub metrics: MetricsSection,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            version: 1,
            server: ServerSection::default(),
            metrics: MetricsSection::default(),
        }
    }
}

impl ExporterConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(ApiExpError::UnsupportedVersion(self.version));
        }
        self.server.validate()?;
        self.metrics.validate()?;
        Ok(())
    }

    /// Listen address; only valid after `validate`.
    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.server
            .listen
            .parse()
            .map_err(|e| ApiExpError::InvalidConfig(format!("server.listen: {e}")))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

impl ServerSection {
    pub fn validate(&self) -> Result<()> {
        if self.listen.parse::<SocketAddr>().is_err() {
            return Err(ApiExpError::InvalidConfig(format!(
                "server.listen must be a valid socket address, got {:?}",
                self.listen
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetricsSection {
    #[serde(default = "default_reset_interval_ms")]
    pub reset_interval_ms: u64,

    #[serde(default = "default_uptime_tick_ms")]
    pub uptime_tick_ms: u64,

    #[serde(default = "default_scraper_signature")]
    pub scraper_signature: String,

    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

impl Default for MetricsSection {
    fn default() -> Self {
        Self {
            reset_interval_ms: default_reset_interval_ms(),
            uptime_tick_ms: default_uptime_tick_ms(),
            scraper_signature: default_scraper_signature(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

impl MetricsSection {
    pub fn validate(&self) -> Result<()> {
        if !(1_000..=86_400_000).contains(&self.reset_interval_ms) {
            return Err(ApiExpError::InvalidConfig(
                "metrics.reset_interval_ms must be between 1000 and 86400000".into(),
            ));
        }
        if !(10..=60_000).contains(&self.uptime_tick_ms) {
            return Err(ApiExpError::InvalidConfig(
                "metrics.uptime_tick_ms must be between 10 and 60000".into(),
            ));
        }
        if self.scraper_signature.trim().is_empty() {
            return Err(ApiExpError::InvalidConfig(
                "metrics.scraper_signature must not be empty".into(),
            ));
        }
        if !(1..=1_048_576).contains(&self.queue_capacity) {
            return Err(ApiExpError::InvalidConfig(
                "metrics.queue_capacity must be between 1 and 1048576".into(),
            ));
        }
        Ok(())
    }
}

fn default_listen() -> String {
    "0.0.0.0:8080".into()
}
fn default_reset_interval_ms() -> u64 {
    scheduler::DEFAULT_RESET_INTERVAL.as_millis() as u64
}
fn default_uptime_tick_ms() -> u64 {
    scheduler::DEFAULT_UPTIME_TICK.as_millis() as u64
}
fn default_scraper_signature() -> String {
    "Prometheus".into()
}
fn default_queue_capacity() -> usize {
    recorder::DEFAULT_QUEUE_CAPACITY
}
