//! Exporter config loader (strict parsing).

pub mod schema;

use std::fs;
use std::io::ErrorKind;

use apiexp_core::error::{ApiExpError, Result};

pub use schema::{ExporterConfig, MetricsSection, ServerSection};

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "APIEXP_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "apiexp.yaml";

pub fn load_from_file(path: &str) -> Result<ExporterConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| ApiExpError::Internal(format!("read config {path} failed: {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<ExporterConfig> {
    let cfg: ExporterConfig = serde_yaml::from_str(s)
        .map_err(|e| ApiExpError::InvalidConfig(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Like [`load_from_file`], but a missing file yields the built-in defaults.
pub fn load_or_default(path: &str) -> Result<ExporterConfig> {
    match fs::read_to_string(path) {
        Ok(s) => load_from_str(&s),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::info!(path, "config file not found, using defaults");
            Ok(ExporterConfig::default())
        }
        Err(e) => Err(ApiExpError::Internal(format!("read config {path} failed: {e}"))),
    }
}

/// `$APIEXP_CONFIG` must exist when set; the default path may be absent.
pub fn load_from_env() -> Result<ExporterConfig> {
    match std::env::var(CONFIG_ENV) {
        Ok(path) => load_from_file(&path),
        Err(_) => load_or_default(DEFAULT_CONFIG_PATH),
    }
}
