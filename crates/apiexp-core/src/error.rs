//! Shared error type across apiexp crates.

use thiserror::Error;

/// Stable error codes, used in logs and asserted by tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Config file could not be parsed or failed validation.
    InvalidConfig,
    /// Config `version` is not supported.
    UnsupportedVersion,
    /// Metric definitions rejected at startup.
    Registration,
    /// Internal failure (io, bind, runtime).
    Internal,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::InvalidConfig => "INVALID_CONFIG",
            ErrorCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ErrorCode::Registration => "REGISTRATION",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, ApiExpError>;

/// Unified error type used by core and server.
#[derive(Debug, Error)]
pub enum ApiExpError {
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("unsupported config version: {0}")]
    UnsupportedVersion(u32),
    #[error("duplicate metric name: {0}")]
    DuplicateMetric(String),
    #[error("invalid metric {metric}: {reason}")]
    InvalidMetric { metric: String, reason: String },
    #[error("unknown label name: {0}")]
    UnknownLabel(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl ApiExpError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ApiExpError::InvalidConfig(_) => ErrorCode::InvalidConfig,
            ApiExpError::UnsupportedVersion(_) => ErrorCode::UnsupportedVersion,
            ApiExpError::DuplicateMetric(_)
            | ApiExpError::InvalidMetric { .. }
            | ApiExpError::UnknownLabel(_) => ErrorCode::Registration,
            ApiExpError::Internal(_) => ErrorCode::Internal,
        }
    }

    pub(crate) fn invalid_metric(metric: &str, reason: impl Into<String>) -> Self {
        ApiExpError::InvalidMetric {
            metric: metric.to_string(),
            reason: reason.into(),
        }
    }
}
