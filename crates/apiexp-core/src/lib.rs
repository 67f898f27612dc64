//! apiexp core: the transport-agnostic metric model and error types.
//!
//! This crate defines what a metric is (name, kind, ordered labels, value
//! source), what a request observation looks like, and how an observation is
//! turned into a label key. It intentionally carries no runtime or HTTP
//! dependencies so the model can be reused by the server and by tests alike.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! All fallible paths surface as `ApiExpError`/`Result`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod event;
pub mod metric;

/// Shared result type.
pub use error::{ApiExpError, Result};
pub use event::{LabelKey, RequestEvent};
pub use metric::{LabelName, MetricDefinition, MetricKind, ValueSource};
