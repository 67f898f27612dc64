//! apiexp server library entry.
//!
//! Wires the metrics engine (registry, window reset, uptime, recording queue),
//! the request observer middleware, and the HTTP routes into one stack. It is
//! consumed by the binary (`main.rs`) and by integration tests.

pub mod app_state;
pub mod config;
pub mod demo;
pub mod obs;
pub mod observer;
pub mod ops;
pub mod router;
