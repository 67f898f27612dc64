//! Top-level facade crate for apiexp.
//!
//! Re-exports the metric model and the server runtime so users can depend on a single crate.

pub mod core {
    pub use apiexp_core::*;
}

pub mod server {
    pub use apiexp_server::*;
}
