//! Axum router wiring.
//!
//! Sample routes, `/healthz` and `/metrics`, all wrapped by the observer
//! middleware (the fallback included, so 404s are counted too).

use axum::{middleware, routing::get, Router};

use crate::{app_state::AppState, demo, observer, ops};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(demo::index))
        .route("/200", get(demo::ok))
        .route("/401", get(demo::unauthorized))
        .route("/500", get(demo::internal_error))
        .route("/healthz", get(ops::healthz))
        .route("/metrics", get(ops::metrics))
        .fallback(demo::not_found)
        .layer(middleware::from_fn_with_state(state.events(), observer::observe))
        .with_state(state)
}
