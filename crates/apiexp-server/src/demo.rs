//! Sample endpoints of the instrumented service.
//!
//! `/200`, `/401` and `/500` answer with their own status code; `/` lists them.

use axum::{http::StatusCode, Json};

pub const ROUTES: [&str; 3] = ["/200", "/401", "/500"];

pub async fn ok() -> (StatusCode, &'static str) {
    (StatusCode::OK, "200")
}

pub async fn unauthorized() -> (StatusCode, &'static str) {
    (StatusCode::UNAUTHORIZED, "401")
}

pub async fn internal_error() -> (StatusCode, &'static str) {
    (StatusCode::INTERNAL_SERVER_ERROR, "500")
}

pub async fn index() -> Json<Vec<&'static str>> {
    Json(ROUTES.to_vec())
}

pub async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "404 page not found")
}
