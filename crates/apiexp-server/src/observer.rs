//! Request observation middleware.
//!
//! Wraps every route: notes the start time, runs the handler, then builds a
//! [`RequestEvent`] from owned copies of the request attributes and the final
//! status, and hands it to the recording queue without waiting.

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header::USER_AGENT, HeaderMap},
    middleware::Next,
    response::Response,
};
use tokio::time::Instant;

use apiexp_core::RequestEvent;

use crate::obs::EventQueue;

const X_FORWARDED_FOR: &str = "x-forwarded-for";
const X_REAL_IP: &str = "x-real-ip";

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// First `X-Forwarded-For` hop, then `X-Real-IP`, then the socket peer.
pub fn client_ip(req: &Request) -> String {
    let headers = req.headers();
    if let Some(first) = header_str(headers, X_FORWARDED_FOR)
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        return first.to_string();
    }
    if let Some(real) = header_str(headers, X_REAL_IP) {
        return real.to_string();
    }
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_default()
}

pub async fn observe(State(events): State<EventQueue>, req: Request, next: Next) -> Response {
    let start = Instant::now();

    let client_ip = client_ip(&req);
    let method = req.method().as_str().to_string();
    let path = req.uri().path().to_string();
    let user_agent = header_str(req.headers(), USER_AGENT.as_str())
        .unwrap_or_default()
        .to_string();

    let resp = next.run(req).await;

    let latency = start.elapsed();
    let status = resp.status().as_u16();
    tracing::info!(ip = %client_ip, %method, %path, status, ?latency, "request");

    events.submit(RequestEvent {
        client_ip,
        user_agent,
        method,
        path,
        status,
        latency,
    });
    resp
}
