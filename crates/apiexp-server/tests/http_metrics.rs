//! End-to-end: requests through the router land in the registry.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use tower::ServiceExt;

use apiexp_core::metric::{
    self, HTTP_REQUEST_FROM_NUM, HTTP_REQUEST_LATENCY_TOTAL, HTTP_REQUEST_NUM,
    HTTP_REQUEST_STATUS_NUM,
};
use apiexp_core::LabelKey;
use apiexp_server::app_state::AppState;
use apiexp_server::config::ExporterConfig;
use apiexp_server::obs::{Exporter, MetricRegistry};
use apiexp_server::router;

const CURL: &str = "curl/8.5.0";
const SCRAPER: &str = "Prometheus/2.48.0";

fn start() -> (Exporter, Router) {
    let cfg = ExporterConfig::default();
    let exporter = Exporter::start(metric::default_definitions(), &cfg.metrics).unwrap();
    let app = router::build_router(AppState::new(&exporter));
    (exporter, app)
}

async fn get(app: &Router, uri: &str, ua: &str) -> (StatusCode, String) {
    let req = Request::builder()
        .uri(uri)
        .header("user-agent", ua)
        .header("x-forwarded-for", "10.1.2.3, 172.16.0.1")
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

fn k<const N: usize>(values: [&str; N]) -> LabelKey {
    LabelKey::from_values(values)
}

async fn eventually(registry: &MetricRegistry, name: &str, key: LabelKey, want: f64) {
    for _ in 0..200 {
        if registry.value(name, &key) == Some(want) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("{name}{:?} never reached {want}", key.values());
}

#[tokio::test]
async fn sample_routes_answer_with_their_status() {
    let (exporter, app) = start();

    assert_eq!(get(&app, "/200", CURL).await, (StatusCode::OK, "200".into()));
    assert_eq!(get(&app, "/401", CURL).await.0, StatusCode::UNAUTHORIZED);
    assert_eq!(get(&app, "/500", CURL).await.0, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(get(&app, "/nope", CURL).await.0, StatusCode::NOT_FOUND);

    let (status, body) = get(&app, "/", CURL).await;
    assert_eq!(status, StatusCode::OK);
    let routes: Vec<String> = serde_json::from_str(&body).unwrap();
    assert_eq!(routes, ["/200", "/401", "/500"]);

    exporter.shutdown().await;
}

#[tokio::test]
async fn counts_then_scrape_resets_windows() {
    let (exporter, app) = start();
    let registry = exporter.registry();

    for _ in 0..3 {
        get(&app, "/200", CURL).await;
    }
    get(&app, "/401", CURL).await;
    eventually(&registry, HTTP_REQUEST_NUM, k(["/401"]), 1.0).await;

    assert_eq!(registry.value(HTTP_REQUEST_NUM, &k(["/200"])), Some(3.0));
    assert_eq!(registry.value(HTTP_REQUEST_STATUS_NUM, &k(["200", "/200"])), Some(3.0));
    assert_eq!(registry.value(HTTP_REQUEST_STATUS_NUM, &k(["401", "/401"])), Some(1.0));
    assert_eq!(
        registry.value(HTTP_REQUEST_FROM_NUM, &k(["10.1.2.3", "/200", "200"])),
        Some(3.0)
    );

    // Read through the endpoint with a non-scraper agent: values unchanged.
    let (status, body) = get(&app, "/metrics", CURL).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("# TYPE http_request_num gauge"));
    assert!(body.contains("http_request_num{path=\"/200\"} 3"));
    assert!(body.contains("http_request_status_num{code=\"401\",path=\"/401\"} 1"));
    assert!(body.contains("# TYPE uptime counter"));
    eventually(&registry, HTTP_REQUEST_NUM, k(["/metrics"]), 1.0).await;

    get(&app, "/metrics", SCRAPER).await;
    get(&app, "/200", CURL).await;
    exporter.shutdown().await;

    assert_eq!(registry.value(HTTP_REQUEST_NUM, &k(["/200"])), Some(1.0));
    assert_eq!(registry.value(HTTP_REQUEST_NUM, &k(["/401"])), Some(0.0));
    assert_eq!(registry.value(HTTP_REQUEST_STATUS_NUM, &k(["200", "/200"])), Some(1.0));
    assert_eq!(registry.value(HTTP_REQUEST_STATUS_NUM, &k(["401", "/401"])), Some(0.0));
    // The non-scraper read of /metrics was counted, then zeroed by the scrape.
    assert_eq!(registry.value(HTTP_REQUEST_NUM, &k(["/metrics"])), Some(0.0));
    let latency = registry.value(HTTP_REQUEST_LATENCY_TOTAL, &k(["/401"]));
    assert_eq!(latency, Some(0.0));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_requests_are_all_counted() {
    let (exporter, app) = start();
    let registry = exporter.registry();

    let mut handles = Vec::new();
    for _ in 0..50 {
        let app = app.clone();
        handles.push(tokio::spawn(async move { get(&app, "/200", CURL).await }));
    }
    for h in handles {
        assert_eq!(h.await.unwrap().0, StatusCode::OK);
    }
    exporter.shutdown().await;

    assert_eq!(registry.value(HTTP_REQUEST_NUM, &k(["/200"])), Some(50.0));
}
