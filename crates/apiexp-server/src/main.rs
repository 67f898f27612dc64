//! apiexp server
//!
//! A small HTTP service instrumented by the request observer:
//! - sample routes: /, /200, /401, /500
//! - Prometheus scrape endpoint: /metrics
//! - windowed request metrics reset every `metrics.reset_interval_ms`
//! - graceful shutdown on Ctrl-C

use std::net::SocketAddr;
use std::process::ExitCode;

use tracing_subscriber::{fmt, EnvFilter};

use apiexp_core::error::{ApiExpError, Result};
use apiexp_core::metric;
use apiexp_server::{app_state::AppState, config, obs::Exporter, router};

#[tokio::main]
async fn main() -> ExitCode {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, code = e.code().as_str(), "apiexp-server failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let cfg = config::load_from_env()?;
    let listen = cfg.listen_addr()?;

    let exporter = Exporter::start(metric::default_definitions(), &cfg.metrics)?;
    let state = AppState::new(&exporter);
    let app = router::build_router(state);

    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| ApiExpError::Internal(format!("bind {listen} failed: {e}")))?;
    tracing::info!(%listen, "apiexp-server starting");

    let served = axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiExpError::Internal(format!("server failed: {e}")));

    exporter.shutdown().await;
    served
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "ctrl_c listener error");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
