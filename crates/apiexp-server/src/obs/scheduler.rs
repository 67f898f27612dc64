//! Periodic background tasks: window reset and uptime ticks.
//!
//! Every task selects on a shared [`CancellationToken`] so [`Background::shutdown`]
//! can stop and join them. A panic inside one tick is caught and logged; the
//! loop carries on with the next tick.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::registry::MetricRegistry;

pub const DEFAULT_RESET_INTERVAL: Duration = Duration::from_secs(60);
pub const DEFAULT_UPTIME_TICK: Duration = Duration::from_secs(1);

/// Owner of the long-lived tasks.
pub struct Background {
    cancel: CancellationToken,
    tasks: Vec<(&'static str, JoinHandle<()>)>,
}

impl Background {
    pub fn new() -> Self {
        Self {
            cancel: CancellationToken::new(),
            tasks: Vec::new(),
        }
    }

    /// Token tasks must observe to stop.
    pub fn token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn push(&mut self, name: &'static str, task: JoinHandle<()>) {
        self.tasks.push((name, task));
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Cancel every task and wait for it to finish.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        for (name, task) in std::mem::take(&mut self.tasks) {
            match task.await {
                Ok(()) => tracing::debug!(task = name, "background task stopped"),
                Err(err) if err.is_cancelled() => {}
                Err(err) => tracing::error!(task = name, error = %err, "background task failed"),
            }
        }
    }
}

impl Default for Background {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Background {
    fn drop(&mut self) {
        self.cancel.cancel();
        for (_, task) in self.tasks.drain(..) {
            task.abort();
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}

/// Run `tick` every `period` (first run one period after spawn) until cancelled.
fn spawn_periodic<F>(
    name: &'static str,
    period: Duration,
    cancel: CancellationToken,
    tick: F,
) -> JoinHandle<()>
where
    F: Fn() + Send + 'static,
{
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(&tick)) {
                        tracing::error!(
                            task = name,
                            panic = panic_message(payload.as_ref()),
                            "tick panicked"
                        );
                    }
                }
            }
        }
    })
}

/// Zeroes every windowed series once per interval.
pub struct ResetScheduler {
    registry: Arc<MetricRegistry>,
    interval: Duration,
}

impl ResetScheduler {
    pub fn new(registry: Arc<MetricRegistry>, interval: Duration) -> Self {
        Self { registry, interval }
    }

    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        let registry = self.registry;
        spawn_periodic("reset-scheduler", self.interval, cancel, move || {
            tracing::debug!("reset metrics");
            registry.reset_windows();
        })
    }
}

/// Adds one to the uptime counter once per tick.
pub struct UptimeCounter {
    registry: Arc<MetricRegistry>,
    tick: Duration,
}

impl UptimeCounter {
    pub fn new(registry: Arc<MetricRegistry>, tick: Duration) -> Self {
        Self { registry, tick }
    }

    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        let registry = self.registry;
        spawn_periodic("uptime-counter", self.tick, cancel, move || registry.tick_uptime())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    use apiexp_core::metric::{HTTP_REQUEST_NUM, UPTIME};
    use apiexp_core::{LabelKey, RequestEvent};

    fn registry() -> Arc<MetricRegistry> {
        Arc::new(MetricRegistry::with_defaults("Prometheus").unwrap())
    }

    fn req(path: &str) -> RequestEvent {
        RequestEvent {
            client_ip: "127.0.0.1".into(),
            user_agent: "curl/8.5".into(),
            method: "GET".into(),
            path: path.into(),
            status: 200,
            latency: Duration::from_millis(1),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn reset_tick_zeroes_windows_and_keeps_keys() {
        let reg = registry();
        let mut bg = Background::new();
        let reset = ResetScheduler::new(Arc::clone(&reg), DEFAULT_RESET_INTERVAL);
        bg.push("reset", reset.spawn(bg.token()));
        let uptime = UptimeCounter::new(Arc::clone(&reg), DEFAULT_UPTIME_TICK);
        bg.push("uptime", uptime.spawn(bg.token()));

        reg.record(req("/200"));
        reg.record(req("/401"));

        tokio::time::sleep(Duration::from_secs(30)).await;
        let key = LabelKey::from_values(["/200"]);
        assert_eq!(reg.value(HTTP_REQUEST_NUM, &key), Some(1.0));
        let uptime_before = reg.value(UPTIME, &LabelKey::empty()).unwrap_or(0.0);

        tokio::time::sleep(Duration::from_millis(30_500)).await;
        assert_eq!(reg.value(HTTP_REQUEST_NUM, &key), Some(0.0));
        assert_eq!(reg.samples(HTTP_REQUEST_NUM).len(), 2);
        let uptime_after = reg.value(UPTIME, &LabelKey::empty()).unwrap_or(0.0);
        assert!(uptime_after > uptime_before);

        bg.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn uptime_counts_ticks() {
        let reg = registry();
        let mut bg = Background::new();
        let uptime = UptimeCounter::new(Arc::clone(&reg), DEFAULT_UPTIME_TICK);
        bg.push("uptime", uptime.spawn(bg.token()));

        tokio::time::sleep(Duration::from_millis(3_500)).await;
        assert_eq!(reg.value(UPTIME, &LabelKey::empty()), Some(3.0));

        bg.shutdown().await;
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(reg.value(UPTIME, &LabelKey::empty()), Some(3.0));
    }

    #[tokio::test(start_paused = true)]
    async fn panicking_tick_does_not_stop_the_loop() {
        let calls = Arc::new(AtomicU32::new(0));
        let seen = Arc::clone(&calls);
        let cancel = CancellationToken::new();
        let task = spawn_periodic("flaky", Duration::from_secs(1), cancel.clone(), move || {
            if seen.fetch_add(1, Ordering::SeqCst) == 0 {
                panic!("first tick fails");
            }
        });

        tokio::time::sleep(Duration::from_millis(3_500)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        cancel.cancel();
        task.await.unwrap();
    }
}
