//! Per-backend request counters, exposed at `GET /metrics`.
//!
//! Counters live in a process-wide collector; the hot path is a read lock
//! plus relaxed atomic increments.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock, RwLock};
use std::time::Instant;

use serde::Serialize;

static COLLECTOR: LazyLock<MetricsCollector> = LazyLock::new(MetricsCollector::new);

#[derive(Debug, Default)]
struct BackendCounters {
    requests_total: AtomicU64,
    requests_failed: AtomicU64,
    latency_sum_ms: AtomicU64,
}

/// Point-in-time view of one backend's counters.
#[derive(Debug, Clone, Serialize)]
pub struct BackendMetrics {
    pub backend: String,
    pub requests_total: u64,
    pub requests_failed: u64,
    pub latency_avg_ms: u64,
}

#[derive(Debug, Default)]
pub struct MetricsCollector {
    backends: RwLock<HashMap<&'static str, Arc<BackendCounters>>>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    fn counters(&self, backend: &'static str) -> Arc<BackendCounters> {
        if let Some(counters) = self.backends.read().unwrap().get(backend) {
            return Arc::clone(counters);
        }
        let mut map = self.backends.write().unwrap();
        Arc::clone(map.entry(backend).or_default())
    }

    fn record(&self, backend: &'static str, failed: bool, latency_ms: u64) {
        let counters = self.counters(backend);
        counters.requests_total.fetch_add(1, Ordering::Relaxed);
        if failed {
            counters.requests_failed.fetch_add(1, Ordering::Relaxed);
        }
        counters.latency_sum_ms.fetch_add(latency_ms, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> Vec<BackendMetrics> {
        let map = self.backends.read().unwrap();
        let mut entries: Vec<BackendMetrics> = map
            .iter()
            .map(|(backend, counters)| {
                let total = counters.requests_total.load(Ordering::Relaxed);
                let latency_sum = counters.latency_sum_ms.load(Ordering::Relaxed);
                BackendMetrics {
                    backend: backend.to_string(),
                    requests_total: total,
                    requests_failed: counters.requests_failed.load(Ordering::Relaxed),
                    latency_avg_ms: if total == 0 { 0 } else { latency_sum / total },
                }
            })
            .collect();
        entries.sort_by(|a, b| a.backend.cmp(&b.backend));
        entries
    }
}

/// Times one backend call and records the outcome on completion.
///
/// Dropping the timer without calling [`RequestTimer::success`] counts the
/// request as failed, so early returns are covered.
pub struct RequestTimer {
    collector: &'static MetricsCollector,
    backend: &'static str,
    start: Instant,
    recorded: bool,
}

impl RequestTimer {
    pub fn success(mut self) {
        self.finish(false);
    }

    pub fn failure(mut self) {
        self.finish(true);
    }

    fn finish(&mut self, failed: bool) {
        self.recorded = true;
        let latency_ms = self.start.elapsed().as_millis() as u64;
        self.collector.record(self.backend, failed, latency_ms);
    }
}

impl Drop for RequestTimer {
    fn drop(&mut self) {
        if !self.recorded {
            self.finish(true);
        }
    }
}

/// Start timing one request against `backend` on the global collector.
pub fn start_request_timer(backend: &'static str) -> RequestTimer {
    RequestTimer {
        collector: &COLLECTOR,
        backend,
        start: Instant::now(),
        recorded: false,
    }
}

/// Snapshot of the global collector.
pub fn snapshot() -> Vec<BackendMetrics> {
    COLLECTOR.snapshot()
}
