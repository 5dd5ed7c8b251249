//! Metrics collection for gateway monitoring.

use std::collections::BTreeMap;
use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use fxgate_fx::FxEngineStats;
use parking_lot::Mutex;

/// Upper bounds (seconds) of the request duration histogram buckets.
pub const DURATION_BUCKETS: [f64; 11] = [
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

/// Routes served by the gateway, used as the `endpoint` label.
const KNOWN_ENDPOINTS: [&str; 7] = [
    "/",
    "/health",
    "/currencies",
    "/convert",
    "/metrics",
    "/cache/clear",
    "/trace",
];

/// Label for any path outside [`KNOWN_ENDPOINTS`].
pub const UNMATCHED_ENDPOINT: &str = "unmatched";

/// Map a request path onto a bounded set of endpoint labels.
pub fn endpoint_label(path: &str) -> &'static str {
    KNOWN_ENDPOINTS
        .iter()
        .copied()
        .find(|known| *known == path)
        .unwrap_or(UNMATCHED_ENDPOINT)
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct RequestKey {
    method: String,
    endpoint: &'static str,
    status: u16,
}

#[derive(Debug, Clone, Default)]
struct Histogram {
    /// Per-bucket (non-cumulative) counts; the last slot is `+Inf`.
    buckets: [u64; DURATION_BUCKETS.len() + 1],
    sum: f64,
    count: u64,
}

impl Histogram {
    fn observe(&mut self, seconds: f64) {
        let idx = DURATION_BUCKETS
            .iter()
            .position(|bound| seconds <= *bound)
            .unwrap_or(DURATION_BUCKETS.len());
        self.buckets[idx] += 1;
        self.sum += seconds;
        self.count += 1;
    }
}

/// Gateway metrics.
pub struct Metrics {
    /// Completed requests by method, endpoint and status.
    requests: Mutex<BTreeMap<RequestKey, u64>>,
    /// Request latency by endpoint.
    durations: Mutex<BTreeMap<&'static str, Histogram>>,
    /// Requests currently being served.
    requests_active: AtomicU64,
    /// Successful conversions.
    conversions_total: AtomicU64,
    /// Failed upstream rate fetches.
    upstream_failures: AtomicU64,
}

impl Metrics {
    /// Create new metrics instance.
    pub fn new() -> Self {
        Self {
            requests: Mutex::new(BTreeMap::new()),
            durations: Mutex::new(BTreeMap::new()),
            requests_active: AtomicU64::new(0),
            conversions_total: AtomicU64::new(0),
            upstream_failures: AtomicU64::new(0),
        }
    }

    /// Mark a request as in flight until the returned guard is dropped.
    pub fn request_started(&self) -> ActiveRequest<'_> {
        self.requests_active.fetch_add(1, Ordering::Relaxed);
        ActiveRequest { metrics: self }
    }

    /// Record a completed request.
    pub fn request_completed(&self, method: &str, path: &str, status: u16, elapsed: Duration) {
        let endpoint = endpoint_label(path);
        let key = RequestKey {
            method: method.to_string(),
            endpoint,
            status,
        };
        *self.requests.lock().entry(key).or_insert(0) += 1;
        self.durations
            .lock()
            .entry(endpoint)
            .or_default()
            .observe(elapsed.as_secs_f64());
    }

    /// Increment successful conversions.
    pub fn conversion_completed(&self) {
        self.conversions_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment failed upstream fetches.
    pub fn upstream_failed(&self) {
        self.upstream_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current metrics snapshot.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests_total: self.requests.lock().values().sum(),
            requests_active: self.requests_active.load(Ordering::Relaxed),
            conversions_total: self.conversions_total.load(Ordering::Relaxed),
            upstream_failures: self.upstream_failures.load(Ordering::Relaxed),
        }
    }

    /// Export metrics in Prometheus text format.
    pub fn to_prometheus(&self, fx: &FxEngineStats) -> String {
        let snapshot = self.snapshot();
        let mut out = String::new();

        out.push_str(
            "# HELP http_requests_total Total number of HTTP requests.\n\
             # TYPE http_requests_total counter\n",
        );
        for (key, count) in self.requests.lock().iter() {
            let _ = writeln!(
                out,
                "http_requests_total{{method=\"{}\",endpoint=\"{}\",status=\"{}\"}} {}",
                key.method, key.endpoint, key.status, count
            );
        }

        out.push_str(
            "\n# HELP http_request_duration_seconds HTTP request latency in seconds.\n\
             # TYPE http_request_duration_seconds histogram\n",
        );
        for (endpoint, histogram) in self.durations.lock().iter() {
            let mut cumulative = 0;
            for (bound, count) in DURATION_BUCKETS.iter().zip(histogram.buckets.iter()) {
                cumulative += count;
                let _ = writeln!(
                    out,
                    "http_request_duration_seconds_bucket{{endpoint=\"{endpoint}\",le=\"{bound}\"}} {cumulative}"
                );
            }
            let _ = writeln!(
                out,
                "http_request_duration_seconds_bucket{{endpoint=\"{endpoint}\",le=\"+Inf\"}} {}",
                histogram.count
            );
            let _ = writeln!(
                out,
                "http_request_duration_seconds_sum{{endpoint=\"{endpoint}\"}} {}",
                histogram.sum
            );
            let _ = writeln!(
                out,
                "http_request_duration_seconds_count{{endpoint=\"{endpoint}\"}} {}",
                histogram.count
            );
        }

        let _ = write!(
            out,
            r#"
# HELP http_requests_active Requests currently being served.
# TYPE http_requests_active gauge
http_requests_active {}

# HELP currency_conversions_total Total number of currency conversions.
# TYPE currency_conversions_total counter
currency_conversions_total {}

# HELP upstream_failures_total Failed upstream rate fetches.
# TYPE upstream_failures_total counter
upstream_failures_total {}

# HELP cache_size_current Current size of exchange rate cache.
# TYPE cache_size_current gauge
cache_size_current {}

# HELP cache_hits_total Rate lookups served from cache.
# TYPE cache_hits_total counter
cache_hits_total {}

# HELP cache_misses_total Rate lookups that went to the provider.
# TYPE cache_misses_total counter
cache_misses_total {}

# HELP cache_hit_ratio Cache hit ratio.
# TYPE cache_hit_ratio gauge
cache_hit_ratio {}
"#,
            snapshot.requests_active,
            snapshot.conversions_total,
            snapshot.upstream_failures,
            fx.cache_size,
            fx.cache_hits,
            fx.cache_misses,
            fx.hit_ratio(),
        );

        out
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Keeps the active-requests gauge raised while alive.
pub struct ActiveRequest<'a> {
    metrics: &'a Metrics,
}

impl Drop for ActiveRequest<'_> {
    fn drop(&mut self) {
        self.metrics.requests_active.fetch_sub(1, Ordering::Relaxed);
    }
}

/// Snapshot of metrics at a point in time.
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub requests_total: u64,
    pub requests_active: u64,
    pub conversions_total: u64,
    pub upstream_failures: u64,
}
