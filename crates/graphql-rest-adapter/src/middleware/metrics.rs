//! Adapter metrics.
//!
//! Plain atomic counters; exported as JSON, or in Prometheus text format with
//! the `metrics` feature.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// How a served request ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    /// Classified as success, success transform produced the response
    Success,
    /// Classified as error, error transform produced the response
    UpstreamError,
    /// A transform failed and the response was recovered from its description
    TransformRecovered,
    /// Payload unreadable or unparseable, or the handler panicked
    Fatal,
}

#[derive(Default)]
pub struct AdapterMetrics {
    pub requests_total: AtomicU64,
    pub requests_success: AtomicU64,
    pub requests_upstream_error: AtomicU64,
    pub transform_failures: AtomicU64,
    pub fatal_failures: AtomicU64,

    // Latency tracking (simplified - in production use histograms)
    pub total_latency_ms: AtomicU64,
    pub request_count_for_latency: AtomicU64,
}

impl AdapterMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a served request
    pub fn record_request(&self, outcome: RequestOutcome, latency_ms: u64) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);

        let counter = match outcome {
            RequestOutcome::Success => &self.requests_success,
            RequestOutcome::UpstreamError => &self.requests_upstream_error,
            RequestOutcome::TransformRecovered => &self.transform_failures,
            RequestOutcome::Fatal => &self.fatal_failures,
        };
        counter.fetch_add(1, Ordering::Relaxed);

        self.total_latency_ms
            .fetch_add(latency_ms, Ordering::Relaxed);
        self.request_count_for_latency
            .fetch_add(1, Ordering::Relaxed);
    }

    /// Get average latency in ms
    pub fn average_latency_ms(&self) -> f64 {
        let total = self.total_latency_ms.load(Ordering::Relaxed);
        let count = self.request_count_for_latency.load(Ordering::Relaxed);
        if count == 0 {
            0.0
        } else {
            total as f64 / count as f64
        }
    }

    /// Export metrics in Prometheus format
    #[cfg(feature = "metrics")]
    pub fn to_prometheus(&self) -> String {
        let counters = [
            (
                "rest_adapter_requests_total",
                "Total number of adapted requests",
                &self.requests_total,
            ),
            (
                "rest_adapter_requests_success_total",
                "Requests answered by a success transform",
                &self.requests_success,
            ),
            (
                "rest_adapter_requests_upstream_error_total",
                "Requests answered by the error transform",
                &self.requests_upstream_error,
            ),
            (
                "rest_adapter_transform_failures_total",
                "Requests recovered from a failed transform",
                &self.transform_failures,
            ),
            (
                "rest_adapter_fatal_failures_total",
                "Requests whose execution payload could not be used",
                &self.fatal_failures,
            ),
        ];

        let mut output = String::new();
        for (name, help, value) in counters {
            output.push_str(&format!(
                "# HELP {name} {help}\n# TYPE {name} counter\n{name} {}\n",
                value.load(Ordering::Relaxed)
            ));
        }

        output.push_str(&format!(
            "# HELP rest_adapter_average_latency_ms Average request latency\n\
             # TYPE rest_adapter_average_latency_ms gauge\n\
             rest_adapter_average_latency_ms {:.2}\n",
            self.average_latency_ms()
        ));

        output
    }

    /// Export metrics as JSON
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "requests": {
                "total": self.requests_total.load(Ordering::Relaxed),
                "success": self.requests_success.load(Ordering::Relaxed),
                "upstream_error": self.requests_upstream_error.load(Ordering::Relaxed),
                "transform_failures": self.transform_failures.load(Ordering::Relaxed),
                "fatal": self.fatal_failures.load(Ordering::Relaxed),
            },
            "latency": {
                "average_ms": self.average_latency_ms(),
            }
        })
    }
}

/// Request timing helper.
///
/// Records exactly once: on [`RequestTimer::finish`], or as
/// [`RequestOutcome::Fatal`] when dropped unfinished (a panic unwinding
/// through the handler).
pub struct RequestTimer {
    start: Instant,
    metrics: Arc<AdapterMetrics>,
    finished: bool,
}

impl RequestTimer {
    pub fn new(metrics: Arc<AdapterMetrics>) -> Self {
        Self {
            start: Instant::now(),
            metrics,
            finished: false,
        }
    }

    pub fn finish(mut self, outcome: RequestOutcome) {
        self.record(outcome);
    }

    fn record(&mut self, outcome: RequestOutcome) {
        if self.finished {
            return;
        }
        self.finished = true;
        let latency_ms = self.start.elapsed().as_millis() as u64;
        self.metrics.record_request(outcome, latency_ms);
    }
}

impl Drop for RequestTimer {
    fn drop(&mut self) {
        self.record(RequestOutcome::Fatal);
    }
}
