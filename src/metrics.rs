//! Prometheus registrations shared by both binaries, grounded in
//! `examples/original_source/pkg/metrics/metrics.go` and the registry
//! pattern of `abacus-base/src/metrics.rs`.

use prometheus::register_counter_vec_with_registry;
use prometheus::register_counter_with_registry;
use prometheus::register_histogram_vec_with_registry;
use prometheus::register_histogram_with_registry;
use prometheus::Counter;
use prometheus::CounterVec;
use prometheus::Encoder;
use prometheus::Histogram;
use prometheus::HistogramVec;
use prometheus::Registry;
use prometheus::TextEncoder;

/// `GET /metrics` on `campaign-api` (ambient HTTP metrics, not named in
/// spec.md but carried per-instruction since the teacher instruments every
/// request it serves).
#[derive(Clone)]
pub struct ApiMetrics {
    pub http_requests_total: CounterVec,
    pub http_request_duration_seconds: HistogramVec,
    registry: Registry,
}

impl ApiMetrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();
        let http_requests_total = register_counter_vec_with_registry!(
            "api_http_requests_total",
            "HTTP requests",
            &["method", "path", "status"],
            registry
        )?;
        let http_request_duration_seconds = register_histogram_vec_with_registry!(
            "api_http_request_duration_seconds",
            "HTTP request duration",
            &["method", "path"],
            registry
        )?;
        Ok(Self { http_requests_total, http_request_duration_seconds, registry })
    }

    pub fn gather(&self) -> String { gather_text(&self.registry) }
}

/// Worker-side counters/histogram named in SPEC_FULL.md §4.4. Served on
/// `METRICS_ADDR` rather than multiplexed with the HTTP API, since the
/// worker runs no other HTTP surface.
#[derive(Clone)]
pub struct WorkerMetrics {
    pub jobs_consumed_total: Counter,
    pub jobs_sent_total: Counter,
    pub jobs_failed_total: Counter,
    pub job_retries_total: Counter,
    pub job_process_duration_seconds: Histogram,
    registry: Registry,
}

impl WorkerMetrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();
        let jobs_consumed_total = register_counter_with_registry!(
            "jobs_consumed_total",
            "Jobs consumed from the queue",
            registry
        )?;
        let jobs_sent_total = register_counter_with_registry!(
            "jobs_sent_total",
            "Jobs sent successfully",
            registry
        )?;
        let jobs_failed_total = register_counter_with_registry!(
            "jobs_failed_total",
            "Jobs that failed at least one send attempt",
            registry
        )?;
        let job_retries_total = register_counter_with_registry!(
            "job_retries_total",
            "Retries performed",
            registry
        )?;
        let job_process_duration_seconds = register_histogram_with_registry!(
            "job_process_duration_seconds",
            "Time spent processing one delivery end to end",
            registry
        )?;
        Ok(Self {
            jobs_consumed_total,
            jobs_sent_total,
            jobs_failed_total,
            job_retries_total,
            job_process_duration_seconds,
            registry,
        })
    }

    pub fn gather(&self) -> String { gather_text(&self.registry) }
}

fn gather_text(registry: &Registry) -> String {
    let encoder = TextEncoder::new();
    let metric_families = registry.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).expect("prometheus encoding is infallible");
    String::from_utf8(buffer).expect("prometheus text output is always valid utf-8")
}
