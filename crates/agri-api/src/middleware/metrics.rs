//! # Prometheus Metrics
//!
//! HTTP-level metrics (request counts, latency, errors) are recorded by
//! [`metrics_middleware`]. Domain gauges (seasons and tasks by status, user
//! count) are refreshed on each `/metrics` scrape by the handler in `lib.rs`.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use prometheus::{
    core::Collector, Encoder, Gauge, GaugeVec, HistogramOpts, HistogramVec, IntCounterVec, Opts,
    Registry, TextEncoder,
};

/// Shared metrics state backed by a Prometheus registry.
#[derive(Clone)]
pub struct ApiMetrics {
    inner: Arc<Inner>,
}

struct Inner {
    registry: Registry,

    http_requests_total: IntCounterVec,
    http_request_duration_seconds: HistogramVec,
    http_errors_total: IntCounterVec,

    seasons_total: GaugeVec,
    tasks_total: GaugeVec,
    users_total: Gauge,
}

impl std::fmt::Debug for ApiMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiMetrics")
            .field("requests", &self.requests())
            .field("errors", &self.errors())
            .finish()
    }
}

impl ApiMetrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let http_requests_total = IntCounterVec::new(
            Opts::new("agri_http_requests_total", "Total HTTP requests"),
            &["method", "path", "status"],
        )
        .expect("metric can be created");

        let http_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "agri_http_request_duration_seconds",
                "HTTP request duration in seconds",
            )
            .buckets(vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),
            &["method", "path"],
        )
        .expect("metric can be created");

        let http_errors_total = IntCounterVec::new(
            Opts::new("agri_http_errors_total", "Total HTTP errors (4xx and 5xx)"),
            &["method", "path", "status"],
        )
        .expect("metric can be created");

        let seasons_total = GaugeVec::new(
            Opts::new("agri_seasons_total", "Seasons by status"),
            &["status"],
        )
        .expect("metric can be created");

        let tasks_total = GaugeVec::new(Opts::new("agri_tasks_total", "Tasks by status"), &["status"])
            .expect("metric can be created");

        let users_total =
            Gauge::new("agri_users_total", "Registered user accounts").expect("metric can be created");

        let collectors: Vec<Box<dyn Collector>> = vec![
            Box::new(http_requests_total.clone()),
            Box::new(http_request_duration_seconds.clone()),
            Box::new(http_errors_total.clone()),
            Box::new(seasons_total.clone()),
            Box::new(tasks_total.clone()),
            Box::new(users_total.clone()),
        ];
        for collector in collectors {
            registry
                .register(collector)
                .expect("metric can be registered");
        }

        Self {
            inner: Arc::new(Inner {
                registry,
                http_requests_total,
                http_request_duration_seconds,
                http_errors_total,
                seasons_total,
                tasks_total,
                users_total,
            }),
        }
    }

    /// Total request count across all labels.
    pub fn requests(&self) -> u64 {
        sum_counter(&self.inner.http_requests_total)
    }

    /// Total 4xx/5xx count across all labels.
    pub fn errors(&self) -> u64 {
        sum_counter(&self.inner.http_errors_total)
    }

    fn record_request(&self, method: &str, path: &str, status: u16, duration_secs: f64) {
        let status_str = status.to_string();
        self.inner
            .http_requests_total
            .with_label_values(&[method, path, &status_str])
            .inc();

        self.inner
            .http_request_duration_seconds
            .with_label_values(&[method, path])
            .observe(duration_secs);

        if status >= 400 {
            self.inner
                .http_errors_total
                .with_label_values(&[method, path, &status_str])
                .inc();
        }
    }

    pub fn seasons_total(&self) -> &GaugeVec {
        &self.inner.seasons_total
    }

    pub fn tasks_total(&self) -> &GaugeVec {
        &self.inner.tasks_total
    }

    pub fn users_total(&self) -> &Gauge {
        &self.inner.users_total
    }

    /// Gather all metrics and encode to Prometheus text format.
    pub fn gather_and_encode(&self) -> Result<String, String> {
        let encoder = TextEncoder::new();
        let metric_families = self.inner.registry.gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|e| format!("failed to encode metrics: {e}"))?;
        String::from_utf8(buffer).map_err(|e| format!("metrics encoding produced invalid UTF-8: {e}"))
    }
}

impl Default for ApiMetrics {
    fn default() -> Self {
        Self::new()
    }
}

fn sum_counter(counter: &IntCounterVec) -> u64 {
    counter
        .collect()
        .iter()
        .flat_map(|mf| mf.get_metric())
        .map(|m| m.get_counter().get_value() as u64)
        .sum()
}

/// Replace UUID path segments with `{id}` to bound label cardinality.
fn normalize_path(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            if uuid::Uuid::parse_str(segment).is_ok() {
                "{id}"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Middleware that records HTTP request metrics.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let metrics = request.extensions().get::<ApiMetrics>().cloned();
    let method = request.method().to_string();
    let path = normalize_path(request.uri().path());
    let start = Instant::now();

    let response = next.run(request).await;

    if let Some(m) = metrics {
        m.record_request(
            &method,
            &path,
            response.status().as_u16(),
            start.elapsed().as_secs_f64(),
        );
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_zero() {
        let m = ApiMetrics::new();
        assert_eq!(m.requests(), 0);
        assert_eq!(m.errors(), 0);
    }

    #[test]
    fn errors_are_counted_separately() {
        let m = ApiMetrics::new();
        for _ in 0..4 {
            m.record_request("GET", "/v1/seasons", 200, 0.01);
        }
        m.record_request("POST", "/v1/seasons", 409, 0.02);
        m.record_request("GET", "/v1/tasks/{id}", 404, 0.01);
        assert_eq!(m.requests(), 6);
        assert_eq!(m.errors(), 2);
    }

    #[test]
    fn clone_shares_counters() {
        let m = ApiMetrics::new();
        let clone = m.clone();
        m.record_request("GET", "/v1/crops", 200, 0.01);
        assert_eq!(clone.requests(), 1);
    }

    #[test]
    fn encode_includes_domain_gauges() {
        let m = ApiMetrics::new();
        m.seasons_total().with_label_values(&["ACTIVE"]).set(2.0);
        m.tasks_total().with_label_values(&["PENDING"]).set(5.0);
        m.users_total().set(3.0);
        m.record_request("GET", "/v1/seasons", 200, 0.01);

        let output = m.gather_and_encode().unwrap();
        assert!(output.contains("agri_http_requests_total"));
        assert!(output.contains("agri_seasons_total{status=\"ACTIVE\"} 2"));
        assert!(output.contains("agri_tasks_total"));
        assert!(output.contains("agri_users_total 3"));
    }

    #[test]
    fn normalize_path_replaces_ids() {
        assert_eq!(
            normalize_path("/v1/seasons/550e8400-e29b-41d4-a716-446655440000/status"),
            "/v1/seasons/{id}/status"
        );
        assert_eq!(
            normalize_path("/v1/crops/550e8400e29b41d4a716446655440000/varieties"),
            "/v1/crops/{id}/varieties"
        );
        assert_eq!(normalize_path("/v1/users/me"), "/v1/users/me");
    }
}
