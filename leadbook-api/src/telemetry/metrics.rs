//! Prometheus Metrics Definitions
//!
//! Defines all Leadbook metrics with appropriate labels and types.
//! Exposes a /metrics endpoint for Prometheus scraping.

use axum::{http::StatusCode, response::IntoResponse};
use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_histogram_vec, CounterVec, Encoder, HistogramVec, TextEncoder,
};

use crate::error::{ApiError, ApiResult};

/// HTTP request latency buckets (seconds)
/// Covers: 1ms, 5ms, 10ms, 25ms, 50ms, 100ms, 250ms, 500ms, 1s, 2.5s, 5s, 10s
const HTTP_LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0, 2.5, 5.0, 10.0,
];

/// Global metrics instance - initialized once at startup
pub static METRICS: Lazy<ApiResult<LeadbookMetrics>> = Lazy::new(LeadbookMetrics::new);

/// The registered metrics, or `None` if registration failed at startup.
pub fn metrics() -> Option<&'static LeadbookMetrics> {
    METRICS.as_ref().ok()
}

/// Container for all Leadbook metrics.
#[derive(Clone)]
pub struct LeadbookMetrics {
    /// HTTP request counter - labels: method, path, status
    pub http_requests_total: CounterVec,

    /// HTTP request duration histogram - labels: method, path
    pub http_request_duration_seconds: HistogramVec,

    /// Leads handed to an agent - labels: mode (specific/random)
    pub leads_assigned_total: CounterVec,

    /// Leads released - labels: reason (unassign-all/phone-duplicate)
    pub leads_unassigned_total: CounterVec,

    /// Documents fixed by repair - labels: fix_type
    pub repairs_total: CounterVec,
}

impl LeadbookMetrics {
    /// Create and register all metrics with Prometheus.
    pub fn new() -> ApiResult<Self> {
        Ok(Self {
            http_requests_total: register_counter_vec!(
                "leadbook_http_requests_total",
                "Total number of HTTP requests",
                &["method", "path", "status"]
            )
            .map_err(|e| registration_failed("http_requests_total", e))?,

            http_request_duration_seconds: register_histogram_vec!(
                "leadbook_http_request_duration_seconds",
                "HTTP request duration in seconds",
                &["method", "path"],
                HTTP_LATENCY_BUCKETS.to_vec()
            )
            .map_err(|e| registration_failed("http_request_duration_seconds", e))?,

            leads_assigned_total: register_counter_vec!(
                "leadbook_leads_assigned_total",
                "Total number of leads assigned to agents",
                &["mode"]
            )
            .map_err(|e| registration_failed("leads_assigned_total", e))?,

            leads_unassigned_total: register_counter_vec!(
                "leadbook_leads_unassigned_total",
                "Total number of leads released from agents",
                &["reason"]
            )
            .map_err(|e| registration_failed("leads_unassigned_total", e))?,

            repairs_total: register_counter_vec!(
                "leadbook_repairs_total",
                "Total number of lead documents fixed by repair",
                &["fix_type"]
            )
            .map_err(|e| registration_failed("repairs_total", e))?,
        })
    }

    /// Record an HTTP request.
    pub fn record_http_request(&self, method: &str, path: &str, status: u16, duration_secs: f64) {
        let status_str = status.to_string();
        self.http_requests_total
            .with_label_values(&[method, path, status_str.as_str()])
            .inc();
        self.http_request_duration_seconds
            .with_label_values(&[method, path])
            .observe(duration_secs);
    }

    pub fn record_assigned(&self, mode: &str, count: usize) {
        self.leads_assigned_total
            .with_label_values(&[mode])
            .inc_by(count as f64);
    }

    pub fn record_unassigned(&self, reason: &str, count: usize) {
        self.leads_unassigned_total
            .with_label_values(&[reason])
            .inc_by(count as f64);
    }

    pub fn record_repair(&self, fix_type: &str, count: usize) {
        self.repairs_total
            .with_label_values(&[fix_type])
            .inc_by(count as f64);
    }
}

fn registration_failed(name: &str, err: prometheus::Error) -> ApiError {
    ApiError::internal_error(format!("Failed to register {}: {}", name, err))
}

/// Handler for GET /metrics endpoint.
///
/// Returns Prometheus text format metrics.
#[utoipa::path(
    get,
    path = "/metrics",
    tag = "Observability",
    responses(
        (status = 200, description = "Prometheus metrics in text format", content_type = "text/plain"),
        (status = 500, description = "Failed to encode metrics"),
    ),
)]
pub async fn metrics_handler() -> impl IntoResponse {
    if let Err(e) = METRICS.as_ref() {
        tracing::warn!(error = %e, "Leadbook metrics are not registered");
    }

    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();

    match encoder.encode(&metric_families, &mut buffer) {
        Ok(_) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            buffer,
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [("content-type", "text/plain")],
                format!("Failed to encode metrics: {}", e).into_bytes(),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus::core::Collector;

    fn registered() -> Result<&'static LeadbookMetrics, String> {
        METRICS
            .as_ref()
            .map_err(|e| format!("Metrics init failed: {}", e.message))
    }

    #[test]
    fn test_metrics_creation() -> Result<(), String> {
        let metrics = registered()?;
        assert!(!metrics.http_requests_total.desc().is_empty());
        assert!(!metrics.repairs_total.desc().is_empty());
        Ok(())
    }

    #[test]
    fn test_record_assignment_counters() -> Result<(), String> {
        let metrics = registered()?;
        let before = metrics
            .leads_assigned_total
            .with_label_values(&["random"])
            .get();
        metrics.record_assigned("random", 37);
        let after = metrics
            .leads_assigned_total
            .with_label_values(&["random"])
            .get();
        assert!(after - before >= 37.0);
        Ok(())
    }

    #[test]
    fn test_record_http_request() -> Result<(), String> {
        let metrics = registered()?;
        metrics.record_http_request("GET", "/api/v1/agents/{id}", 200, 0.015);
        metrics.record_unassigned("unassign-all", 2);
        metrics.record_repair("inconsistent-data", 1);
        Ok(())
    }
}
