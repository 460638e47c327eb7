//! Prometheus metrics for the server
//!
//! Counters and histograms are recorded through the `metrics` facade;
//! the Prometheus exporter renders them at GET /metrics.

use std::time::Duration;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

static PROMETHEUS: OnceCell<PrometheusHandle> = OnceCell::new();

/// Install the Prometheus recorder as the global metrics sink.
///
/// Returns `None` if a recorder is already installed (e.g. in tests);
/// recording macros degrade to no-ops in that case.
pub fn init_metrics() -> Option<PrometheusHandle> {
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            let _ = PROMETHEUS.set(handle.clone());
            Some(handle)
        },
        Err(e) => {
            tracing::warn!("Failed to install Prometheus recorder: {}", e);
            None
        },
    }
}

/// Axum handler for GET /metrics (Prometheus exposition format)
pub async fn metrics_handler() -> String {
    PROMETHEUS.get().map(|h| h.render()).unwrap_or_default()
}

pub fn record_request(endpoint: &'static str) {
    metrics::counter!("sauti_http_requests_total", "endpoint" => endpoint).increment(1);
}

pub fn record_error(kind: &'static str) {
    metrics::counter!("sauti_errors_total", "kind" => kind).increment(1);
}

pub fn record_session_opened() {
    metrics::counter!("sauti_sessions_opened_total").increment(1);
    metrics::gauge!("sauti_sessions_active").increment(1.0);
}

pub fn record_session_closed() {
    metrics::gauge!("sauti_sessions_active").decrement(1.0);
}

pub fn record_grievance_created() {
    metrics::counter!("sauti_grievances_created_total").increment(1);
}

pub fn record_tool_call(outcome: &'static str) {
    metrics::counter!("sauti_tool_calls_total", "outcome" => outcome).increment(1);
}

pub fn record_extraction_latency(elapsed: Duration) {
    metrics::histogram!("sauti_extraction_duration_seconds").record(elapsed.as_secs_f64());
}

pub fn record_translation_latency(elapsed: Duration) {
    metrics::histogram!("sauti_translation_duration_seconds").record(elapsed.as_secs_f64());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_handler_renders_empty_before_init() {
        // No recorder installed in tests; the handler must not panic.
        assert_eq!(metrics_handler().await, "");
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        record_request("/api/grievances");
        record_error("extraction");
        record_session_opened();
        record_session_closed();
        record_grievance_created();
        record_tool_call("ok");
        record_extraction_latency(Duration::from_millis(120));
        record_translation_latency(Duration::from_millis(80));
    }
}
