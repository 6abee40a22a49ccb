//! Prometheus metrics recorder and `/metrics` endpoint handler.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::info;

/// Install the Prometheus metrics recorder (global).
///
/// Returns the `PrometheusHandle` used to render the `/metrics` endpoint.
/// Must be called once at server startup before any metrics are recorded.
pub fn install_recorder() -> PrometheusHandle {
    let builder = PrometheusBuilder::new();
    let handle = builder
        .install_recorder()
        .expect("failed to install metrics recorder");
    info!("prometheus metrics recorder installed");
    handle
}

/// Render Prometheus text format from the installed recorder.
pub fn render(handle: &PrometheusHandle) -> String {
    handle.render()
}

// Metric name constants to avoid typos across modules.

/// Messages accepted into the buffer (counter).
pub const RELAY_ENQUEUED_TOTAL: &str = "relay_enqueued_total";
/// Messages delivered to a consumer (counter).
pub const RELAY_DELIVERED_TOTAL: &str = "relay_delivered_total";
/// Messages currently queued (gauge).
pub const RELAY_BUFFER_DEPTH: &str = "relay_buffer_depth";
/// Active WebSocket sessions (gauge, labels: role).
pub const WS_SESSIONS_ACTIVE: &str = "ws_sessions_active";
/// Sessions ended by an error rather than a clean close
/// (counter, labels: role, kind).
pub const WS_SESSION_ERRORS_TOTAL: &str = "ws_session_errors_total";
