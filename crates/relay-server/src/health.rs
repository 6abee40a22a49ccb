//! `/health` endpoint.

use std::time::Instant;

use relay_core::BufferStats;
use serde::Serialize;

/// Health check response body.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Always `"ok"` when the server is running.
    pub status: String,
    /// Seconds since the server started.
    pub uptime_secs: u64,
    /// Messages currently queued in the relay buffer.
    pub buffer_depth: usize,
    /// Messages accepted since startup.
    pub enqueued_total: u64,
    /// Messages delivered since startup.
    pub delivered_total: u64,
    /// Connected producer sessions.
    pub producers: usize,
    /// Connected consumer sessions.
    pub consumers: usize,
}

/// Build a health response from live counters.
pub fn health_check(
    start_time: Instant,
    stats: BufferStats,
    producers: usize,
    consumers: usize,
) -> HealthResponse {
    HealthResponse {
        status: "ok".into(),
        uptime_secs: start_time.elapsed().as_secs(),
        buffer_depth: stats.depth,
        enqueued_total: stats.enqueued,
        delivered_total: stats.delivered,
        producers,
        consumers,
    }
}
