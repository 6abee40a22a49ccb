//! `RelayServer` — Axum HTTP + WebSocket server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::extract::State;
use axum::response::Json;
use axum::routing::get;
use metrics_exporter_prometheus::PrometheusHandle;
use relay_core::RelayBuffer;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::config::ServerConfig;
use crate::health::{self, HealthResponse};
use crate::shutdown::ShutdownCoordinator;
use crate::ws::{self, SessionGauges};

/// Shared state accessible from Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// The relay buffer all sessions share.
    pub buffer: Arc<RelayBuffer>,
    /// Per-role session counts.
    pub gauges: Arc<SessionGauges>,
    /// Shutdown coordinator.
    pub shutdown: Arc<ShutdownCoordinator>,
    /// When the server started.
    pub start_time: Instant,
    /// Prometheus render handle for `/metrics`.
    pub metrics: PrometheusHandle,
    /// Max WebSocket message size in bytes.
    pub max_message_size: usize,
}

/// The relay server.
pub struct RelayServer {
    config: ServerConfig,
    buffer: Arc<RelayBuffer>,
    gauges: Arc<SessionGauges>,
    shutdown: Arc<ShutdownCoordinator>,
    start_time: Instant,
    metrics: PrometheusHandle,
}

impl RelayServer {
    /// Create a new server. The buffer is built once here and handed to
    /// every session by shared ownership.
    pub fn new(config: ServerConfig, metrics: PrometheusHandle) -> Self {
        let buffer = match config.capacity {
            Some(capacity) => RelayBuffer::bounded(capacity),
            None => RelayBuffer::unbounded(),
        };
        Self {
            config,
            buffer: Arc::new(buffer),
            gauges: Arc::new(SessionGauges::new()),
            shutdown: Arc::new(ShutdownCoordinator::new()),
            start_time: Instant::now(),
            metrics,
        }
    }

    /// Build the Axum router with all routes.
    pub fn router(&self) -> Router {
        let state = AppState {
            buffer: self.buffer.clone(),
            gauges: self.gauges.clone(),
            shutdown: self.shutdown.clone(),
            start_time: self.start_time,
            metrics: self.metrics.clone(),
            max_message_size: self.config.max_message_size,
        };

        Router::new()
            .route("/ws/producer", get(ws::producer::upgrade))
            .route("/ws/consumer", get(ws::consumer::upgrade))
            .route("/health", get(health_handler))
            .route("/metrics", get(metrics_handler))
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }

    /// Bind and serve in a background task.
    ///
    /// Returns the bound address and the serve task handle; the task
    /// drains gracefully once [`ShutdownCoordinator::shutdown`] fires.
    pub async fn listen(&self) -> std::io::Result<(SocketAddr, JoinHandle<()>)> {
        let listener =
            tokio::net::TcpListener::bind((self.config.host.as_str(), self.config.port)).await?;
        let addr = listener.local_addr()?;
        let app = self.router();
        let token = self.shutdown.token();

        let handle = tokio::spawn(async move {
            let serve = axum::serve(listener, app).with_graceful_shutdown(token.cancelled_owned());
            if let Err(err) = serve.await {
                error!(error = %err, "server error");
            }
        });

        Ok((addr, handle))
    }

    /// Get the shared relay buffer.
    pub fn buffer(&self) -> &Arc<RelayBuffer> {
        &self.buffer
    }

    /// Get the shutdown coordinator.
    pub fn shutdown(&self) -> &Arc<ShutdownCoordinator> {
        &self.shutdown
    }

    /// Get the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Get the per-role session gauges.
    pub fn gauges(&self) -> &Arc<SessionGauges> {
        &self.gauges
    }
}

/// GET /health
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let resp = health::health_check(
        state.start_time,
        state.buffer.stats(),
        state.gauges.producers(),
        state.gauges.consumers(),
    );
    Json(resp)
}

/// GET /metrics
async fn metrics_handler(State(state): State<AppState>) -> String {
    crate::metrics::render(&state.metrics)
}
