//! # relay-server
//!
//! Axum HTTP + `WebSocket` server for the JSON relay.
//!
//! - `WebSocket` endpoints: `/ws/producer` (ingest + echo) and
//!   `/ws/consumer` (delivery from the shared buffer)
//! - HTTP endpoints: `/health`, `/metrics` (Prometheus)
//! - Session loops are isolated: a failing connection only ends its own
//!   session, never the buffer or its peers
//! - Graceful shutdown via a shared `CancellationToken`

#![deny(unsafe_code)]

pub mod config;
pub mod health;
pub mod metrics;
pub mod server;
pub mod shutdown;
pub mod ws;
