//! WebSocket session handling.
//!
//! ## Submodules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `producer` | `/ws/producer` upgrade + ingest/echo loop |
//! | `consumer` | `/ws/consumer` upgrade + delivery loop |
//! | `error` | Session-local error taxonomy |
//!
//! ## Data Flow
//!
//! `producer` → relay buffer → `consumer`. The buffer is the only thing
//! the two sides share; there is no affinity between a given producer
//! and a given consumer.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use metrics::gauge;

use crate::metrics::WS_SESSIONS_ACTIVE;

pub mod consumer;
pub mod error;
pub mod producer;

pub use error::SessionError;

/// A session's role on the relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Supplies messages into the buffer.
    Producer,
    /// Withdraws messages from the buffer for delivery.
    Consumer,
}

impl Role {
    /// Label used in logs, session IDs, and metric labels.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Producer => "producer",
            Self::Consumer => "consumer",
        }
    }
}

/// Live counts of connected sessions per role.
pub struct SessionGauges {
    producers: AtomicUsize,
    consumers: AtomicUsize,
}

impl SessionGauges {
    /// Create zeroed gauges.
    pub fn new() -> Self {
        Self {
            producers: AtomicUsize::new(0),
            consumers: AtomicUsize::new(0),
        }
    }

    /// Record a session entering; the returned guard decrements on drop.
    pub fn enter(self: &Arc<Self>, role: Role) -> SessionGuard {
        let _ = self.slot(role).fetch_add(1, Ordering::Relaxed);
        gauge!(WS_SESSIONS_ACTIVE, "role" => role.as_str()).increment(1.0);
        SessionGuard {
            gauges: Arc::clone(self),
            role,
        }
    }

    /// Connected producer sessions.
    pub fn producers(&self) -> usize {
        self.producers.load(Ordering::Relaxed)
    }

    /// Connected consumer sessions.
    pub fn consumers(&self) -> usize {
        self.consumers.load(Ordering::Relaxed)
    }

    fn slot(&self, role: Role) -> &AtomicUsize {
        match role {
            Role::Producer => &self.producers,
            Role::Consumer => &self.consumers,
        }
    }
}

impl Default for SessionGauges {
    fn default() -> Self {
        Self::new()
    }
}

/// RAII guard keeping a session counted while its loop runs.
pub struct SessionGuard {
    gauges: Arc<SessionGauges>,
    role: Role,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let _ = self.gauges.slot(self.role).fetch_sub(1, Ordering::Relaxed);
        gauge!(WS_SESSIONS_ACTIVE, "role" => self.role.as_str()).decrement(1.0);
    }
}
