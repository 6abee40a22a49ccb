//! # relay-core
//!
//! The relay buffer: a shared, async FIFO queue of opaque JSON values
//! that decouples producer sessions from consumer sessions. This crate
//! has no I/O — the WebSocket plumbing lives in `relay-server`.

#![deny(unsafe_code)]

pub mod buffer;

pub use buffer::{BufferStats, RelayBuffer};
