//! Observer API server for the crashcast round engine.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **`WebSocket` endpoint** (`/ws/game`) streaming round-start,
//!   live-score, and crash events via [`tokio::sync::broadcast`], with an
//!   `initData` catch-up frame sent to every new connection
//! - **REST endpoints** for the current round snapshot and the recent
//!   round history
//! - **Minimal HTML status page** (`GET /`)
//!
//! # Architecture
//!
//! The observer reads from an in-memory [`LiveSnapshot`] that the engine
//! updates on every round-lifecycle emission. REST reads and `WebSocket`
//! catch-up both serve from this snapshot, so the observer never blocks
//! the round loop and there is exactly one copy of the live score.
//! `WebSocket` observers receive events via a broadcast channel with
//! automatic lag handling.
//!
//! [`LiveSnapshot`]: state::LiveSnapshot

pub mod handlers;
pub mod router;
pub mod server;
pub mod startup;
pub mod state;
pub mod ws;

// Re-export primary types for convenience.
pub use router::build_router;
pub use server::{ServerConfig, ServerError, start_server};
pub use startup::{StartupError, spawn_observer};
pub use state::{AppState, LiveSnapshot};
