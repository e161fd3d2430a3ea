//! Shared type definitions for the crashcast round engine.
//!
//! This crate is the single source of truth for the types that cross crate
//! boundaries: round identifiers, backlog/log entities, and the observer
//! wire protocol. Types defined here flow downstream to `TypeScript` via
//! `ts-rs` for the observer dashboard.
//!
//! # Modules
//!
//! - [`ids`] -- The wall-clock-derived round identifier
//! - [`rounds`] -- Backlog entry and completed-round log entities
//! - [`events`] -- The tagged JSON frames pushed to observers

pub mod events;
pub mod ids;
pub mod rounds;

// Re-export all public types at crate root for convenience.
pub use events::GameEvent;
pub use ids::RoundId;
pub use rounds::{Round, RoundLogEntry};
