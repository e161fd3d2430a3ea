//! Round engine for the crashcast crash game.
//!
//! This crate holds everything with temporal coordination or invariants to
//! preserve: crash-point generation, the backlog persistence interface,
//! live-score progression, and the scheduler loop that ties them together.
//! Transport and durable storage are collaborators behind seams
//! ([`RoundCallback`](runner::RoundCallback), [`RoundStore`](store::RoundStore)).
//!
//! # Modules
//!
//! - [`config`] -- Typed YAML configuration with env overrides
//! - [`control`] -- Shared stop/timing control state
//! - [`generator`] -- Crash-point generation policy
//! - [`progression`] -- Live-score climb and crash latch
//! - [`runner`] -- The round scheduler loop
//! - [`store`] -- The `RoundStore` interface + in-memory implementation

pub mod config;
pub mod control;
pub mod generator;
pub mod progression;
pub mod runner;
pub mod store;

// Re-export primary types for convenience.
pub use config::{ConfigError, EngineConfig, GameConfig, InfrastructureConfig, LoggingConfig};
pub use control::ControlState;
pub use generator::{GeneratorState, generate};
pub use progression::{LiveRound, TickOutcome};
pub use runner::{EndReason, NoOpCallback, RoundCallback, RunSummary, run_rounds};
pub use store::{MemoryRoundStore, RoundStore, StoreError};
