//! Error types for the engine binary.

use crashcast_core::config::ConfigError;
use crashcast_db::DbError;
use crashcast_observer::StartupError;

/// Errors that can occur while starting the engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying configuration error.
        #[from]
        source: ConfigError,
    },

    /// The database could not be reached or migrated.
    #[error("database error: {source}")]
    Database {
        /// The underlying data-layer error.
        #[from]
        source: DbError,
    },

    /// The observer server could not start.
    #[error("observer error: {source}")]
    Observer {
        /// The underlying startup error.
        #[from]
        source: StartupError,
    },
}
