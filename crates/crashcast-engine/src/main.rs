//! Engine binary for the crashcast crash game.
//!
//! This is the main entry point that wires together the round loop, the
//! `PostgreSQL` round store, the observer server, and the shutdown hook.
//! It loads configuration, initializes all subsystems, and runs the round
//! loop until a clean stop is requested.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `crashcast-config.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Connect to `PostgreSQL` and run migrations
//! 4. Start the observer API server
//! 5. Install the Ctrl-C stop hook
//! 6. Run the round loop
//! 7. Close the pool and log the result

mod callback;
mod error;

use std::path::Path;
use std::sync::Arc;

use crashcast_core::config::EngineConfig;
use crashcast_core::control::ControlState;
use crashcast_core::generator::GeneratorState;
use crashcast_core::runner;
use crashcast_db::{PgRoundStore, PostgresPool};
use crashcast_observer::{AppState, ServerConfig, spawn_observer};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::callback::BroadcastCallback;
use crate::error::EngineError;

/// Application entry point for the engine.
///
/// Initializes all subsystems and runs the round loop. Returns an error
/// if any initialization step fails; the loop itself only exits on a
/// clean stop.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let config = load_config()?;

    // 2. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!("crashcast-engine starting");
    info!(
        seed = config.game.seed,
        tick_interval_ms = config.game.tick_interval_ms,
        inter_round_pause_ms = config.game.inter_round_pause_ms,
        backlog_target = config.game.backlog_target,
        "Configuration loaded"
    );

    // 3. Connect to PostgreSQL and run migrations.
    let pool = PostgresPool::connect_url(&config.infrastructure.postgres_url)
        .await
        .map_err(EngineError::from)?;
    pool.run_migrations().await.map_err(EngineError::from)?;
    let store = PgRoundStore::new(&pool);

    // 4. Start the observer API server.
    let app_state = Arc::new(AppState::new());
    let server_config = ServerConfig {
        host: config.infrastructure.observer_host.clone(),
        port: config.infrastructure.observer_port,
    };
    let _observer_handle = spawn_observer(&server_config, Arc::clone(&app_state))
        .await
        .map_err(EngineError::from)?;
    info!(
        port = config.infrastructure.observer_port,
        "Observer API server started"
    );

    // 5. Install the Ctrl-C stop hook. The round in progress drains
    //    before the loop exits.
    let control = Arc::new(ControlState::new(
        config.game.tick_interval_ms,
        config.game.inter_round_pause_ms,
    ));
    {
        let control = Arc::clone(&control);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Ctrl-C received, draining the current round");
                control.request_stop();
            }
        });
    }

    // 6. Run the round loop.
    let mut generator = GeneratorState::new();
    let mut rng = if config.game.seed == 0 {
        SmallRng::from_os_rng()
    } else {
        SmallRng::seed_from_u64(config.game.seed)
    };
    let mut callback = BroadcastCallback::new(Arc::clone(&app_state));

    info!("Entering round loop");
    let summary = runner::run_rounds(
        &store,
        &mut generator,
        &mut rng,
        &control,
        &mut callback,
        &config.game,
    )
    .await;

    // 7. Shut down.
    pool.close().await;
    info!(
        end_reason = ?summary.end_reason,
        rounds_played = summary.rounds_played,
        "crashcast-engine shutdown complete"
    );

    Ok(())
}

/// Load the engine configuration from `crashcast-config.yaml`.
///
/// Looks for the config file relative to the current working directory;
/// falls back to defaults (with env overrides applied) when it is absent.
fn load_config() -> Result<EngineConfig, EngineError> {
    let config_path = Path::new("crashcast-config.yaml");
    if config_path.exists() {
        let config = EngineConfig::from_file(config_path)?;
        Ok(config)
    } else {
        let mut config = EngineConfig::default();
        config.infrastructure.apply_env_overrides();
        Ok(config)
    }
}
