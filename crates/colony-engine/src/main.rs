//! Colony engine binary.
//!
//! This is the main entry point that wires together the citizen AIs, the
//! colony's work orders and delivery queues, and the operator-controlled
//! run loop. It loads configuration, hires the demo citizens and runs the
//! colony until a termination condition is met.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `colony-config.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Register the work-order kinds
//! 4. Found the colony and spawn its citizens
//! 5. Create operator state and install the Ctrl-C handler
//! 6. Run the colony loop
//! 7. Log the result and serialize a final snapshot

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use colony_core::config::{LoggingConfig, SimulationConfig};
use colony_core::operator::OperatorState;
use colony_core::runner;
use colony_core::scheduler::Scheduler;
use colony_engine::callback::ColonyCallback;
use colony_engine::colony::{Colony, SharedColony};
use colony_engine::error::EngineError;
use colony_engine::spawner::spawn_citizens;
use colony_types::CitizenState;
use colony_workorders::WorkOrderRegistry;
use tracing::info;
use tracing_subscriber::EnvFilter;

const CONFIG_PATH: &str = "colony-config.yaml";

/// Application entry point for the colony engine.
///
/// # Errors
///
/// Returns an error if any initialization step or the run itself fails.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load configuration. Logging is configured from it, so this comes first.
    let (config, from_file) = load_config().context("loading configuration")?;

    // 2. Initialize structured logging.
    init_logging(&config.logging);
    info!("colony-engine starting");
    if !from_file {
        info!(path = CONFIG_PATH, "Config file not found, using defaults");
    }
    info!(
        colony = %config.colony.name,
        seed = config.colony.seed,
        builders = config.colony.builders,
        deliverymen = config.colony.deliverymen,
        tick_interval_ms = config.engine.tick_interval_ms,
        max_ticks = config.engine.max_ticks,
        "Configuration loaded"
    );

    // 3. Register the work-order kinds.
    let registry = WorkOrderRegistry::standard().map_err(EngineError::from)?;
    info!(kinds = ?registry.kinds().collect::<Vec<_>>(), "Work order kinds registered");

    // 4. Found the colony and spawn its citizens.
    let colony = Colony::new(&config.colony).into_shared();
    let mut scheduler: Scheduler<CitizenState> = Scheduler::new();
    let citizens = spawn_citizens(&config.colony, &colony, &mut scheduler)?;
    info!(citizens = citizens.len(), "Colony founded");

    // 5. Create operator state and install the Ctrl-C handler.
    let operator = Arc::new(OperatorState::new(&config.engine));
    let signal_operator = Arc::clone(&operator);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl-C received, stopping after the current tick");
            signal_operator.request_stop();
        }
    });

    // 6. Run the colony loop.
    let mut callback =
        ColonyCallback::new(SharedColony::clone(&colony), config.engine.colony_tick_period);
    let result = runner::run_colony(&mut scheduler, &operator, &mut callback)
        .await
        .map_err(EngineError::from)?;

    // 7. Log the result and serialize a final snapshot.
    runner::log_run_end(&result, &operator);
    log_snapshot(&colony, &registry)?;

    Ok(())
}

/// Load configuration from `colony-config.yaml`.
///
/// Returns the defaults when the file does not exist, together with whether
/// the file was read.
fn load_config() -> Result<(SimulationConfig, bool), EngineError> {
    let config_path = Path::new(CONFIG_PATH);
    if config_path.exists() {
        let config = SimulationConfig::from_file(config_path)?;
        Ok((config, true))
    } else {
        Ok((SimulationConfig::default(), false))
    }
}

/// Install the tracing subscriber. `RUST_LOG` wins over the configured level.
fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    if config.json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

/// Serialize the colony's work orders and jobs and log what would be saved.
fn log_snapshot(colony: &SharedColony, registry: &WorkOrderRegistry) -> Result<(), EngineError> {
    let colony = colony.borrow();
    let snapshot = colony.snapshot(registry)?;
    let bytes = serde_json::to_vec(&snapshot).map_or(0, |encoded| encoded.len());
    info!(
        colony = %colony.name(),
        open_orders = colony.work().len(),
        top_work_order_id = colony.work().top_id(),
        open_requests = colony.requests().open_requests().count(),
        bytes,
        "Colony snapshot serialized"
    );
    Ok(())
}
