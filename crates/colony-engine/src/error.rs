//! Error types for the colony engine.
//!
//! [`EngineError`] is the top-level error type that wraps all possible
//! failure modes during engine startup, the run and the final snapshot.

/// Top-level error for the colony engine.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: colony_core::config::ConfigError,
    },

    /// The run loop failed.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: colony_core::runner::RunnerError,
    },

    /// The colony could not hand out another work-order id.
    #[error("work order error: {source}")]
    WorkOrder {
        /// The underlying work manager error.
        #[from]
        source: colony_workorders::WorkManagerError,
    },

    /// Work-order kinds could not be registered.
    #[error("registry error: {source}")]
    Registry {
        /// The underlying registry error.
        #[from]
        source: colony_workorders::RegistryError,
    },

    /// The colony could not be written out.
    #[error("persistence error: {source}")]
    Persist {
        /// The underlying persistence error.
        #[from]
        source: colony_workorders::PersistError,
    },

    /// Citizen spawning failed.
    #[error("spawner error: {message}")]
    Spawner {
        /// Description of the spawner failure.
        message: String,
    },
}
