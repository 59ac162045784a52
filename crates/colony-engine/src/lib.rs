//! Headless host for the colony simulation.
//!
//! The library half of the engine binary: the demo colony the citizens
//! share, their target tables, the spawner and the tick callback that runs
//! colony-level upkeep.
//!
//! # Modules
//!
//! - [`callback`] -- Per-tick colony upkeep ([`ColonyCallback`]).
//! - [`citizens`] -- Builder and deliveryman target tables.
//! - [`colony`] -- The shared colony state ([`Colony`]).
//! - [`error`] -- Top-level [`EngineError`].
//! - [`spawner`] -- Hiring the configured citizens.
//!
//! [`ColonyCallback`]: callback::ColonyCallback
//! [`Colony`]: colony::Colony
//! [`EngineError`]: error::EngineError

pub mod callback;
pub mod citizens;
pub mod colony;
pub mod error;
pub mod spawner;
