//! Clock, scheduler and run loop for the colony simulation.
//!
//! This crate drives the citizen AIs of `colony-ai` on a shared tick clock
//! and wraps the scheduler in an async, operator-controlled run loop.
//!
//! # Modules
//!
//! - [`clock`] -- Monotonic tick clock ([`TickClock`]).
//! - [`config`] -- Configuration loading from `colony-config.yaml` into
//!   strongly-typed structs.
//! - [`operator`] -- Pause, resume, speed and stop controls.
//! - [`runner`] -- The async run loop ([`run_colony`]).
//! - [`scheduler`] -- Per-tick agent evaluation ([`Scheduler`]).
//!
//! [`TickClock`]: clock::TickClock
//! [`run_colony`]: runner::run_colony
//! [`Scheduler`]: scheduler::Scheduler

pub mod clock;
pub mod config;
pub mod operator;
pub mod runner;
pub mod scheduler;
