//! Citizen behavior scheduling for the colony simulation.
//!
//! A citizen's AI is a finite state machine driven by a table of
//! [`AiTarget`]s. Each tick the table is scanned in priority order and the
//! first target whose state, throttle and predicate gates all pass runs its
//! action; the action's result becomes the next state.
//!
//! # Modules
//!
//! - [`agent`] -- The per-agent driver ([`AiAgent`]) and the object-safe
//!   [`Tickable`] seam used by the scheduler.
//! - [`error`] -- Errors raised by predicates and actions ([`TargetError`]).
//! - [`offset`] -- Tick-rate clamping and the rotating phase counter.
//! - [`state`] -- The [`AiState`] marker and the [`TargetState`] matcher.
//! - [`table`] -- The ordered, tombstoned [`TargetTable`].
//! - [`target`] -- [`AiTarget`] and its builder.

pub mod agent;
pub mod error;
pub mod offset;
pub mod state;
pub mod table;
pub mod target;

pub use agent::{AgentTick, AiAgent, Tickable};
pub use error::{HostError, TargetError};
pub use offset::{
    MAX_AI_TICKRATE, MAX_AI_TICKRATE_VARIANT, MIN_AI_TICKRATE, OffsetCounter, clamp_tick_rate,
};
pub use state::{AiState, TargetState};
pub use table::{Fired, TargetId, TargetTable};
pub use target::{Action, AiTarget, AiTargetBuilder, Predicate};
