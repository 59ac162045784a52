//! Operator control state for a running colony.
//!
//! Shared between the run loop and whoever controls it (the engine's signal
//! handler, tests). Control fields are atomics so the loop reads them without
//! locking; a [`Notify`] wakes the loop when a paused run resumes.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, Notify};

use crate::config::EngineConfig;

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunEndReason {
    /// Reached the configured `max_ticks`.
    MaxTicksReached,
    /// A stop was requested.
    OperatorStop,
}

/// Shared run control state.
#[derive(Debug)]
pub struct OperatorState {
    /// Whether the run is paused.
    paused: AtomicBool,

    /// Wakes the loop when resumed.
    resume_notify: Notify,

    /// Whether a stop has been requested.
    stop_requested: AtomicBool,

    /// Current tick interval in milliseconds.
    tick_interval_ms: AtomicU64,

    /// Maximum number of ticks (0 = unlimited).
    max_ticks: u64,

    /// Wall-clock start of the run.
    started_at: DateTime<Utc>,

    /// Reason the run ended, once it has.
    end_reason: Mutex<Option<RunEndReason>>,
}

impl OperatorState {
    /// Create control state from the engine configuration.
    pub fn new(config: &EngineConfig) -> Self {
        Self::with_limits(config.tick_interval_ms, config.max_ticks)
    }

    /// Create control state from explicit limits.
    pub fn with_limits(tick_interval_ms: u64, max_ticks: u64) -> Self {
        Self {
            paused: AtomicBool::new(false),
            resume_notify: Notify::new(),
            stop_requested: AtomicBool::new(false),
            tick_interval_ms: AtomicU64::new(tick_interval_ms),
            max_ticks,
            started_at: Utc::now(),
            end_reason: Mutex::new(None),
        }
    }

    // -----------------------------------------------------------------------
    // Pause / Resume
    // -----------------------------------------------------------------------

    /// Whether the run is paused.
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    /// Pause. The loop sleeps before its next tick until resumed.
    pub fn pause(&self) {
        self.paused.store(true, Ordering::Release);
    }

    /// Resume and wake the loop.
    pub fn resume(&self) {
        self.paused.store(false, Ordering::Release);
        self.resume_notify.notify_one();
    }

    /// Wait until the run is no longer paused or a stop is requested.
    pub async fn wait_if_paused(&self) {
        while self.is_paused() && !self.is_stop_requested() {
            self.resume_notify.notified().await;
        }
    }

    // -----------------------------------------------------------------------
    // Stop
    // -----------------------------------------------------------------------

    /// Request a clean stop. Also wakes a paused loop.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
        self.resume_notify.notify_one();
    }

    /// Whether a stop has been requested.
    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    /// Record why the run ended.
    pub async fn set_end_reason(&self, reason: RunEndReason) {
        *self.end_reason.lock().await = Some(reason);
    }

    /// Why the run ended, if it has.
    pub async fn end_reason(&self) -> Option<RunEndReason> {
        *self.end_reason.lock().await
    }

    // -----------------------------------------------------------------------
    // Tick speed and limits
    // -----------------------------------------------------------------------

    /// Current tick interval in milliseconds.
    pub fn tick_interval_ms(&self) -> u64 {
        self.tick_interval_ms.load(Ordering::Acquire)
    }

    /// Change the tick interval, returning the previous one.
    pub fn set_tick_interval_ms(&self, ms: u64) -> u64 {
        self.tick_interval_ms.swap(ms, Ordering::AcqRel)
    }

    /// Whether `ticks_run` has reached the tick limit.
    pub const fn tick_limit_reached(&self, ticks_run: u64) -> bool {
        self.max_ticks > 0 && ticks_run >= self.max_ticks
    }

    /// Configured tick limit (0 = unlimited).
    pub const fn max_ticks(&self) -> u64 {
        self.max_ticks
    }

    /// Wall-clock start of the run.
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Elapsed wall-clock milliseconds since the run started.
    pub fn elapsed_ms(&self) -> u64 {
        let elapsed = Utc::now()
            .signed_duration_since(self.started_at)
            .num_milliseconds();
        u64::try_from(elapsed.max(0)).unwrap_or(u64::MAX)
    }
}
