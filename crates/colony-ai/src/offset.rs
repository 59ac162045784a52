//! Phase offsets for target throttling.
//!
//! Every target is throttled to fire only every `tick_rate` ticks. If all
//! targets with the same rate fired on the same absolute tick, load would
//! spike on those ticks. Each new target therefore takes a phase from a
//! rotating counter that cycles through `0..MAX_AI_TICKRATE_VARIANT`.
//!
//! The process-wide counter returned by [`OffsetCounter::global`] starts at 0
//! when the process starts and is never reset. Callers that need
//! reproducible phases (tests, deterministic replays) pass their own
//! [`OffsetCounter`] instead.

use std::sync::atomic::{AtomicU32, Ordering};

/// Lowest allowed tick rate.
pub const MIN_AI_TICKRATE: u32 = 1;

/// Highest allowed tick rate.
pub const MAX_AI_TICKRATE: u32 = 500;

/// Size of the phase counter cycle.
pub const MAX_AI_TICKRATE_VARIANT: u32 = 50;

static GLOBAL: OffsetCounter = OffsetCounter::new();

/// Clamp a requested tick rate into `[MIN_AI_TICKRATE, MAX_AI_TICKRATE]`.
///
/// Zero and negative requests become 1.
pub fn clamp_tick_rate(requested: i64) -> u32 {
    let clamped = requested.clamp(i64::from(MIN_AI_TICKRATE), i64::from(MAX_AI_TICKRATE));
    u32::try_from(clamped).unwrap_or(MIN_AI_TICKRATE)
}

/// Rotating phase counter.
#[derive(Debug, Default)]
pub struct OffsetCounter {
    next: AtomicU32,
}

impl OffsetCounter {
    /// Create a counter starting at 0.
    pub const fn new() -> Self {
        Self {
            next: AtomicU32::new(0),
        }
    }

    /// The process-wide counter used by [`crate::AiTargetBuilder::build`].
    pub fn global() -> &'static Self {
        &GLOBAL
    }

    /// Take the current value and advance, wrapping back to 0 at
    /// [`MAX_AI_TICKRATE_VARIANT`].
    pub fn advance(&self) -> u32 {
        let step = |current: u32| {
            Some(
                current
                    .checked_add(1)
                    .filter(|next| *next < MAX_AI_TICKRATE_VARIANT)
                    .unwrap_or(0),
            )
        };
        match self.next.fetch_update(Ordering::Relaxed, Ordering::Relaxed, step) {
            Ok(previous) | Err(previous) => previous,
        }
    }

    /// Peek at the value the next target will receive.
    pub fn peek(&self) -> u32 {
        self.next.load(Ordering::Relaxed)
    }
}
