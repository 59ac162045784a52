//! The shared tick clock.
//!
//! Every agent of a scheduler is evaluated against the same tick number.
//! The clock starts at tick 0; the scheduler advances it and then evaluates
//! the tick it was on.

/// Errors that can occur during clock operations.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// Tick counter would overflow.
    #[error("tick counter overflow: cannot advance beyond u64::MAX")]
    TickOverflow,
}

/// Monotonic tick counter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickClock {
    tick: u64,
}

impl TickClock {
    /// Create a clock at tick 0.
    pub const fn new() -> Self {
        Self { tick: 0 }
    }

    /// Restore a clock at `tick`.
    pub const fn at(tick: u64) -> Self {
        Self { tick }
    }

    /// The tick that will be evaluated next.
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Advance by one tick and return the new tick number.
    pub fn advance(&mut self) -> Result<u64, ClockError> {
        self.tick = self.tick.checked_add(1).ok_or(ClockError::TickOverflow)?;
        Ok(self.tick)
    }

    /// Whether the current tick falls on a period boundary, e.g. the colony
    /// maintenance pass that runs every `period` ticks. A zero period never
    /// matches.
    pub const fn is_every(&self, period: u64) -> bool {
        match self.tick.checked_rem(period) {
            Some(rem) => rem == 0,
            None => false,
        }
    }
}
