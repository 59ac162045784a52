//! A single candidate behavior of a citizen AI.
//!
//! An [`AiTarget`] bundles a required state, a guard predicate, an action and
//! a throttle. On a given tick it fires iff
//!
//! 1. its required state matches the agent's current state (or is the
//!    [`TargetState::BlockingPriority`] wildcard),
//! 2. `(tick + tick_offset) % tick_rate == 0`, and
//! 3. the predicate returns `true`.
//!
//! The action's return value becomes the agent's next state (`None` keeps
//! the current one).

use crate::error::TargetError;
use crate::offset::{OffsetCounter, clamp_tick_rate};
use crate::state::{AiState, TargetState};

/// Guard evaluated once the state gate and throttle have passed.
pub type Predicate<C> = Box<dyn Fn(&C) -> Result<bool, TargetError>>;

/// Behavior run when the target fires. Returns the next state, if any.
pub type Action<S, C> = Box<dyn FnMut(&mut C) -> Result<Option<S>, TargetError>>;

/// A throttled, guarded state-machine transition.
pub struct AiTarget<S, C> {
    state: TargetState<S>,
    predicate: Predicate<C>,
    action: Action<S, C>,
    tick_rate: u32,
    /// Counter value taken at construction; the effective offset is this
    /// value reduced modulo the current tick rate.
    phase: u32,
    okay_to_eat: bool,
    one_shot: bool,
}

impl<S: AiState, C: 'static> AiTarget<S, C> {
    /// Start building a target that runs only in `state`.
    pub fn on(state: S) -> AiTargetBuilder<S, C> {
        AiTargetBuilder::new(TargetState::State(state))
    }

    /// Start building a wildcard target that may run in any state.
    pub fn blocking() -> AiTargetBuilder<S, C> {
        AiTargetBuilder::new(TargetState::BlockingPriority)
    }

    /// The state this target requires.
    pub const fn state(&self) -> TargetState<S> {
        self.state
    }

    /// Effective tick rate, always within `[1, 500]`.
    pub const fn tick_rate(&self) -> u32 {
        self.tick_rate
    }

    /// Change the tick rate at runtime. The value is clamped the same way as
    /// at construction, and the offset stays below the new rate.
    pub fn set_tick_rate(&mut self, requested: i64) {
        self.tick_rate = clamp_tick_rate(requested);
    }

    /// Phase offset, always `< tick_rate`.
    pub fn tick_offset(&self) -> u32 {
        self.phase.checked_rem(self.tick_rate).unwrap_or(0)
    }

    /// Whether the citizen may stop to eat while this target is active.
    pub const fn is_okay_to_eat(&self) -> bool {
        self.okay_to_eat
    }

    /// Whether the target removes itself from its table after firing once.
    pub const fn should_unregister(&self) -> bool {
        self.one_shot
    }

    /// Throttle gate: whether the target is due on `tick`.
    pub fn is_due(&self, tick: u64) -> bool {
        tick.wrapping_add(u64::from(self.tick_offset()))
            .checked_rem(u64::from(self.tick_rate))
            .is_some_and(|rem| rem == 0)
    }

    /// Evaluate the predicate.
    pub fn test(&self, context: &C) -> Result<bool, TargetError> {
        (self.predicate)(context)
    }

    /// Run the action and return the requested transition.
    pub fn apply(&mut self, context: &mut C) -> Result<Option<S>, TargetError> {
        (self.action)(context)
    }
}

impl<S: core::fmt::Debug, C> core::fmt::Debug for AiTarget<S, C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AiTarget")
            .field("state", &self.state)
            .field("tick_rate", &self.tick_rate)
            .field("phase", &self.phase)
            .field("okay_to_eat", &self.okay_to_eat)
            .field("one_shot", &self.one_shot)
            .finish_non_exhaustive()
    }
}

/// Builder for [`AiTarget`].
///
/// Defaults: always-true predicate, an action that keeps the current state,
/// tick rate 1, not okay to eat, persistent.
pub struct AiTargetBuilder<S, C> {
    state: TargetState<S>,
    predicate: Predicate<C>,
    action: Action<S, C>,
    tick_rate: i64,
    okay_to_eat: bool,
    one_shot: bool,
}

impl<S: AiState, C: 'static> AiTargetBuilder<S, C> {
    fn new(state: TargetState<S>) -> Self {
        Self {
            state,
            predicate: Box::new(|_: &C| Ok(true)),
            action: Box::new(|_: &mut C| Ok(None)),
            tick_rate: 1,
            okay_to_eat: false,
            one_shot: false,
        }
    }

    /// Guard the target with a predicate over the agent context.
    #[must_use]
    pub fn predicate<P>(mut self, predicate: P) -> Self
    where
        P: Fn(&C) -> Result<bool, TargetError> + 'static,
    {
        self.predicate = Box::new(predicate);
        self
    }

    /// Set the action run when the target fires.
    #[must_use]
    pub fn action<A>(mut self, action: A) -> Self
    where
        A: FnMut(&mut C) -> Result<Option<S>, TargetError> + 'static,
    {
        self.action = Box::new(action);
        self
    }

    /// Make the action a plain transition to `next`.
    #[must_use]
    pub fn transition_to(mut self, next: S) -> Self {
        self.action = Box::new(move |_: &mut C| Ok(Some(next)));
        self
    }

    /// Request a tick rate; clamped into `[1, 500]` at build time.
    #[must_use]
    pub fn tick_rate(mut self, rate: i64) -> Self {
        self.tick_rate = rate;
        self
    }

    /// Allow the citizen to eat while this target is active.
    #[must_use]
    pub fn okay_to_eat(mut self, okay: bool) -> Self {
        self.okay_to_eat = okay;
        self
    }

    /// Remove the target from its table after it fires once.
    #[must_use]
    pub fn one_shot(mut self) -> Self {
        self.one_shot = true;
        self
    }

    /// Build, taking the phase from the process-wide counter.
    pub fn build(self) -> AiTarget<S, C> {
        self.build_with(OffsetCounter::global())
    }

    /// Build, taking the phase from `counter`.
    pub fn build_with(self, counter: &OffsetCounter) -> AiTarget<S, C> {
        AiTarget {
            state: self.state,
            predicate: self.predicate,
            action: self.action,
            tick_rate: clamp_tick_rate(self.tick_rate),
            phase: counter.advance(),
            okay_to_eat: self.okay_to_eat,
            one_shot: self.one_shot,
        }
    }
}
