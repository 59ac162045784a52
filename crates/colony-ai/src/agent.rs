//! The per-agent AI driver.
//!
//! An [`AiAgent`] owns one state machine: the current state, the
//! [`TargetTable`] and a host-defined context that predicates and actions
//! operate on. The scheduler ticks agents through the object-safe
//! [`Tickable`] trait so agents with different context types can share one
//! scheduler.

use tracing::debug;

use crate::error::TargetError;
use crate::state::AiState;
use crate::table::{TargetId, TargetTable};
use crate::target::AiTarget;

/// Outcome of one agent tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentTick<S> {
    /// The tick that was evaluated.
    pub tick: u64,
    /// State before the tick.
    pub previous: S,
    /// State after the tick.
    pub current: S,
    /// The target that fired, if any.
    pub fired: Option<TargetId>,
}

impl<S: AiState> AgentTick<S> {
    /// Whether the tick changed the agent's state.
    pub fn transitioned(&self) -> bool {
        self.previous != self.current
    }
}

/// Object-safe view of an agent for the scheduler.
pub trait Tickable<S> {
    /// Evaluate the agent's target table for `tick` and commit the result.
    ///
    /// On error the agent's state is left as it was before the call.
    fn tick(&mut self, tick: u64) -> Result<AgentTick<S>, TargetError>;

    /// The agent's current state.
    fn current_state(&self) -> S;

    /// Whether the active target allows a hunger interrupt. The decision to
    /// eat belongs to the caller.
    fn is_okay_to_eat(&self) -> bool;
}

/// A citizen AI: current state, target table and context.
pub struct AiAgent<S, C> {
    state: S,
    table: TargetTable<S, C>,
    context: C,
    active: Option<TargetId>,
    okay_to_eat: bool,
    last_tick: Option<u64>,
}

impl<S: AiState, C: 'static> AiAgent<S, C> {
    /// Create an agent in `initial` state with an empty table.
    pub const fn new(initial: S, context: C) -> Self {
        Self {
            state: initial,
            table: TargetTable::new(),
            context,
            active: None,
            okay_to_eat: true,
            last_tick: None,
        }
    }

    /// Builder-style registration of several targets.
    #[must_use]
    pub fn with_targets<I>(mut self, targets: I) -> Self
    where
        I: IntoIterator<Item = AiTarget<S, C>>,
    {
        let _ = self.table.register_all(targets);
        self
    }

    /// Append a target at the lowest priority.
    pub fn register(&mut self, target: AiTarget<S, C>) -> TargetId {
        self.table.register(target)
    }

    /// Retire a target; see [`TargetTable::unregister`].
    pub fn unregister(&mut self, id: TargetId) -> bool {
        self.table.unregister(id)
    }

    /// The agent's current state.
    pub const fn state(&self) -> S {
        self.state
    }

    /// Force the current state (e.g. host reset after a fault).
    pub const fn set_state(&mut self, state: S) {
        self.state = state;
    }

    /// The host context.
    pub const fn context(&self) -> &C {
        &self.context
    }

    /// The host context, mutably.
    pub const fn context_mut(&mut self) -> &mut C {
        &mut self.context
    }

    /// The target table.
    pub const fn table(&self) -> &TargetTable<S, C> {
        &self.table
    }

    /// The target table, mutably.
    pub const fn table_mut(&mut self) -> &mut TargetTable<S, C> {
        &mut self.table
    }

    /// The target that fired most recently.
    pub const fn active_target(&self) -> Option<TargetId> {
        self.active
    }

    /// The last tick evaluated, if any.
    pub const fn last_tick(&self) -> Option<u64> {
        self.last_tick
    }

    /// Okay-to-eat flag of the active target; `true` before any target has
    /// fired.
    pub const fn is_okay_to_eat(&self) -> bool {
        self.okay_to_eat
    }

    /// Evaluate one tick. See [`Tickable::tick`].
    pub fn tick(&mut self, tick: u64) -> Result<AgentTick<S>, TargetError> {
        let previous = self.state;
        let outcome = self.table.evaluate(previous, tick, &mut self.context);
        self.table.compact();
        self.last_tick = Some(tick);

        let Some(fired) = outcome? else {
            return Ok(AgentTick {
                tick,
                previous,
                current: previous,
                fired: None,
            });
        };

        self.active = Some(fired.id);
        self.okay_to_eat = fired.okay_to_eat;
        if let Some(next) = fired.next {
            self.state = next;
        }
        if self.state != previous {
            debug!(tick, target_id = %fired.id, from = ?previous, to = ?self.state, "AI transition");
        }

        Ok(AgentTick {
            tick,
            previous,
            current: self.state,
            fired: Some(fired.id),
        })
    }
}

impl<S: AiState, C: 'static> Tickable<S> for AiAgent<S, C> {
    fn tick(&mut self, tick: u64) -> Result<AgentTick<S>, TargetError> {
        Self::tick(self, tick)
    }

    fn current_state(&self) -> S {
        self.state
    }

    fn is_okay_to_eat(&self) -> bool {
        self.okay_to_eat
    }
}

impl<S: core::fmt::Debug, C: core::fmt::Debug> core::fmt::Debug for AiAgent<S, C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AiAgent")
            .field("state", &self.state)
            .field("table", &self.table)
            .field("context", &self.context)
            .field("active", &self.active)
            .field("okay_to_eat", &self.okay_to_eat)
            .field("last_tick", &self.last_tick)
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::offset::OffsetCounter;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Phase {
        X,
        Y,
    }

    #[test]
    fn wildcard_fires_when_exact_predicate_fails() {
        let counter = OffsetCounter::new();
        let mut agent: AiAgent<Phase, ()> = AiAgent::new(Phase::X, ()).with_targets([
            AiTarget::on(Phase::X)
                .predicate(|_: &()| Ok(false))
                .build_with(&counter),
            AiTarget::blocking()
                .predicate(|_: &()| Ok(true))
                .transition_to(Phase::Y)
                .build_with(&counter),
        ]);

        let outcome = agent.tick(0).unwrap();
        assert!(outcome.transitioned());
        assert_eq!(agent.state(), Phase::Y);
        assert_eq!(outcome.current, Phase::Y);
    }

    #[test]
    fn none_keeps_current_state() {
        let counter = OffsetCounter::new();
        let mut agent: AiAgent<Phase, u32> = AiAgent::new(Phase::X, 0).with_targets([
            AiTarget::on(Phase::X)
                .action(|n: &mut u32| {
                    *n = n.saturating_add(1);
                    Ok(None)
                })
                .build_with(&counter),
        ]);

        for tick in 0..3 {
            let outcome = agent.tick(tick).unwrap();
            assert!(!outcome.transitioned());
            assert!(outcome.fired.is_some());
        }
        assert_eq!(*agent.context(), 3);
        assert_eq!(agent.last_tick(), Some(2));
    }

    #[test]
    fn failed_action_leaves_state_untouched() {
        let counter = OffsetCounter::new();
        let mut agent: AiAgent<Phase, ()> = AiAgent::new(Phase::X, ()).with_targets([
            AiTarget::on(Phase::X)
                .action(|_: &mut ()| Err(TargetError::failed("path blocked")))
                .build_with(&counter),
        ]);

        assert!(agent.tick(0).is_err());
        assert_eq!(agent.state(), Phase::X);
        assert!(agent.active_target().is_none());
    }

    #[test]
    fn okay_to_eat_follows_active_target() {
        let counter = OffsetCounter::new();
        let mut agent: AiAgent<Phase, ()> = AiAgent::new(Phase::X, ()).with_targets([
            AiTarget::on(Phase::X)
                .transition_to(Phase::Y)
                .okay_to_eat(false)
                .build_with(&counter),
            AiTarget::on(Phase::Y)
                .transition_to(Phase::X)
                .okay_to_eat(true)
                .build_with(&counter),
        ]);

        assert!(agent.is_okay_to_eat());
        agent.tick(0).unwrap();
        assert!(!agent.is_okay_to_eat());
        agent.tick(1).unwrap();
        assert!(agent.is_okay_to_eat());
    }
}
