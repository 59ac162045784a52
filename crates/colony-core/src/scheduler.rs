//! The citizen scheduler.
//!
//! One scheduler drives every citizen AI of a colony on a shared clock.
//! Each [`Scheduler::tick`] claims the current tick from the clock, then
//! evaluates every registered agent once, in ascending [`CitizenId`] order.
//! A failing agent is reported and skipped; the rest of the colony still
//! ticks.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, PoisonError};

use colony_ai::{AiState, TargetError, TargetId, Tickable};
use colony_types::CitizenId;
use tracing::{debug, warn};

use crate::clock::{ClockError, TickClock};

/// What one agent did during a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentOutcome<S> {
    /// The agent.
    pub citizen: CitizenId,
    /// The target that fired, if any.
    pub fired: Option<TargetId>,
    /// State before the tick.
    pub previous: S,
    /// State after the tick.
    pub current: S,
}

impl<S: AiState> AgentOutcome<S> {
    /// Whether the agent changed state.
    pub fn transitioned(&self) -> bool {
        self.previous != self.current
    }
}

/// An agent whose tick failed. Its state was left unchanged.
#[derive(Debug)]
pub struct AgentFault {
    /// The agent.
    pub citizen: CitizenId,
    /// The predicate or action error.
    pub error: TargetError,
}

/// Result of one scheduler tick.
#[derive(Debug)]
pub struct TickSummary<S> {
    /// The tick that was evaluated.
    pub tick: u64,
    /// Outcomes of agents that ticked successfully, in id order.
    pub outcomes: Vec<AgentOutcome<S>>,
    /// Agents whose tick failed, in id order.
    pub faults: Vec<AgentFault>,
    /// Agents dropped at the end of the tick.
    pub removed: Vec<CitizenId>,
}

impl<S: AiState> TickSummary<S> {
    /// Outcomes that changed state.
    pub fn transitions(&self) -> impl Iterator<Item = &AgentOutcome<S>> {
        self.outcomes.iter().filter(|o| o.transitioned())
    }

    /// Number of agents whose target fired.
    pub fn fired_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.fired.is_some()).count()
    }
}

/// Shared handle for removing agents from inside a running tick.
///
/// Actions cannot borrow the scheduler, so they capture a clone of this
/// handle instead. A requested agent is not ticked again and is dropped
/// once the running tick completes.
#[derive(Debug, Clone, Default)]
pub struct RemovalQueue {
    pending: Arc<Mutex<BTreeSet<CitizenId>>>,
}

impl RemovalQueue {
    /// Ask for `citizen` to be removed.
    pub fn request(&self, citizen: CitizenId) {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(citizen);
    }

    /// Whether removal of `citizen` is pending.
    pub fn is_pending(&self, citizen: CitizenId) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&citizen)
    }

    fn drain(&self) -> BTreeSet<CitizenId> {
        std::mem::take(&mut *self.pending.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

/// Drives all registered agents on a shared clock.
pub struct Scheduler<S> {
    agents: BTreeMap<CitizenId, Box<dyn Tickable<S>>>,
    clock: TickClock,
    removals: RemovalQueue,
}

impl<S: AiState> Scheduler<S> {
    /// Create an empty scheduler at tick 0.
    pub fn new() -> Self {
        Self::with_clock(TickClock::new())
    }

    /// Create an empty scheduler on a restored clock.
    pub fn with_clock(clock: TickClock) -> Self {
        Self {
            agents: BTreeMap::new(),
            clock,
            removals: RemovalQueue::default(),
        }
    }

    /// Register an agent, replacing and returning any agent already
    /// registered under `citizen`.
    pub fn register(
        &mut self,
        citizen: CitizenId,
        agent: Box<dyn Tickable<S>>,
    ) -> Option<Box<dyn Tickable<S>>> {
        debug!(%citizen, "agent registered");
        self.agents.insert(citizen, agent)
    }

    /// Remove an agent now.
    pub fn unregister(&mut self, citizen: CitizenId) -> Option<Box<dyn Tickable<S>>> {
        self.agents.remove(&citizen)
    }

    /// Handle for deferred removal from inside actions.
    pub fn removal_queue(&self) -> RemovalQueue {
        self.removals.clone()
    }

    /// Whether `citizen` has a registered agent.
    pub fn contains(&self, citizen: CitizenId) -> bool {
        self.agents.contains_key(&citizen)
    }

    /// Number of registered agents.
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    /// Whether no agent is registered.
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Registered citizens in tick order.
    pub fn citizens(&self) -> impl Iterator<Item = CitizenId> + '_ {
        self.agents.keys().copied()
    }

    /// Current state of an agent.
    pub fn current_state(&self, citizen: CitizenId) -> Option<S> {
        self.agents.get(&citizen).map(|a| a.current_state())
    }

    /// Okay-to-eat flag of an agent's active target.
    pub fn is_okay_to_eat(&self, citizen: CitizenId) -> Option<bool> {
        self.agents.get(&citizen).map(|a| a.is_okay_to_eat())
    }

    /// The shared clock.
    pub const fn clock(&self) -> &TickClock {
        &self.clock
    }

    /// Advance the clock, then evaluate every agent once for the tick it
    /// was on and drop agents whose removal was requested.
    ///
    /// A clock overflow is reported before any agent runs.
    pub fn tick(&mut self) -> Result<TickSummary<S>, ClockError> {
        let tick = self.clock.tick();
        self.clock.advance()?;
        let mut outcomes = Vec::with_capacity(self.agents.len());
        let mut faults = Vec::new();

        for (citizen, agent) in &mut self.agents {
            if self.removals.is_pending(*citizen) {
                continue;
            }
            match agent.tick(tick) {
                Ok(outcome) => outcomes.push(AgentOutcome {
                    citizen: *citizen,
                    fired: outcome.fired,
                    previous: outcome.previous,
                    current: outcome.current,
                }),
                Err(error) => {
                    warn!(tick, %citizen, error = %error, "agent tick failed; state unchanged");
                    faults.push(AgentFault {
                        citizen: *citizen,
                        error,
                    });
                }
            }
        }

        let removed: Vec<CitizenId> = self
            .removals
            .drain()
            .into_iter()
            .filter(|citizen| self.agents.remove(citizen).is_some())
            .collect();
        if !removed.is_empty() {
            debug!(tick, removed = removed.len(), "agents removed after tick");
        }

        Ok(TickSummary {
            tick,
            outcomes,
            faults,
            removed,
        })
    }
}

impl<S: AiState> Default for Scheduler<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> core::fmt::Debug for Scheduler<S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Scheduler")
            .field("agents", &self.agents.keys().collect::<Vec<_>>())
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use colony_ai::{AiAgent, AiTarget, OffsetCounter};
    use colony_types::CitizenState;

    use super::*;

    fn id(raw: u32) -> CitizenId {
        CitizenId::new(raw).unwrap()
    }

    fn logging_agent(
        citizen: CitizenId,
        log: &Rc<RefCell<Vec<CitizenId>>>,
        counter: &OffsetCounter,
    ) -> Box<dyn Tickable<CitizenState>> {
        let log = Rc::clone(log);
        Box::new(AiAgent::new(CitizenState::Idle, ()).with_targets([AiTarget::on(
            CitizenState::Idle,
        )
        .action(move |_: &mut ()| {
            log.borrow_mut().push(citizen);
            Ok(None)
        })
        .build_with(counter)]))
    }

    #[test]
    fn agents_tick_in_ascending_id_order() {
        let counter = OffsetCounter::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut scheduler: Scheduler<CitizenState> = Scheduler::new();
        for raw in [9, 2, 5] {
            scheduler.register(id(raw), logging_agent(id(raw), &log, &counter));
        }

        let summary = scheduler.tick().unwrap();
        assert_eq!(summary.tick, 0);
        assert_eq!(*log.borrow(), vec![id(2), id(5), id(9)]);
        assert_eq!(summary.fired_count(), 3);
        assert_eq!(scheduler.clock().tick(), 1);
    }

    #[test]
    fn failing_agent_does_not_stop_others() {
        let counter = OffsetCounter::new();
        let mut scheduler: Scheduler<CitizenState> = Scheduler::new();
        scheduler.register(
            id(1),
            Box::new(AiAgent::new(CitizenState::Delivery, ()).with_targets([AiTarget::on(
                CitizenState::Delivery,
            )
            .action(|_: &mut ()| Err(TargetError::failed("no path")))
            .build_with(&counter)])),
        );
        scheduler.register(
            id(2),
            Box::new(AiAgent::new(CitizenState::Idle, ()).with_targets([AiTarget::on(
                CitizenState::Idle,
            )
            .transition_to(CitizenState::StartWorking)
            .build_with(&counter)])),
        );

        let summary = scheduler.tick().unwrap();
        assert_eq!(summary.faults.len(), 1);
        assert_eq!(summary.faults.first().unwrap().citizen, id(1));
        assert_eq!(scheduler.current_state(id(1)), Some(CitizenState::Delivery));
        assert_eq!(scheduler.current_state(id(2)), Some(CitizenState::StartWorking));
        assert_eq!(summary.transitions().count(), 1);
    }

    #[test]
    fn removal_requested_mid_tick_is_deferred() {
        let counter = OffsetCounter::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut scheduler: Scheduler<CitizenState> = Scheduler::new();
        let removals = scheduler.removal_queue();

        // Citizen 1 retires citizen 3 while the tick is running.
        scheduler.register(
            id(1),
            Box::new(AiAgent::new(CitizenState::Idle, ()).with_targets([AiTarget::on(
                CitizenState::Idle,
            )
            .action(move |_: &mut ()| {
                removals.request(id(3));
                Ok(None)
            })
            .build_with(&counter)])),
        );
        scheduler.register(id(2), logging_agent(id(2), &log, &counter));
        scheduler.register(id(3), logging_agent(id(3), &log, &counter));

        let summary = scheduler.tick().unwrap();
        assert_eq!(*log.borrow(), vec![id(2)]);
        assert_eq!(summary.removed, vec![id(3)]);
        assert!(!scheduler.contains(id(3)));
        assert_eq!(scheduler.len(), 2);
    }

    #[test]
    fn okay_to_eat_is_reported_per_agent() {
        let counter = OffsetCounter::new();
        let mut scheduler: Scheduler<CitizenState> = Scheduler::new();
        scheduler.register(
            id(4),
            Box::new(AiAgent::new(CitizenState::Idle, ()).with_targets([AiTarget::on(
                CitizenState::Idle,
            )
            .transition_to(CitizenState::Building)
            .okay_to_eat(false)
            .build_with(&counter)])),
        );
        assert_eq!(scheduler.is_okay_to_eat(id(4)), Some(true));
        scheduler.tick().unwrap();
        assert_eq!(scheduler.is_okay_to_eat(id(4)), Some(false));
        assert_eq!(scheduler.is_okay_to_eat(id(5)), None);
    }

    #[test]
    fn clock_overflow_leaves_agents_untouched() {
        let counter = OffsetCounter::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut scheduler: Scheduler<CitizenState> =
            Scheduler::with_clock(TickClock::at(u64::MAX));
        scheduler.register(id(1), logging_agent(id(1), &log, &counter));
        scheduler.removal_queue().request(id(1));

        assert!(matches!(scheduler.tick(), Err(ClockError::TickOverflow)));
        assert!(log.borrow().is_empty());
        assert!(scheduler.contains(id(1)));
        assert_eq!(scheduler.clock().tick(), u64::MAX);
    }
}
