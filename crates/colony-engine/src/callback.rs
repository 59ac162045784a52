//! Tick callback that runs colony-level upkeep.
//!
//! After each scheduler tick this callback dismisses citizens whose agents
//! were removed and feeds every citizen's committed state and okay-to-eat
//! flag back into the colony's vitals. Every `colony_tick_period` ticks it
//! also runs the colony tick: new work and delivery requests, the
//! work-order sweep and the client view updates.

use colony_core::clock::TickClock;
use colony_core::runner::TickCallback;
use colony_core::scheduler::{Scheduler, TickSummary};
use colony_types::CitizenState;
use tracing::{debug, info, warn};

use crate::colony::SharedColony;

/// Callback bridging the scheduler to the shared colony.
pub struct ColonyCallback {
    colony: SharedColony,
    colony_tick_period: u64,
    colony_ticks: u64,
}

impl ColonyCallback {
    /// Create a callback running the colony tick every `colony_tick_period`
    /// scheduler ticks. A zero period disables the colony tick.
    pub const fn new(colony: SharedColony, colony_tick_period: u64) -> Self {
        Self {
            colony,
            colony_tick_period,
            colony_ticks: 0,
        }
    }

    /// Colony ticks run so far.
    pub const fn colony_ticks(&self) -> u64 {
        self.colony_ticks
    }

    const fn is_colony_tick(&self, tick: u64) -> bool {
        TickClock::at(tick).is_every(self.colony_tick_period)
    }
}

impl TickCallback<CitizenState> for ColonyCallback {
    fn on_tick(
        &mut self,
        summary: &TickSummary<CitizenState>,
        scheduler: &mut Scheduler<CitizenState>,
    ) {
        for outcome in summary.transitions() {
            debug!(
                tick = summary.tick,
                citizen = %outcome.citizen,
                from = ?outcome.previous,
                to = ?outcome.current,
                "citizen state changed"
            );
        }

        let Ok(mut colony) = self.colony.try_borrow_mut() else {
            warn!(tick = summary.tick, "colony busy; skipping upkeep");
            return;
        };

        for citizen in &summary.removed {
            colony.dismiss(*citizen);
        }

        for citizen in scheduler.citizens() {
            let (Some(state), Some(okay_to_eat)) = (
                scheduler.current_state(citizen),
                scheduler.is_okay_to_eat(citizen),
            ) else {
                continue;
            };
            colony.update_vitals(citizen, state, okay_to_eat);
        }

        if !self.is_colony_tick(summary.tick) {
            return;
        }
        self.colony_ticks = self.colony_ticks.saturating_add(1);

        match colony.colony_tick() {
            Ok(report) => {
                if !report.removed.is_empty() || !report.claimed.is_empty() {
                    info!(
                        tick = summary.tick,
                        removed = report.removed.len(),
                        claimed = report.claimed.len(),
                        open_orders = colony.work().len(),
                        "colony tick"
                    );
                }
            }
            Err(error) => warn!(tick = summary.tick, %error, "colony tick failed"),
        }

        for view in colony.publish_changes() {
            debug!(
                order = %view.id,
                order_type = ?view.order_type,
                claimed_by = ?view.claimed_by,
                value = %view.value,
                "work order view"
            );
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use colony_core::config::ColonyConfig;
    use colony_types::CitizenId;

    use super::*;
    use crate::colony::{Colony, HUNGER_LIMIT};
    use crate::spawner::spawn_citizens;

    #[test]
    fn vitals_follow_scheduler_ticks() {
        let config = ColonyConfig {
            builders: 1,
            deliverymen: 0,
            ..ColonyConfig::default()
        };
        let colony = Colony::new(&config).into_shared();
        let mut scheduler: Scheduler<CitizenState> = Scheduler::new();
        spawn_citizens(&config, &colony, &mut scheduler).unwrap();
        let mut callback = ColonyCallback::new(SharedColony::clone(&colony), 0);

        for _ in 0..10 {
            let summary = scheduler.tick().unwrap();
            callback.on_tick(&summary, &mut scheduler);
        }

        let hunger = colony.borrow().vitals(CitizenId::new(1).unwrap()).hunger;
        assert_eq!(hunger, 10);
        assert!(hunger < HUNGER_LIMIT);
        assert_eq!(callback.colony_ticks(), 0);
    }

    #[test]
    fn colony_tick_runs_on_period() {
        let config = ColonyConfig::default();
        let colony = Colony::new(&config).into_shared();
        let mut scheduler: Scheduler<CitizenState> = Scheduler::new();
        spawn_citizens(&config, &colony, &mut scheduler).unwrap();
        let mut callback = ColonyCallback::new(SharedColony::clone(&colony), 5);

        for _ in 0..20 {
            let summary = scheduler.tick().unwrap();
            callback.on_tick(&summary, &mut scheduler);
        }
        // Ticks 0, 5, 10 and 15.
        assert_eq!(callback.colony_ticks(), 4);
    }

    #[test]
    fn removed_agents_are_dismissed() {
        let config = ColonyConfig {
            builders: 1,
            deliverymen: 1,
            ..ColonyConfig::default()
        };
        let colony = Colony::new(&config).into_shared();
        let mut scheduler: Scheduler<CitizenState> = Scheduler::new();
        spawn_citizens(&config, &colony, &mut scheduler).unwrap();
        let mut callback = ColonyCallback::new(SharedColony::clone(&colony), 0);

        let courier = CitizenId::new(2).unwrap();
        scheduler.removal_queue().request(courier);
        let summary = scheduler.tick().unwrap();
        callback.on_tick(&summary, &mut scheduler);

        assert_eq!(summary.removed, vec![courier]);
        assert!(!scheduler.contains(courier));
        assert!(colony.borrow().deliveryman(courier).is_none());
    }

    #[test]
    fn busy_colony_skips_upkeep() {
        let config = ColonyConfig::default();
        let colony = Colony::new(&config).into_shared();
        let mut scheduler: Scheduler<CitizenState> = Scheduler::new();
        let mut callback = ColonyCallback::new(SharedColony::clone(&colony), 1);

        let summary = scheduler.tick().unwrap();
        let guard = colony.borrow();
        callback.on_tick(&summary, &mut scheduler);
        drop(guard);
        assert_eq!(callback.colony_ticks(), 0);
    }
}
