//! The ordered target table owned by a single agent.
//!
//! Table order is priority order: the first target that passes every gate
//! wins the tick. Removal is tombstoned and compacted after the evaluation
//! pass, so handles stay valid and a removal never shifts targets that are
//! still being scanned.

use crate::error::TargetError;
use crate::state::AiState;
use crate::target::AiTarget;

/// Stable handle to a registered target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TargetId(u64);

impl core::fmt::Display for TargetId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "target#{}", self.0)
    }
}

/// The target that won an evaluation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fired<S> {
    /// Handle of the target that fired.
    pub id: TargetId,
    /// Transition requested by its action (`None` keeps the current state).
    pub next: Option<S>,
    /// The target's okay-to-eat flag.
    pub okay_to_eat: bool,
}

struct Slot<S, C> {
    id: TargetId,
    target: AiTarget<S, C>,
    retired: bool,
}

/// Ordered sequence of targets driving one agent's state machine.
pub struct TargetTable<S, C> {
    slots: Vec<Slot<S, C>>,
    next_id: u64,
}

impl<S: AiState, C: 'static> TargetTable<S, C> {
    /// Create an empty table.
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            next_id: 0,
        }
    }

    /// Append a target at the lowest priority and return its handle.
    pub fn register(&mut self, target: AiTarget<S, C>) -> TargetId {
        let id = TargetId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.slots.push(Slot {
            id,
            target,
            retired: false,
        });
        id
    }

    /// Append several targets in order.
    pub fn register_all<I>(&mut self, targets: I) -> Vec<TargetId>
    where
        I: IntoIterator<Item = AiTarget<S, C>>,
    {
        targets.into_iter().map(|t| self.register(t)).collect()
    }

    /// Retire a target. It is skipped from now on and dropped at the next
    /// [`compact`](Self::compact). Returns `false` if the handle is unknown
    /// or already retired.
    pub fn unregister(&mut self, id: TargetId) -> bool {
        match self.slots.iter_mut().find(|slot| slot.id == id && !slot.retired) {
            Some(slot) => {
                slot.retired = true;
                true
            }
            None => false,
        }
    }

    /// Drop retired targets.
    pub fn compact(&mut self) {
        self.slots.retain(|slot| !slot.retired);
    }

    /// Look up a live target.
    pub fn get(&self, id: TargetId) -> Option<&AiTarget<S, C>> {
        self.slots
            .iter()
            .find(|slot| slot.id == id && !slot.retired)
            .map(|slot| &slot.target)
    }

    /// Look up a live target mutably (e.g. to retune its tick rate).
    pub fn get_mut(&mut self, id: TargetId) -> Option<&mut AiTarget<S, C>> {
        self.slots
            .iter_mut()
            .find(|slot| slot.id == id && !slot.retired)
            .map(|slot| &mut slot.target)
    }

    /// Number of live targets.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| !slot.retired).count()
    }

    /// Whether the table has no live targets.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Live targets in priority order.
    pub fn iter(&self) -> impl Iterator<Item = (TargetId, &AiTarget<S, C>)> {
        self.slots
            .iter()
            .filter(|slot| !slot.retired)
            .map(|slot| (slot.id, &slot.target))
    }

    /// Run one evaluation pass: find the first target whose state, throttle
    /// and predicate gates all pass, run its action and report it.
    ///
    /// An error from a predicate or action ends the pass immediately; no
    /// later target is evaluated.
    pub fn evaluate(
        &mut self,
        current: S,
        tick: u64,
        context: &mut C,
    ) -> Result<Option<Fired<S>>, TargetError> {
        for slot in &mut self.slots {
            if slot.retired
                || !slot.target.state().matches(current)
                || !slot.target.is_due(tick)
                || !slot.target.test(context)?
            {
                continue;
            }

            let next = slot.target.apply(context)?;
            if slot.target.should_unregister() {
                slot.retired = true;
            }
            return Ok(Some(Fired {
                id: slot.id,
                next,
                okay_to_eat: slot.target.is_okay_to_eat(),
            }));
        }
        Ok(None)
    }
}

impl<S: AiState, C: 'static> Default for TargetTable<S, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: core::fmt::Debug, C> core::fmt::Debug for TargetTable<S, C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list()
            .entries(
                self.slots
                    .iter()
                    .filter(|slot| !slot.retired)
                    .map(|slot| (slot.id, &slot.target)),
            )
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
        Z,
    }

    #[test]
    fn first_passing_target_wins() {
        let counter = OffsetCounter::new();
        let mut table: TargetTable<Phase, ()> = TargetTable::new();
        let a = table.register(AiTarget::on(Phase::X).transition_to(Phase::Y).build_with(&counter));
        let _b = table.register(AiTarget::on(Phase::X).transition_to(Phase::Z).build_with(&counter));

        let fired = table.evaluate(Phase::X, 0, &mut ()).unwrap().unwrap();
        assert_eq!(fired.id, a);
        assert_eq!(fired.next, Some(Phase::Y));
    }

    #[test]
    fn unregistered_targets_are_skipped_then_compacted() {
        let counter = OffsetCounter::new();
        let mut table: TargetTable<Phase, ()> = TargetTable::new();
        let a = table.register(AiTarget::on(Phase::X).transition_to(Phase::Y).build_with(&counter));
        let b = table.register(AiTarget::on(Phase::X).transition_to(Phase::Z).build_with(&counter));

        assert!(table.unregister(a));
        assert!(!table.unregister(a));
        assert_eq!(table.len(), 1);
        assert!(table.get(a).is_none());

        let fired = table.evaluate(Phase::X, 0, &mut ()).unwrap().unwrap();
        assert_eq!(fired.id, b);

        table.compact();
        assert_eq!(table.iter().map(|(id, _)| id).collect::<Vec<_>>(), vec![b]);
    }

    #[test]
    fn one_shot_target_retires_after_firing() {
        let counter = OffsetCounter::new();
        let mut table: TargetTable<Phase, ()> = TargetTable::new();
        let once = table.register(
            AiTarget::blocking()
                .transition_to(Phase::Z)
                .one_shot()
                .build_with(&counter),
        );

        let fired = table.evaluate(Phase::X, 0, &mut ()).unwrap().unwrap();
        assert_eq!(fired.id, once);
        assert!(table.is_empty());
        assert!(table.evaluate(Phase::X, 1, &mut ()).unwrap().is_none());
    }

    #[test]
    fn predicate_error_stops_the_pass() {
        let counter = OffsetCounter::new();
        let mut table: TargetTable<Phase, u32> = TargetTable::new();
        table.register(
            AiTarget::on(Phase::X)
                .predicate(|_: &u32| Err(TargetError::failed("sensor offline")))
                .build_with(&counter),
        );
        table.register(
            AiTarget::on(Phase::X)
                .action(|hits: &mut u32| {
                    *hits = hits.saturating_add(1);
                    Ok(None)
                })
                .build_with(&counter),
        );

        let mut hits = 0;
        assert!(table.evaluate(Phase::X, 0, &mut hits).is_err());
        assert_eq!(hits, 0);
    }

    #[test]
    fn tick_rate_can_be_retuned_through_handle() {
        let counter = OffsetCounter::new();
        let mut table: TargetTable<Phase, ()> = TargetTable::new();
        let id = table.register(AiTarget::on(Phase::X).tick_rate(20).build_with(&counter));
        table.get_mut(id).unwrap().set_tick_rate(3);
        assert_eq!(table.get(id).unwrap().tick_rate(), 3);
    }
}
