//! Target tables of the demo citizens.
//!
//! Builders and deliverymen share the hunger and sleep interrupts, which sit
//! at the front of every table as wildcard targets. Each interrupt only
//! fires while the active target allows a break, which the colony learns
//! from the scheduler's okay-to-eat flag after every tick.

use std::cell::{Ref, RefMut};

use colony_ai::{AiAgent, AiTarget, TargetError};
use colony_jobs::JobDeliveryman;
use colony_types::{CitizenId, CitizenState};

use crate::colony::{Colony, SharedColony};

/// Ticks between hunger checks.
pub const HUNGER_CHECK_RATE: i64 = 5;

/// Ticks between sleep checks.
pub const SLEEP_CHECK_RATE: i64 = 10;

/// Ticks between idle scans for new work.
pub const IDLE_SCAN_RATE: i64 = 10;

/// Building passes needed to finish an order.
pub const BUILD_STEPS: u32 = 6;

/// Walking passes needed to complete a delivery.
pub const DELIVERY_STEPS: u32 = 4;

/// Probability that a delivery arrives intact.
pub const DELIVERY_SUCCESS: f64 = 0.85;

/// The role a citizen was hired for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Role {
    /// Works on claimed work orders.
    Builder,
    /// Services a delivery task queue.
    Deliveryman,
}

/// Per-citizen AI context.
#[derive(Debug)]
pub struct CitizenContext {
    citizen: CitizenId,
    colony: SharedColony,
    progress: u32,
}

impl CitizenContext {
    /// Context for `citizen` living in `colony`.
    pub const fn new(citizen: CitizenId, colony: SharedColony) -> Self {
        Self {
            citizen,
            colony,
            progress: 0,
        }
    }

    /// The citizen this context belongs to.
    pub const fn citizen(&self) -> CitizenId {
        self.citizen
    }

    /// Progress on the current job step.
    pub const fn progress(&self) -> u32 {
        self.progress
    }

    fn colony(&self) -> Result<Ref<'_, Colony>, TargetError> {
        self.colony.try_borrow().map_err(TargetError::host)
    }

    fn colony_mut(&self) -> Result<RefMut<'_, Colony>, TargetError> {
        self.colony.try_borrow_mut().map_err(TargetError::host)
    }

    /// Advance the current step, returning `true` once `steps` are done.
    const fn step(&mut self, steps: u32) -> bool {
        self.progress = self.progress.saturating_add(1);
        self.progress >= steps
    }

    fn with_job<R>(
        &self,
        f: impl FnOnce(&JobDeliveryman, &mut colony_jobs::StandardRequestSystem) -> R,
    ) -> Result<R, TargetError> {
        let citizen = self.citizen;
        self.colony_mut()?
            .with_job(citizen, f)
            .ok_or_else(|| TargetError::failed(format!("{citizen} has no deliveryman job")))
    }
}

/// An agent driving one citizen.
pub type CitizenAgent = AiAgent<CitizenState, CitizenContext>;

type Target = AiTarget<CitizenState, CitizenContext>;

/// Build the agent for a citizen hired as `role`.
pub fn citizen_agent(role: Role, citizen: CitizenId, colony: SharedColony) -> CitizenAgent {
    let context = CitizenContext::new(citizen, colony);
    let agent = AiAgent::new(CitizenState::Init, context).with_targets(vital_targets());
    let agent = match role {
        Role::Builder => agent.with_targets(builder_targets()),
        Role::Deliveryman => agent.with_targets(deliveryman_targets()),
    };
    agent.with_targets([idle_target()])
}

/// Lowest-priority idle target. It fires whenever the idle work scan does
/// not, so an idle citizen without work is always free to eat and sleep.
fn idle_target() -> Target {
    AiTarget::on(CitizenState::Idle).okay_to_eat(true).build()
}

/// Hunger and sleep interrupts plus the eating and sleeping states.
fn vital_targets() -> Vec<Target> {
    vec![
        AiTarget::blocking()
            .tick_rate(HUNGER_CHECK_RATE)
            .predicate(|ctx: &CitizenContext| Ok(ctx.colony()?.wants_to_eat(ctx.citizen)))
            .transition_to(CitizenState::Eating)
            .build(),
        AiTarget::blocking()
            .tick_rate(SLEEP_CHECK_RATE)
            .predicate(|ctx: &CitizenContext| Ok(ctx.colony()?.wants_to_sleep(ctx.citizen)))
            .transition_to(CitizenState::Sleeping)
            .build(),
        AiTarget::on(CitizenState::Eating)
            .action(|ctx: &mut CitizenContext| {
                let citizen = ctx.citizen;
                let done = ctx.colony_mut()?.eat(citizen);
                Ok(done.then_some(CitizenState::Idle))
            })
            .build(),
        AiTarget::on(CitizenState::Sleeping)
            .tick_rate(2)
            .action(|ctx: &mut CitizenContext| {
                let citizen = ctx.citizen;
                let done = ctx.colony_mut()?.rest(citizen);
                Ok(done.then_some(CitizenState::Idle))
            })
            .build(),
        AiTarget::on(CitizenState::Init)
            .transition_to(CitizenState::Idle)
            .okay_to_eat(true)
            .build(),
    ]
}

fn builder_targets() -> Vec<Target> {
    vec![
        AiTarget::on(CitizenState::Idle)
            .tick_rate(IDLE_SCAN_RATE)
            .okay_to_eat(true)
            .predicate(|ctx: &CitizenContext| Ok(ctx.colony()?.claimed_order(ctx.citizen).is_some()))
            .transition_to(CitizenState::StartWorking)
            .build(),
        AiTarget::on(CitizenState::StartWorking)
            .action(|ctx: &mut CitizenContext| {
                ctx.progress = 0;
                let claimed = ctx.colony()?.claimed_order(ctx.citizen);
                Ok(Some(if claimed.is_some() {
                    CitizenState::Building
                } else {
                    CitizenState::Idle
                }))
            })
            .build(),
        AiTarget::on(CitizenState::Building)
            .tick_rate(2)
            .okay_to_eat(true)
            .action(|ctx: &mut CitizenContext| {
                let citizen = ctx.citizen;
                let Some(order) = ctx.colony()?.claimed_order(citizen) else {
                    // The order was removed under us (structure demolished).
                    return Ok(Some(CitizenState::Idle));
                };
                if !ctx.step(BUILD_STEPS) {
                    return Ok(None);
                }
                ctx.colony_mut()?.complete_order(order);
                Ok(Some(CitizenState::Idle))
            })
            .build(),
    ]
}

fn deliveryman_targets() -> Vec<Target> {
    vec![
        AiTarget::on(CitizenState::Idle)
            .tick_rate(IDLE_SCAN_RATE)
            .okay_to_eat(true)
            .predicate(|ctx: &CitizenContext| {
                ctx.with_job(|job, rs| job.has_task(rs))
            })
            .transition_to(CitizenState::StartWorking)
            .build(),
        AiTarget::on(CitizenState::StartWorking)
            .action(|ctx: &mut CitizenContext| {
                let (task, returning) =
                    ctx.with_job(|job, rs| (job.current_task(rs), job.is_returning(rs)))?;
                Ok(Some(match (task, returning) {
                    (_, true) => CitizenState::Dumping,
                    (Some(_), false) => CitizenState::PrepareDelivery,
                    (None, false) => CitizenState::Idle,
                }))
            })
            .build(),
        AiTarget::on(CitizenState::PrepareDelivery)
            .tick_rate(3)
            .okay_to_eat(true)
            .action(|ctx: &mut CitizenContext| {
                ctx.progress = 0;
                let task = ctx.with_job(|job, rs| job.current_task(rs))?;
                Ok(Some(if task.is_some() {
                    CitizenState::Delivery
                } else {
                    CitizenState::Dumping
                }))
            })
            .build(),
        AiTarget::on(CitizenState::Delivery)
            .tick_rate(2)
            .action(|ctx: &mut CitizenContext| {
                if ctx.with_job(|job, rs| job.current_task(rs))?.is_none() {
                    // Cancelled while on the road; the cancellation already
                    // flagged the return trip.
                    return Ok(Some(CitizenState::Dumping));
                }
                if !ctx.step(DELIVERY_STEPS) {
                    return Ok(None);
                }
                let successful = ctx.colony_mut()?.roll(DELIVERY_SUCCESS);
                ctx.with_job(|job, rs| job.finish_request(successful, rs))?;
                Ok(Some(CitizenState::Dumping))
            })
            .build(),
        AiTarget::on(CitizenState::Dumping)
            .tick_rate(2)
            .action(|ctx: &mut CitizenContext| {
                let more = ctx.with_job(|job, rs| {
                    job.set_returning(false, rs);
                    job.current_task(rs).is_some()
                })?;
                Ok(Some(if more {
                    CitizenState::StartWorking
                } else {
                    CitizenState::Idle
                }))
            })
            .build(),
    ]
}
