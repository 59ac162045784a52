//! Async run loop for a colony scheduler.
//!
//! [`run_colony`] ticks the scheduler at the operator's tick interval until
//! the tick limit is reached or a stop is requested, honoring pause/resume
//! between ticks. Colony-level work that is not part of any citizen AI (the
//! work-order sweep, request generation) hangs off the [`TickCallback`].

use std::sync::Arc;

use colony_ai::AiState;
use tracing::{info, warn};

use crate::clock::ClockError;
use crate::operator::{OperatorState, RunEndReason};
use crate::scheduler::{Scheduler, TickSummary};

/// Errors that can occur during a run.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// The clock could not advance.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },
}

/// Result of a run.
#[derive(Debug)]
pub struct RunResult {
    /// Why the run ended.
    pub end_reason: RunEndReason,
    /// Number of ticks executed.
    pub total_ticks: u64,
    /// Agent faults reported across the run.
    pub total_faults: u64,
    /// Last tick evaluated, if any.
    pub final_tick: Option<u64>,
}

/// Called after each scheduler tick.
pub trait TickCallback<S> {
    /// Inspect the tick and do colony-level work. The scheduler is handed
    /// over mutably so callbacks can register or remove citizens.
    fn on_tick(&mut self, summary: &TickSummary<S>, scheduler: &mut Scheduler<S>);
}

/// A callback that does nothing.
pub struct NoOpCallback;

impl<S> TickCallback<S> for NoOpCallback {
    fn on_tick(&mut self, _summary: &TickSummary<S>, _scheduler: &mut Scheduler<S>) {}
}

/// Run `scheduler` until a termination condition is met.
pub async fn run_colony<S: AiState>(
    scheduler: &mut Scheduler<S>,
    operator: &Arc<OperatorState>,
    callback: &mut dyn TickCallback<S>,
) -> Result<RunResult, RunnerError> {
    let mut total_ticks: u64 = 0;
    let mut total_faults: u64 = 0;
    let mut final_tick = None;

    info!(
        agents = scheduler.len(),
        max_ticks = operator.max_ticks(),
        tick_interval_ms = operator.tick_interval_ms(),
        "Colony run starting"
    );

    let end_reason = loop {
        if operator.is_paused() {
            info!("Run paused, waiting for resume...");
            operator.wait_if_paused().await;
            info!("Run resumed");
        }

        if operator.is_stop_requested() {
            info!("Operator stop requested");
            break RunEndReason::OperatorStop;
        }

        let summary = scheduler.tick()?;
        total_ticks = total_ticks.saturating_add(1);
        let faults = u64::try_from(summary.faults.len()).unwrap_or(u64::MAX);
        total_faults = total_faults.saturating_add(faults);
        final_tick = Some(summary.tick);

        callback.on_tick(&summary, scheduler);

        if operator.tick_limit_reached(total_ticks) {
            info!(
                tick = summary.tick,
                max_ticks = operator.max_ticks(),
                "Tick limit reached"
            );
            break RunEndReason::MaxTicksReached;
        }

        let interval_ms = operator.tick_interval_ms();
        if interval_ms > 0 {
            tokio::time::sleep(tokio::time::Duration::from_millis(interval_ms)).await;
        } else {
            tokio::task::yield_now().await;
        }
    };

    operator.set_end_reason(end_reason).await;
    Ok(RunResult {
        end_reason,
        total_ticks,
        total_faults,
        final_tick,
    })
}

/// Log how a run ended.
pub fn log_run_end(result: &RunResult, operator: &OperatorState) {
    info!(
        reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        final_tick = result.final_tick,
        elapsed_ms = operator.elapsed_ms(),
        "Colony run ended"
    );
    if result.total_faults > 0 {
        warn!(faults = result.total_faults, "agent faults occurred during the run");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use colony_ai::{AiAgent, AiTarget, OffsetCounter};
    use colony_types::{CitizenId, CitizenState};

    use super::*;

    fn scheduler_with_walker() -> Scheduler<CitizenState> {
        let counter = OffsetCounter::new();
        let mut scheduler: Scheduler<CitizenState> = Scheduler::new();
        scheduler.register(
            CitizenId::new(1).unwrap(),
            Box::new(AiAgent::new(CitizenState::Idle, ()).with_targets([
                AiTarget::on(CitizenState::Idle)
                    .transition_to(CitizenState::Delivery)
                    .build_with(&counter),
                AiTarget::on(CitizenState::Delivery)
                    .transition_to(CitizenState::Idle)
                    .build_with(&counter),
            ])),
        );
        scheduler
    }

    #[tokio::test]
    async fn bounded_by_max_ticks() {
        let mut scheduler = scheduler_with_walker();
        let operator = Arc::new(OperatorState::with_limits(0, 5));

        let result = run_colony(&mut scheduler, &operator, &mut NoOpCallback)
            .await
            .unwrap();

        assert_eq!(result.end_reason, RunEndReason::MaxTicksReached);
        assert_eq!(result.total_ticks, 5);
        assert_eq!(result.final_tick, Some(4));
        assert_eq!(scheduler.clock().tick(), 5);
        assert_eq!(operator.end_reason().await, Some(RunEndReason::MaxTicksReached));
    }

    #[tokio::test]
    async fn operator_stop_before_first_tick() {
        let mut scheduler = scheduler_with_walker();
        let operator = Arc::new(OperatorState::with_limits(0, 0));
        operator.request_stop();

        let result = run_colony(&mut scheduler, &operator, &mut NoOpCallback)
            .await
            .unwrap();

        assert_eq!(result.end_reason, RunEndReason::OperatorStop);
        assert_eq!(result.total_ticks, 0);
        assert_eq!(result.final_tick, None);
    }

    #[tokio::test]
    async fn callback_sees_every_tick_and_can_stop() {
        struct StopAfter {
            operator: Arc<OperatorState>,
            seen: Vec<u64>,
        }
        impl TickCallback<CitizenState> for StopAfter {
            fn on_tick(
                &mut self,
                summary: &TickSummary<CitizenState>,
                _scheduler: &mut Scheduler<CitizenState>,
            ) {
                self.seen.push(summary.tick);
                if self.seen.len() == 3 {
                    self.operator.request_stop();
                }
            }
        }

        let mut scheduler = scheduler_with_walker();
        let operator = Arc::new(OperatorState::with_limits(0, 0));
        let mut callback = StopAfter {
            operator: Arc::clone(&operator),
            seen: Vec::new(),
        };

        let result = run_colony(&mut scheduler, &operator, &mut callback)
            .await
            .unwrap();

        assert_eq!(result.end_reason, RunEndReason::OperatorStop);
        assert_eq!(callback.seen, vec![0, 1, 2]);
        assert_eq!(
            scheduler.current_state(CitizenId::new(1).unwrap()),
            Some(CitizenState::Delivery)
        );
    }
}
