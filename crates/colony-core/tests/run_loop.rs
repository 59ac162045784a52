//! Integration tests for the run loop under operator control.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use colony_ai::{AiAgent, AiTarget, OffsetCounter};
use colony_core::operator::{OperatorState, RunEndReason};
use colony_core::runner::{NoOpCallback, run_colony};
use colony_core::scheduler::Scheduler;
use colony_types::{CitizenId, CitizenState};

fn throttled_colony(agents: u32) -> Scheduler<CitizenState> {
    let counter = OffsetCounter::new();
    let mut scheduler: Scheduler<CitizenState> = Scheduler::new();
    for raw in 1..=agents {
        let agent = AiAgent::new(CitizenState::Idle, 0_u32).with_targets([AiTarget::on(
            CitizenState::Idle,
        )
        .tick_rate(4)
        .action(|fired: &mut u32| {
            *fired = fired.saturating_add(1);
            Ok(None)
        })
        .build_with(&counter)]);
        scheduler.register(CitizenId::new(raw).unwrap(), Box::new(agent));
    }
    scheduler
}

#[tokio::test]
async fn throttled_targets_spread_over_ticks() {
    let mut scheduler = throttled_colony(4);
    let operator = Arc::new(OperatorState::with_limits(0, 8));

    struct Fired(Vec<usize>);
    impl colony_core::runner::TickCallback<CitizenState> for Fired {
        fn on_tick(
            &mut self,
            summary: &colony_core::scheduler::TickSummary<CitizenState>,
            _scheduler: &mut Scheduler<CitizenState>,
        ) {
            self.0.push(summary.fired_count());
        }
    }

    let mut fired = Fired(Vec::new());
    let result = run_colony(&mut scheduler, &operator, &mut fired).await.unwrap();
    assert_eq!(result.total_ticks, 8);

    // Offsets 0..4 with rate 4: exactly one agent fires on every tick.
    assert_eq!(fired.0, vec![1; 8]);
}

#[tokio::test]
async fn pause_then_stop_from_another_task() {
    let mut scheduler = throttled_colony(2);
    let operator = Arc::new(OperatorState::with_limits(1, 0));

    let controller = {
        let operator = Arc::clone(&operator);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            operator.pause();
            tokio::time::sleep(Duration::from_millis(20)).await;
            operator.resume();
            tokio::time::sleep(Duration::from_millis(20)).await;
            operator.request_stop();
        })
    };

    let result = tokio::time::timeout(
        Duration::from_secs(5),
        run_colony(&mut scheduler, &operator, &mut NoOpCallback),
    )
    .await
    .unwrap()
    .unwrap();
    controller.await.unwrap();

    assert_eq!(result.end_reason, RunEndReason::OperatorStop);
    assert!(result.total_ticks > 0);
    assert_eq!(scheduler.clock().tick(), result.total_ticks);
}
