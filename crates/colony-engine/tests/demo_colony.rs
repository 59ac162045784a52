//! End-to-end runs of the demo colony on the real run loop.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use colony_core::config::ColonyConfig;
use colony_core::operator::{OperatorState, RunEndReason};
use colony_core::runner::run_colony;
use colony_core::scheduler::Scheduler;
use colony_engine::callback::ColonyCallback;
use colony_engine::colony::{Colony, SharedColony};
use colony_engine::spawner::spawn_citizens;
use colony_types::{CitizenState, RequestState};
use colony_workorders::{WorkManager, WorkOrder, WorkOrderRegistry};

fn founded(config: &ColonyConfig) -> (SharedColony, Scheduler<CitizenState>) {
    let colony = Colony::new(config).into_shared();
    let mut scheduler: Scheduler<CitizenState> = Scheduler::new();
    spawn_citizens(config, &colony, &mut scheduler).unwrap();
    (colony, scheduler)
}

#[tokio::test]
async fn colony_runs_to_tick_limit_without_faults() {
    let config = ColonyConfig::default();
    let (colony, mut scheduler) = founded(&config);
    let operator = Arc::new(OperatorState::with_limits(0, 400));
    let mut callback = ColonyCallback::new(SharedColony::clone(&colony), 10);

    let result = run_colony(&mut scheduler, &operator, &mut callback)
        .await
        .unwrap();

    assert_eq!(result.end_reason, RunEndReason::MaxTicksReached);
    assert_eq!(result.total_ticks, 400);
    assert_eq!(result.total_faults, 0);
    assert_eq!(callback.colony_ticks(), 40);

    let colony = colony.borrow();
    assert!(colony.work().top_id() > 0);
    for citizen in scheduler.citizens() {
        assert_ne!(scheduler.current_state(citizen), Some(CitizenState::Init));
    }
}

#[tokio::test]
async fn deliveries_get_resolved_over_a_long_run() {
    let config = ColonyConfig {
        builders: 0,
        deliverymen: 2,
        ..ColonyConfig::default()
    };
    let (colony, mut scheduler) = founded(&config);
    let operator = Arc::new(OperatorState::with_limits(0, 600));
    let mut callback = ColonyCallback::new(SharedColony::clone(&colony), 20);
    let mut tracked = Vec::new();
    {
        let mut host = colony.borrow_mut();
        let courier = colony_types::CitizenId::new(1).unwrap();
        for _ in 0..3 {
            let token = host.requests_mut().create_request();
            host.with_job(courier, |job, rs| job.add_request(token, rs))
                .unwrap();
            tracked.push(token);
        }
    }

    run_colony(&mut scheduler, &operator, &mut callback)
        .await
        .unwrap();

    let host = colony.borrow();
    for token in tracked {
        let state = host.requests().request_state(token).unwrap();
        assert!(
            matches!(state, RequestState::Resolved | RequestState::Cancelled),
            "{token} still {state:?}"
        );
    }
}

#[tokio::test]
async fn snapshot_after_a_run_restores_the_work_orders() {
    let config = ColonyConfig::default();
    let (colony, mut scheduler) = founded(&config);
    let operator = Arc::new(OperatorState::with_limits(0, 200));
    let mut callback = ColonyCallback::new(SharedColony::clone(&colony), 5);
    run_colony(&mut scheduler, &operator, &mut callback)
        .await
        .unwrap();

    let registry = WorkOrderRegistry::standard().unwrap();
    let host = colony.borrow();
    let snapshot = host.snapshot(&registry).unwrap();

    let work = snapshot.get("workManager").and_then(|v| v.as_object()).unwrap();
    let restored = WorkManager::read_from_compound(&registry, work);
    assert_eq!(restored.len(), host.work().len());
    assert_eq!(restored.top_id(), host.work().top_id());
    for (a, b) in restored.iter().zip(host.work().iter()) {
        assert_eq!(a.id(), b.id());
        assert_eq!(a.kind(), b.kind());
        assert_eq!(a.claimed_by(), b.claimed_by());
        assert_eq!(a.value(), b.value());
    }
}
