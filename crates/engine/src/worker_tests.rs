use super::*;
use crate::graph_ticker::GraphTicker;
use crate::policy::AllowAllPolicy;
use av_core::{FakeClock, RunGraph, RunMode, RunStatus, StepDef, StepId};
use av_storage::{ConfigRegistry, RunStore};
use std::collections::BTreeMap;
use std::sync::Arc;

async fn test_pool() -> sqlx::SqlitePool {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    av_storage::migrate(&pool).await.unwrap();
    pool
}

fn noop_graph() -> RunGraph {
    let mut steps = BTreeMap::new();
    steps.insert(
        StepId::new("noop"),
        StepDef {
            id: StepId::new("noop"),
            deps: vec![],
            kind: "noop".into(),
        },
    );
    RunGraph {
        entry_step: StepId::new("noop"),
        steps,
    }
}

#[tokio::test]
async fn tick_once_runs_a_single_noop_run_to_completion() {
    let pool = test_pool().await;
    let clock = FakeClock::new();
    let run_store = RunStore::new(pool.clone(), clock.clone());
    let event_bus = EventBus::new(pool.clone(), clock.clone());
    let lease_store = LeaseStore::new(pool.clone(), clock.clone());
    let config_registry = ConfigRegistry::new(pool, clock.clone());
    let kill_switch = KillSwitch::new(&config_registry);

    run_store
        .create_run(
            "local",
            "default",
            RunMode::DryRun,
            "demo",
            "tester",
            noop_graph(),
            serde_json::json!({}),
            None,
        )
        .await
        .unwrap();

    let scheduler = Scheduler::new(run_store.clone());
    let ticker = GraphTicker::new(
        run_store.clone(),
        event_bus.clone(),
        clock.clone(),
        Some(Arc::new(AllowAllPolicy)),
        None,
    );
    let worker = Worker::new(scheduler, lease_store, ticker, event_bus);

    let summary = worker
        .tick_once(
            "local",
            "default",
            "proof",
            SchedulerCaps::new(1),
            Duration::seconds(15),
            &kill_switch,
        )
        .await
        .unwrap();

    assert_eq!(summary.runs_ticked, 1);
    assert_eq!(summary.ticks_used, 1);
}

#[tokio::test]
async fn tick_once_respects_disabled_kill_switch() {
    let pool = test_pool().await;
    let clock = FakeClock::new();
    let run_store = RunStore::new(pool.clone(), clock.clone());
    let event_bus = EventBus::new(pool.clone(), clock.clone());
    let lease_store = LeaseStore::new(pool.clone(), clock.clone());
    let config_registry = ConfigRegistry::new(pool, clock.clone());
    let kill_switch = KillSwitch::new(&config_registry);
    kill_switch.set_lane_enabled("local", "default", false).await.unwrap();

    run_store
        .create_run(
            "local",
            "default",
            RunMode::DryRun,
            "demo",
            "tester",
            noop_graph(),
            serde_json::json!({}),
            None,
        )
        .await
        .unwrap();

    let scheduler = Scheduler::new(run_store.clone());
    let ticker = GraphTicker::new(
        run_store.clone(),
        event_bus.clone(),
        clock.clone(),
        Some(Arc::new(AllowAllPolicy)),
        None,
    );
    let worker = Worker::new(scheduler, lease_store, ticker, event_bus);

    let summary = worker
        .tick_once(
            "local",
            "default",
            "proof",
            SchedulerCaps::new(1),
            Duration::seconds(15),
            &kill_switch,
        )
        .await
        .unwrap();

    assert_eq!(summary.runs_ticked, 0);
    let state = run_store
        .get_run_summary(&run_store.next_run_id("local", "default").await.unwrap().unwrap())
        .await
        .unwrap();
    assert_eq!(state.status, RunStatus::Queued);
}

#[tokio::test]
async fn tick_once_caps_at_one_run_per_invocation() {
    let pool = test_pool().await;
    let clock = FakeClock::new();
    let run_store = RunStore::new(pool.clone(), clock.clone());
    let event_bus = EventBus::new(pool.clone(), clock.clone());
    let lease_store = LeaseStore::new(pool.clone(), clock.clone());
    let config_registry = ConfigRegistry::new(pool, clock.clone());
    let kill_switch = KillSwitch::new(&config_registry);

    for _ in 0..3 {
        run_store
            .create_run(
                "local",
                "default",
                RunMode::DryRun,
                "demo",
                "tester",
                noop_graph(),
                serde_json::json!({}),
                None,
            )
            .await
            .unwrap();
        clock.advance(std::time::Duration::from_secs(1));
    }

    let scheduler = Scheduler::new(run_store.clone());
    let ticker = GraphTicker::new(
        run_store.clone(),
        event_bus.clone(),
        clock.clone(),
        Some(Arc::new(AllowAllPolicy)),
        None,
    );
    let worker = Worker::new(scheduler, lease_store, ticker, event_bus);

    let summary = worker
        .tick_once(
            "local",
            "default",
            "proof",
            SchedulerCaps::new(1),
            Duration::seconds(15),
            &kill_switch,
        )
        .await
        .unwrap();

    assert!(summary.runs_ticked <= 1);
}

#[tokio::test]
async fn tick_once_is_bounded_when_the_only_run_is_leased_by_another_owner() {
    let pool = test_pool().await;
    let clock = FakeClock::new();
    let run_store = RunStore::new(pool.clone(), clock.clone());
    let event_bus = EventBus::new(pool.clone(), clock.clone());
    let lease_store = LeaseStore::new(pool.clone(), clock.clone());
    let config_registry = ConfigRegistry::new(pool, clock.clone());
    let kill_switch = KillSwitch::new(&config_registry);

    let run_id = run_store
        .create_run(
            "local",
            "default",
            RunMode::DryRun,
            "demo",
            "tester",
            noop_graph(),
            serde_json::json!({}),
            None,
        )
        .await
        .unwrap();

    // Another owner holds the only runnable run's lease for the whole
    // invocation; `next_run_id` is not lease-aware, so every iteration would
    // re-select the same run and fail to acquire it.
    lease_store.acquire(&run_id, "other-owner", Duration::seconds(60)).await.unwrap();

    let scheduler = Scheduler::new(run_store.clone());
    let ticker = GraphTicker::new(
        run_store.clone(),
        event_bus.clone(),
        clock.clone(),
        Some(Arc::new(AllowAllPolicy)),
        None,
    );
    let worker = Worker::new(scheduler, lease_store, ticker, event_bus);

    let summary = worker
        .tick_once(
            "local",
            "default",
            "proof",
            SchedulerCaps::new(5),
            Duration::seconds(15),
            &kill_switch,
        )
        .await
        .unwrap();

    // Bounded by the cap, not stuck in an unbounded retry loop.
    assert_eq!(summary.runs_ticked, 0);
    assert_eq!(summary.ticks_used, 0);
}
