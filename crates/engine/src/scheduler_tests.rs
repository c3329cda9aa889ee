use super::*;
use av_core::FakeClock;
use av_storage::RunStore;

fn caps(total: u32) -> SchedulerCaps {
    SchedulerCaps::new(total)
}

#[test]
fn enforce_caps_allows_until_total_reached() {
    let c = caps(3);
    assert!(Scheduler::<FakeClock>::enforce_caps(0, &c).is_ok());
    assert!(Scheduler::<FakeClock>::enforce_caps(2, &c).is_ok());
    assert!(matches!(
        Scheduler::<FakeClock>::enforce_caps(3, &c),
        Err(EngineError::CapReached)
    ));
}

#[test]
fn per_run_and_daily_caps_are_round_tripped_not_enforced() {
    let mut c = caps(100);
    c.max_ticks_per_run_per_invocation = 1;
    c.daily_tick_cap = 1;
    // ticks_used far exceeds the per-run/daily fields but not the total cap.
    assert!(Scheduler::<FakeClock>::enforce_caps(50, &c).is_ok());
    let json = serde_json::to_value(c).unwrap();
    assert_eq!(json["max_ticks_per_run_per_invocation"], 1);
    assert_eq!(json["daily_tick_cap"], 1);
}

async fn test_pool() -> sqlx::SqlitePool {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    av_storage::migrate(&pool).await.unwrap();
    pool
}

#[tokio::test]
async fn next_run_id_delegates_to_run_store_fifo_order() {
    use av_core::{RunGraph, RunMode, StepDef, StepId};
    use std::collections::BTreeMap;

    let pool = test_pool().await;
    let clock = FakeClock::new();
    let run_store = RunStore::new(pool, clock.clone());
    let scheduler = Scheduler::new(run_store.clone());

    let mut steps = BTreeMap::new();
    steps.insert(
        StepId::new("noop"),
        StepDef {
            id: StepId::new("noop"),
            deps: vec![],
            kind: "noop".into(),
        },
    );
    let graph = RunGraph {
        entry_step: StepId::new("noop"),
        steps,
    };

    assert!(scheduler.next_run_id("local", "default").await.unwrap().is_none());

    let first = run_store
        .create_run(
            "local",
            "default",
            RunMode::DryRun,
            "demo",
            "tester",
            graph,
            serde_json::json!({}),
            None,
        )
        .await
        .unwrap();

    assert_eq!(
        scheduler.next_run_id("local", "default").await.unwrap(),
        Some(first)
    );
}
