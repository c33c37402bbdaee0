// tests/engine_fake_launcher.rs

//! End-to-end scheduling-loop behaviour over the fake launcher: halt
//! policy, Not Executed backfill, skip-completed and force semantics, and
//! what lands in the completion store.

mod common;
use crate::common::init_tracing;

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use flowdag::config::TaskSpec;
use flowdag::dag::{ExecutionPlan, ExecutionRange};
use flowdag::engine::{run_plan, EngineOptions, InterruptFlag};
use flowdag::exec::{HealthConfig, LaunchMode, RunnerContext};
use flowdag::run::store::{load_outcomes, CompletionStore};
use flowdag::types::{RunId, TaskStatus, TerminalKind};
use flowdag_test_utils::builders::TaskSpecBuilder;
use flowdag_test_utils::fake_launcher::{DeadProbe, FakeBehaviour, FakeLauncher};

fn fast_health() -> HealthConfig {
    HealthConfig {
        status_poll: Duration::from_millis(5),
        terminal_check: Duration::from_millis(10),
        deep_check: Duration::from_secs(60),
        status_stale_after: Duration::from_secs(60),
        wall_clock_limit: Duration::from_secs(5),
        reap_grace: Duration::from_millis(1),
    }
}

fn ctx<'a>(
    launcher: &'a FakeLauncher,
    probe: &'a DeadProbe,
    scratch: &Path,
) -> RunnerContext<'a> {
    RunnerContext {
        run_id: RunId(7),
        scratch_dir: scratch.to_path_buf(),
        run_dir: "tests".to_string(),
        mode: LaunchMode::Terminal(TerminalKind::Xterm),
        launcher,
        probe,
        interrupt: InterruptFlag::new(),
        health: fast_health(),
    }
}

fn chain() -> Vec<TaskSpec> {
    vec![
        TaskSpecBuilder::new("A").build(),
        TaskSpecBuilder::new("B").depends_on("A").build(),
        TaskSpecBuilder::new("C").depends_on("B").build(),
    ]
}

fn statuses(outcomes: &[flowdag::run::TaskOutcome]) -> Vec<(String, TaskStatus)> {
    outcomes
        .iter()
        .map(|o| (o.name.clone(), o.status))
        .collect()
}

#[tokio::test]
async fn chain_runs_in_order_and_is_recorded() {
    init_tracing();
    let scratch = tempfile::tempdir().unwrap();
    let logs = tempfile::tempdir().unwrap();
    let launcher = FakeLauncher::new();
    let probe = DeadProbe::new();

    let tasks = chain();
    let plan = ExecutionPlan::compute(&tasks, &HashSet::new(), &ExecutionRange::All).unwrap();
    let mut store = CompletionStore::open(logs.path(), "full_run", RunId(7)).unwrap();

    let ctx = ctx(&launcher, &probe, scratch.path());
    let options = EngineOptions {
        force: false,
        max_retries: 3,
    };

    let outcomes = run_plan(&plan, &tasks, &HashSet::new(), &mut store, &ctx, &options)
        .await
        .unwrap();

    assert_eq!(launcher.launched(), vec!["A", "B", "C"]);
    assert_eq!(
        statuses(&outcomes),
        vec![
            ("A".to_string(), TaskStatus::Success),
            ("B".to_string(), TaskStatus::Success),
            ("C".to_string(), TaskStatus::Success),
        ]
    );

    // The store on disk matches what the run reported.
    let persisted = load_outcomes(store.path());
    assert_eq!(statuses(&persisted), statuses(&outcomes));
}

#[tokio::test]
async fn failure_halts_and_backfills_not_executed() {
    init_tracing();
    let scratch = tempfile::tempdir().unwrap();
    let logs = tempfile::tempdir().unwrap();
    let launcher = FakeLauncher::new();
    let probe = DeadProbe::new();

    launcher.on_task("A", FakeBehaviour::Exit(1));

    let tasks = chain();
    let plan = ExecutionPlan::compute(&tasks, &HashSet::new(), &ExecutionRange::All).unwrap();
    let mut store = CompletionStore::open(logs.path(), "full_run", RunId(7)).unwrap();

    let ctx = ctx(&launcher, &probe, scratch.path());
    let options = EngineOptions {
        force: false,
        max_retries: 1,
    };

    let outcomes = run_plan(&plan, &tasks, &HashSet::new(), &mut store, &ctx, &options)
        .await
        .unwrap();

    assert_eq!(
        statuses(&outcomes),
        vec![
            ("A".to_string(), TaskStatus::Failed),
            ("B".to_string(), TaskStatus::NotExecuted),
            ("C".to_string(), TaskStatus::NotExecuted),
        ]
    );
    assert_eq!(launcher.launched(), vec!["A"], "halt must stop spawning");
}

#[tokio::test]
async fn force_continues_past_failures() {
    init_tracing();
    let scratch = tempfile::tempdir().unwrap();
    let logs = tempfile::tempdir().unwrap();
    let launcher = FakeLauncher::new();
    let probe = DeadProbe::new();

    launcher.on_task("A", FakeBehaviour::Exit(1));

    let tasks = chain();
    let plan = ExecutionPlan::compute(&tasks, &HashSet::new(), &ExecutionRange::All).unwrap();
    let mut store = CompletionStore::open(logs.path(), "full_run", RunId(7)).unwrap();

    let ctx = ctx(&launcher, &probe, scratch.path());
    let options = EngineOptions {
        force: true,
        max_retries: 1,
    };

    let outcomes = run_plan(&plan, &tasks, &HashSet::new(), &mut store, &ctx, &options)
        .await
        .unwrap();

    assert_eq!(
        statuses(&outcomes),
        vec![
            ("A".to_string(), TaskStatus::Failed),
            ("B".to_string(), TaskStatus::Success),
            ("C".to_string(), TaskStatus::Success),
        ]
    );
}

#[tokio::test]
async fn preset_interrupt_records_everything_not_executed() {
    init_tracing();
    let scratch = tempfile::tempdir().unwrap();
    let logs = tempfile::tempdir().unwrap();
    let launcher = FakeLauncher::new();
    let probe = DeadProbe::new();

    let tasks = chain();
    let plan = ExecutionPlan::compute(&tasks, &HashSet::new(), &ExecutionRange::All).unwrap();
    let mut store = CompletionStore::open(logs.path(), "full_run", RunId(7)).unwrap();

    let ctx = ctx(&launcher, &probe, scratch.path());
    ctx.interrupt.set();
    let options = EngineOptions {
        force: false,
        max_retries: 3,
    };

    let outcomes = run_plan(&plan, &tasks, &HashSet::new(), &mut store, &ctx, &options)
        .await
        .unwrap();

    assert!(launcher.launched().is_empty(), "no process may be spawned");
    assert!(outcomes
        .iter()
        .all(|o| o.status == TaskStatus::NotExecuted));
    assert_eq!(outcomes.len(), 3);
}

#[tokio::test]
async fn interruption_mid_run_stops_the_rest() {
    init_tracing();
    let scratch = tempfile::tempdir().unwrap();
    let logs = tempfile::tempdir().unwrap();
    let launcher = FakeLauncher::new();
    let probe = DeadProbe::new();

    // B's window is closed by accident; C must never start.
    launcher.on_task("B", FakeBehaviour::Vanish);

    let tasks = chain();
    let plan = ExecutionPlan::compute(&tasks, &HashSet::new(), &ExecutionRange::All).unwrap();
    let mut store = CompletionStore::open(logs.path(), "full_run", RunId(7)).unwrap();

    let ctx = ctx(&launcher, &probe, scratch.path());
    let options = EngineOptions {
        force: false,
        max_retries: 3,
    };

    let outcomes = run_plan(&plan, &tasks, &HashSet::new(), &mut store, &ctx, &options)
        .await
        .unwrap();

    assert_eq!(
        statuses(&outcomes),
        vec![
            ("A".to_string(), TaskStatus::Success),
            ("B".to_string(), TaskStatus::Interrupted),
            ("C".to_string(), TaskStatus::NotExecuted),
        ]
    );
    assert_eq!(launcher.launched(), vec!["A", "B"]);
}

#[tokio::test]
async fn previously_successful_tasks_are_skipped_without_force() {
    init_tracing();
    let scratch = tempfile::tempdir().unwrap();
    let logs = tempfile::tempdir().unwrap();
    let launcher = FakeLauncher::new();
    let probe = DeadProbe::new();

    let tasks = chain();
    let completed: HashSet<String> = ["A".to_string()].into_iter().collect();
    // Plan as the orchestrator would: completed tasks removed up front.
    let plan = ExecutionPlan::compute(&tasks, &completed, &ExecutionRange::All).unwrap();
    let mut store = CompletionStore::open(logs.path(), "full_run", RunId(7)).unwrap();

    let ctx = ctx(&launcher, &probe, scratch.path());
    let options = EngineOptions {
        force: false,
        max_retries: 3,
    };

    let outcomes = run_plan(&plan, &tasks, &completed, &mut store, &ctx, &options)
        .await
        .unwrap();

    assert_eq!(launcher.launched(), vec!["B", "C"]);
    assert_eq!(
        statuses(&outcomes),
        vec![
            ("B".to_string(), TaskStatus::Success),
            ("C".to_string(), TaskStatus::Success),
        ]
    );
}
