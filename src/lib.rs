// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod monitor;
pub mod run;
pub mod types;

use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use tracing::{info, warn};

use crate::cli::CliArgs;
use crate::config::{expand_groups, load_and_validate, substitute_run_dir, TaskSpec};
use crate::dag::{ExecutionPlan, ExecutionRange};
use crate::engine::{
    executor::{run_plan, EngineOptions},
    interrupt::{install_signal_handlers, InterruptFlag},
    summary::{print_summary, RunReport},
};
use crate::errors::Result;
use crate::exec::{
    terminal::{default_terminal, select_terminal, terminal_invocation},
    HealthConfig, LaunchMode, OsLauncher, RunnerContext, SysinfoProbe,
};
use crate::run::{CompletionStore, RuntimeHistory, TaskOutcome};
use crate::types::{RunId, TaskStatus};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - flow loading + validation + group expansion
/// - execution planning
/// - completion store / runtime history
/// - the sequential executor with process supervision
/// - signal handling and the optional sibling monitor
///
/// Returns the process exit code.
pub async fn run(args: CliArgs) -> Result<i32> {
    let flow_path = PathBuf::from(&args.flow);
    let flow = load_and_validate(&flow_path)?;

    let run_dir = current_dir_basename();
    let mut expanded = expand_groups(&flow.task);
    substitute_run_dir(&mut expanded, &run_dir);

    let range = ExecutionRange::from_cli(args.start.clone(), args.end.clone(), args.only.clone());
    let signature = range.signature();
    let run_id = RunId::now();

    let log_dir = PathBuf::from(&flow.config.log_dir);
    let mut store = CompletionStore::open(&log_dir, &signature, run_id)?;

    if args.force {
        info!("force mode: discarding prior completion records for this range");
        store.clear_previous();
    }
    let previous = store.previous_outcomes();
    let completed = store.previous_successes();

    let plan = ExecutionPlan::compute(&expanded, &completed, &range)?;
    if plan.is_empty() {
        println!("No tasks to execute.");
        return Ok(0);
    }

    print_plan(&plan, &expanded);

    if args.dry_run {
        return Ok(0);
    }

    print_previous_run(&previous);

    if !args.yes && !confirm_proceed(&previous)? {
        println!("Execution skipped.");
        return Ok(0);
    }

    let mode = if args.single_term {
        LaunchMode::SingleTerminal
    } else {
        LaunchMode::Terminal(select_terminal(args.terminal)?)
    };

    let scratch_dir = flow
        .config
        .scratch_dir
        .as_ref()
        .map(PathBuf::from)
        .unwrap_or_else(std::env::temp_dir);

    if args.monitor {
        launch_monitor(&flow_path, store.path(), &scratch_dir, run_id, &run_dir);
    }

    let interrupt = InterruptFlag::new();
    install_signal_handlers(&interrupt);

    let launcher = OsLauncher;
    let probe = SysinfoProbe::new();
    let ctx = RunnerContext {
        run_id,
        scratch_dir,
        run_dir,
        mode,
        launcher: &launcher,
        probe: &probe,
        interrupt: interrupt.clone(),
        health: HealthConfig::default()
            .with_wall_clock_limit(Duration::from_secs(args.timeout)),
    };
    let options = EngineOptions {
        force: args.force,
        max_retries: args.max_retries,
    };

    println!("Starting task execution...");
    let outcomes = run_plan(&plan, &expanded, &completed, &mut store, &ctx, &options).await?;

    let report = RunReport {
        order: plan.order.clone(),
        outcomes,
    };
    print_summary(&report);

    RuntimeHistory::new(&log_dir, &signature).append_run(&report.order, &report.outcomes)?;

    if interrupt.is_set() {
        println!("\nExecution was interrupted; some tasks may not have completed.");
    }

    Ok(if report.is_failure(args.force) { 1 } else { 0 })
}

/// Basename of the working directory, used in window titles and `$run_dir`
/// command substitution.
fn current_dir_basename() -> String {
    std::env::current_dir()
        .ok()
        .and_then(|d| d.file_name().map(|n| n.to_string_lossy().into_owned()))
        .unwrap_or_else(|| ".".to_string())
}

/// Print the resolved execution order with each task's scheduling inputs.
fn print_plan(plan: &ExecutionPlan, tasks: &[TaskSpec]) {
    println!("\nExecution Order:");
    println!(
        "{:<4} {:<20} {:<28} {:<28} {}",
        "No.", "Task", "Depends On", "Any Of", "Priority"
    );
    println!("{}", "-".repeat(100));
    for (idx, name) in plan.order.iter().enumerate() {
        let spec = tasks.iter().find(|t| &t.name == name);
        let (deps, any_of, priority) = match spec {
            Some(t) => (t.depends_on.join(", "), t.any_of.join(", "), t.priority),
            None => (String::new(), String::new(), 0),
        };
        println!(
            "{:<4} {:<20} {:<28} {:<28} {}",
            idx + 1,
            name,
            deps,
            any_of,
            priority
        );
    }
    println!("{}", "-".repeat(100));
}

/// Show what the most recent previous run of this range did.
fn print_previous_run(previous: &[TaskOutcome]) {
    if previous.is_empty() {
        println!("No previous runs found for this task range.");
        return;
    }

    println!("\nMost Recent Run:");
    println!(
        "{:<20} {:<22} {:<22} {:<22} {:<12}",
        "Task Name", "Start Time", "End Time", "Runtime (DD:HH:MM:SS)", "Status"
    );
    println!("{}", "-".repeat(100));
    for outcome in previous {
        println!(
            "{:<20} {:<22} {:<22} {:<22} {:<12}",
            outcome.name,
            outcome.start_time,
            outcome.end_time,
            outcome.runtime,
            outcome.status.to_string()
        );
    }
    println!("{}", "-".repeat(100));

    let success = previous
        .iter()
        .filter(|o| o.status == TaskStatus::Success)
        .count();
    if success == previous.len() {
        println!("Previous run completed successfully; re-running will repeat all work.");
    } else {
        println!(
            "Previous run incomplete: {success} of {} tasks succeeded.",
            previous.len()
        );
    }
}

/// Interactive go/no-go prompt (skipped with `-y`).
fn confirm_proceed(previous: &[TaskOutcome]) -> Result<bool> {
    let mut stdout = std::io::stdout();
    if previous.is_empty() || previous.iter().any(|o| o.status != TaskStatus::Success) {
        print!("Proceed with execution? [Y/n]: ");
    } else {
        print!("Proceed anyway? [y/N]: ");
    }
    stdout.flush().context("flushing prompt")?;

    let mut line = String::new();
    std::io::stdin()
        .read_line(&mut line)
        .context("reading confirmation")?;

    let answer = line.trim().to_lowercase();
    let default_yes = previous.is_empty() || previous.iter().any(|o| o.status != TaskStatus::Success);
    Ok(match answer.as_str() {
        "y" | "yes" => true,
        "n" | "no" => false,
        "" => default_yes,
        _ => false,
    })
}

/// Start the sibling monitor process in its own terminal window.
///
/// The monitor has no control channel back into the orchestrator, so a
/// failure to launch it only costs visibility; the run proceeds either way.
fn launch_monitor(
    flow_path: &Path,
    completed: &Path,
    scratch_dir: &Path,
    run_id: RunId,
    run_dir: &str,
) {
    let Some(kind) = default_terminal() else {
        warn!("no terminal emulator available; monitor not launched");
        return;
    };

    let monitor_exe = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|d| d.join("flowdag-monitor")));
    let Some(monitor_exe) = monitor_exe else {
        warn!("could not locate flowdag-monitor next to this binary");
        return;
    };

    let inner = vec![
        monitor_exe.display().to_string(),
        "--flow".to_string(),
        flow_path.display().to_string(),
        "--completed".to_string(),
        completed.display().to_string(),
        "--scratch-dir".to_string(),
        scratch_dir.display().to_string(),
        "--run-id".to_string(),
        run_id.to_string(),
    ];
    let title = format!("Flow Monitor @ {run_dir}");
    let (program, prog_args) = terminal_invocation(kind, &title, &inner);

    match std::process::Command::new(&program)
        .args(&prog_args)
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .spawn()
    {
        Ok(child) => {
            info!(pid = child.id(), terminal = %kind, "task monitor launched");
            println!("Task monitor launched in {kind} (pid {}).", child.id());
        }
        Err(e) => warn!(error = %e, "failed to launch task monitor"),
    }
}
