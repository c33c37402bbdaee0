// src/monitor/mod.rs

//! The read-only progress monitor.
//!
//! Runs as its own process (`flowdag-monitor`) with no control channel back
//! into the orchestrator: it reloads the flow definition and the completion
//! file on every tick and scans PID files to spot in-flight tasks. Any file
//! being absent or malformed means "no data yet", never an error.

pub mod view;

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Local};
use tracing::debug;

use crate::config::{expand_groups, load_from_path};
use crate::errors::Result;
use crate::exec::probe::ProcessProbe;
use crate::exec::script::read_pid_file;
use crate::run::outcome::{TaskOutcome, STAMP_FORMAT};
use crate::run::store::load_outcomes;

/// Where the monitor looks and how often.
#[derive(Debug, Clone)]
pub struct MonitorOptions {
    pub flow: PathBuf,
    pub completed: PathBuf,
    /// Run identity to match PID files against; without it, in-flight
    /// detection is disabled (stale files from other runs would bleed in).
    pub run_id: Option<String>,
    pub scratch_dir: PathBuf,
    pub refresh: Duration,
}

/// A task currently holding a live PID file.
#[derive(Debug, Clone)]
pub struct RunningTask {
    pub pid: u32,
    pub since: String,
}

/// One tick's view of the world.
#[derive(Debug, Default)]
pub struct Snapshot {
    /// Task names in flow order; empty if the flow file is unreadable.
    pub tasks: Vec<String>,
    pub outcomes: Vec<TaskOutcome>,
    pub running: HashMap<String, RunningTask>,
}

impl Snapshot {
    pub fn collect(opts: &MonitorOptions, probe: &dyn ProcessProbe) -> Self {
        let tasks = match load_from_path(&opts.flow) {
            Ok(flow) => expand_groups(&flow.task)
                .into_iter()
                .map(|t| t.name)
                .collect(),
            Err(e) => {
                debug!(error = %e, "flow file unreadable; rendering without task list");
                Vec::new()
            }
        };

        let outcomes = load_outcomes(&opts.completed);

        let running = match &opts.run_id {
            Some(run_id) => scan_running(&opts.scratch_dir, &tasks, run_id, probe),
            None => HashMap::new(),
        };

        Self {
            tasks,
            outcomes,
            running,
        }
    }
}

/// Find tasks with a live PID file for this run.
///
/// PID file names are `flowtask_<task>_<run-id>_<attempt>.pid`; matching is
/// done per known task name, so task names containing underscores cannot be
/// confused with one another.
fn scan_running(
    scratch_dir: &Path,
    tasks: &[String],
    run_id: &str,
    probe: &dyn ProcessProbe,
) -> HashMap<String, RunningTask> {
    let mut running = HashMap::new();

    let Ok(entries) = fs::read_dir(scratch_dir) else {
        return running;
    };
    let paths: Vec<PathBuf> = entries.flatten().map(|e| e.path()).collect();

    for task in tasks {
        let prefix = format!("flowtask_{task}_{run_id}_");
        for path in &paths {
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !name.starts_with(&prefix) || !name.ends_with(".pid") {
                continue;
            }
            let Some(pid) = read_pid_file(path) else {
                continue;
            };
            if probe.alive(pid) {
                let since = fs::metadata(path)
                    .and_then(|m| m.modified())
                    .map(|t| DateTime::<Local>::from(t).format(STAMP_FORMAT).to_string())
                    .unwrap_or_else(|_| "?".to_string());
                running.insert(task.clone(), RunningTask { pid, since });
                break;
            }
        }
    }

    running
}

/// Render loop. Never writes to any file the orchestrator owns.
pub async fn run_monitor(opts: &MonitorOptions, probe: &dyn ProcessProbe) -> Result<()> {
    loop {
        let snapshot = Snapshot::collect(opts, probe);
        view::render(&snapshot, opts);
        tokio::time::sleep(opts.refresh).await;
    }
}
