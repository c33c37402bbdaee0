// src/monitor/view.rs

//! Terminal rendering for the monitor: header, progress bar, per-task table.

use crate::monitor::{MonitorOptions, Snapshot};
use crate::run::outcome::TaskOutcome;
use crate::types::TaskStatus;

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const CYAN: &str = "\x1b[36m";
const YELLOW: &str = "\x1b[33m";
const CLEAR: &str = "\x1b[2J\x1b[H";

/// Per-tick counts derived from a snapshot.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Tally {
    pub succeeded: usize,
    pub failed: usize,
    pub running: usize,
    pub waiting: usize,
}

pub fn tally(snapshot: &Snapshot) -> Tally {
    let mut t = Tally::default();
    let total = snapshot.tasks.len();

    for task in &snapshot.tasks {
        if snapshot.running.contains_key(task) {
            t.running += 1;
            continue;
        }
        match outcome_of(snapshot, task).map(|o| o.status) {
            Some(TaskStatus::Success) | Some(TaskStatus::Skipped) => t.succeeded += 1,
            Some(TaskStatus::Failed)
            | Some(TaskStatus::Interrupted)
            | Some(TaskStatus::Timeout) => t.failed += 1,
            Some(TaskStatus::NotExecuted) | None => t.waiting += 1,
        }
    }

    // When the flow file is unreadable we still know about recorded
    // outcomes; count them so the header is not all zeros.
    if total == 0 {
        for outcome in &snapshot.outcomes {
            match outcome.status {
                TaskStatus::Success | TaskStatus::Skipped => t.succeeded += 1,
                TaskStatus::Failed | TaskStatus::Interrupted | TaskStatus::Timeout => {
                    t.failed += 1
                }
                TaskStatus::NotExecuted => t.waiting += 1,
            }
        }
    }

    t
}

fn outcome_of<'a>(snapshot: &'a Snapshot, task: &str) -> Option<&'a TaskOutcome> {
    snapshot.outcomes.iter().find(|o| o.name == task)
}

fn progress_bar(t: &Tally, width: usize) -> String {
    let total = t.succeeded + t.failed + t.running + t.waiting;
    if total == 0 {
        return format!("[{}] 0.0%", "-".repeat(width));
    }

    let w = |n: usize| n * width / total;
    let done_w = w(t.succeeded);
    let failed_w = w(t.failed);
    let running_w = w(t.running);
    let rest = width.saturating_sub(done_w + failed_w + running_w);

    let pct = (t.succeeded + t.failed) as f64 / total as f64 * 100.0;
    format!(
        "[{GREEN}{}{RESET}{RED}{}{RESET}{CYAN}{}{RESET}{}] {pct:.1}%",
        "=".repeat(done_w),
        "x".repeat(failed_w),
        "~".repeat(running_w),
        "-".repeat(rest),
    )
}

fn status_cell(snapshot: &Snapshot, task: &str) -> String {
    if let Some(running) = snapshot.running.get(task) {
        return format!("{CYAN}running (pid {}){RESET}", running.pid);
    }
    match outcome_of(snapshot, task).map(|o| o.status) {
        Some(TaskStatus::Success) => format!("{GREEN}Success{RESET}"),
        Some(TaskStatus::Skipped) => format!("{DIM}Skipped{RESET}"),
        Some(TaskStatus::Failed) => format!("{RED}Failed{RESET}"),
        Some(TaskStatus::Interrupted) => format!("{RED}Interrupted{RESET}"),
        Some(TaskStatus::Timeout) => format!("{RED}Timeout{RESET}"),
        Some(TaskStatus::NotExecuted) => format!("{DIM}Not Executed{RESET}"),
        None => format!("{DIM}waiting{RESET}"),
    }
}

/// Redraw the whole screen for one tick.
pub fn render(snapshot: &Snapshot, opts: &MonitorOptions) {
    let t = tally(snapshot);

    print!("{CLEAR}");
    println!("{BOLD}{CYAN}{}{RESET}", "=".repeat(80));
    println!("{BOLD}FLOWDAG - TASK MONITOR{RESET}");
    println!("{DIM}Flow:      {}{RESET}", opts.flow.display());
    println!("{DIM}Completed: {}{RESET}", opts.completed.display());
    if let Some(run_id) = &opts.run_id {
        println!("{DIM}Run id:    {run_id}{RESET}");
    }
    println!("{BOLD}{CYAN}{}{RESET}", "=".repeat(80));

    println!(
        "{GREEN}{} succeeded{RESET}  {RED}{} failed{RESET}  {CYAN}{} running{RESET}  {} waiting",
        t.succeeded, t.failed, t.running, t.waiting
    );
    println!("{}", progress_bar(&t, 50));
    println!();

    if snapshot.tasks.is_empty() && snapshot.outcomes.is_empty() {
        println!("{YELLOW}No data yet.{RESET}");
    } else {
        println!(
            "{:<20} {:<22} {:<22} {:<22} {}",
            "Task", "Start Time", "End Time", "Runtime (DD:HH:MM:SS)", "Status"
        );
        println!("{}", "-".repeat(100));
        for task in &snapshot.tasks {
            let (start, end, runtime) = match outcome_of(snapshot, task) {
                Some(o) => (o.start_time.as_str(), o.end_time.as_str(), o.runtime.as_str()),
                None => match snapshot.running.get(task) {
                    Some(r) => (r.since.as_str(), "-", "-"),
                    None => ("-", "-", "-"),
                },
            };
            println!(
                "{:<20} {:<22} {:<22} {:<22} {}",
                task,
                start,
                end,
                runtime,
                status_cell(snapshot, task)
            );
        }
    }

    println!();
    println!("{DIM}Press Ctrl+C to exit (the orchestrator keeps running).{RESET}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::RunningTask;
    use crate::run::outcome::now_stamp;

    fn outcome(name: &str, status: TaskStatus) -> TaskOutcome {
        TaskOutcome {
            name: name.to_string(),
            start_time: now_stamp(),
            end_time: now_stamp(),
            runtime: "00:00:00:01".to_string(),
            status,
        }
    }

    #[test]
    fn tally_buckets_every_state() {
        let mut snapshot = Snapshot {
            tasks: ["a", "b", "c", "d", "e"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            outcomes: vec![
                outcome("a", TaskStatus::Success),
                outcome("b", TaskStatus::Failed),
                outcome("c", TaskStatus::Timeout),
            ],
            running: Default::default(),
        };
        snapshot.running.insert(
            "d".to_string(),
            RunningTask {
                pid: 7,
                since: now_stamp(),
            },
        );

        let t = tally(&snapshot);
        assert_eq!(
            t,
            Tally {
                succeeded: 1,
                failed: 2,
                running: 1,
                waiting: 1
            }
        );
    }

    #[test]
    fn empty_snapshot_renders_zero_bar() {
        let t = tally(&Snapshot::default());
        assert_eq!(t, Tally::default());
        assert!(progress_bar(&t, 10).contains("0.0%"));
    }
}
