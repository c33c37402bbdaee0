// src/engine/summary.rs

//! End-of-run reporting: the per-task table, the overall tally, and the
//! exit-code decision.

use chrono::NaiveDateTime;

use crate::run::outcome::{format_elapsed, TaskOutcome, STAMP_FORMAT};
use crate::types::TaskStatus;

/// Everything the end of a run needs to report on.
#[derive(Debug)]
pub struct RunReport {
    pub order: Vec<String>,
    pub outcomes: Vec<TaskOutcome>,
}

impl RunReport {
    /// True when the run should exit non-zero (some task ended
    /// `Failed`/`Timeout` and the operator did not opt into ignoring
    /// failures).
    pub fn is_failure(&self, ignore_failures: bool) -> bool {
        !ignore_failures && self.outcomes.iter().any(|o| o.status.is_failure())
    }

    /// Synthesised `Total` row spanning the first start to the last end.
    pub fn total_row(&self) -> Option<TaskOutcome> {
        let starts: Vec<NaiveDateTime> = self
            .outcomes
            .iter()
            .filter(|o| o.status != TaskStatus::NotExecuted)
            .filter_map(|o| NaiveDateTime::parse_from_str(&o.start_time, STAMP_FORMAT).ok())
            .collect();
        let ends: Vec<NaiveDateTime> = self
            .outcomes
            .iter()
            .filter(|o| o.status != TaskStatus::NotExecuted)
            .filter_map(|o| NaiveDateTime::parse_from_str(&o.end_time, STAMP_FORMAT).ok())
            .collect();

        let first = starts.iter().min()?;
        let last = ends.iter().max()?;
        let elapsed = (*last - *first).num_seconds().max(0) as u64;

        Some(TaskOutcome {
            name: "Total".to_string(),
            start_time: first.format(STAMP_FORMAT).to_string(),
            end_time: last.format(STAMP_FORMAT).to_string(),
            runtime: format_elapsed(elapsed),
            status: TaskStatus::Success,
        })
    }
}

/// Print the one-line-per-task summary plus the pass/fail tally. Always
/// called at run end, however the run stopped.
pub fn print_summary(report: &RunReport) {
    if report.outcomes.is_empty() {
        println!("\nNo tasks were executed.");
        return;
    }

    println!("\nExecution Summary:");
    println!(
        "{:<20} {:<22} {:<22} {:<22} {:<12}",
        "Task Name", "Start Time", "End Time", "Runtime (DD:HH:MM:SS)", "Status"
    );
    println!("{}", "-".repeat(100));
    for outcome in &report.outcomes {
        println!(
            "{:<20} {:<22} {:<22} {:<22} {:<12}",
            outcome.name,
            outcome.start_time,
            outcome.end_time,
            outcome.runtime,
            outcome.status.to_string()
        );
    }
    if let Some(total) = report.total_row() {
        println!("{}", "-".repeat(100));
        println!(
            "{:<20} {:<22} {:<22} {:<22}",
            total.name, total.start_time, total.end_time, total.runtime
        );
    }
    println!("{}", "-".repeat(100));

    let count = |status: TaskStatus| {
        report
            .outcomes
            .iter()
            .filter(|o| o.status == status)
            .count()
    };
    println!(
        "{} total: {} success, {} failed, {} interrupted, {} timeout, {} skipped, {} not executed",
        report.outcomes.len(),
        count(TaskStatus::Success),
        count(TaskStatus::Failed),
        count(TaskStatus::Interrupted),
        count(TaskStatus::Timeout),
        count(TaskStatus::Skipped),
        count(TaskStatus::NotExecuted),
    );
}
