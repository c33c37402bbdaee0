// src/run/outcome.rs

use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::types::TaskStatus;

/// Wall-clock format used in all user-facing files and tables.
pub const STAMP_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// One record per attempted task per run.
///
/// Owned exclusively by the executor; appended to the completion store as
/// soon as the verdict is known and never mutated afterwards. A retry
/// produces a fresh record; only the final attempt is persisted for the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskOutcome {
    pub name: String,
    pub start_time: String,
    pub end_time: String,
    pub runtime: String,
    pub status: TaskStatus,
}

impl TaskOutcome {
    /// Record for a task that never got a process: `Skipped`,
    /// `Not Executed`, or an interrupt before launch.
    pub fn unstarted(name: &str, status: TaskStatus) -> Self {
        let stamp = now_stamp();
        Self {
            name: name.to_string(),
            start_time: stamp.clone(),
            end_time: stamp,
            runtime: "00:00:00:00".to_string(),
            status,
        }
    }
}

/// Current local time in the shared stamp format.
pub fn now_stamp() -> String {
    Local::now().format(STAMP_FORMAT).to_string()
}

/// Format an elapsed duration as `DD:HH:MM:SS`.
pub fn format_elapsed(secs: u64) -> String {
    let days = secs / 86_400;
    let hours = (secs % 86_400) / 3_600;
    let minutes = (secs % 3_600) / 60;
    let seconds = secs % 60;
    format!("{days:02}:{hours:02}:{minutes:02}:{seconds:02}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_formatting() {
        assert_eq!(format_elapsed(0), "00:00:00:00");
        assert_eq!(format_elapsed(61), "00:00:01:01");
        assert_eq!(format_elapsed(86_400 + 3_600 + 60 + 1), "01:01:01:01");
    }

    #[test]
    fn unstarted_outcome_has_zero_runtime() {
        let outcome = TaskOutcome::unstarted("syn", TaskStatus::Skipped);
        assert_eq!(outcome.runtime, "00:00:00:00");
        assert_eq!(outcome.start_time, outcome.end_time);
        assert_eq!(outcome.status, TaskStatus::Skipped);
    }
}
