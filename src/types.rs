// src/types.rs

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Terminal status of one task attempt.
///
/// Serialized into the completion file and the runtime history with the
/// display strings below, so other tools reading those files see stable
/// values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    Success,
    Failed,
    Interrupted,
    Timeout,
    Skipped,
    #[serde(rename = "Not Executed")]
    NotExecuted,
}

impl TaskStatus {
    /// True for statuses that should halt scheduling of the remaining plan.
    pub fn halts_run(self) -> bool {
        matches!(
            self,
            TaskStatus::Failed | TaskStatus::Interrupted | TaskStatus::Timeout
        )
    }

    /// True for statuses that count against the process exit code.
    pub fn is_failure(self) -> bool {
        matches!(self, TaskStatus::Failed | TaskStatus::Timeout)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskStatus::Success => "Success",
            TaskStatus::Failed => "Failed",
            TaskStatus::Interrupted => "Interrupted",
            TaskStatus::Timeout => "Timeout",
            TaskStatus::Skipped => "Skipped",
            TaskStatus::NotExecuted => "Not Executed",
        };
        f.write_str(s)
    }
}

/// Terminal emulator used for per-task windows in multi-terminal mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TerminalKind {
    Xterm,
    GnomeTerminal,
}

impl TerminalKind {
    /// Executable name to look up on `$PATH`.
    pub fn program(self) -> &'static str {
        match self {
            TerminalKind::Xterm => "xterm",
            TerminalKind::GnomeTerminal => "gnome-terminal",
        }
    }
}

impl fmt::Display for TerminalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.program())
    }
}

impl FromStr for TerminalKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "xterm" => Ok(TerminalKind::Xterm),
            "gnome-terminal" => Ok(TerminalKind::GnomeTerminal),
            other => Err(format!(
                "invalid terminal: {other} (expected \"xterm\" or \"gnome-terminal\")"
            )),
        }
    }
}

/// Token scoping one orchestrator invocation.
///
/// Unix seconds at startup; stamps the completion file and every status/PID
/// file so a stale file from a previous run is never misread as current.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunId(pub i64);

impl RunId {
    pub fn now() -> Self {
        RunId(chrono::Local::now().timestamp())
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_display_matches_file_contract() {
        assert_eq!(TaskStatus::NotExecuted.to_string(), "Not Executed");
        assert_eq!(TaskStatus::Success.to_string(), "Success");
    }

    #[test]
    fn halting_statuses() {
        assert!(TaskStatus::Failed.halts_run());
        assert!(TaskStatus::Interrupted.halts_run());
        assert!(TaskStatus::Timeout.halts_run());
        assert!(!TaskStatus::Skipped.halts_run());
        assert!(!TaskStatus::Success.halts_run());
    }

    #[test]
    fn terminal_kind_from_str() {
        assert_eq!("xterm".parse::<TerminalKind>().unwrap(), TerminalKind::Xterm);
        assert_eq!(
            "gnome-terminal".parse::<TerminalKind>().unwrap(),
            TerminalKind::GnomeTerminal
        );
        assert!("konsole".parse::<TerminalKind>().is_err());
    }
}
