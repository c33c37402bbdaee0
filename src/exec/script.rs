// src/exec/script.rs

//! The supervision script and its status/PID file contract (v1).
//!
//! The spawned shell, not the orchestrator, writes both files: it records
//! its own PID, marks itself `RUNNING`, runs the user command, and records
//! the final `SUCCESS` / `FAILED:<code>` line (or `INTERRUPTED` from a
//! signal trap). Every write is followed by `sync` because a separate
//! process polls these files.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::debug;

use crate::errors::Result;
use crate::types::RunId;

/// Per-attempt supervision artefacts, keyed by task + run id + attempt
/// timestamp so no two runs (or retries) can collide.
#[derive(Debug, Clone)]
pub struct SupervisionFiles {
    pub script: PathBuf,
    pub status: PathBuf,
    pub pid: PathBuf,
}

impl SupervisionFiles {
    pub fn new(scratch_dir: &Path, task: &str, run_id: RunId, attempt_ts: i64) -> Self {
        let stem = format!("flowtask_{task}_{run_id}_{attempt_ts}");
        Self {
            script: scratch_dir.join(format!("{stem}.sh")),
            status: scratch_dir.join(format!("{stem}.status")),
            pid: scratch_dir.join(format!("{stem}.pid")),
        }
    }

    /// Delete all three files. Best-effort: the monitor tolerates their
    /// absence, and a file that refuses to go away only wastes scratch
    /// space.
    pub fn remove_all(&self) {
        for path in [&self.script, &self.status, &self.pid] {
            if let Err(e) = fs::remove_file(path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    debug!(?path, error = %e, "could not remove supervision file");
                }
            }
        }
    }

    /// PID recorded by the supervising shell, if the file exists and holds
    /// a decimal number.
    pub fn read_pid(&self) -> Option<u32> {
        read_pid_file(&self.pid)
    }
}

pub fn read_pid_file(path: &Path) -> Option<u32> {
    fs::read_to_string(path).ok()?.trim().parse().ok()
}

/// One line of the status file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLine {
    Running,
    Success,
    Failed(i32),
    Interrupted,
}

impl StatusLine {
    pub fn is_terminal(self) -> bool {
        !matches!(self, StatusLine::Running)
    }
}

/// Parse one status line. Unknown content yields `None` (treated the same
/// as a missing file: "not yet complete").
pub fn parse_status(line: &str) -> Option<StatusLine> {
    let line = line.trim();
    if line == "RUNNING" {
        Some(StatusLine::Running)
    } else if line == "SUCCESS" {
        Some(StatusLine::Success)
    } else if line == "INTERRUPTED" {
        Some(StatusLine::Interrupted)
    } else if let Some(code) = line.strip_prefix("FAILED:") {
        Some(StatusLine::Failed(code.trim().parse().unwrap_or(-1)))
    } else if line == "FAILED" {
        Some(StatusLine::Failed(-1))
    } else {
        None
    }
}

/// Read and parse the status file. Missing or unreadable files are `None`.
pub fn read_status(path: &Path) -> Option<StatusLine> {
    let contents = fs::read_to_string(path).ok()?;
    parse_status(&contents)
}

/// Materialise the supervision script for one attempt.
pub fn write_script(
    files: &SupervisionFiles,
    task_name: &str,
    command: &str,
) -> Result<()> {
    let status = files.status.display();
    let pid = files.pid.display();

    let body = format!(
        r#"#!/bin/sh
# Record supervising shell PID, then mark the attempt as running.
echo $$ > {pid}
echo "RUNNING" > {status}
sync

trap 'echo "INTERRUPTED" > {status}; sync; exit 1' INT TERM

echo "==============================================="
echo "FLOWDAG - TASK EXECUTION"
echo "Task:    {task_name}"
echo "Command: {command}"
echo "==============================================="
echo ""

{command}
exit_code=$?

if [ "$exit_code" -eq 0 ]; then
    echo "SUCCESS" > {status}
else
    echo "FAILED:$exit_code" > {status}
fi
sync

exit $exit_code
"#
    );

    if let Some(parent) = files.script.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating scratch directory {:?}", parent))?;
    }
    fs::write(&files.script, body)
        .with_context(|| format!("writing supervision script {:?}", files.script))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&files.script, fs::Permissions::from_mode(0o755))
            .with_context(|| format!("marking {:?} executable", files.script))?;
    }

    debug!(script = ?files.script, task = %task_name, "supervision script written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parsing() {
        assert_eq!(parse_status("RUNNING"), Some(StatusLine::Running));
        assert_eq!(parse_status("SUCCESS\n"), Some(StatusLine::Success));
        assert_eq!(parse_status("FAILED:3"), Some(StatusLine::Failed(3)));
        assert_eq!(parse_status("FAILED:garbage"), Some(StatusLine::Failed(-1)));
        assert_eq!(parse_status("INTERRUPTED"), Some(StatusLine::Interrupted));
        assert_eq!(parse_status("whatever"), None);
        assert_eq!(parse_status(""), None);
    }

    #[test]
    fn terminal_statuses() {
        assert!(!StatusLine::Running.is_terminal());
        assert!(StatusLine::Success.is_terminal());
        assert!(StatusLine::Failed(1).is_terminal());
        assert!(StatusLine::Interrupted.is_terminal());
    }

    #[test]
    fn script_contains_contract_writes() {
        let dir = tempfile::tempdir().unwrap();
        let files = SupervisionFiles::new(dir.path(), "syn", crate::types::RunId(42), 7);

        write_script(&files, "syn", "make syn").unwrap();

        let body = fs::read_to_string(&files.script).unwrap();
        assert!(body.contains("echo $$ >"));
        assert!(body.contains("echo \"RUNNING\""));
        assert!(body.contains("FAILED:$exit_code"));
        assert!(body.contains("make syn"));
        assert!(body.contains("trap"));
    }

    #[test]
    fn file_names_are_attempt_scoped() {
        let dir = tempfile::tempdir().unwrap();
        let a = SupervisionFiles::new(dir.path(), "syn", crate::types::RunId(42), 1);
        let b = SupervisionFiles::new(dir.path(), "syn", crate::types::RunId(42), 2);
        assert_ne!(a.status, b.status);
        assert_ne!(a.pid, b.pid);
    }

    #[test]
    fn pid_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let files = SupervisionFiles::new(dir.path(), "syn", crate::types::RunId(1), 1);
        fs::write(&files.pid, "12345\n").unwrap();
        assert_eq!(files.read_pid(), Some(12345));

        fs::write(&files.pid, "not-a-pid").unwrap();
        assert_eq!(files.read_pid(), None);
    }
}
