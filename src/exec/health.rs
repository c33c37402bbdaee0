// src/exec/health.rs

//! The two-tier watchdog supervising one in-flight task attempt.
//!
//! Three independent signals are folded into one verdict:
//! - the status file (polled fast; a terminal value always wins),
//! - the terminal child process (fast liveness check, catching an operator
//!   closing the task's window),
//! - the PID-file process tree (slow deep audit, catching zombies and
//!   vanished shells once the status file has gone stale).
//!
//! Reaping is the only path that ever signals a task's processes.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{info, warn};

use crate::engine::interrupt::InterruptFlag;
use crate::exec::launcher::SpawnedChild;
use crate::exec::probe::ProcessProbe;
use crate::exec::script::{read_status, StatusLine, SupervisionFiles};

/// Timing knobs for the watchdog. Defaults match production; tests shrink
/// them to milliseconds.
#[derive(Debug, Clone)]
pub struct HealthConfig {
    /// Status file poll interval.
    pub status_poll: Duration,
    /// Fast terminal-process liveness check interval.
    pub terminal_check: Duration,
    /// Deep process-tree audit interval.
    pub deep_check: Duration,
    /// How long the status file must be unchanged before the deep audit
    /// acts on process evidence.
    pub status_stale_after: Duration,
    /// Hard wall-clock ceiling for one attempt.
    pub wall_clock_limit: Duration,
    /// Pause between SIGTERM and SIGKILL while reaping.
    pub reap_grace: Duration,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            status_poll: Duration::from_secs(2),
            terminal_check: Duration::from_secs(10),
            deep_check: Duration::from_secs(300),
            status_stale_after: Duration::from_secs(600),
            wall_clock_limit: Duration::from_secs(864_000),
            reap_grace: Duration::from_secs(2),
        }
    }
}

impl HealthConfig {
    pub fn with_wall_clock_limit(mut self, limit: Duration) -> Self {
        self.wall_clock_limit = limit;
        self
    }
}

/// Terminal verdict of one supervised attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Success,
    Failed(i32),
    Interrupted,
    Timeout,
}

/// Supervise a task running inside its own terminal window until a verdict
/// is reached.
pub async fn supervise(
    task: &str,
    child: &mut dyn SpawnedChild,
    files: &SupervisionFiles,
    probe: &dyn ProcessProbe,
    interrupt: &InterruptFlag,
    cfg: &HealthConfig,
) -> Verdict {
    let started = Instant::now();
    let mut last_status: Option<StatusLine> = None;
    let mut last_status_update = started;
    let mut last_terminal_check = started;
    let mut last_deep_check = started;
    let mut terminal_closed_warned = false;

    info!(task, "supervising task: status file + terminal + process health");

    loop {
        if interrupt.is_set() {
            warn!(task, "interrupt flag set; terminating task process tree");
            reap_from_pid_file(task, files, probe, cfg).await;
            return Verdict::Interrupted;
        }

        if started.elapsed() >= cfg.wall_clock_limit {
            warn!(task, "task exceeded wall-clock ceiling; terminating");
            reap_from_pid_file(task, files, probe, cfg).await;
            return Verdict::Timeout;
        }

        // PRIMARY: the status file. A terminal value short-circuits both
        // timers below.
        if let Some(status) = read_status(&files.status) {
            if last_status != Some(status) {
                last_status = Some(status);
                last_status_update = Instant::now();
                match status {
                    StatusLine::Running => info!(task, "task is running"),
                    StatusLine::Success => {
                        info!(task, "task completed successfully");
                        return Verdict::Success;
                    }
                    StatusLine::Failed(code) => {
                        warn!(task, exit_code = code, "task failed");
                        return Verdict::Failed(code);
                    }
                    StatusLine::Interrupted => {
                        warn!(task, "task reported interruption");
                        return Verdict::Interrupted;
                    }
                }
            }
        }

        // FAST: did the terminal window die? Catches an accidental close
        // within one check interval.
        if last_terminal_check.elapsed() >= cfg.terminal_check {
            last_terminal_check = Instant::now();

            let terminal_exited = matches!(child.try_wait(), Ok(Some(_)));
            if terminal_exited {
                let task_alive = files
                    .read_pid()
                    .map(|pid| probe.alive(pid))
                    .unwrap_or(false);

                if task_alive {
                    // Window gone but the command lives on (legitimately
                    // detached tools do this). Say so once, keep polling.
                    if !terminal_closed_warned {
                        warn!(
                            task,
                            "terminal window closed but task process still running; continuing to monitor"
                        );
                        terminal_closed_warned = true;
                    }
                } else {
                    // Both gone. A terminal status written in the last poll
                    // window still wins; otherwise this was an accidental
                    // closure.
                    if let Some(status) = read_status(&files.status) {
                        match status {
                            StatusLine::Success => return Verdict::Success,
                            StatusLine::Failed(code) => return Verdict::Failed(code),
                            StatusLine::Interrupted => return Verdict::Interrupted,
                            StatusLine::Running => {}
                        }
                    }
                    warn!(
                        task,
                        "terminal closed and task process dead without completion status; marking Interrupted"
                    );
                    reap_from_pid_file(task, files, probe, cfg).await;
                    return Verdict::Interrupted;
                }
            }
        }

        // DEEP: process-tree audit, only once the status file has gone
        // stale. Kept infrequent; long-running EDA-style tools write status
        // rarely and must not be killed on suspicion alone.
        if last_deep_check.elapsed() >= cfg.deep_check {
            last_deep_check = Instant::now();

            if last_status_update.elapsed() >= cfg.status_stale_after {
                let closure = match files.read_pid() {
                    None => {
                        warn!(task, "PID file missing during deep check");
                        true
                    }
                    Some(pid) if !probe.alive(pid) => {
                        warn!(task, pid, "supervising shell dead or zombie during deep check");
                        true
                    }
                    Some(_) => false,
                };

                if closure {
                    reap_from_pid_file(task, files, probe, cfg).await;
                    return Verdict::Interrupted;
                }
            }
        }

        tokio::time::sleep(cfg.status_poll).await;
    }
}

/// Reap the process tree rooted at the PID-file process, if any.
async fn reap_from_pid_file(
    task: &str,
    files: &SupervisionFiles,
    probe: &dyn ProcessProbe,
    cfg: &HealthConfig,
) {
    match files.read_pid() {
        Some(pid) => reap_tree(task, pid, probe, cfg).await,
        None => info!(task, "no PID file; nothing to reap"),
    }
}

/// Terminate a process tree: children first (SIGTERM, brief wait, SIGKILL
/// survivors), then the root the same way.
pub async fn reap_tree(task: &str, root: u32, probe: &dyn ProcessProbe, cfg: &HealthConfig) {
    if !probe.exists(root) {
        info!(task, pid = root, "task process already gone");
        return;
    }

    let children = probe.children_recursive(root);
    info!(
        task,
        pid = root,
        descendants = children.len(),
        "reaping task process tree"
    );

    for pid in &children {
        probe.terminate(*pid);
    }
    if !children.is_empty() {
        tokio::time::sleep(cfg.reap_grace).await;
        for pid in &children {
            if probe.alive(*pid) {
                warn!(task, pid, "child survived SIGTERM; killing");
                probe.kill(*pid);
            }
        }
    }

    probe.terminate(root);
    tokio::time::sleep(cfg.reap_grace).await;
    if probe.alive(root) {
        warn!(task, pid = root, "root process survived SIGTERM; killing");
        probe.kill(root);
    }
}
