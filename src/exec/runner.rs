// src/exec/runner.rs

//! One task attempt, end to end: short-circuits, supervision script,
//! process launch, verdict, cleanup.

use std::path::PathBuf;

use tokio::time::Instant;
use tracing::{error, info, warn};

use crate::config::model::TaskSpec;
use crate::engine::interrupt::InterruptFlag;
use crate::errors::Result;
use crate::exec::health::{self, HealthConfig, Verdict};
use crate::exec::launcher::{LaunchSpec, SpawnedChild, StdioMode, TaskLauncher};
use crate::exec::probe::ProcessProbe;
use crate::exec::script::{self, read_status, StatusLine, SupervisionFiles};
use crate::exec::terminal::terminal_invocation;
use crate::run::outcome::{format_elapsed, now_stamp, TaskOutcome};
use crate::types::{RunId, TaskStatus, TerminalKind};

/// How task processes are hosted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchMode {
    /// All tasks share the orchestrator's terminal, sequentially.
    SingleTerminal,
    /// One emulator window per task.
    Terminal(TerminalKind),
}

/// Everything one attempt needs, threaded explicitly so tests can swap the
/// launcher and probe.
pub struct RunnerContext<'a> {
    pub run_id: RunId,
    pub scratch_dir: PathBuf,
    /// Label for window titles (basename of the working directory).
    pub run_dir: String,
    pub mode: LaunchMode,
    pub launcher: &'a dyn TaskLauncher,
    pub probe: &'a dyn ProcessProbe,
    pub interrupt: InterruptFlag,
    pub health: HealthConfig,
}

impl RunnerContext<'_> {
    /// Execute one attempt of `task` and return its outcome record.
    ///
    /// State machine: Pending -> Launching -> Running -> terminal. Entry to
    /// Launching is skipped for command-less tasks (`Skipped`) and when the
    /// interrupt flag is already set (`Not Executed`).
    pub async fn execute(&self, task: &TaskSpec) -> TaskOutcome {
        if self.interrupt.is_set() {
            info!(task = %task.name, "interrupt flag set; not executing");
            return TaskOutcome::unstarted(&task.name, TaskStatus::NotExecuted);
        }

        let Some(command) = task.command.as_deref() else {
            info!(task = %task.name, "task has no command; skipping");
            return TaskOutcome::unstarted(&task.name, TaskStatus::Skipped);
        };

        let started = Instant::now();
        let start_time = now_stamp();
        let attempt_ts = chrono::Local::now().timestamp_millis();
        let files =
            SupervisionFiles::new(&self.scratch_dir, &task.name, self.run_id, attempt_ts);

        info!(task = %task.name, %command, "executing task");

        let verdict = match self.run_attempt(task, command, &files, attempt_ts).await {
            Ok(verdict) => verdict,
            Err(e) => {
                error!(task = %task.name, error = %e, "task execution error");
                Verdict::Failed(-1)
            }
        };

        files.remove_all();

        let status = match verdict {
            Verdict::Success => TaskStatus::Success,
            Verdict::Failed(_) => TaskStatus::Failed,
            Verdict::Interrupted => TaskStatus::Interrupted,
            Verdict::Timeout => TaskStatus::Timeout,
        };

        if status == TaskStatus::Interrupted {
            // A task-level interruption stops the whole run.
            self.interrupt.set();
        }

        let runtime = format_elapsed(started.elapsed().as_secs());
        let end_time = now_stamp();
        info!(task = %task.name, %status, %runtime, "task finished");

        TaskOutcome {
            name: task.name.clone(),
            start_time,
            end_time,
            runtime,
            status,
        }
    }

    async fn run_attempt(
        &self,
        task: &TaskSpec,
        command: &str,
        files: &SupervisionFiles,
        attempt_ts: i64,
    ) -> Result<Verdict> {
        script::write_script(files, &task.name, command)?;

        let inner = vec!["sh".to_string(), files.script.display().to_string()];
        let spec = match self.mode {
            LaunchMode::SingleTerminal => LaunchSpec {
                task: task.name.clone(),
                program: "sh".to_string(),
                args: vec![files.script.display().to_string()],
                stdio: StdioMode::Inherit,
            },
            LaunchMode::Terminal(kind) => {
                let title = format!(
                    "Task: {} [{}_{}_{}] @ {}",
                    task.name, task.name, self.run_id, attempt_ts, self.run_dir
                );
                let (program, args) = terminal_invocation(kind, &title, &inner);
                LaunchSpec {
                    task: task.name.clone(),
                    program,
                    args,
                    stdio: StdioMode::Null,
                }
            }
        };

        let mut child = self.launcher.launch(&spec)?;

        let verdict = match self.mode {
            LaunchMode::SingleTerminal => self.wait_direct(task, child.as_mut(), files).await,
            LaunchMode::Terminal(_) => {
                health::supervise(
                    &task.name,
                    child.as_mut(),
                    files,
                    self.probe,
                    &self.interrupt,
                    &self.health,
                )
                .await
            }
        };

        Ok(verdict)
    }

    /// Single-terminal supervision: the child IS the supervising shell, so
    /// its exit is the task's end. The status file refines the verdict (it
    /// carries the command's own exit code); interrupt and the wall-clock
    /// ceiling still apply.
    async fn wait_direct(
        &self,
        task: &TaskSpec,
        child: &mut dyn SpawnedChild,
        files: &SupervisionFiles,
    ) -> Verdict {
        let started = Instant::now();

        loop {
            if self.interrupt.is_set() {
                warn!(task = %task.name, "interrupt flag set; terminating task");
                self.reap(files, child).await;
                return Verdict::Interrupted;
            }

            if started.elapsed() >= self.health.wall_clock_limit {
                warn!(task = %task.name, "task exceeded wall-clock ceiling; terminating");
                self.reap(files, child).await;
                return Verdict::Timeout;
            }

            match child.try_wait() {
                Ok(Some(code)) => {
                    // Prefer the shell's own record over the raw exit code;
                    // they agree except when the script was torn down
                    // mid-write.
                    return match read_status(&files.status) {
                        Some(StatusLine::Success) => Verdict::Success,
                        Some(StatusLine::Failed(file_code)) => Verdict::Failed(file_code),
                        Some(StatusLine::Interrupted) => Verdict::Interrupted,
                        Some(StatusLine::Running) | None => {
                            if code == 0 {
                                Verdict::Success
                            } else {
                                Verdict::Failed(code)
                            }
                        }
                    };
                }
                Ok(None) => {}
                Err(e) => {
                    error!(task = %task.name, error = %e, "could not poll task process");
                    return Verdict::Failed(-1);
                }
            }

            tokio::time::sleep(self.health.status_poll).await;
        }
    }

    async fn reap(&self, files: &SupervisionFiles, child: &mut dyn SpawnedChild) {
        if let Some(pid) = files.read_pid() {
            health::reap_tree("direct", pid, self.probe, &self.health).await;
        } else if let Some(pid) = child.id() {
            health::reap_tree("direct", pid, self.probe, &self.health).await;
        }
        let _ = child.start_kill();
    }
}
