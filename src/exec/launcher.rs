// src/exec/launcher.rs

//! Pluggable process launcher abstraction.
//!
//! The runner talks to a [`TaskLauncher`] instead of `tokio::process`
//! directly. This keeps terminal-emulator choice and process supervision
//! testable: tests swap in a fake launcher whose children "exit" on a
//! script, without any real OS process or window.

use std::process::Stdio;

use anyhow::Context;
use tokio::process::{Child, Command};
use tracing::info;

use crate::errors::Result;

/// How the child's stdio is wired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StdioMode {
    /// Inherit the orchestrator's terminal (single-terminal mode, so the
    /// operator can interact with the task).
    Inherit,
    /// Detach from our stdio (terminal-window mode; output lives in the
    /// task's own window).
    Null,
}

/// Everything needed to start one supervised child process.
#[derive(Debug, Clone)]
pub struct LaunchSpec {
    /// Task this process belongs to (for logging only).
    pub task: String,
    /// Executable to run.
    pub program: String,
    /// Arguments, already fully assembled (terminal wrapper included when
    /// applicable).
    pub args: Vec<String>,
    pub stdio: StdioMode,
}

/// Handle to a spawned child, narrow enough to fake in tests.
pub trait SpawnedChild: Send {
    /// OS process id, if the process is still attached.
    fn id(&self) -> Option<u32>;

    /// Non-blocking exit poll. `Ok(Some(code))` once the process has exited
    /// (`-1` when killed by a signal), `Ok(None)` while it is still running.
    fn try_wait(&mut self) -> std::io::Result<Option<i32>>;

    /// Begin forcefully killing the process (SIGKILL), without waiting.
    fn start_kill(&mut self) -> std::io::Result<()>;
}

/// Trait abstracting how child processes are started.
///
/// Production code uses [`OsLauncher`]; tests provide their own
/// implementation that doesn't spawn real processes.
pub trait TaskLauncher: Send + Sync {
    fn launch(&self, spec: &LaunchSpec) -> Result<Box<dyn SpawnedChild>>;
}

/// Real launcher used in production, backed by `tokio::process`.
#[derive(Debug, Clone, Default)]
pub struct OsLauncher;

struct OsChild(Child);

impl SpawnedChild for OsChild {
    fn id(&self) -> Option<u32> {
        self.0.id()
    }

    fn try_wait(&mut self) -> std::io::Result<Option<i32>> {
        Ok(self.0.try_wait()?.map(|status| status.code().unwrap_or(-1)))
    }

    fn start_kill(&mut self) -> std::io::Result<()> {
        self.0.start_kill()
    }
}

impl TaskLauncher for OsLauncher {
    fn launch(&self, spec: &LaunchSpec) -> Result<Box<dyn SpawnedChild>> {
        info!(
            task = %spec.task,
            program = %spec.program,
            args = ?spec.args,
            "spawning task process"
        );

        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args);

        match spec.stdio {
            StdioMode::Inherit => {
                cmd.stdin(Stdio::inherit())
                    .stdout(Stdio::inherit())
                    .stderr(Stdio::inherit());
            }
            StdioMode::Null => {
                cmd.stdin(Stdio::null())
                    .stdout(Stdio::null())
                    .stderr(Stdio::null());
            }
        }

        // The supervision loop owns termination; dropping the handle must
        // not kill a task that is still being reaped gracefully.
        cmd.kill_on_drop(false);

        let child = cmd
            .spawn()
            .with_context(|| format!("spawning process for task '{}'", spec.task))?;

        Ok(Box::new(OsChild(child)))
    }
}
