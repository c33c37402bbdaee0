// src/exec/probe.rs

//! Process-tree inspection behind a narrow trait, so orphan detection and
//! reaping are testable without real processes.

use std::sync::Mutex;

use sysinfo::{Pid, Process, ProcessStatus, Signal, System};

/// Liveness and termination primitives over raw PIDs.
///
/// Only the health monitor ever sends signals through this; no other
/// component terminates task processes.
pub trait ProcessProbe: Send + Sync {
    /// Does the PID exist at all (zombies included)?
    fn exists(&self, pid: u32) -> bool;

    /// Does the PID exist and is it not a zombie?
    fn alive(&self, pid: u32) -> bool;

    /// All descendant PIDs of the given process, depth-first.
    fn children_recursive(&self, pid: u32) -> Vec<u32>;

    /// Deliver SIGTERM. Returns false if the process was already gone or
    /// the signal could not be sent.
    fn terminate(&self, pid: u32) -> bool;

    /// Deliver SIGKILL. Returns false if the process was already gone.
    fn kill(&self, pid: u32) -> bool;
}

/// Production probe backed by `sysinfo`.
///
/// A single `System` is refreshed per query batch; the mutex keeps the
/// probe shareable across the supervision loop and signal handlers.
pub struct SysinfoProbe {
    sys: Mutex<System>,
}

impl SysinfoProbe {
    pub fn new() -> Self {
        Self {
            sys: Mutex::new(System::new()),
        }
    }

    fn with_process<T>(&self, pid: u32, f: impl FnOnce(&Process) -> T) -> Option<T> {
        let mut sys = self.sys.lock().unwrap_or_else(|e| e.into_inner());
        sys.refresh_processes();
        sys.process(Pid::from_u32(pid)).map(f)
    }
}

impl Default for SysinfoProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessProbe for SysinfoProbe {
    fn exists(&self, pid: u32) -> bool {
        self.with_process(pid, |_| ()).is_some()
    }

    fn alive(&self, pid: u32) -> bool {
        self.with_process(pid, |p| p.status() != ProcessStatus::Zombie)
            .unwrap_or(false)
    }

    fn children_recursive(&self, pid: u32) -> Vec<u32> {
        let mut sys = self.sys.lock().unwrap_or_else(|e| e.into_inner());
        sys.refresh_processes();

        let mut result = Vec::new();
        let mut frontier = vec![Pid::from_u32(pid)];
        while let Some(parent) = frontier.pop() {
            for (child_pid, process) in sys.processes() {
                if process.parent() == Some(parent) {
                    result.push(child_pid.as_u32());
                    frontier.push(*child_pid);
                }
            }
        }
        result
    }

    fn terminate(&self, pid: u32) -> bool {
        self.with_process(pid, |p| p.kill_with(Signal::Term).unwrap_or(false))
            .unwrap_or(false)
    }

    fn kill(&self, pid: u32) -> bool {
        self.with_process(pid, |p| p.kill()).unwrap_or(false)
    }
}
