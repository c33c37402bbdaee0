//! A fake process launcher for exercising supervision, retry and engine
//! logic without spawning real processes or windows.
//!
//! The fake honours the status/PID file contract: each "launch" writes the
//! files the real supervision script would have written, according to a
//! scripted behaviour, so the health monitor and single-terminal wait loop
//! see exactly what they would see in production.

use std::collections::{HashMap, VecDeque};
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::anyhow;
use flowdag::errors::Result;
use flowdag::exec::{LaunchSpec, ProcessProbe, SpawnedChild, TaskLauncher};

/// What one launch of a task should look like to the supervisor.
#[derive(Debug, Clone, Copy)]
pub enum FakeBehaviour {
    /// The supervised shell runs to completion: status file gets
    /// `SUCCESS`/`FAILED:<code>`, PID file is written, the child exits with
    /// the code.
    Exit(i32),
    /// The shell writes `RUNNING` + its PID and then never finishes.
    Hang,
    /// The terminal dies instantly and nothing is ever written — the
    /// accidental-closure case.
    Vanish,
}

/// Scripted launcher: behaviours are queued per task; each launch consumes
/// one (an exhausted queue falls back to `Exit(0)`).
pub struct FakeLauncher {
    behaviours: Mutex<HashMap<String, VecDeque<FakeBehaviour>>>,
    launched: Mutex<Vec<String>>,
}

impl FakeLauncher {
    pub fn new() -> Self {
        Self {
            behaviours: Mutex::new(HashMap::new()),
            launched: Mutex::new(Vec::new()),
        }
    }

    /// Queue a behaviour for the next launch of `task`.
    pub fn on_task(&self, task: &str, behaviour: FakeBehaviour) {
        self.behaviours
            .lock()
            .unwrap()
            .entry(task.to_string())
            .or_default()
            .push_back(behaviour);
    }

    /// Task names in launch order (one entry per attempt).
    pub fn launched(&self) -> Vec<String> {
        self.launched.lock().unwrap().clone()
    }
}

impl Default for FakeLauncher {
    fn default() -> Self {
        Self::new()
    }
}

/// Derive the status/PID paths from the script path inside the spec, the
/// same way `SupervisionFiles` lays them out.
fn supervision_paths(spec: &LaunchSpec) -> Option<(PathBuf, PathBuf)> {
    let script = spec.args.iter().find(|a| a.ends_with(".sh"))?;
    let script = PathBuf::from(script);
    let status = script.with_extension("status");
    let pid = script.with_extension("pid");
    Some((status, pid))
}

impl TaskLauncher for FakeLauncher {
    fn launch(&self, spec: &LaunchSpec) -> Result<Box<dyn SpawnedChild>> {
        self.launched.lock().unwrap().push(spec.task.clone());

        let behaviour = self
            .behaviours
            .lock()
            .unwrap()
            .get_mut(&spec.task)
            .and_then(|queue| queue.pop_front())
            .unwrap_or(FakeBehaviour::Exit(0));

        let (status, pid) = supervision_paths(spec)
            .ok_or_else(|| anyhow!("no supervision script in launch spec"))?;

        match behaviour {
            FakeBehaviour::Exit(code) => {
                fs::write(&pid, "4242\n").map_err(anyhow::Error::from)?;
                let line = if code == 0 {
                    "SUCCESS".to_string()
                } else {
                    format!("FAILED:{code}")
                };
                fs::write(&status, line).map_err(anyhow::Error::from)?;
                Ok(Box::new(FakeChild { exit: Some(code) }))
            }
            FakeBehaviour::Hang => {
                fs::write(&pid, "4242\n").map_err(anyhow::Error::from)?;
                fs::write(&status, "RUNNING").map_err(anyhow::Error::from)?;
                Ok(Box::new(FakeChild { exit: None }))
            }
            FakeBehaviour::Vanish => Ok(Box::new(FakeChild { exit: Some(1) })),
        }
    }
}

struct FakeChild {
    exit: Option<i32>,
}

impl SpawnedChild for FakeChild {
    fn id(&self) -> Option<u32> {
        Some(4242)
    }

    fn try_wait(&mut self) -> std::io::Result<Option<i32>> {
        Ok(self.exit)
    }

    fn start_kill(&mut self) -> std::io::Result<()> {
        self.exit = Some(-1);
        Ok(())
    }
}

/// A probe with no live processes; records every signal it is asked to send.
pub struct DeadProbe {
    pub signalled: Mutex<Vec<u32>>,
}

impl DeadProbe {
    pub fn new() -> Self {
        Self {
            signalled: Mutex::new(Vec::new()),
        }
    }
}

impl Default for DeadProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessProbe for DeadProbe {
    fn exists(&self, _pid: u32) -> bool {
        false
    }
    fn alive(&self, _pid: u32) -> bool {
        false
    }
    fn children_recursive(&self, _pid: u32) -> Vec<u32> {
        Vec::new()
    }
    fn terminate(&self, pid: u32) -> bool {
        self.signalled.lock().unwrap().push(pid);
        false
    }
    fn kill(&self, pid: u32) -> bool {
        self.signalled.lock().unwrap().push(pid);
        false
    }
}
