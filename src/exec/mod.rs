// src/exec/mod.rs

//! Process execution and supervision.
//!
//! - [`launcher`] is the narrow seam over OS process spawning, so the
//!   supervision logic is testable without opening terminal windows.
//! - [`probe`] wraps process-tree inspection (liveness, zombies, children).
//! - [`script`] materialises the supervision script and owns the status/PID
//!   file contract.
//! - [`terminal`] detects terminal emulators and builds window invocations.
//! - [`health`] is the two-tier watchdog that turns file and process signals
//!   into a terminal verdict.
//! - [`runner`] executes one task attempt end to end.
//! - [`retry`] wraps the runner with the bounded-retry policy.

pub mod health;
pub mod launcher;
pub mod probe;
pub mod retry;
pub mod runner;
pub mod script;
pub mod terminal;

pub use health::{HealthConfig, Verdict};
pub use launcher::{LaunchSpec, OsLauncher, SpawnedChild, StdioMode, TaskLauncher};
pub use probe::{ProcessProbe, SysinfoProbe};
pub use retry::execute_with_retries;
pub use runner::{LaunchMode, RunnerContext};
pub use script::SupervisionFiles;
