// src/engine/executor.rs

//! The sequential scheduling loop.
//!
//! One task at a time, in plan order; each terminal outcome lands in the
//! completion store before the next task starts, so the external monitor
//! only ever sees fully recorded history.

use std::collections::{HashMap, HashSet};

use tracing::{info, warn};

use crate::config::model::TaskSpec;
use crate::dag::planner::ExecutionPlan;
use crate::errors::Result;
use crate::exec::retry::execute_with_retries;
use crate::exec::runner::RunnerContext;
use crate::run::outcome::TaskOutcome;
use crate::run::store::CompletionStore;
use crate::types::TaskStatus;

/// Scheduling policy knobs.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Re-run tasks recorded successful in a prior run, and continue the
    /// plan past `Failed` outcomes.
    pub force: bool,
    /// Attempt bound handed to the retry controller.
    pub max_retries: u32,
}

/// Drive the plan to completion (or to its halt point) and return every
/// recorded outcome, in completion order.
pub async fn run_plan(
    plan: &ExecutionPlan,
    tasks: &[TaskSpec],
    completed: &HashSet<String>,
    store: &mut CompletionStore,
    ctx: &RunnerContext<'_>,
    options: &EngineOptions,
) -> Result<Vec<TaskOutcome>> {
    let by_name: HashMap<&str, &TaskSpec> =
        tasks.iter().map(|t| (t.name.as_str(), t)).collect();

    let mut outcomes: Vec<TaskOutcome> = Vec::with_capacity(plan.order.len());

    for (idx, name) in plan.order.iter().enumerate() {
        if ctx.interrupt.is_set() {
            warn!("run interrupted; recording remaining tasks as Not Executed");
            record_remaining(&plan.order[idx..], store, &mut outcomes)?;
            break;
        }

        if completed.contains(name) && !options.force {
            info!(task = %name, "already successful in a previous run; skipping");
            let outcome = TaskOutcome::unstarted(name, TaskStatus::Skipped);
            store.append(outcome.clone())?;
            outcomes.push(outcome);
            continue;
        }

        let Some(task) = by_name.get(name.as_str()) else {
            // Plan and task list come from the same expansion; this would
            // be a programming error, not an operator one.
            warn!(task = %name, "planned task missing from task list; ignoring");
            continue;
        };

        let outcome = execute_with_retries(ctx, task, options.max_retries).await;
        let status = outcome.status;
        store.append(outcome.clone())?;
        outcomes.push(outcome);

        if should_halt(status, options) {
            warn!(
                task = %name,
                %status,
                "halting run; recording remaining tasks as Not Executed"
            );
            record_remaining(&plan.order[idx + 1..], store, &mut outcomes)?;
            break;
        }
    }

    Ok(outcomes)
}

/// `Failed` halts unless force mode is on; `Interrupted` and `Timeout`
/// always halt.
fn should_halt(status: TaskStatus, options: &EngineOptions) -> bool {
    match status {
        TaskStatus::Failed => !options.force,
        TaskStatus::Interrupted | TaskStatus::Timeout => true,
        TaskStatus::Success | TaskStatus::Skipped | TaskStatus::NotExecuted => false,
    }
}

fn record_remaining(
    remaining: &[String],
    store: &mut CompletionStore,
    outcomes: &mut Vec<TaskOutcome>,
) -> Result<()> {
    for name in remaining {
        if outcomes.iter().any(|o| &o.name == name) {
            continue;
        }
        let outcome = TaskOutcome::unstarted(name, TaskStatus::NotExecuted);
        store.append(outcome.clone())?;
        outcomes.push(outcome);
    }
    Ok(())
}
