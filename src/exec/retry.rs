// src/exec/retry.rs

//! Bounded-retry policy around the task runner.

use tracing::{info, warn};

use crate::config::model::TaskSpec;
use crate::exec::runner::RunnerContext;
use crate::run::outcome::TaskOutcome;
use crate::types::TaskStatus;

/// Execute a task with up to `max_attempts` attempts.
///
/// - `Success`, `Skipped` and `Not Executed` return immediately.
/// - `Interrupted` and `Timeout` are never retried: the first points at an
///   operator action, the second would just burn another ceiling's worth of
///   wall clock.
/// - A genuine `Failed` is retried until the bound, then surfaced. Only the
///   final attempt's outcome is returned; earlier attempts are not recorded.
pub async fn execute_with_retries(
    ctx: &RunnerContext<'_>,
    task: &TaskSpec,
    max_attempts: u32,
) -> TaskOutcome {
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1;

    loop {
        let outcome = ctx.execute(task).await;

        if outcome.status != TaskStatus::Failed {
            return outcome;
        }

        if ctx.interrupt.is_set() {
            warn!(task = %task.name, "interrupted during attempt; not retrying");
            return outcome;
        }

        if attempt >= max_attempts {
            warn!(task = %task.name, max_attempts, "task failed after all attempts");
            return outcome;
        }

        info!(
            task = %task.name,
            attempt,
            max_attempts,
            "task failed; retrying"
        );
        attempt += 1;
    }
}
