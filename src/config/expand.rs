// src/config/expand.rs

//! Group expansion: flattening `tasks = [...]` grouping nodes into the flat
//! ordered task list the graph builder and planner operate on.

use std::collections::{HashMap, HashSet};

use crate::config::model::TaskSpec;

/// Flatten task groups depth-first into a single ordered list.
///
/// For each task in declared order, its children are emitted (recursively)
/// before the task itself, so a group's leaves occupy the group's position
/// in the flow. A child listed under multiple parents is emitted once: the
/// first occurrence wins.
///
/// Assumes the flow has already been validated; unknown child names are
/// skipped rather than panicking.
pub fn expand_groups(tasks: &[TaskSpec]) -> Vec<TaskSpec> {
    let by_name: HashMap<&str, &TaskSpec> =
        tasks.iter().map(|t| (t.name.as_str(), t)).collect();

    let mut seen: HashSet<&str> = HashSet::new();
    let mut expanded: Vec<TaskSpec> = Vec::with_capacity(tasks.len());

    fn add<'a>(
        name: &'a str,
        by_name: &HashMap<&'a str, &'a TaskSpec>,
        seen: &mut HashSet<&'a str>,
        out: &mut Vec<TaskSpec>,
    ) {
        if !seen.insert(name) {
            return;
        }
        let Some(task) = by_name.get(name) else {
            return;
        };
        for child in &task.tasks {
            add(child.as_str(), by_name, seen, out);
        }
        out.push((*task).clone());
    }

    for task in tasks {
        add(task.name.as_str(), &by_name, &mut seen, &mut expanded);
    }

    expanded
}

/// Replace the `$run_dir` placeholder in every command with the basename of
/// the directory the orchestrator was started from.
pub fn substitute_run_dir(tasks: &mut [TaskSpec], run_dir: &str) {
    for task in tasks.iter_mut() {
        if let Some(cmd) = task.command.as_mut() {
            if cmd.contains("$run_dir") {
                *cmd = cmd.replace("$run_dir", run_dir);
            }
        }
    }
}
