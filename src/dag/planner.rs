// src/dag/planner.rs

//! Execution planning: a Kahn's-algorithm variant that additionally resolves
//! "any-of" waits, then stabilises the order by priority.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use anyhow::anyhow;
use tracing::{debug, warn};

use crate::config::model::TaskSpec;
use crate::dag::graph::{FlowGraph, TaskName};
use crate::errors::{FlowdagError, Result};

/// Which subset of the flat task list one invocation schedules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionRange {
    /// Everything.
    All,
    /// A contiguous slice of the expanded declaration order, inclusive at
    /// both ends; `None` means "from the beginning" / "to the end".
    Slice {
        start: Option<TaskName>,
        end: Option<TaskName>,
    },
    /// A single task; a group resolves to its leaves. Dependencies are NOT
    /// pulled in.
    Only(TaskName),
}

impl ExecutionRange {
    pub fn from_cli(
        start: Option<String>,
        end: Option<String>,
        only: Option<String>,
    ) -> Self {
        match (only, start, end) {
            (Some(task), _, _) => ExecutionRange::Only(task),
            (None, None, None) => ExecutionRange::All,
            (None, start, end) => ExecutionRange::Slice { start, end },
        }
    }

    /// Signature used to scope completion/history files to one range.
    pub fn signature(&self) -> String {
        match self {
            ExecutionRange::All => "full_run".to_string(),
            ExecutionRange::Slice { start, end } => format!(
                "{}_to_{}",
                start.as_deref().unwrap_or("start"),
                end.as_deref().unwrap_or("end")
            ),
            ExecutionRange::Only(task) => format!("only_{task}"),
        }
    }
}

/// The ordered sequence of task names for one run, computed once up front.
///
/// Invariant: every "all-of" dependency of a planned task that is itself
/// planned appears earlier in the sequence.
#[derive(Debug, Clone)]
pub struct ExecutionPlan {
    pub order: Vec<TaskName>,
}

impl ExecutionPlan {
    /// Compute the plan for the given flat task list.
    ///
    /// `completed` holds names recorded `Success` by a previous run of the
    /// same flow/range signature; they are removed from the graph before
    /// seeding, so their dependents become eligible without re-running them.
    pub fn compute(
        expanded: &[TaskSpec],
        completed: &HashSet<TaskName>,
        range: &ExecutionRange,
    ) -> Result<Self> {
        if let ExecutionRange::Only(task) = range {
            return Ok(Self {
                order: resolve_only_leaves(expanded, task)?,
            });
        }

        let mut graph = FlowGraph::from_tasks(expanded);
        graph.remove_completed(completed);

        let raw_order = kahn_with_alternatives(&graph);

        let in_range = range_members(expanded, range)?;
        let mut order: Vec<TaskName> = raw_order
            .into_iter()
            .filter(|name| in_range.contains(name))
            .collect();

        // Stable: ties keep the topological order established above.
        order.sort_by_key(|name| graph.priority_of(name));

        debug!(?order, "computed execution plan");
        Ok(Self { order })
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Kahn's algorithm over the all-of graph, with immediate resolution of
/// any-of waiters.
///
/// Whenever a task is emitted, every waiter listing it in its any-of set is
/// satisfied and emitted right behind it, regardless of the waiter's other
/// alternatives. If the ready queue drains while waiters remain (none of
/// their candidates ever surfaced through normal flow), one waiter is
/// force-resolved so the traversal always terminates; waiters are kept in
/// declaration order so even that degenerate case is reproducible.
fn kahn_with_alternatives(graph: &FlowGraph) -> Vec<TaskName> {
    let mut in_degree: HashMap<TaskName, usize> = graph
        .task_order()
        .iter()
        .filter_map(|name| graph.in_degree_of(name).map(|d| (name.clone(), d)))
        .collect();

    // Declaration-ordered list of (waiter, remaining candidates). Waiters
    // never enter the ready queue: they are emitted only through
    // satisfaction (or force-resolution), so a waiter cannot surface before
    // one of its alternatives.
    let mut waiting: Vec<(TaskName, BTreeSet<TaskName>)> = graph
        .task_order()
        .iter()
        .filter(|name| in_degree.contains_key(*name))
        .filter_map(|name| {
            graph
                .any_of_sets()
                .get(name)
                .map(|set| (name.clone(), set.clone()))
        })
        .collect();

    let is_waiting = |waiting: &[(TaskName, BTreeSet<TaskName>)], name: &TaskName| {
        waiting.iter().any(|(w, _)| w == name)
    };

    let mut ready: VecDeque<TaskName> = graph
        .task_order()
        .iter()
        .filter(|name| in_degree.get(*name) == Some(&0) && !is_waiting(&waiting, name))
        .cloned()
        .collect();

    let mut order: Vec<TaskName> = Vec::with_capacity(in_degree.len());

    fn release(
        graph: &FlowGraph,
        task: &TaskName,
        in_degree: &mut HashMap<TaskName, usize>,
        waiting: &[(TaskName, BTreeSet<TaskName>)],
        ready: &mut VecDeque<TaskName>,
    ) {
        for dependent in graph.dependents_of(task) {
            if let Some(deg) = in_degree.get_mut(dependent) {
                *deg = deg.saturating_sub(1);
                if *deg == 0 && !waiting.iter().any(|(w, _)| w == dependent) {
                    ready.push_back(dependent.clone());
                }
            }
        }
    }

    while !ready.is_empty() || !waiting.is_empty() {
        while let Some(current) = ready.pop_front() {
            order.push(current.clone());
            release(graph, &current, &mut in_degree, &waiting, &mut ready);

            // Satisfy every waiter listing `current` as an alternative,
            // regardless of its remaining alternatives or all-of edges.
            let mut i = 0;
            while i < waiting.len() {
                if waiting[i].1.contains(&current) {
                    let (satisfied, _) = waiting.remove(i);
                    order.push(satisfied.clone());
                    release(graph, &satisfied, &mut in_degree, &waiting, &mut ready);
                } else {
                    i += 1;
                }
            }
        }

        if !waiting.is_empty() {
            let (forced, candidates) = waiting.remove(0);
            warn!(
                task = %forced,
                ?candidates,
                "no any-of candidate became ready; force-resolving waiter"
            );
            order.push(forced.clone());
            release(graph, &forced, &mut in_degree, &waiting, &mut ready);
        }
    }

    // Stable dedup: any-of resolution can emit a task that later also drains
    // from the ready queue.
    let mut seen: HashSet<TaskName> = HashSet::new();
    order.retain(|name| seen.insert(name.clone()));
    order
}

/// Names belonging to the requested range, in expanded declaration order.
fn range_members(
    expanded: &[TaskSpec],
    range: &ExecutionRange,
) -> Result<HashSet<TaskName>> {
    let all: Vec<&str> = expanded.iter().map(|t| t.name.as_str()).collect();

    let (start, end) = match range {
        ExecutionRange::All => return Ok(all.iter().map(|s| s.to_string()).collect()),
        ExecutionRange::Slice { start, end } => (start.as_deref(), end.as_deref()),
        ExecutionRange::Only(_) => unreachable!("Only ranges bypass range_members"),
    };

    let start_idx = match start {
        Some(name) => index_of(&all, name)?,
        None => 0,
    };
    let end_idx = match end {
        Some(name) => index_of(&all, name)? + 1,
        None => all.len(),
    };

    if start_idx >= end_idx {
        return Err(FlowdagError::Other(anyhow!(
            "execution range is empty: start '{}' comes after end '{}'",
            start.unwrap_or("start"),
            end.unwrap_or("end")
        )));
    }

    Ok(all[start_idx..end_idx]
        .iter()
        .map(|s| s.to_string())
        .collect())
}

fn index_of(all: &[&str], name: &str) -> Result<usize> {
    all.iter()
        .position(|t| *t == name)
        .ok_or_else(|| FlowdagError::TaskNotFound(name.to_string()))
}

/// Resolve a single requested task to its leaf set, in declared order.
fn resolve_only_leaves(expanded: &[TaskSpec], task: &str) -> Result<Vec<TaskName>> {
    let by_name: HashMap<&str, &TaskSpec> =
        expanded.iter().map(|t| (t.name.as_str(), t)).collect();

    let root = by_name
        .get(task)
        .ok_or_else(|| FlowdagError::TaskNotFound(task.to_string()))?;

    let mut leaves = Vec::new();
    collect_leaves(root, &by_name, &mut leaves);
    Ok(leaves)
}

fn collect_leaves(
    task: &TaskSpec,
    by_name: &HashMap<&str, &TaskSpec>,
    out: &mut Vec<TaskName>,
) {
    if task.tasks.is_empty() {
        out.push(task.name.clone());
        return;
    }
    for child in &task.tasks {
        if let Some(spec) = by_name.get(child.as_str()) {
            collect_leaves(spec, by_name, out);
        }
    }
}
