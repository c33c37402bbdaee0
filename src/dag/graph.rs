// src/dag/graph.rs

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::config::model::TaskSpec;

/// Canonical task name type used throughout the crate.
pub type TaskName = String;

/// Dependency structure built once from the flat (expanded) task list.
///
/// - `dependents` are forward edges: completing a task makes these
///   candidates for scheduling.
/// - `in_degree` counts unresolved "all-of" edges per task. Parent/child
///   (group) edges count here too: a child carries one edge from its group
///   node, which keeps the child spliced through the group's position.
/// - `any_of` is a separate explicit waiting-set per task; it contributes
///   nothing to `in_degree`. A task is held in the waiting set until any one
///   candidate completes.
///
/// Assumes validated input: acyclic, all references known, unique names.
#[derive(Debug, Clone)]
pub struct FlowGraph {
    /// Task names in expanded declaration order.
    order: Vec<TaskName>,
    dependents: HashMap<TaskName, Vec<TaskName>>,
    in_degree: HashMap<TaskName, usize>,
    any_of: HashMap<TaskName, BTreeSet<TaskName>>,
    priorities: HashMap<TaskName, i64>,
}

impl FlowGraph {
    /// Build the graph from the flat task list in one pass.
    pub fn from_tasks(tasks: &[TaskSpec]) -> Self {
        let mut order = Vec::with_capacity(tasks.len());
        let mut dependents: HashMap<TaskName, Vec<TaskName>> = HashMap::new();
        let mut in_degree: HashMap<TaskName, usize> = HashMap::new();
        let mut any_of: HashMap<TaskName, BTreeSet<TaskName>> = HashMap::new();
        let mut priorities: HashMap<TaskName, i64> = HashMap::new();

        for task in tasks {
            order.push(task.name.clone());
            dependents.entry(task.name.clone()).or_default();
            in_degree.entry(task.name.clone()).or_insert(0);
            priorities.insert(task.name.clone(), task.priority);
        }

        for task in tasks {
            for dep in &task.depends_on {
                dependents
                    .entry(dep.clone())
                    .or_default()
                    .push(task.name.clone());
                *in_degree.entry(task.name.clone()).or_insert(0) += 1;
            }

            // Group edge: parent -> child, so children become eligible at
            // the group's position in the flow.
            for child in &task.tasks {
                dependents
                    .entry(task.name.clone())
                    .or_default()
                    .push(child.clone());
                *in_degree.entry(child.clone()).or_insert(0) += 1;
            }

            if !task.any_of.is_empty() {
                any_of.insert(
                    task.name.clone(),
                    task.any_of.iter().cloned().collect(),
                );
            }
        }

        Self {
            order,
            dependents,
            in_degree,
            any_of,
            priorities,
        }
    }

    /// Task names in expanded declaration order.
    pub fn task_order(&self) -> &[TaskName] {
        &self.order
    }

    /// Forward edges of a task.
    pub fn dependents_of(&self, name: &str) -> &[TaskName] {
        self.dependents
            .get(name)
            .map(|d| d.as_slice())
            .unwrap_or(&[])
    }

    /// Current in-degree of a task, if it is still part of the graph.
    pub fn in_degree_of(&self, name: &str) -> Option<usize> {
        self.in_degree.get(name).copied()
    }

    /// Scheduling priority of a task (default 0).
    pub fn priority_of(&self, name: &str) -> i64 {
        self.priorities.get(name).copied().unwrap_or(0)
    }

    /// Snapshot of the any-of waiting sets (task -> remaining candidates).
    pub fn any_of_sets(&self) -> &HashMap<TaskName, BTreeSet<TaskName>> {
        &self.any_of
    }

    /// Remove tasks that completed in a previous run, satisfying their
    /// outgoing edges.
    ///
    /// Each removed task:
    /// - leaves the in-degree map (so it is never seeded or emitted),
    /// - decrements every dependent's in-degree,
    /// - satisfies any waiting-set that lists it (the waiter no longer waits).
    pub fn remove_completed(&mut self, completed: &HashSet<TaskName>) {
        for name in completed {
            if self.in_degree.remove(name).is_none() {
                continue;
            }

            for dependent in self.dependents.get(name).cloned().unwrap_or_default() {
                if let Some(deg) = self.in_degree.get_mut(&dependent) {
                    *deg = deg.saturating_sub(1);
                }
            }

            self.any_of.retain(|_, candidates| !candidates.contains(name));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(name: &str, depends_on: &[&str], any_of: &[&str]) -> TaskSpec {
        TaskSpec {
            name: name.to_string(),
            command: Some(format!("echo {name}")),
            priority: 0,
            depends_on: depends_on.iter().map(|s| s.to_string()).collect(),
            any_of: any_of.iter().map(|s| s.to_string()).collect(),
            tasks: vec![],
        }
    }

    #[test]
    fn in_degree_counts_all_of_edges() {
        let tasks = vec![
            spec("A", &[], &[]),
            spec("B", &["A"], &[]),
            spec("D", &["A", "B"], &[]),
        ];
        let graph = FlowGraph::from_tasks(&tasks);
        assert_eq!(graph.in_degree_of("A"), Some(0));
        assert_eq!(graph.in_degree_of("B"), Some(1));
        assert_eq!(graph.in_degree_of("D"), Some(2));
    }

    #[test]
    fn any_of_does_not_count_toward_in_degree() {
        let tasks = vec![
            spec("A", &[], &[]),
            spec("B", &[], &[]),
            spec("C", &[], &["A", "B"]),
        ];
        let graph = FlowGraph::from_tasks(&tasks);
        assert_eq!(graph.in_degree_of("C"), Some(0));
        assert!(graph.any_of_sets().contains_key("C"));
    }

    #[test]
    fn group_edges_count_like_all_of() {
        let mut group = spec("G", &[], &[]);
        group.command = None;
        group.tasks = vec!["a".to_string()];
        let tasks = vec![spec("a", &[], &[]), group];
        let graph = FlowGraph::from_tasks(&tasks);
        assert_eq!(graph.in_degree_of("a"), Some(1));
        assert_eq!(graph.dependents_of("G"), ["a".to_string()]);
    }

    #[test]
    fn remove_completed_releases_dependents_and_waiters() {
        let tasks = vec![
            spec("A", &[], &[]),
            spec("B", &["A"], &[]),
            spec("C", &[], &["A"]),
        ];
        let mut graph = FlowGraph::from_tasks(&tasks);

        let done: HashSet<String> = ["A".to_string()].into_iter().collect();
        graph.remove_completed(&done);

        assert_eq!(graph.in_degree_of("A"), None);
        assert_eq!(graph.in_degree_of("B"), Some(0));
        assert!(!graph.any_of_sets().contains_key("C"));
    }
}
