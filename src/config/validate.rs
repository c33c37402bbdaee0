// src/config/validate.rs

use std::collections::HashSet;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::FlowFile;
use crate::errors::{FlowdagError, Result};

/// Run semantic validation against a loaded flow definition.
///
/// Unlike most loaders, this does not stop at the first problem: every
/// detectable error is collected and reported in one aggregate, so a broken
/// flow can be fixed in a single edit pass.
///
/// Checks:
/// - there is at least one task
/// - task names are unique
/// - no task depends on itself (`depends_on`, `any_of` or own child list)
/// - all `depends_on`, `any_of` and child references name existing tasks
/// - the graph of `depends_on` + parent/child edges is acyclic
pub fn validate_flow(flow: &FlowFile) -> Result<()> {
    let mut errors: Vec<String> = Vec::new();

    if flow.task.is_empty() {
        errors.push("flow must contain at least one [[task]] entry".to_string());
    }

    check_names_and_references(flow, &mut errors);
    check_cycles(flow, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(FlowdagError::Validation(errors))
    }
}

fn check_names_and_references(flow: &FlowFile, errors: &mut Vec<String>) {
    let mut seen: HashSet<&str> = HashSet::new();
    let known: HashSet<&str> = flow.task.iter().map(|t| t.name.as_str()).collect();

    for task in &flow.task {
        if task.name.is_empty() {
            errors.push("task found without a name".to_string());
            continue;
        }

        if !seen.insert(task.name.as_str()) {
            errors.push(format!("duplicate task name: '{}'", task.name));
        }

        for dep in &task.depends_on {
            if dep == &task.name {
                errors.push(format!("task '{}' depends on itself", task.name));
            } else if !known.contains(dep.as_str()) {
                errors.push(format!(
                    "task '{}' depends on non-existent task '{}'",
                    task.name, dep
                ));
            }
        }

        for dep in &task.any_of {
            if dep == &task.name {
                errors.push(format!(
                    "task '{}' lists itself as an any-of alternative",
                    task.name
                ));
            } else if !known.contains(dep.as_str()) {
                errors.push(format!(
                    "task '{}' has any-of dependency on non-existent task '{}'",
                    task.name, dep
                ));
            }
        }

        for child in &task.tasks {
            if child == &task.name {
                errors.push(format!("task '{}' lists itself as a child", task.name));
            } else if !known.contains(child.as_str()) {
                errors.push(format!(
                    "task '{}' lists non-existent child task '{}'",
                    task.name, child
                ));
            }
        }
    }
}

fn check_cycles(flow: &FlowFile, errors: &mut Vec<String>) {
    // Edge direction: dep -> task, parent -> child. Any-of edges are
    // intentionally excluded: only one alternative ever has to run, so they
    // cannot create a scheduling deadlock.
    let known: HashSet<&str> = flow.task.iter().map(|t| t.name.as_str()).collect();
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for task in &flow.task {
        graph.add_node(task.name.as_str());
    }

    for task in &flow.task {
        for dep in &task.depends_on {
            if known.contains(dep.as_str()) && dep != &task.name {
                graph.add_edge(dep.as_str(), task.name.as_str(), ());
            }
        }
        for child in &task.tasks {
            if known.contains(child.as_str()) && child != &task.name {
                graph.add_edge(task.name.as_str(), child.as_str(), ());
            }
        }
    }

    if let Err(cycle) = toposort(&graph, None) {
        errors.push(format!(
            "cycle detected in task graph involving task '{}'",
            cycle.node_id()
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::model::{RunDefaults, TaskSpec};

    fn task(name: &str) -> TaskSpec {
        TaskSpec {
            name: name.to_string(),
            command: Some(format!("echo {name}")),
            priority: 0,
            depends_on: vec![],
            any_of: vec![],
            tasks: vec![],
        }
    }

    fn flow_of(tasks: Vec<TaskSpec>) -> FlowFile {
        FlowFile {
            config: RunDefaults::default(),
            task: tasks,
        }
    }

    #[test]
    fn accepts_valid_flow() {
        let mut b = task("B");
        b.depends_on = vec!["A".to_string()];
        let flow = flow_of(vec![task("A"), b]);
        assert!(validate_flow(&flow).is_ok());
    }

    #[test]
    fn reports_all_errors_together() {
        let mut bad = task("A");
        bad.depends_on = vec!["A".to_string(), "missing".to_string()];
        let flow = flow_of(vec![bad, task("A")]);

        let err = validate_flow(&flow).unwrap_err();
        let text = err.to_string();
        assert!(text.contains("duplicate task name: 'A'"), "{text}");
        assert!(text.contains("depends on itself"), "{text}");
        assert!(text.contains("non-existent task 'missing'"), "{text}");
    }

    #[test]
    fn rejects_cycles() {
        let mut a = task("A");
        a.depends_on = vec!["B".to_string()];
        let mut b = task("B");
        b.depends_on = vec!["A".to_string()];
        let flow = flow_of(vec![a, b]);

        let err = validate_flow(&flow).unwrap_err();
        assert!(err.to_string().contains("cycle detected"), "{err}");
    }

    #[test]
    fn any_of_edges_do_not_count_as_cycles() {
        let mut a = task("A");
        a.any_of = vec!["B".to_string()];
        let mut b = task("B");
        b.any_of = vec!["A".to_string()];
        let flow = flow_of(vec![a, b]);

        assert!(validate_flow(&flow).is_ok());
    }

    #[test]
    fn rejects_empty_flow() {
        let err = validate_flow(&flow_of(vec![])).unwrap_err();
        assert!(err.to_string().contains("at least one"), "{err}");
    }
}
