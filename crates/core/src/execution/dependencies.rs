//! Task dependency management
//!
//! This module groups tasks into waves: batches that may run concurrently
//! because none of their members waits on a task that is still unplaced.

use std::collections::{HashMap, HashSet};

use petgraph::algo::kosaraju_scc;
use petgraph::graph::DiGraph;
use tracing::warn;

use crate::tasks::Task;
use crate::types::{JointlyError, JointlyResult};

/// Indices into the task list, one batch per wave
pub type Wave = Vec<usize>;

/// Group tasks by dependency level.
///
/// Each pass takes every unplaced task none of whose dependencies is the key
/// of another unplaced task. Dependencies on keys no task declares are
/// satisfied trivially. Input order is preserved within a wave.
pub fn group_tasks(tasks: &[Task]) -> JointlyResult<Vec<Wave>> {
    warn_unknown_dependencies(tasks);

    let mut waves = Vec::new();
    let mut pending: Vec<usize> = (0..tasks.len()).collect();

    while !pending.is_empty() {
        let (wave, rest): (Vec<usize>, Vec<usize>) = pending.iter().partition(|&&index| {
            !pending.iter().any(|&other| {
                tasks[other]
                    .key
                    .as_deref()
                    .is_some_and(|key| tasks[index].depends_on(key))
            })
        });

        if wave.is_empty() {
            return Err(cyclic_dependency_error(tasks, &pending));
        }

        waves.push(wave);
        pending = rest;
    }

    Ok(waves)
}

fn warn_unknown_dependencies(tasks: &[Task]) {
    let keys: HashSet<&str> = tasks.iter().filter_map(|task| task.key.as_deref()).collect();
    for task in tasks {
        for dep in &task.dependencies {
            if !keys.contains(dep.as_str()) {
                warn!(
                    task = task.label(),
                    dependency = %dep,
                    "dependency does not match any task key, ignoring it"
                );
            }
        }
    }
}

/// Describe the unplaceable tasks and the cycles among them
fn cyclic_dependency_error(tasks: &[Task], pending: &[usize]) -> JointlyError {
    let mut graph = DiGraph::<String, ()>::new();
    let nodes: HashMap<usize, _> = pending
        .iter()
        .map(|&index| (index, graph.add_node(tasks[index].label().to_string())))
        .collect();

    for &from in pending {
        for &to in pending {
            if let Some(key) = tasks[to].key.as_deref() {
                if tasks[from].depends_on(key) {
                    graph.add_edge(nodes[&from], nodes[&to], ());
                }
            }
        }
    }

    let mut cycles: Vec<Vec<String>> = kosaraju_scc(&graph)
        .into_iter()
        .filter_map(|component| {
            if component.len() > 1 {
                let mut cycle = component
                    .iter()
                    .map(|node| graph[*node].clone())
                    .collect::<Vec<_>>();
                cycle.sort();
                Some(cycle)
            } else {
                let node = component[0];
                if graph.contains_edge(node, node) {
                    Some(vec![graph[node].clone()])
                } else {
                    None
                }
            }
        })
        .collect();
    cycles.sort();

    JointlyError::CyclicDependency {
        pending: pending
            .iter()
            .map(|&index| tasks[index].label().to_string())
            .collect(),
        cycles,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(tasks: &[Task], waves: &[Wave]) -> Vec<Vec<String>> {
        waves
            .iter()
            .map(|wave| {
                wave.iter()
                    .map(|&index| tasks[index].label().to_string())
                    .collect()
            })
            .collect()
    }

    #[test]
    fn test_independent_tasks_form_one_wave() {
        let tasks = vec![Task::new("xxx"), Task::new("yyy"), Task::new("zzz")];
        let waves = group_tasks(&tasks).unwrap();
        assert_eq!(waves, vec![vec![0, 1, 2]]);
    }

    #[test]
    fn test_empty_task_list_has_no_waves() {
        assert!(group_tasks(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_dependent_task_goes_to_later_wave() {
        let tasks = vec![
            Task::new("bbb").with_dependencies(["aaa"]),
            Task::new("aaa").with_key("aaa"),
        ];
        let waves = group_tasks(&tasks).unwrap();
        assert_eq!(labels(&tasks, &waves), vec![vec!["aaa"], vec!["bbb"]]);
    }

    #[test]
    fn test_wave_count_is_longest_chain() {
        // a <- b <- d, a <- c, e independent
        let tasks = vec![
            Task::new("d").with_key("d").with_dependencies(["b"]),
            Task::new("c").with_key("c").with_dependencies(["a"]),
            Task::new("b").with_key("b").with_dependencies(["a"]),
            Task::new("a").with_key("a"),
            Task::new("e").with_key("e"),
        ];
        let waves = group_tasks(&tasks).unwrap();
        assert_eq!(
            labels(&tasks, &waves),
            vec![vec!["a", "e"], vec!["c", "b"], vec!["d"]]
        );

        let wave_of = |label: &str| {
            waves
                .iter()
                .position(|wave| wave.iter().any(|&i| tasks[i].label() == label))
                .unwrap()
        };
        for task in &tasks {
            for dep in &task.dependencies {
                assert!(wave_of(task.label()) > wave_of(dep));
            }
        }
    }

    #[test]
    fn test_unknown_dependency_is_ignored() {
        let tasks = vec![Task::new("a").with_dependencies(["missing"])];
        assert_eq!(group_tasks(&tasks).unwrap(), vec![vec![0]]);
    }

    #[test]
    fn test_task_without_key_cannot_be_depended_on() {
        let tasks = vec![
            Task::new("a").with_label("a"),
            Task::new("b").with_dependencies(["a"]),
        ];
        assert_eq!(group_tasks(&tasks).unwrap(), vec![vec![0, 1]]);
    }

    #[test]
    fn test_two_node_cycle_is_rejected() {
        let tasks = vec![
            Task::new("xxx").with_key("aaa").with_dependencies(["bbb"]),
            Task::new("yyy").with_key("bbb").with_dependencies(["aaa"]),
        ];
        let err = group_tasks(&tasks).unwrap_err();
        match err {
            JointlyError::CyclicDependency { pending, cycles } => {
                assert_eq!(pending, vec!["aaa", "bbb"]);
                assert_eq!(cycles, vec![vec!["aaa".to_string(), "bbb".to_string()]]);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_self_dependency_is_rejected() {
        let tasks = vec![Task::new("xxx").with_key("aaa").with_dependencies(["aaa"])];
        let err = group_tasks(&tasks).unwrap_err();
        assert!(matches!(
            err,
            JointlyError::CyclicDependency { ref cycles, .. } if cycles == &vec![vec!["aaa".to_string()]]
        ));
    }

    #[test]
    fn test_cycle_blocks_its_dependents_without_partial_result() {
        let tasks = vec![
            Task::new("ok").with_key("ok"),
            Task::new("x").with_key("x").with_dependencies(["y"]),
            Task::new("y").with_key("y").with_dependencies(["x"]),
            Task::new("z").with_key("z").with_dependencies(["x", "ok"]),
        ];
        let err = group_tasks(&tasks).unwrap_err();
        match err {
            JointlyError::CyclicDependency { pending, cycles } => {
                assert_eq!(pending, vec!["x", "y", "z"]);
                assert_eq!(cycles, vec![vec!["x".to_string(), "y".to_string()]]);
            }
            other => panic!("unexpected error: {}", other),
        }
    }
}
