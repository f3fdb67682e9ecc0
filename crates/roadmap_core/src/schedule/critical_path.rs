//! Longest story-point chain through a task graph.
//!
//! Kahn's topological sort with longest-path tracking. Each task's duration
//! is its story points; unrelated tasks may run in parallel.
//!
//! # Invariants
//! - The returned path is in execution order (prerequisites first).
//! - A cyclic graph yields `CycleError` and no partial path.
//! - Ties resolve to the node processed first; comparisons are strict.

use crate::model::TaskId;
use crate::schedule::graph::TaskGraph;
use serde::Serialize;
use std::collections::VecDeque;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Critical path result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CriticalPath {
    /// Task ids in execution order.
    pub task_ids: Vec<TaskId>,
    /// Sum of story points along the path.
    pub total_points: u64,
}

/// The graph is not acyclic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleError {
    /// Nodes never released by the topological sort.
    pub unresolved: usize,
}

impl Display for CycleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "dependency cycle detected; {} task(s) unresolved",
            self.unresolved
        )
    }
}

impl Error for CycleError {}

/// Computes the maximum-weight dependency chain of `graph`.
pub fn critical_path(graph: &TaskGraph) -> Result<CriticalPath, CycleError> {
    let count = graph.node_count();
    if count == 0 {
        return Ok(CriticalPath::default());
    }

    let mut in_degree: Vec<usize> = graph.nodes().map(|node| graph.in_degree(node)).collect();
    let mut finish: Vec<u64> = graph.nodes().map(|node| graph.node(node).weight).collect();
    let mut predecessor = vec![None; count];

    let mut queue: VecDeque<_> = graph
        .nodes()
        .filter(|node| in_degree[node.index()] == 0)
        .collect();
    let mut processed = Vec::with_capacity(count);

    while let Some(node) = queue.pop_front() {
        processed.push(node);
        for successor in graph.successors(node) {
            let candidate = finish[node.index()] + graph.node(successor).weight;
            if candidate > finish[successor.index()] {
                finish[successor.index()] = candidate;
                predecessor[successor.index()] = Some(node);
            }
            in_degree[successor.index()] -= 1;
            if in_degree[successor.index()] == 0 {
                queue.push_back(successor);
            }
        }
    }

    if processed.len() != count {
        return Err(CycleError {
            unresolved: count - processed.len(),
        });
    }

    let mut terminus = processed[0];
    for &node in &processed[1..] {
        if finish[node.index()] > finish[terminus.index()] {
            terminus = node;
        }
    }

    let mut task_ids = Vec::new();
    let mut cursor = Some(terminus);
    while let Some(node) = cursor {
        task_ids.push(graph.node(node).task_id);
        cursor = predecessor[node.index()];
    }
    task_ids.reverse();

    Ok(CriticalPath {
        task_ids,
        total_points: finish[terminus.index()],
    })
}

#[cfg(test)]
mod tests {
    use super::{critical_path, CycleError};
    use crate::model::Task;
    use crate::schedule::graph::TaskGraph;
    use uuid::Uuid;

    fn task(project_id: Uuid, points: u32, deps: &[&Task]) -> Task {
        let mut task = Task::new(project_id, "t", "x");
        task.story_points = points;
        task.dependencies = deps.iter().map(|dep| dep.id).collect();
        task
    }

    #[test]
    fn picks_heaviest_branch() {
        let p = Uuid::new_v4();
        let a = task(p, 5, &[]);
        let b = task(p, 13, &[&a]);
        let c = task(p, 2, &[&a]);

        let path = critical_path(&TaskGraph::from_tasks(&[a.clone(), b.clone(), c])).unwrap();
        assert_eq!(path.task_ids, vec![a.id, b.id]);
        assert_eq!(path.total_points, 18);
    }

    #[test]
    fn diamond_takes_longer_side() {
        let p = Uuid::new_v4();
        let a = task(p, 1, &[]);
        let b = task(p, 2, &[&a]);
        let c = task(p, 8, &[&a]);
        let d = task(p, 1, &[&b, &c]);

        let tasks = [a.clone(), b, c.clone(), d.clone()];
        let path = critical_path(&TaskGraph::from_tasks(&tasks)).unwrap();
        assert_eq!(path.task_ids, vec![a.id, c.id, d.id]);
        assert_eq!(path.total_points, 10);
    }

    #[test]
    fn equal_weights_resolve_to_first_processed() {
        let p = Uuid::new_v4();
        let first = task(p, 3, &[]);
        let second = task(p, 3, &[]);

        let tasks = [first.clone(), second];
        let path = critical_path(&TaskGraph::from_tasks(&tasks)).unwrap();
        assert_eq!(path.task_ids, vec![first.id]);
    }

    #[test]
    fn zero_point_tasks_still_form_a_path() {
        let p = Uuid::new_v4();
        let a = task(p, 0, &[]);
        let path = critical_path(&TaskGraph::from_tasks(&[a.clone()])).unwrap();
        assert_eq!(path.task_ids, vec![a.id]);
        assert_eq!(path.total_points, 0);
    }

    #[test]
    fn cycle_is_reported_without_partial_result() {
        let p = Uuid::new_v4();
        let mut a = task(p, 1, &[]);
        let b = task(p, 1, &[&a]);
        a.dependencies = vec![b.id];
        let c = task(p, 1, &[]);

        let err = critical_path(&TaskGraph::from_tasks(&[a, b, c])).unwrap_err();
        assert_eq!(err, CycleError { unresolved: 2 });
    }

    #[test]
    fn empty_graph_yields_empty_path() {
        let path = critical_path(&TaskGraph::from_tasks(&[])).unwrap();
        assert!(path.task_ids.is_empty());
        assert_eq!(path.total_points, 0);
    }
}
