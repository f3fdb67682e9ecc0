//! In-memory dependency graph for one project's tasks.
//!
//! # Invariants
//! - Nodes are inserted in the order tasks are supplied, so `NodeIndex`
//!   order doubles as the deterministic tie-break order.
//! - Edges point from prerequisite to dependent (`depends_on -> task`).
//! - Edges naming a task outside the supplied set are dropped.

use crate::model::{Task, TaskId};
use petgraph::algo::has_path_connecting;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::HashMap;

/// Graph node payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskNode {
    pub task_id: TaskId,
    /// Story points of the task.
    pub weight: u64,
}

/// Directed dependency graph weighted by story points.
#[derive(Debug, Clone, Default)]
pub struct TaskGraph {
    graph: DiGraph<TaskNode, ()>,
    index: HashMap<TaskId, NodeIndex>,
}

impl TaskGraph {
    /// Builds the graph from tasks and the dependency ids they carry.
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let mut graph = DiGraph::with_capacity(tasks.len(), tasks.len());
        let mut index = HashMap::with_capacity(tasks.len());
        for task in tasks {
            let node = graph.add_node(TaskNode {
                task_id: task.id,
                weight: u64::from(task.story_points),
            });
            index.insert(task.id, node);
        }

        for task in tasks {
            let Some(&dependent) = index.get(&task.id) else {
                continue;
            };
            for depends_on in &task.dependencies {
                if let Some(&prerequisite) = index.get(depends_on) {
                    graph.update_edge(prerequisite, dependent, ());
                }
            }
        }

        Self { graph, index }
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Node indices in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.node_indices()
    }

    pub fn node(&self, node: NodeIndex) -> TaskNode {
        self.graph[node]
    }

    pub fn node_of(&self, task_id: TaskId) -> Option<NodeIndex> {
        self.index.get(&task_id).copied()
    }

    /// Dependents of `node`, sorted by insertion order.
    pub fn successors(&self, node: NodeIndex) -> Vec<NodeIndex> {
        let mut successors: Vec<NodeIndex> = self
            .graph
            .neighbors_directed(node, Direction::Outgoing)
            .collect();
        successors.sort_unstable();
        successors
    }

    /// Number of prerequisites of `node` inside the graph.
    pub fn in_degree(&self, node: NodeIndex) -> usize {
        self.graph
            .neighbors_directed(node, Direction::Incoming)
            .count()
    }

    /// Returns whether `to` is reachable from `from` by following edges.
    ///
    /// Unknown ids are unreachable. A node always reaches itself.
    pub fn has_path(&self, from: TaskId, to: TaskId) -> bool {
        match (self.node_of(from), self.node_of(to)) {
            (Some(from), Some(to)) => has_path_connecting(&self.graph, from, to, None),
            _ => false,
        }
    }
}
