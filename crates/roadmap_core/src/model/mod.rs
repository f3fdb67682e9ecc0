//! Domain model for projects, tasks and their dependency edges.
//!
//! # Responsibility
//! - Define canonical records shared by store, scheduling and export code.
//! - Keep status and priority sets closed so invalid states cannot be built.
//!
//! # Invariants
//! - Every record is identified by a stable UUID.
//! - Timestamps carry millisecond precision, the precision the store keeps.

use chrono::{DateTime, SubsecRound, Utc};

pub mod project;
pub mod task;
pub mod validation;

pub use project::{Project, ProjectId, ProjectStatus};
pub use task::{story_points_from, Priority, Task, TaskId, TaskStatus};
pub use validation::ValidationError;

/// Ordered prerequisite pair: `task_id` cannot finish before `depends_on`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DependencyEdge {
    pub task_id: TaskId,
    pub depends_on: TaskId,
}

/// Current UTC time truncated to storage precision.
pub(crate) fn timestamp_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}
