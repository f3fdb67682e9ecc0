//! Validation errors shared by model, repository and manager layers.
//!
//! # Invariants
//! - Every variant describes caller input, never a storage failure.
//! - Messages carry ids and enum values only, never titles or descriptions.

use crate::model::project::ProjectId;
use crate::model::task::TaskId;
use crate::schedule::burndown::MAX_SPRINT_DAYS;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Rejected input for project/task writes and report requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Project name is blank after trim.
    EmptyProjectName,
    /// Project owner is blank after trim.
    EmptyOwner,
    /// Task title is blank after trim.
    EmptyTaskTitle,
    /// Task assignee is blank after trim.
    EmptyAssignee,
    /// Status text does not name a known project status.
    UnknownProjectStatus(String),
    /// Status text does not name a known task status.
    UnknownTaskStatus(String),
    /// Priority level outside `1..=4`.
    UnknownPriority(i64),
    /// Story points must be zero or positive.
    NegativeStoryPoints(i64),
    /// Story points do not fit the supported range.
    StoryPointsOutOfRange(i64),
    /// A task lists itself as a dependency.
    SelfDependency(TaskId),
    /// A dependency id appears more than once on one task.
    DuplicateDependency(TaskId),
    /// A dependency references a task that does not exist.
    MissingDependency(TaskId),
    /// A dependency references a task that belongs to another project.
    CrossProjectDependency {
        task_id: TaskId,
        depends_on: TaskId,
        depends_on_project: ProjectId,
    },
    /// A task with the same id is already stored.
    DuplicateTaskId(TaskId),
    /// A task that is not `done` carries a completion timestamp.
    CompletionWithoutDone(TaskId),
    /// A task cannot move to another project after creation.
    ProjectReassignment(TaskId),
    /// Sprint length must be at least one day.
    InvalidSprintLength(u32),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyProjectName => write!(f, "project name must not be blank"),
            Self::EmptyOwner => write!(f, "project owner must not be blank"),
            Self::EmptyTaskTitle => write!(f, "task title must not be blank"),
            Self::EmptyAssignee => write!(f, "task assignee must not be blank"),
            Self::UnknownProjectStatus(value) => write!(
                f,
                "unknown project status `{value}`; expected planned|active|on_hold|completed|cancelled"
            ),
            Self::UnknownTaskStatus(value) => write!(
                f,
                "unknown task status `{value}`; expected todo|in_progress|review|done|blocked"
            ),
            Self::UnknownPriority(value) => {
                write!(f, "unknown priority `{value}`; expected 1 (critical) to 4 (low)")
            }
            Self::NegativeStoryPoints(value) => {
                write!(f, "story points must not be negative, got {value}")
            }
            Self::StoryPointsOutOfRange(value) => {
                write!(f, "story points out of range: {value}")
            }
            Self::SelfDependency(id) => write!(f, "task cannot depend on itself: {id}"),
            Self::DuplicateDependency(id) => write!(f, "dependency listed twice: {id}"),
            Self::MissingDependency(id) => write!(f, "dependency task not found: {id}"),
            Self::CrossProjectDependency {
                task_id,
                depends_on,
                depends_on_project,
            } => write!(
                f,
                "task {task_id} cannot depend on {depends_on} from project {depends_on_project}"
            ),
            Self::DuplicateTaskId(id) => write!(f, "task already exists: {id}"),
            Self::CompletionWithoutDone(id) => {
                write!(f, "task {id} has a completion time but is not done")
            }
            Self::ProjectReassignment(id) => {
                write!(f, "task {id} cannot move to another project")
            }
            Self::InvalidSprintLength(days) => {
                write!(
                    f,
                    "sprint length must be between 1 and {MAX_SPRINT_DAYS} days, got {days}"
                )
            }
        }
    }
}

impl Error for ValidationError {}
