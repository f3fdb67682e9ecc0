//! Task domain model.
//!
//! # Responsibility
//! - Define the task record, its status set and priority levels.
//! - Keep `completed_at` in step with status transitions.
//!
//! # Invariants
//! - `completed_at` is `Some` only while `status == Done`.
//! - `dependencies` never contains the task's own id or duplicates.
//! - `story_points` is non-negative by construction.

use crate::model::project::ProjectId;
use crate::model::timestamp_now;
use crate::model::validation::ValidationError;
use chrono::{DateTime, NaiveDate, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

/// Stable task identifier.
pub type TaskId = Uuid;

/// Task workflow state.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Review,
    Done,
    Blocked,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 5] = [
        Self::Todo,
        Self::InProgress,
        Self::Review,
        Self::Done,
        Self::Blocked,
    ];

    /// Storage and wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "in_progress",
            Self::Review => "review",
            Self::Done => "done",
            Self::Blocked => "blocked",
        }
    }
}

impl Display for TaskStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| ValidationError::UnknownTaskStatus(value.to_string()))
    }
}

/// Task urgency. Lower level means more urgent.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Critical,
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    /// Numeric level stored in `tasks.priority` (1..=4).
    pub fn level(self) -> u8 {
        match self {
            Self::Critical => 1,
            Self::High => 2,
            Self::Medium => 3,
            Self::Low => 4,
        }
    }

    /// Parses a numeric level.
    pub fn from_level(level: i64) -> Result<Self, ValidationError> {
        match level {
            1 => Ok(Self::Critical),
            2 => Ok(Self::High),
            3 => Ok(Self::Medium),
            4 => Ok(Self::Low),
            other => Err(ValidationError::UnknownPriority(other)),
        }
    }
}

/// Converts signed input into story points.
pub fn story_points_from(value: i64) -> Result<u32, ValidationError> {
    if value < 0 {
        return Err(ValidationError::NegativeStoryPoints(value));
    }
    u32::try_from(value).map_err(|_| ValidationError::StoryPointsOutOfRange(value))
}

/// Canonical task record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub project_id: ProjectId,
    pub title: String,
    pub assignee: String,
    pub priority: Priority,
    pub status: TaskStatus,
    pub due_date: Option<NaiveDate>,
    /// Effort estimate; node weight for critical path and burndown.
    pub story_points: u32,
    /// Tasks in the same project that must finish first.
    pub dependencies: Vec<TaskId>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Creates a `todo` task worth one story point with a generated id.
    pub fn new(
        project_id: ProjectId,
        title: impl Into<String>,
        assignee: impl Into<String>,
    ) -> Self {
        Self::with_id(Uuid::new_v4(), project_id, title, assignee)
    }

    /// Creates a `todo` task with a caller-provided id.
    pub fn with_id(
        id: TaskId,
        project_id: ProjectId,
        title: impl Into<String>,
        assignee: impl Into<String>,
    ) -> Self {
        Self {
            id,
            project_id,
            title: title.into(),
            assignee: assignee.into(),
            priority: Priority::default(),
            status: TaskStatus::default(),
            due_date: None,
            story_points: 1,
            dependencies: Vec::new(),
            completed_at: None,
            created_at: timestamp_now(),
        }
    }

    pub fn is_done(&self) -> bool {
        self.status == TaskStatus::Done
    }

    /// Moves the task to `status`, stamping or clearing `completed_at`.
    ///
    /// Re-marking a done task as done keeps the original completion time.
    pub fn set_status(&mut self, status: TaskStatus, now: DateTime<Utc>) {
        match (self.status, status) {
            (TaskStatus::Done, TaskStatus::Done) => {}
            (_, TaskStatus::Done) => self.completed_at = Some(now.trunc_subsecs(3)),
            _ => self.completed_at = None,
        }
        self.status = status;
    }

    /// Validates write-time invariants that need no storage lookups.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyTaskTitle);
        }
        if self.assignee.trim().is_empty() {
            return Err(ValidationError::EmptyAssignee);
        }
        if !self.is_done() && self.completed_at.is_some() {
            return Err(ValidationError::CompletionWithoutDone(self.id));
        }

        let mut seen = HashSet::with_capacity(self.dependencies.len());
        for dependency in &self.dependencies {
            if *dependency == self.id {
                return Err(ValidationError::SelfDependency(self.id));
            }
            if !seen.insert(*dependency) {
                return Err(ValidationError::DuplicateDependency(*dependency));
            }
        }
        Ok(())
    }
}
