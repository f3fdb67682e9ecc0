//! Project domain model.
//!
//! # Responsibility
//! - Define the project record and its closed status set.
//! - Provide deadline helpers evaluated against a caller-supplied `today`.
//!
//! # Invariants
//! - `id` is stable and never reassigned.
//! - Status transitions are unconstrained, but status is always a known value.
//! - `name` and `owner` are non-blank.

use crate::model::timestamp_now;
use crate::model::validation::ValidationError;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

/// Stable project identifier.
pub type ProjectId = Uuid;

/// Project lifecycle state.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    /// Scoped but not started.
    Planned,
    /// Work is ongoing.
    #[default]
    Active,
    /// Paused.
    OnHold,
    /// Finished.
    Completed,
    /// Abandoned.
    Cancelled,
}

impl ProjectStatus {
    pub const ALL: [ProjectStatus; 5] = [
        Self::Planned,
        Self::Active,
        Self::OnHold,
        Self::Completed,
        Self::Cancelled,
    ];

    /// Storage and wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Planned => "planned",
            Self::Active => "active",
            Self::OnHold => "on_hold",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Returns whether the project no longer takes deadline alerts.
    pub fn is_closed(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

impl Display for ProjectStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectStatus {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| ValidationError::UnknownProjectStatus(value.to_string()))
    }
}

/// Canonical project record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    pub status: ProjectStatus,
    pub owner: String,
    /// Optional target date; projects without one never raise deadline alerts.
    pub deadline: Option<NaiveDate>,
    pub description: String,
    /// Millisecond precision, matching storage.
    pub created_at: DateTime<Utc>,
}

impl Project {
    /// Creates an active project with a generated id and no deadline.
    pub fn new(name: impl Into<String>, owner: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), name, owner)
    }

    /// Creates an active project with a caller-provided id.
    pub fn with_id(id: ProjectId, name: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            status: ProjectStatus::default(),
            owner: owner.into(),
            deadline: None,
            description: String::new(),
            created_at: timestamp_now(),
        }
    }

    /// Validates write-time invariants.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyProjectName);
        }
        if self.owner.trim().is_empty() {
            return Err(ValidationError::EmptyOwner);
        }
        Ok(())
    }

    /// Whole days from `today` to the deadline; negative once it has passed.
    pub fn days_remaining(&self, today: NaiveDate) -> Option<i64> {
        self.deadline
            .map(|deadline| deadline.signed_duration_since(today).num_days())
    }

    /// Returns whether an open project has passed its deadline.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !self.status.is_closed() && self.deadline.is_some_and(|deadline| deadline < today)
    }
}
