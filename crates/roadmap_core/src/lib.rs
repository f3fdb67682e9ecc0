//! Core domain logic for Roadmap.
//! This crate is the single source of truth for scheduling invariants.

pub mod db;
pub mod export;
pub mod logging;
pub mod model;
pub mod repo;
pub mod schedule;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::{
    DependencyEdge, Priority, Project, ProjectId, ProjectStatus, Task, TaskId, TaskStatus,
    ValidationError,
};
pub use repo::error::{RepoError, RepoResult};
pub use repo::project_repo::{ProjectListQuery, ProjectRepository, SqliteProjectRepository};
pub use repo::task_repo::{SqliteTaskRepository, TaskRepository};
pub use schedule::burndown::BurndownPoint;
pub use schedule::critical_path::CriticalPath;
pub use schedule::deadlines::{DeadlineReport, Urgency};
pub use schedule::stats::ProjectStats;
pub use service::project_manager::{
    BurndownOptions, ManagerError, ManagerResult, NewProject, ProjectManager,
    SqliteProjectManager,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
