//! Command-line surface.
//!
//! Settings resolve from flags first, then `ROADMAP_*` environment variables.

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use roadmap_core::model::story_points_from;
use roadmap_core::{Priority, ProjectId, ProjectStatus, TaskId, TaskStatus};

pub const IN_MEMORY_DB: &str = ":memory:";

#[derive(Debug, Parser)]
#[command(name = "roadmap")]
#[command(version, about = "Projects, task dependencies and schedule reports")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// SQLite database file (`:memory:` for a throwaway store)
    #[arg(long, global = true, env = "ROADMAP_DB", default_value = "roadmap.db")]
    pub db: String,

    /// Log level (trace|debug|info|warn|error)
    #[arg(long, global = true, env = "ROADMAP_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Absolute log directory; logging is off when unset
    #[arg(long, global = true, env = "ROADMAP_LOG_DIR")]
    pub log_dir: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print the core version
    Version,

    #[command(flatten)]
    Store(StoreCommand),
}

/// Commands that read or write the store.
#[derive(Debug, Subcommand)]
pub enum StoreCommand {
    /// Manage projects
    #[command(subcommand)]
    Project(ProjectCommand),

    /// Manage tasks and dependencies
    #[command(subcommand)]
    Task(TaskCommand),

    /// Longest story-point chain through a project's dependencies
    CriticalPath {
        project_id: ProjectId,
    },

    /// Ideal vs actual remaining story points per sprint day
    Burndown {
        project_id: ProjectId,

        /// Sprint length in days
        #[arg(long, default_value_t = 14)]
        sprint_days: u32,

        /// First sprint day (defaults to the earliest task creation date)
        #[arg(long, value_parser = parse_date)]
        start: Option<NaiveDate>,

        /// Last day with observed actuals (defaults to the current UTC date)
        #[arg(long, value_parser = parse_date)]
        today: Option<NaiveDate>,
    },

    /// Gantt CSV of a project
    Gantt {
        project_id: ProjectId,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Overdue, due-today and upcoming tasks and projects
    Deadlines {
        /// Look-ahead window in days
        #[arg(long, default_value_t = 7)]
        days: u32,

        /// Reference date (defaults to the current UTC date)
        #[arg(long, value_parser = parse_date)]
        today: Option<NaiveDate>,
    },

    /// Completion statistics of a project
    Stats {
        project_id: ProjectId,
    },
}

#[derive(Debug, Subcommand)]
pub enum ProjectCommand {
    /// Create a project
    Create {
        name: String,

        #[arg(long)]
        owner: String,

        #[arg(long, value_parser = parse_date)]
        deadline: Option<NaiveDate>,

        #[arg(short = 'd', long, default_value = "")]
        description: String,

        #[arg(short, long, value_parser = parse_project_status)]
        status: Option<ProjectStatus>,
    },

    /// List projects
    #[command(visible_alias = "ls")]
    List {
        #[arg(short, long, value_parser = parse_project_status)]
        status: Option<ProjectStatus>,
    },

    /// Show one project
    Show { id: ProjectId },

    /// Change project status
    Status {
        id: ProjectId,
        #[arg(value_parser = parse_project_status)]
        status: ProjectStatus,
    },

    /// Delete a project with its tasks
    Delete { id: ProjectId },
}

#[derive(Debug, Subcommand)]
pub enum TaskCommand {
    /// Add a task to a project
    Add(AddTaskArgs),

    /// Show one task
    Show { id: TaskId },

    /// List a project's tasks
    #[command(visible_alias = "ls")]
    List { project_id: ProjectId },

    /// Change task status
    Status {
        id: TaskId,
        #[arg(value_parser = parse_task_status)]
        status: TaskStatus,
    },

    /// Record that a task waits for another
    Depend {
        id: TaskId,

        /// Prerequisite task
        #[arg(long)]
        on: TaskId,
    },

    /// Delete a task with its dependency edges
    Delete { id: TaskId },
}

#[derive(Debug, Args)]
pub struct AddTaskArgs {
    pub project_id: ProjectId,

    pub title: String,

    #[arg(short, long)]
    pub assignee: String,

    /// 1 = critical .. 4 = low
    #[arg(short, long, value_parser = parse_priority, default_value = "3")]
    pub priority: Priority,

    #[arg(short, long, value_parser = parse_task_status)]
    pub status: Option<TaskStatus>,

    #[arg(long, value_parser = parse_date)]
    pub due: Option<NaiveDate>,

    #[arg(long, value_parser = parse_story_points, default_value = "1", allow_negative_numbers = true)]
    pub points: u32,

    /// Prerequisite task ids (repeatable)
    #[arg(long = "depends-on")]
    pub depends_on: Vec<TaskId>,
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|err| format!("expected YYYY-MM-DD: {err}"))
}

fn parse_project_status(value: &str) -> Result<ProjectStatus, String> {
    value.parse().map_err(|err| format!("{err}"))
}

fn parse_task_status(value: &str) -> Result<TaskStatus, String> {
    value.parse().map_err(|err| format!("{err}"))
}

fn parse_priority(value: &str) -> Result<Priority, String> {
    let level: i64 = value
        .trim()
        .parse()
        .map_err(|_| format!("expected 1..4, got `{value}`"))?;
    Priority::from_level(level).map_err(|err| err.to_string())
}

fn parse_story_points(value: &str) -> Result<u32, String> {
    let points: i64 = value
        .trim()
        .parse()
        .map_err(|_| format!("expected a whole number, got `{value}`"))?;
    story_points_from(points).map_err(|err| err.to_string())
}
