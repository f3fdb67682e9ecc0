//! Project manager façade.
//!
//! # Responsibility
//! - Compose repositories and scheduling functions into the public
//!   operation set (create/add/query/report).
//! - Validate foreign references and dependency edges above the store.
//!
//! # Invariants
//! - Dependencies always reference existing tasks of the same project.
//! - A write rejected by validation leaves the store unmodified.
//! - Report operations never write.

use crate::export::gantt::render_gantt_csv;
use crate::model::{
    timestamp_now, DependencyEdge, Project, ProjectId, ProjectStatus, Task, TaskId, TaskStatus,
    ValidationError,
};
use crate::repo::error::RepoError;
use crate::repo::project_repo::{
    ProjectListQuery, ProjectRepository, SqliteProjectRepository,
};
use crate::repo::task_repo::{SqliteTaskRepository, TaskRepository};
use crate::schedule::burndown::{burndown, default_sprint_start, BurndownPoint};
use crate::schedule::critical_path::{critical_path, CriticalPath};
use crate::schedule::deadlines::{build_deadline_report, DeadlineReport};
use crate::schedule::graph::TaskGraph;
use crate::schedule::stats::{project_stats, ProjectStats};
use chrono::{DateTime, NaiveDate, SubsecRound, Utc};
use log::{debug, info, warn};
use rusqlite::Connection;
use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Errors from manager operations.
#[derive(Debug)]
pub enum ManagerError {
    /// Referenced project does not exist.
    ProjectNotFound(ProjectId),
    /// Referenced task does not exist.
    TaskNotFound(TaskId),
    /// Input rejected before any write.
    Validation(ValidationError),
    /// The project's dependency graph is not acyclic.
    CycleDetected { project_id: ProjectId },
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for ManagerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ProjectNotFound(id) => write!(f, "project not found: {id}"),
            Self::TaskNotFound(id) => write!(f, "task not found: {id}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::CycleDetected { project_id } => {
                write!(f, "dependency cycle detected in project {project_id}")
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ManagerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ManagerError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::ProjectNotFound(id) => Self::ProjectNotFound(id),
            RepoError::TaskNotFound(id) => Self::TaskNotFound(id),
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

impl From<ValidationError> for ManagerError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

pub type ManagerResult<T> = Result<T, ManagerError>;

/// Request model for creating a project.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewProject {
    pub name: String,
    pub owner: String,
    pub deadline: Option<NaiveDate>,
    pub description: String,
    /// Defaults to `active`.
    pub status: Option<ProjectStatus>,
}

impl NewProject {
    pub fn new(name: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            owner: owner.into(),
            ..Self::default()
        }
    }
}

/// Burndown request options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BurndownOptions {
    /// Sprint length; must be at least one.
    pub sprint_days: u32,
    /// Defaults to the earliest task creation date of the project.
    pub sprint_start: Option<NaiveDate>,
    /// Last day with observed actuals. Defaults to the current UTC date.
    pub today: Option<NaiveDate>,
}

impl Default for BurndownOptions {
    fn default() -> Self {
        Self {
            sprint_days: 14,
            sprint_start: None,
            today: None,
        }
    }
}

/// Manager backed by SQLite repositories borrowing one connection.
pub type SqliteProjectManager<'conn> =
    ProjectManager<SqliteProjectRepository<'conn>, SqliteTaskRepository<'conn>>;

/// Façade over project and task repositories.
pub struct ProjectManager<P: ProjectRepository, T: TaskRepository> {
    projects: P,
    tasks: T,
}

impl<'conn> ProjectManager<SqliteProjectRepository<'conn>, SqliteTaskRepository<'conn>> {
    /// Creates a manager over a migrated connection.
    pub fn from_connection(conn: &'conn Connection) -> ManagerResult<Self> {
        Ok(Self::new(
            SqliteProjectRepository::try_new(conn)?,
            SqliteTaskRepository::try_new(conn)?,
        ))
    }
}

impl<P: ProjectRepository, T: TaskRepository> ProjectManager<P, T> {
    pub fn new(projects: P, tasks: T) -> Self {
        Self { projects, tasks }
    }

    // ----- projects -----

    /// Creates and stores a new project.
    pub fn create_project(&self, request: &NewProject) -> ManagerResult<Project> {
        let mut project = Project::new(request.name.trim(), request.owner.trim());
        project.deadline = request.deadline;
        project.description = request.description.clone();
        if let Some(status) = request.status {
            project.status = status;
        }

        self.projects.create_project(&project)?;
        info!(
            "event=project_create module=service status=ok project_id={} project_status={}",
            project.id, project.status
        );
        Ok(project)
    }

    pub fn get_project(&self, id: ProjectId) -> ManagerResult<Project> {
        self.projects
            .get_project(id)?
            .ok_or(ManagerError::ProjectNotFound(id))
    }

    /// Lists projects, optionally restricted to one status.
    pub fn list_projects(&self, status: Option<ProjectStatus>) -> ManagerResult<Vec<Project>> {
        Ok(self.projects.list_projects(&ProjectListQuery { status })?)
    }

    pub fn update_project_status(&self, id: ProjectId, status: ProjectStatus) -> ManagerResult<()> {
        self.projects.update_project_status(id, status)?;
        info!(
            "event=project_status module=service status=ok project_id={id} project_status={status}"
        );
        Ok(())
    }

    /// Deletes a project with all of its tasks and edges.
    pub fn delete_project(&self, id: ProjectId) -> ManagerResult<()> {
        self.projects.delete_project(id)?;
        info!("event=project_delete module=service status=ok project_id={id}");
        Ok(())
    }

    // ----- tasks -----

    /// Validates and stores a new task with its dependency edges.
    ///
    /// A `done` task without a completion time is stamped with the current time.
    pub fn add_task(&self, mut task: Task) -> ManagerResult<Task> {
        task.validate()?;
        truncate_to_storage_precision(&mut task);
        self.get_project(task.project_id)?;
        if self.tasks.get_task(task.id)?.is_some() {
            return Err(ValidationError::DuplicateTaskId(task.id).into());
        }
        self.ensure_dependencies_in_project(&task)?;

        if task.is_done() && task.completed_at.is_none() {
            task.completed_at = Some(timestamp_now());
        }

        self.tasks.create_task(&task)?;
        info!(
            "event=task_add module=service status=ok project_id={} task_id={} dependency_count={}",
            task.project_id,
            task.id,
            task.dependencies.len()
        );
        Ok(task)
    }

    pub fn get_task(&self, id: TaskId) -> ManagerResult<Task> {
        self.tasks.get_task(id)?.ok_or(ManagerError::TaskNotFound(id))
    }

    /// Lists a project's tasks in creation order.
    pub fn list_tasks(&self, project_id: ProjectId) -> ManagerResult<Vec<Task>> {
        self.get_project(project_id)?;
        Ok(self.tasks.list_project_tasks(project_id)?)
    }

    /// Writes back a modified task, including its dependency list.
    ///
    /// The task keeps its project and its creation time. The new dependency
    /// list must keep the project graph acyclic.
    pub fn update_task(&self, mut task: Task) -> ManagerResult<Task> {
        task.validate()?;
        let stored = self.get_task(task.id)?;
        if stored.project_id != task.project_id {
            return Err(ValidationError::ProjectReassignment(task.id).into());
        }
        task.created_at = stored.created_at;
        truncate_to_storage_precision(&mut task);
        self.ensure_dependencies_in_project(&task)?;

        match (stored.status, task.status) {
            (TaskStatus::Done, TaskStatus::Done) if task.completed_at.is_none() => {
                task.completed_at = stored.completed_at;
            }
            (_, TaskStatus::Done) if task.completed_at.is_none() => {
                task.completed_at = Some(timestamp_now());
            }
            _ => {}
        }

        let mut tasks = self.tasks.list_project_tasks(task.project_id)?;
        for candidate in tasks.iter_mut() {
            if candidate.id == task.id {
                candidate.dependencies = task.dependencies.clone();
            }
        }
        if critical_path(&TaskGraph::from_tasks(&tasks)).is_err() {
            warn!(
                "event=task_update module=service status=error error_code=cycle project_id={} task_id={}",
                task.project_id, task.id
            );
            return Err(ManagerError::CycleDetected {
                project_id: task.project_id,
            });
        }

        self.tasks.update_task(&task)?;
        info!(
            "event=task_update module=service status=ok project_id={} task_id={}",
            task.project_id, task.id
        );
        Ok(task)
    }

    /// Changes task status, stamping `completed_at` with the current time.
    pub fn update_task_status(&self, id: TaskId, status: TaskStatus) -> ManagerResult<Task> {
        self.update_task_status_at(id, status, Utc::now())
    }

    /// Changes task status using `now` as the completion time.
    ///
    /// Marking an already done task as done keeps its original completion
    /// time; any other status clears it.
    pub fn update_task_status_at(
        &self,
        id: TaskId,
        status: TaskStatus,
        now: DateTime<Utc>,
    ) -> ManagerResult<Task> {
        let mut task = self.get_task(id)?;
        task.set_status(status, now);
        self.tasks
            .update_task_status(task.id, task.status, task.completed_at)?;
        info!(
            "event=task_status module=service status=ok task_id={id} task_status={status}"
        );
        Ok(task)
    }

    /// Records that `task_id` cannot finish before `depends_on`.
    pub fn add_dependency(&self, task_id: TaskId, depends_on: TaskId) -> ManagerResult<()> {
        if task_id == depends_on {
            return Err(ValidationError::SelfDependency(task_id).into());
        }
        let task = self.get_task(task_id)?;
        let prerequisite = self
            .tasks
            .get_task(depends_on)?
            .ok_or(ValidationError::MissingDependency(depends_on))?;
        if prerequisite.project_id != task.project_id {
            return Err(ValidationError::CrossProjectDependency {
                task_id,
                depends_on,
                depends_on_project: prerequisite.project_id,
            }
            .into());
        }

        let graph = TaskGraph::from_tasks(&self.tasks.list_project_tasks(task.project_id)?);
        if graph.has_path(task_id, depends_on) {
            warn!(
                "event=dependency_add module=service status=error error_code=cycle project_id={} task_id={task_id} depends_on={depends_on}",
                task.project_id
            );
            return Err(ManagerError::CycleDetected {
                project_id: task.project_id,
            });
        }

        self.tasks.add_dependency(DependencyEdge {
            task_id,
            depends_on,
        })?;
        info!(
            "event=dependency_add module=service status=ok project_id={} task_id={task_id} depends_on={depends_on}",
            task.project_id
        );
        Ok(())
    }

    /// Deletes a task and every dependency edge touching it.
    pub fn delete_task(&self, id: TaskId) -> ManagerResult<()> {
        self.tasks.delete_task(id)?;
        info!("event=task_delete module=service status=ok task_id={id}");
        Ok(())
    }

    // ----- reports -----

    /// Builds the dependency graph of one project.
    pub fn build_graph(&self, project_id: ProjectId) -> ManagerResult<TaskGraph> {
        let tasks = self.list_tasks(project_id)?;
        Ok(TaskGraph::from_tasks(&tasks))
    }

    /// Critical path ids and total weight for one project.
    pub fn critical_path_report(&self, project_id: ProjectId) -> ManagerResult<CriticalPath> {
        let tasks = self.list_tasks(project_id)?;
        self.compute_critical_path(project_id, &tasks)
    }

    /// Tasks on the critical path in execution order.
    pub fn get_critical_path(&self, project_id: ProjectId) -> ManagerResult<Vec<Task>> {
        let tasks = self.list_tasks(project_id)?;
        let path = self.compute_critical_path(project_id, &tasks)?;

        let mut by_id: HashMap<TaskId, Task> =
            tasks.into_iter().map(|task| (task.id, task)).collect();
        Ok(path
            .task_ids
            .iter()
            .filter_map(|id| by_id.remove(id))
            .collect())
    }

    /// Ideal vs actual remaining story points per sprint day.
    pub fn calculate_burndown(
        &self,
        project_id: ProjectId,
        options: &BurndownOptions,
    ) -> ManagerResult<Vec<BurndownPoint>> {
        let project = self.get_project(project_id)?;
        let tasks = self.tasks.list_project_tasks(project_id)?;

        let sprint_start = options
            .sprint_start
            .unwrap_or_else(|| default_sprint_start(&tasks, project.created_at.date_naive()));
        let today = options.today.unwrap_or_else(|| Utc::now().date_naive());
        let chart = burndown(&tasks, sprint_start, options.sprint_days, today)?;
        debug!(
            "event=burndown module=service status=ok project_id={project_id} sprint_start={sprint_start} sprint_days={} task_count={}",
            options.sprint_days,
            tasks.len()
        );
        Ok(chart)
    }

    /// Gantt CSV of one project with critical-path flags.
    pub fn export_gantt_csv(&self, project_id: ProjectId) -> ManagerResult<String> {
        let tasks = self.list_tasks(project_id)?;
        let path = self.compute_critical_path(project_id, &tasks)?;
        let critical: HashSet<TaskId> = path.task_ids.into_iter().collect();
        let csv = render_gantt_csv(&tasks, &critical);
        info!(
            "event=gantt_export module=service status=ok project_id={project_id} row_count={}",
            tasks.len()
        );
        Ok(csv)
    }

    /// Deadline alerts for open tasks and open projects across the store.
    pub fn check_deadlines(
        &self,
        days_ahead: u32,
        today: Option<NaiveDate>,
    ) -> ManagerResult<DeadlineReport> {
        let today = today.unwrap_or_else(|| Utc::now().date_naive());
        let tasks = self.tasks.list_open_tasks_with_due_date()?;
        let projects = self.projects.list_projects(&ProjectListQuery::default())?;
        let report = build_deadline_report(tasks, projects, today, days_ahead);
        info!(
            "event=deadline_check module=service status=ok today={today} window_days={days_ahead} alert_count={}",
            report.alert_count()
        );
        Ok(report)
    }

    /// Completion statistics for one project.
    pub fn get_statistics(&self, project_id: ProjectId) -> ManagerResult<ProjectStats> {
        let tasks = self.list_tasks(project_id)?;
        Ok(project_stats(&tasks))
    }

    fn compute_critical_path(
        &self,
        project_id: ProjectId,
        tasks: &[Task],
    ) -> ManagerResult<CriticalPath> {
        let started_at = Instant::now();
        let graph = TaskGraph::from_tasks(tasks);
        match critical_path(&graph) {
            Ok(path) => {
                debug!(
                    "event=critical_path module=service status=ok project_id={project_id} node_count={} edge_count={} path_len={} total_points={} duration_ms={}",
                    graph.node_count(),
                    graph.edge_count(),
                    path.task_ids.len(),
                    path.total_points,
                    started_at.elapsed().as_millis()
                );
                Ok(path)
            }
            Err(err) => {
                warn!(
                    "event=critical_path module=service status=error error_code=cycle project_id={project_id} unresolved={}",
                    err.unresolved
                );
                Err(ManagerError::CycleDetected { project_id })
            }
        }
    }

    fn ensure_dependencies_in_project(&self, task: &Task) -> ManagerResult<()> {
        for &depends_on in &task.dependencies {
            let prerequisite = self
                .tasks
                .get_task(depends_on)?
                .ok_or(ValidationError::MissingDependency(depends_on))?;
            if prerequisite.project_id != task.project_id {
                return Err(ValidationError::CrossProjectDependency {
                    task_id: task.id,
                    depends_on,
                    depends_on_project: prerequisite.project_id,
                }
                .into());
            }
        }
        Ok(())
    }
}

fn truncate_to_storage_precision(task: &mut Task) {
    task.created_at = task.created_at.trunc_subsecs(3);
    task.completed_at = task.completed_at.map(|at| at.trunc_subsecs(3));
}
