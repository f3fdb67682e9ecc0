//! Task and dependency-edge repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD APIs over `tasks` and `dependencies`.
//! - Load tasks together with their dependency ids.
//!
//! # Invariants
//! - Task row and its edges are written in one transaction.
//! - Project task listing is deterministic: `created_at ASC, id ASC`.
//! - Dependency ids keep insertion order.
//! - Deleting a task removes every edge that references it (FK cascade).

use crate::model::{
    story_points_from, DependencyEdge, Priority, ProjectId, Task, TaskId, TaskStatus,
};
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::schema::{
    date_to_db, ensure_connection_ready, parse_date, parse_timestamp, parse_uuid,
    timestamp_to_db, DEPENDENCIES_TABLE, PROJECTS_TABLE, TASKS_TABLE,
};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};
use std::collections::HashMap;

const TASK_SELECT_SQL: &str = "SELECT
    id,
    project_id,
    title,
    assignee,
    priority,
    status,
    due_date,
    story_points,
    completed_at,
    created_at
FROM tasks";

/// Repository interface for task and dependency operations.
pub trait TaskRepository {
    /// Inserts the task row and its dependency edges.
    fn create_task(&self, task: &Task) -> RepoResult<TaskId>;
    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>>;
    /// Lists one project's tasks ordered by `created_at ASC, id ASC`.
    fn list_project_tasks(&self, project_id: ProjectId) -> RepoResult<Vec<Task>>;
    /// Lists edges whose dependent task belongs to `project_id`.
    fn list_dependency_edges(&self, project_id: ProjectId) -> RepoResult<Vec<DependencyEdge>>;
    /// Lists tasks in any project that are not done and have a due date.
    fn list_open_tasks_with_due_date(&self) -> RepoResult<Vec<Task>>;
    /// Rewrites the task row and replaces its dependency edges.
    fn update_task(&self, task: &Task) -> RepoResult<()>;
    fn update_task_status(
        &self,
        id: TaskId,
        status: TaskStatus,
        completed_at: Option<DateTime<Utc>>,
    ) -> RepoResult<()>;
    /// Inserts one edge; inserting an existing edge is a no-op.
    fn add_dependency(&self, edge: DependencyEdge) -> RepoResult<()>;
    fn delete_task(&self, id: TaskId) -> RepoResult<()>;
}

/// SQLite-backed task repository.
pub struct SqliteTaskRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTaskRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &[PROJECTS_TABLE, TASKS_TABLE, DEPENDENCIES_TABLE])?;
        Ok(Self { conn })
    }
}

impl TaskRepository for SqliteTaskRepository<'_> {
    fn create_task(&self, task: &Task) -> RepoResult<TaskId> {
        task.validate()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO tasks (
                id,
                project_id,
                title,
                assignee,
                priority,
                status,
                due_date,
                story_points,
                completed_at,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10);",
            params![
                task.id.to_string(),
                task.project_id.to_string(),
                task.title.as_str(),
                task.assignee.as_str(),
                task.priority.level(),
                task.status.as_str(),
                task.due_date.map(date_to_db),
                task.story_points,
                task.completed_at.map(timestamp_to_db),
                timestamp_to_db(task.created_at),
            ],
        )?;
        insert_dependencies(&tx, task.id, &task.dependencies)?;
        tx.commit()?;

        Ok(task.id)
    }

    fn get_task(&self, id: TaskId) -> RepoResult<Option<Task>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{TASK_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            let mut task = parse_task_row(row)?;
            task.dependencies = load_task_dependencies(self.conn, task.id)?;
            task.validate()?;
            return Ok(Some(task));
        }
        Ok(None)
    }

    fn list_project_tasks(&self, project_id: ProjectId) -> RepoResult<Vec<Task>> {
        let mut by_task: HashMap<TaskId, Vec<TaskId>> = HashMap::new();
        for edge in self.list_dependency_edges(project_id)? {
            by_task.entry(edge.task_id).or_default().push(edge.depends_on);
        }

        let mut stmt = self.conn.prepare(&format!(
            "{TASK_SELECT_SQL}
             WHERE project_id = ?1
             ORDER BY created_at ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([project_id.to_string()])?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            let mut task = parse_task_row(row)?;
            task.dependencies = by_task.remove(&task.id).unwrap_or_default();
            task.validate()?;
            tasks.push(task);
        }
        Ok(tasks)
    }

    fn list_dependency_edges(&self, project_id: ProjectId) -> RepoResult<Vec<DependencyEdge>> {
        let mut stmt = self.conn.prepare(
            "SELECT d.task_id, d.depends_on
             FROM dependencies d
             INNER JOIN tasks t ON t.id = d.task_id
             WHERE t.project_id = ?1
             ORDER BY d.rowid ASC;",
        )?;
        let mut rows = stmt.query([project_id.to_string()])?;
        let mut edges = Vec::new();
        while let Some(row) = rows.next()? {
            let task_id: String = row.get(0)?;
            let depends_on: String = row.get(1)?;
            edges.push(DependencyEdge {
                task_id: parse_uuid(&task_id, "dependencies.task_id")?,
                depends_on: parse_uuid(&depends_on, "dependencies.depends_on")?,
            });
        }
        Ok(edges)
    }

    fn list_open_tasks_with_due_date(&self) -> RepoResult<Vec<Task>> {
        let mut stmt = self.conn.prepare(&format!(
            "{TASK_SELECT_SQL}
             WHERE status <> 'done'
               AND due_date IS NOT NULL
             ORDER BY due_date ASC, priority ASC, created_at ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut tasks = Vec::new();
        while let Some(row) = rows.next()? {
            let mut task = parse_task_row(row)?;
            task.dependencies = load_task_dependencies(self.conn, task.id)?;
            task.validate()?;
            tasks.push(task);
        }
        Ok(tasks)
    }

    fn update_task(&self, task: &Task) -> RepoResult<()> {
        task.validate()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let changed = tx.execute(
            "UPDATE tasks
             SET
                project_id = ?1,
                title = ?2,
                assignee = ?3,
                priority = ?4,
                status = ?5,
                due_date = ?6,
                story_points = ?7,
                completed_at = ?8
             WHERE id = ?9;",
            params![
                task.project_id.to_string(),
                task.title.as_str(),
                task.assignee.as_str(),
                task.priority.level(),
                task.status.as_str(),
                task.due_date.map(date_to_db),
                task.story_points,
                task.completed_at.map(timestamp_to_db),
                task.id.to_string(),
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::TaskNotFound(task.id));
        }

        tx.execute(
            "DELETE FROM dependencies WHERE task_id = ?1;",
            [task.id.to_string()],
        )?;
        insert_dependencies(&tx, task.id, &task.dependencies)?;
        tx.commit()?;
        Ok(())
    }

    fn update_task_status(
        &self,
        id: TaskId,
        status: TaskStatus,
        completed_at: Option<DateTime<Utc>>,
    ) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE tasks SET status = ?1, completed_at = ?2 WHERE id = ?3;",
            params![
                status.as_str(),
                completed_at.map(timestamp_to_db),
                id.to_string()
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::TaskNotFound(id));
        }
        Ok(())
    }

    fn add_dependency(&self, edge: DependencyEdge) -> RepoResult<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO dependencies (task_id, depends_on) VALUES (?1, ?2);",
            params![edge.task_id.to_string(), edge.depends_on.to_string()],
        )?;
        Ok(())
    }

    fn delete_task(&self, id: TaskId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM tasks WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::TaskNotFound(id));
        }
        Ok(())
    }
}

fn insert_dependencies(conn: &Connection, task_id: TaskId, dependencies: &[TaskId]) -> RepoResult<()> {
    let mut stmt = conn.prepare(
        "INSERT OR IGNORE INTO dependencies (task_id, depends_on) VALUES (?1, ?2);",
    )?;
    for depends_on in dependencies {
        stmt.execute(params![task_id.to_string(), depends_on.to_string()])?;
    }
    Ok(())
}

fn load_task_dependencies(conn: &Connection, task_id: TaskId) -> RepoResult<Vec<TaskId>> {
    let mut stmt = conn.prepare(
        "SELECT depends_on
         FROM dependencies
         WHERE task_id = ?1
         ORDER BY rowid ASC;",
    )?;
    let mut rows = stmt.query([task_id.to_string()])?;
    let mut dependencies = Vec::new();
    while let Some(row) = rows.next()? {
        let value: String = row.get(0)?;
        dependencies.push(parse_uuid(&value, "dependencies.depends_on")?);
    }
    Ok(dependencies)
}

fn parse_task_row(row: &Row<'_>) -> RepoResult<Task> {
    let id_text: String = row.get("id")?;
    let project_text: String = row.get("project_id")?;

    let priority_level: i64 = row.get("priority")?;
    let priority = Priority::from_level(priority_level).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid priority `{priority_level}` in tasks.priority"
        ))
    })?;

    let status_text: String = row.get("status")?;
    let status = status_text.parse::<TaskStatus>().map_err(|_| {
        RepoError::InvalidData(format!("invalid task status `{status_text}` in tasks.status"))
    })?;

    let points: i64 = row.get("story_points")?;
    let story_points = story_points_from(points).map_err(|_| {
        RepoError::InvalidData(format!("invalid story points `{points}` in tasks.story_points"))
    })?;

    let due_date = row
        .get::<_, Option<String>>("due_date")?
        .map(|value| parse_date(&value, "tasks.due_date"))
        .transpose()?;
    let completed_at = row
        .get::<_, Option<i64>>("completed_at")?
        .map(|value| parse_timestamp(value, "tasks.completed_at"))
        .transpose()?;

    Ok(Task {
        id: parse_uuid(&id_text, "tasks.id")?,
        project_id: parse_uuid(&project_text, "tasks.project_id")?,
        title: row.get("title")?,
        assignee: row.get("assignee")?,
        priority,
        status,
        due_date,
        story_points,
        dependencies: Vec::new(),
        completed_at,
        created_at: parse_timestamp(row.get("created_at")?, "tasks.created_at")?,
    })
}
