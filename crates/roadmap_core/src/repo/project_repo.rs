//! Project repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD APIs over the `projects` table.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Write paths call `Project::validate()` before SQL mutations.
//! - Read paths reject invalid persisted state instead of masking it.
//! - Listing order is deterministic: deadline (missing last), creation, id.

use crate::model::{Project, ProjectId, ProjectStatus};
use crate::repo::error::{RepoError, RepoResult};
use crate::repo::schema::{
    date_to_db, ensure_connection_ready, parse_date, parse_timestamp, parse_uuid,
    timestamp_to_db, PROJECTS_TABLE,
};
use rusqlite::{params, Connection, Row};

const PROJECT_SELECT_SQL: &str = "SELECT
    id,
    name,
    status,
    owner,
    deadline,
    description,
    created_at
FROM projects";

/// Query options for listing projects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectListQuery {
    /// Restricts results to one status when set.
    pub status: Option<ProjectStatus>,
}

/// Repository interface for project CRUD operations.
pub trait ProjectRepository {
    fn create_project(&self, project: &Project) -> RepoResult<ProjectId>;
    fn get_project(&self, id: ProjectId) -> RepoResult<Option<Project>>;
    fn list_projects(&self, query: &ProjectListQuery) -> RepoResult<Vec<Project>>;
    fn update_project_status(&self, id: ProjectId, status: ProjectStatus) -> RepoResult<()>;
    /// Deletes the project together with its tasks and their edges.
    fn delete_project(&self, id: ProjectId) -> RepoResult<()>;
}

/// SQLite-backed project repository.
pub struct SqliteProjectRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteProjectRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &[PROJECTS_TABLE])?;
        Ok(Self { conn })
    }
}

impl ProjectRepository for SqliteProjectRepository<'_> {
    fn create_project(&self, project: &Project) -> RepoResult<ProjectId> {
        project.validate()?;

        self.conn.execute(
            "INSERT INTO projects (
                id,
                name,
                status,
                owner,
                deadline,
                description,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                project.id.to_string(),
                project.name.as_str(),
                project.status.as_str(),
                project.owner.as_str(),
                project.deadline.map(date_to_db),
                project.description.as_str(),
                timestamp_to_db(project.created_at),
            ],
        )?;

        Ok(project.id)
    }

    fn get_project(&self, id: ProjectId) -> RepoResult<Option<Project>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PROJECT_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_project_row(row)?));
        }
        Ok(None)
    }

    fn list_projects(&self, query: &ProjectListQuery) -> RepoResult<Vec<Project>> {
        let order = "ORDER BY deadline IS NULL ASC, deadline ASC, created_at ASC, id ASC";
        let mut stmt;
        let mut rows = match query.status {
            Some(status) => {
                stmt = self
                    .conn
                    .prepare(&format!("{PROJECT_SELECT_SQL} WHERE status = ?1 {order};"))?;
                stmt.query([status.as_str()])?
            }
            None => {
                stmt = self.conn.prepare(&format!("{PROJECT_SELECT_SQL} {order};"))?;
                stmt.query([])?
            }
        };

        let mut projects = Vec::new();
        while let Some(row) = rows.next()? {
            projects.push(parse_project_row(row)?);
        }
        Ok(projects)
    }

    fn update_project_status(&self, id: ProjectId, status: ProjectStatus) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE projects SET status = ?1 WHERE id = ?2;",
            params![status.as_str(), id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::ProjectNotFound(id));
        }
        Ok(())
    }

    fn delete_project(&self, id: ProjectId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM projects WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::ProjectNotFound(id));
        }
        Ok(())
    }
}

fn parse_project_row(row: &Row<'_>) -> RepoResult<Project> {
    let id_text: String = row.get("id")?;
    let status_text: String = row.get("status")?;
    let status = status_text.parse::<ProjectStatus>().map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid project status `{status_text}` in projects.status"
        ))
    })?;
    let deadline = row
        .get::<_, Option<String>>("deadline")?
        .map(|value| parse_date(&value, "projects.deadline"))
        .transpose()?;

    let project = Project {
        id: parse_uuid(&id_text, "projects.id")?,
        name: row.get("name")?,
        status,
        owner: row.get("owner")?,
        deadline,
        description: row.get("description")?,
        created_at: parse_timestamp(row.get("created_at")?, "projects.created_at")?,
    };
    project.validate()?;
    Ok(project)
}
