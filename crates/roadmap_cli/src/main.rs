//! `roadmap` command-line entry point.
//!
//! # Responsibility
//! - Resolve settings, open the store, dispatch one command.
//! - Print reports as pretty JSON (Gantt as CSV) and errors to stderr.

mod cli;

use clap::Parser;
use cli::{
    AddTaskArgs, Cli, Commands, ProjectCommand, StoreCommand, TaskCommand, IN_MEMORY_DB,
};
use log::{error, info};
use roadmap_core::db::{open_db, open_db_in_memory, DbError};
use roadmap_core::{
    core_version, default_log_level, init_logging, BurndownOptions, LoggingError, ManagerError,
    NewProject, SqliteProjectManager, Task,
};
use rusqlite::Connection;
use serde_json::json;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::process::ExitCode;

#[derive(Debug)]
enum CliError {
    Logging(LoggingError),
    Db(DbError),
    Manager(ManagerError),
    Json(serde_json::Error),
    Io(std::io::Error),
}

impl Display for CliError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Logging(err) => write!(f, "logging: {err}"),
            Self::Db(err) => write!(f, "database: {err}"),
            Self::Manager(err) => write!(f, "{err}"),
            Self::Json(err) => write!(f, "output: {err}"),
            Self::Io(err) => write!(f, "io: {err}"),
        }
    }
}

impl Error for CliError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Logging(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Manager(err) => Some(err),
            Self::Json(err) => Some(err),
            Self::Io(err) => Some(err),
        }
    }
}

impl From<LoggingError> for CliError {
    fn from(value: LoggingError) -> Self {
        Self::Logging(value)
    }
}

impl From<DbError> for CliError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<ManagerError> for CliError {
    fn from(value: ManagerError) -> Self {
        Self::Manager(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

type CliResult<T> = Result<T, CliError>;

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=cli_command module=cli status=error error={err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> CliResult<()> {
    if let Some(log_dir) = cli.log_dir.as_deref() {
        let level = cli.log_level.as_deref().unwrap_or_else(|| default_log_level());
        init_logging(level, log_dir)?;
    }

    match cli.command {
        Commands::Version => {
            println!("{}", core_version());
            Ok(())
        }
        Commands::Store(command) => {
            let conn = open_store(&cli.db)?;
            let manager = SqliteProjectManager::from_connection(&conn)?;
            dispatch(&manager, command)
        }
    }
}

fn open_store(db: &str) -> CliResult<Connection> {
    let conn = if db == IN_MEMORY_DB {
        open_db_in_memory()?
    } else {
        open_db(db)?
    };
    Ok(conn)
}

fn dispatch(manager: &SqliteProjectManager<'_>, command: StoreCommand) -> CliResult<()> {
    match command {
        StoreCommand::Project(command) => project_command(manager, command),
        StoreCommand::Task(command) => task_command(manager, command),
        StoreCommand::CriticalPath { project_id } => {
            let report = manager.critical_path_report(project_id)?;
            let tasks = manager.get_critical_path(project_id)?;
            print_json(&json!({
                "project_id": project_id,
                "total_points": report.total_points,
                "task_ids": report.task_ids,
                "tasks": tasks,
            }))
        }
        StoreCommand::Burndown {
            project_id,
            sprint_days,
            start,
            today,
        } => {
            let options = BurndownOptions {
                sprint_days,
                sprint_start: start,
                today,
            };
            print_json(&manager.calculate_burndown(project_id, &options)?)
        }
        StoreCommand::Gantt { project_id, output } => {
            let csv = manager.export_gantt_csv(project_id)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, csv)?;
                    info!("event=gantt_write module=cli status=ok project_id={project_id}");
                }
                None => print!("{csv}"),
            }
            Ok(())
        }
        StoreCommand::Deadlines { days, today } => print_json(&manager.check_deadlines(days, today)?),
        StoreCommand::Stats { project_id } => print_json(&manager.get_statistics(project_id)?),
    }
}

fn project_command(manager: &SqliteProjectManager<'_>, command: ProjectCommand) -> CliResult<()> {
    match command {
        ProjectCommand::Create {
            name,
            owner,
            deadline,
            description,
            status,
        } => {
            let request = NewProject {
                name,
                owner,
                deadline,
                description,
                status,
            };
            print_json(&manager.create_project(&request)?)
        }
        ProjectCommand::List { status } => print_json(&manager.list_projects(status)?),
        ProjectCommand::Show { id } => print_json(&manager.get_project(id)?),
        ProjectCommand::Status { id, status } => {
            manager.update_project_status(id, status)?;
            print_json(&manager.get_project(id)?)
        }
        ProjectCommand::Delete { id } => {
            manager.delete_project(id)?;
            print_json(&json!({ "deleted": id }))
        }
    }
}

fn task_command(manager: &SqliteProjectManager<'_>, command: TaskCommand) -> CliResult<()> {
    match command {
        TaskCommand::Add(args) => print_json(&manager.add_task(task_from_args(args))?),
        TaskCommand::Show { id } => print_json(&manager.get_task(id)?),
        TaskCommand::List { project_id } => print_json(&manager.list_tasks(project_id)?),
        TaskCommand::Status { id, status } => print_json(&manager.update_task_status(id, status)?),
        TaskCommand::Depend { id, on } => {
            manager.add_dependency(id, on)?;
            print_json(&manager.get_task(id)?)
        }
        TaskCommand::Delete { id } => {
            manager.delete_task(id)?;
            print_json(&json!({ "deleted": id }))
        }
    }
}

fn task_from_args(args: AddTaskArgs) -> Task {
    let mut task = Task::new(args.project_id, args.title, args.assignee);
    task.priority = args.priority;
    task.due_date = args.due;
    task.story_points = args.points;
    task.dependencies = args.depends_on;
    if let Some(status) = args.status {
        task.status = status;
    }
    task
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
