//! Gantt CSV rendering.
//!
//! # Invariants
//! - Header and column order are fixed (`GANTT_COLUMNS`); the critical-path
//!   flag is always the last column.
//! - Rows are ordered by priority, due date (missing last), creation, id.
//! - Fields containing `,`, `"`, `\r` or `\n` are quoted, inner quotes doubled.
//! - Lines end with `\n`.

use crate::model::{Task, TaskId};
use chrono::SecondsFormat;
use std::borrow::Cow;
use std::cmp::Ordering;
use std::collections::HashSet;

pub const GANTT_COLUMNS: [&str; 10] = [
    "Task ID",
    "Title",
    "Assignee",
    "Priority",
    "Status",
    "Story Points",
    "Due Date",
    "Completed At",
    "Dependencies",
    "Critical Path",
];

/// Separator between dependency ids inside the `Dependencies` column.
pub const DEPENDENCY_SEPARATOR: &str = "|";

/// Renders `tasks` as CSV, flagging ids in `critical` as on the critical path.
pub fn render_gantt_csv(tasks: &[Task], critical: &HashSet<TaskId>) -> String {
    let mut ordered: Vec<&Task> = tasks.iter().collect();
    ordered.sort_by(|a, b| gantt_order(a, b));

    let mut out = String::new();
    push_row(&mut out, GANTT_COLUMNS.iter().map(|name| Cow::Borrowed(*name)));
    for task in ordered {
        push_row(&mut out, task_fields(task, critical.contains(&task.id)).into_iter());
    }
    out
}

fn gantt_order(a: &Task, b: &Task) -> Ordering {
    a.priority
        .cmp(&b.priority)
        .then_with(|| match (a.due_date, b.due_date) {
            (Some(left), Some(right)) => left.cmp(&right),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| a.created_at.cmp(&b.created_at))
        .then_with(|| a.id.cmp(&b.id))
}

fn task_fields(task: &Task, on_critical_path: bool) -> Vec<Cow<'_, str>> {
    let mut dependencies: Vec<String> = task.dependencies.iter().map(TaskId::to_string).collect();
    dependencies.sort();

    vec![
        Cow::Owned(task.id.to_string()),
        Cow::Borrowed(task.title.as_str()),
        Cow::Borrowed(task.assignee.as_str()),
        Cow::Owned(task.priority.level().to_string()),
        Cow::Borrowed(task.status.as_str()),
        Cow::Owned(task.story_points.to_string()),
        Cow::Owned(
            task.due_date
                .map(|date| date.to_string())
                .unwrap_or_default(),
        ),
        Cow::Owned(
            task.completed_at
                .map(|at| at.to_rfc3339_opts(SecondsFormat::Millis, true))
                .unwrap_or_default(),
        ),
        Cow::Owned(dependencies.join(DEPENDENCY_SEPARATOR)),
        Cow::Borrowed(if on_critical_path { "yes" } else { "no" }),
    ]
}

fn push_row<'a>(out: &mut String, fields: impl Iterator<Item = Cow<'a, str>>) {
    for (index, field) in fields.enumerate() {
        if index > 0 {
            out.push(',');
        }
        out.push_str(&escape_field(&field));
    }
    out.push('\n');
}

/// Quotes one CSV field when it contains a delimiter, quote or line break.
pub fn escape_field(value: &str) -> Cow<'_, str> {
    if value.contains([',', '"', '\r', '\n']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}
