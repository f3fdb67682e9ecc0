//! Deadline alert classification.
//!
//! # Invariants
//! - Each item lands in at most one bucket.
//! - A due date equal to `today` is always `Today`, whatever the window.
//! - Done tasks and closed projects never raise alerts.

use crate::model::{Project, Task};
use chrono::{Days, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;

/// Urgency bucket of a due date relative to `today`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Overdue,
    Today,
    Upcoming,
}

impl Urgency {
    pub const ALL: [Urgency; 3] = [Self::Overdue, Self::Today, Self::Upcoming];
}

/// Classifies `due` or returns `None` when it is beyond the window.
pub fn classify(due: NaiveDate, today: NaiveDate, window_days: u32) -> Option<Urgency> {
    if due < today {
        return Some(Urgency::Overdue);
    }
    if due == today {
        return Some(Urgency::Today);
    }
    let horizon = today
        .checked_add_days(Days::new(u64::from(window_days)))
        .unwrap_or(NaiveDate::MAX);
    (due <= horizon).then_some(Urgency::Upcoming)
}

/// Alerts grouped by urgency. Every bucket is present, possibly empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeadlineReport {
    pub today: NaiveDate,
    pub window_days: u32,
    /// Ordered by due date, priority, then id.
    pub tasks: BTreeMap<Urgency, Vec<Task>>,
    /// Ordered by deadline, name, then id.
    pub projects: BTreeMap<Urgency, Vec<Project>>,
}

impl DeadlineReport {
    /// Total number of alerts across tasks and projects.
    pub fn alert_count(&self) -> usize {
        self.tasks.values().map(Vec::len).sum::<usize>()
            + self.projects.values().map(Vec::len).sum::<usize>()
    }
}

/// Buckets open tasks and open projects by due date.
pub fn build_deadline_report(
    tasks: impl IntoIterator<Item = Task>,
    projects: impl IntoIterator<Item = Project>,
    today: NaiveDate,
    window_days: u32,
) -> DeadlineReport {
    let mut task_buckets = empty_buckets();
    for task in tasks {
        if task.is_done() {
            continue;
        }
        let Some(due) = task.due_date else {
            continue;
        };
        if let Some(urgency) = classify(due, today, window_days) {
            task_buckets.entry(urgency).or_default().push(task);
        }
    }
    for bucket in task_buckets.values_mut() {
        bucket.sort_by(|a, b| {
            (a.due_date, a.priority, a.id).cmp(&(b.due_date, b.priority, b.id))
        });
    }

    let mut project_buckets = empty_buckets();
    for project in projects {
        if project.status.is_closed() {
            continue;
        }
        let Some(deadline) = project.deadline else {
            continue;
        };
        if let Some(urgency) = classify(deadline, today, window_days) {
            project_buckets.entry(urgency).or_default().push(project);
        }
    }
    for bucket in project_buckets.values_mut() {
        bucket.sort_by(|a, b| {
            (a.deadline, a.name.as_str(), a.id).cmp(&(b.deadline, b.name.as_str(), b.id))
        });
    }

    DeadlineReport {
        today,
        window_days,
        tasks: task_buckets,
        projects: project_buckets,
    }
}

fn empty_buckets<T>() -> BTreeMap<Urgency, Vec<T>> {
    Urgency::ALL
        .into_iter()
        .map(|urgency| (urgency, Vec::new()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{build_deadline_report, classify, Urgency};
    use crate::model::{Priority, Project, ProjectStatus, Task, TaskStatus};
    use chrono::{NaiveDate, Utc};
    use uuid::Uuid;

    fn date(value: &str) -> NaiveDate {
        value.parse().unwrap()
    }

    #[test]
    fn classify_matches_reference_scenario() {
        let today = date("2024-06-10");
        assert_eq!(classify(date("2024-06-09"), today, 7), Some(Urgency::Overdue));
        assert_eq!(classify(date("2024-06-10"), today, 7), Some(Urgency::Today));
        assert_eq!(classify(date("2024-06-15"), today, 7), Some(Urgency::Upcoming));
        assert_eq!(classify(date("2024-06-17"), today, 7), Some(Urgency::Upcoming));
        assert_eq!(classify(date("2024-06-20"), today, 7), None);
    }

    #[test]
    fn due_today_is_today_even_with_zero_window() {
        let today = date("2024-06-10");
        assert_eq!(classify(today, today, 0), Some(Urgency::Today));
        assert_eq!(classify(date("2024-06-11"), today, 0), None);
    }

    #[test]
    fn report_skips_done_tasks_and_orders_by_due_then_priority() {
        let p = Uuid::new_v4();
        let mut low = Task::new(p, "low", "x");
        low.due_date = Some(date("2024-06-12"));
        low.priority = Priority::Low;
        let mut critical = Task::new(p, "critical", "x");
        critical.due_date = Some(date("2024-06-12"));
        critical.priority = Priority::Critical;
        let mut earlier = Task::new(p, "earlier", "x");
        earlier.due_date = Some(date("2024-06-11"));
        let mut done = Task::new(p, "done", "x");
        done.due_date = Some(date("2024-06-01"));
        done.set_status(TaskStatus::Done, Utc::now());
        let undated = Task::new(p, "undated", "x");

        let report = build_deadline_report(
            vec![low.clone(), critical.clone(), earlier.clone(), done, undated],
            Vec::new(),
            date("2024-06-10"),
            7,
        );

        let upcoming: Vec<_> = report.tasks[&Urgency::Upcoming]
            .iter()
            .map(|task| task.id)
            .collect();
        assert_eq!(upcoming, vec![earlier.id, critical.id, low.id]);
        assert!(report.tasks[&Urgency::Overdue].is_empty());
        assert!(report.tasks[&Urgency::Today].is_empty());
        assert_eq!(report.alert_count(), 3);
    }

    #[test]
    fn report_skips_closed_projects() {
        let mut open = Project::new("Urgent", "ed");
        open.deadline = Some(date("2024-06-12"));
        let mut cancelled = Project::new("Dropped", "ed");
        cancelled.deadline = Some(date("2024-06-12"));
        cancelled.status = ProjectStatus::Cancelled;
        let mut far = Project::new("Far", "ed");
        far.deadline = Some(date("2024-08-09"));

        let report =
            build_deadline_report(Vec::new(), vec![open.clone(), cancelled, far], date("2024-06-10"), 7);
        assert_eq!(report.projects[&Urgency::Upcoming], vec![open]);
        assert_eq!(report.alert_count(), 1);
    }
}
