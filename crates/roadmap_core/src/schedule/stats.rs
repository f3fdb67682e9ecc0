//! Per-project completion statistics.

use crate::model::{Task, TaskStatus};
use serde::Serialize;
use std::collections::BTreeMap;

/// Aggregate counts for one project.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectStats {
    pub total_tasks: usize,
    pub done_tasks: usize,
    /// Done share of all tasks in percent, one decimal; `0.0` with no tasks.
    pub completion_pct: f64,
    pub total_story_points: u64,
    pub done_story_points: u64,
    /// Every status is present, possibly with zero.
    pub tasks_by_status: BTreeMap<TaskStatus, usize>,
    pub tasks_by_assignee: BTreeMap<String, usize>,
    pub points_by_assignee: BTreeMap<String, u64>,
}

pub fn project_stats(tasks: &[Task]) -> ProjectStats {
    let mut tasks_by_status: BTreeMap<TaskStatus, usize> =
        TaskStatus::ALL.into_iter().map(|status| (status, 0)).collect();
    let mut tasks_by_assignee = BTreeMap::new();
    let mut points_by_assignee = BTreeMap::new();
    let mut done_tasks = 0;
    let mut total_story_points = 0;
    let mut done_story_points = 0;

    for task in tasks {
        let points = u64::from(task.story_points);
        *tasks_by_status.entry(task.status).or_insert(0) += 1;
        *tasks_by_assignee.entry(task.assignee.clone()).or_insert(0) += 1;
        *points_by_assignee.entry(task.assignee.clone()).or_insert(0) += points;
        total_story_points += points;
        if task.is_done() {
            done_tasks += 1;
            done_story_points += points;
        }
    }

    let completion_pct = if tasks.is_empty() {
        0.0
    } else {
        (done_tasks as f64 / tasks.len() as f64 * 1000.0).round() / 10.0
    };

    ProjectStats {
        total_tasks: tasks.len(),
        done_tasks,
        completion_pct,
        total_story_points,
        done_story_points,
        tasks_by_status,
        tasks_by_assignee,
        points_by_assignee,
    }
}

#[cfg(test)]
mod tests {
    use super::project_stats;
    use crate::model::{Task, TaskStatus};
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn counts_by_status_and_assignee() {
        let p = Uuid::new_v4();
        let mut a = Task::new(p, "a", "ann");
        a.story_points = 4;
        a.set_status(TaskStatus::Done, Utc::now());
        let mut b = Task::new(p, "b", "bob");
        b.story_points = 2;
        let mut c = Task::new(p, "c", "bob");
        c.story_points = 3;

        let stats = project_stats(&[a, b, c]);
        assert_eq!(stats.total_tasks, 3);
        assert_eq!(stats.done_tasks, 1);
        assert_eq!(stats.completion_pct, 33.3);
        assert_eq!(stats.total_story_points, 9);
        assert_eq!(stats.done_story_points, 4);
        assert_eq!(stats.tasks_by_status[&TaskStatus::Todo], 2);
        assert_eq!(stats.tasks_by_status[&TaskStatus::Blocked], 0);
        assert_eq!(stats.tasks_by_assignee["bob"], 2);
        assert_eq!(stats.points_by_assignee["bob"], 5);
    }

    #[test]
    fn empty_project_has_zero_completion() {
        let stats = project_stats(&[]);
        assert_eq!(stats.total_tasks, 0);
        assert_eq!(stats.completion_pct, 0.0);
    }
}
