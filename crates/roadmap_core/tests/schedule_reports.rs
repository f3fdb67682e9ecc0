use chrono::{NaiveDate, SecondsFormat, TimeZone, Utc};
use roadmap_core::db::open_db_in_memory;
use roadmap_core::export::gantt::{DEPENDENCY_SEPARATOR, GANTT_COLUMNS};
use roadmap_core::schedule::burndown::MAX_SPRINT_DAYS;
use roadmap_core::{
    BurndownOptions, ManagerError, NewProject, Priority, Project, SqliteProjectManager, Task,
    TaskId, TaskStatus, Urgency, ValidationError,
};
use std::collections::HashMap;
use uuid::Uuid;

fn date(value: &str) -> NaiveDate {
    value.parse().unwrap()
}

fn launch(manager: &SqliteProjectManager<'_>) -> Project {
    manager
        .create_project(&NewProject::new("Launch", "ed"))
        .unwrap()
}

fn add(
    manager: &SqliteProjectManager<'_>,
    project: &Project,
    title: &str,
    points: u32,
    deps: &[TaskId],
) -> Task {
    let mut task = Task::new(project.id, title, "carol");
    task.story_points = points;
    task.dependencies = deps.to_vec();
    manager.add_task(task).unwrap()
}

#[test]
fn critical_path_follows_heaviest_chain() {
    let conn = open_db_in_memory().unwrap();
    let manager = SqliteProjectManager::from_connection(&conn).unwrap();
    let project = launch(&manager);
    let a = add(&manager, &project, "A", 5, &[]);
    let b = add(&manager, &project, "B", 13, &[a.id]);
    let _c = add(&manager, &project, "C", 2, &[a.id]);

    let report = manager.critical_path_report(project.id).unwrap();
    assert_eq!(report.task_ids, vec![a.id, b.id]);
    assert_eq!(report.total_points, 18);

    let tasks = manager.get_critical_path(project.id).unwrap();
    let titles: Vec<_> = tasks.iter().map(|task| task.title.as_str()).collect();
    assert_eq!(titles, ["A", "B"]);
}

#[test]
fn critical_path_is_a_maximal_dependency_chain() {
    let conn = open_db_in_memory().unwrap();
    let manager = SqliteProjectManager::from_connection(&conn).unwrap();
    let project = launch(&manager);

    let t0 = add(&manager, &project, "t0", 3, &[]);
    let t1 = add(&manager, &project, "t1", 2, &[]);
    let t2 = add(&manager, &project, "t2", 8, &[t0.id]);
    let t3 = add(&manager, &project, "t3", 1, &[t0.id, t1.id]);
    let t4 = add(&manager, &project, "t4", 5, &[t3.id]);
    let t5 = add(&manager, &project, "t5", 4, &[t2.id, t4.id]);
    let _t6 = add(&manager, &project, "t6", 9, &[t1.id]);
    let _t7 = add(&manager, &project, "t7", 0, &[t5.id]);

    let tasks = manager.list_tasks(project.id).unwrap();
    let by_id: HashMap<TaskId, &Task> = tasks.iter().map(|task| (task.id, task)).collect();
    let report = manager.critical_path_report(project.id).unwrap();

    for pair in report.task_ids.windows(2) {
        assert!(
            by_id[&pair[1]].dependencies.contains(&pair[0]),
            "path step is not a dependency edge"
        );
    }
    let weight: u64 = report
        .task_ids
        .iter()
        .map(|id| u64::from(by_id[id].story_points))
        .sum();
    assert_eq!(weight, report.total_points);
    assert_eq!(report.total_points, heaviest_chain(&tasks));
    assert_eq!(report.total_points, 15);
}

fn heaviest_chain(tasks: &[Task]) -> u64 {
    fn best_ending_at(id: TaskId, tasks: &HashMap<TaskId, &Task>) -> u64 {
        let task = tasks[&id];
        let before = task
            .dependencies
            .iter()
            .map(|dep| best_ending_at(*dep, tasks))
            .max()
            .unwrap_or(0);
        before + u64::from(task.story_points)
    }
    let by_id: HashMap<TaskId, &Task> = tasks.iter().map(|task| (task.id, task)).collect();
    tasks
        .iter()
        .map(|task| best_ending_at(task.id, &by_id))
        .max()
        .unwrap_or(0)
}

#[test]
fn critical_path_of_empty_project_is_empty() {
    let conn = open_db_in_memory().unwrap();
    let manager = SqliteProjectManager::from_connection(&conn).unwrap();
    let project = launch(&manager);

    let report = manager.critical_path_report(project.id).unwrap();
    assert!(report.task_ids.is_empty());
    assert_eq!(report.total_points, 0);
    assert!(manager.get_critical_path(project.id).unwrap().is_empty());
}

#[test]
fn persisted_cycle_is_reported_not_partially_resolved() {
    let conn = open_db_in_memory().unwrap();
    let manager = SqliteProjectManager::from_connection(&conn).unwrap();
    let project = launch(&manager);
    let a = add(&manager, &project, "A", 3, &[]);
    let b = add(&manager, &project, "B", 5, &[a.id]);
    let _c = add(&manager, &project, "C", 1, &[]);

    conn.execute(
        "INSERT INTO dependencies (task_id, depends_on) VALUES (?1, ?2);",
        [a.id.to_string(), b.id.to_string()],
    )
    .unwrap();

    assert!(matches!(
        manager.critical_path_report(project.id).unwrap_err(),
        ManagerError::CycleDetected { project_id } if project_id == project.id
    ));
    assert!(matches!(
        manager.export_gantt_csv(project.id).unwrap_err(),
        ManagerError::CycleDetected { .. }
    ));
}

#[test]
fn burndown_spans_sprint_and_tracks_completions() {
    let conn = open_db_in_memory().unwrap();
    let manager = SqliteProjectManager::from_connection(&conn).unwrap();
    let project = launch(&manager);
    let _a = add(&manager, &project, "A", 8, &[]);
    let b = add(&manager, &project, "B", 5, &[]);
    let _c = add(&manager, &project, "C", 7, &[]);

    let options = BurndownOptions {
        sprint_days: 14,
        sprint_start: Some(date("2024-06-01")),
        today: Some(date("2024-06-14")),
    };
    let untouched = manager.calculate_burndown(project.id, &options).unwrap();
    assert_eq!(untouched.len(), 14);
    assert_eq!(untouched[0].ideal, 20.0);
    assert_eq!(untouched[13].ideal, 0.0);
    assert!(untouched.windows(2).all(|w| w[1].ideal < w[0].ideal));
    assert!(untouched.iter().all(|point| point.actual == Some(20)));
    assert_eq!(untouched[13].date, date("2024-06-14"));

    manager
        .update_task_status_at(
            b.id,
            TaskStatus::Done,
            Utc.with_ymd_and_hms(2024, 6, 3, 10, 0, 0).unwrap(),
        )
        .unwrap();
    let chart = manager
        .calculate_burndown(
            project.id,
            &BurndownOptions {
                today: Some(date("2024-06-05")),
                ..options
            },
        )
        .unwrap();
    let actual: Vec<_> = chart.iter().map(|point| point.actual).collect();
    assert_eq!(actual[..5], [Some(20), Some(20), Some(15), Some(15), Some(15)]);
    assert!(actual[5..].iter().all(Option::is_none));
}

#[test]
fn burndown_rejects_zero_length_sprint() {
    let conn = open_db_in_memory().unwrap();
    let manager = SqliteProjectManager::from_connection(&conn).unwrap();
    let project = launch(&manager);

    let err = manager
        .calculate_burndown(
            project.id,
            &BurndownOptions {
                sprint_days: 0,
                ..BurndownOptions::default()
            },
        )
        .unwrap_err();
    assert!(matches!(
        err,
        ManagerError::Validation(ValidationError::InvalidSprintLength(0))
    ));
}

#[test]
fn deadlines_bucket_tasks_and_projects() {
    let conn = open_db_in_memory().unwrap();
    let manager = SqliteProjectManager::from_connection(&conn).unwrap();
    let mut request = NewProject::new("Launch", "ed");
    request.deadline = Some(date("2024-06-15"));
    let project = manager.create_project(&request).unwrap();

    let mut ids = HashMap::new();
    for due in ["2024-06-09", "2024-06-10", "2024-06-15", "2024-06-20"] {
        let mut task = Task::new(project.id, due, "carol");
        task.due_date = Some(date(due));
        ids.insert(due, manager.add_task(task).unwrap().id);
    }
    let mut finished = Task::new(project.id, "finished", "carol");
    finished.due_date = Some(date("2024-06-01"));
    finished.status = TaskStatus::Done;
    manager.add_task(finished).unwrap();

    let report = manager
        .check_deadlines(7, Some(date("2024-06-10")))
        .unwrap();

    let bucket = |urgency: Urgency| -> Vec<TaskId> {
        report.tasks[&urgency].iter().map(|task| task.id).collect()
    };
    assert_eq!(bucket(Urgency::Overdue), vec![ids["2024-06-09"]]);
    assert_eq!(bucket(Urgency::Today), vec![ids["2024-06-10"]]);
    assert_eq!(bucket(Urgency::Upcoming), vec![ids["2024-06-15"]]);
    assert_eq!(report.projects[&Urgency::Upcoming].len(), 1);
    assert_eq!(report.alert_count(), 4);

    let json = serde_json::to_value(&report).unwrap();
    assert!(json["tasks"]["overdue"].is_array());
    assert!(json["projects"]["today"].as_array().unwrap().is_empty());
}

#[test]
fn statistics_summarize_project() {
    let conn = open_db_in_memory().unwrap();
    let manager = SqliteProjectManager::from_connection(&conn).unwrap();
    let project = launch(&manager);
    let a = add(&manager, &project, "A", 5, &[]);
    let _b = add(&manager, &project, "B", 3, &[]);
    manager.update_task_status(a.id, TaskStatus::Done).unwrap();

    let stats = manager.get_statistics(project.id).unwrap();
    assert_eq!(stats.total_tasks, 2);
    assert_eq!(stats.done_tasks, 1);
    assert_eq!(stats.completion_pct, 50.0);
    assert_eq!(stats.total_story_points, 8);
    assert_eq!(stats.done_story_points, 5);
    assert_eq!(stats.tasks_by_status[&TaskStatus::Done], 1);
    assert_eq!(stats.points_by_assignee["carol"], 8);
}

#[test]
fn gantt_csv_reparses_to_stored_values() {
    let conn = open_db_in_memory().unwrap();
    let manager = SqliteProjectManager::from_connection(&conn).unwrap();
    let project = launch(&manager);

    let mut first = Task::new(project.id, "Write, then \"ship\"", "carol");
    first.story_points = 5;
    first.priority = Priority::Critical;
    first.due_date = Some(date("2024-06-20"));
    let first = manager.add_task(first).unwrap();
    let mut second = Task::new(project.id, "two\nlines", "dave");
    second.story_points = 3;
    second.dependencies = vec![first.id];
    let second = manager.add_task(second).unwrap();
    let third = add(&manager, &project, "side", 1, &[first.id]);
    manager.update_task_status(third.id, TaskStatus::Done).unwrap();

    let csv = manager.export_gantt_csv(project.id).unwrap();
    let rows = parse_csv(&csv);
    assert_eq!(rows[0], GANTT_COLUMNS);
    assert_eq!(rows.len(), 4);

    let stored = manager.list_tasks(project.id).unwrap();
    for row in &rows[1..] {
        let task = stored
            .iter()
            .find(|task| task.id.to_string() == row[0])
            .unwrap();
        let on_path = [first.id, second.id].contains(&task.id);
        let expected = [
            task.id.to_string(),
            task.title.clone(),
            task.assignee.clone(),
            task.priority.level().to_string(),
            task.status.as_str().to_string(),
            task.story_points.to_string(),
            task.due_date.map(|d| d.to_string()).unwrap_or_default(),
            task.completed_at
                .map(|at| at.to_rfc3339_opts(SecondsFormat::Millis, true))
                .unwrap_or_default(),
            task.dependencies
                .iter()
                .map(|id| id.to_string())
                .collect::<Vec<_>>()
                .join(DEPENDENCY_SEPARATOR),
            if on_path { "yes" } else { "no" }.to_string(),
        ];
        assert_eq!(row[..], expected[..]);
    }
    assert_eq!(rows[1][0], first.id.to_string());
}

/// Minimal RFC 4180 reader for the export above.
fn parse_csv(input: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut row = Vec::new();
    let mut field = String::new();
    let mut quoted = false;
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        match (quoted, ch) {
            (true, '"') if chars.peek() == Some(&'"') => {
                chars.next();
                field.push('"');
            }
            (true, '"') => quoted = false,
            (true, other) => field.push(other),
            (false, '"') => quoted = true,
            (false, ',') => row.push(std::mem::take(&mut field)),
            (false, '\n') => {
                row.push(std::mem::take(&mut field));
                rows.push(std::mem::take(&mut row));
            }
            (false, other) => field.push(other),
        }
    }
    rows
}

#[test]
fn burndown_rejects_sprints_beyond_the_cap() {
    let conn = open_db_in_memory().unwrap();
    let manager = SqliteProjectManager::from_connection(&conn).unwrap();
    let project = launch(&manager);
    add(&manager, &project, "A", 3, &[]);

    for sprint_days in [MAX_SPRINT_DAYS + 1, u32::MAX] {
        let err = manager
            .calculate_burndown(
                project.id,
                &BurndownOptions {
                    sprint_days,
                    sprint_start: Some(date("2024-06-01")),
                    today: Some(date("2024-06-01")),
                },
            )
            .unwrap_err();
        assert!(matches!(
            err,
            ManagerError::Validation(ValidationError::InvalidSprintLength(days)) if days == sprint_days
        ));
    }
}

#[test]
fn build_graph_links_prerequisites_to_dependents() {
    let conn = open_db_in_memory().unwrap();
    let manager = SqliteProjectManager::from_connection(&conn).unwrap();
    let project = launch(&manager);
    assert!(manager.build_graph(project.id).unwrap().is_empty());

    let a = add(&manager, &project, "A", 5, &[]);
    let b = add(&manager, &project, "B", 13, &[a.id]);
    let _c = add(&manager, &project, "C", 2, &[a.id]);

    let graph = manager.build_graph(project.id).unwrap();
    assert_eq!(graph.node_count(), 3);
    assert_eq!(graph.edge_count(), 2);
    assert!(graph.has_path(a.id, b.id));
    assert!(!graph.has_path(b.id, a.id));
}

#[test]
fn reports_on_unknown_project_are_not_found() {
    let conn = open_db_in_memory().unwrap();
    let manager = SqliteProjectManager::from_connection(&conn).unwrap();
    let missing = Uuid::new_v4();
    let not_found = |err: ManagerError| matches!(err, ManagerError::ProjectNotFound(id) if id == missing);

    assert!(not_found(manager.build_graph(missing).unwrap_err()));
    assert!(not_found(manager.get_critical_path(missing).unwrap_err()));
    assert!(not_found(manager.critical_path_report(missing).unwrap_err()));
    assert!(not_found(manager.export_gantt_csv(missing).unwrap_err()));
    assert!(not_found(manager.get_statistics(missing).unwrap_err()));
    assert!(not_found(
        manager
            .calculate_burndown(missing, &BurndownOptions::default())
            .unwrap_err()
    ));
}
