//! Sprint burndown: ideal vs actual remaining story points per day.
//!
//! # Invariants
//! - Exactly `sprint_days` points are produced, day 0 at the sprint start.
//! - The ideal line falls linearly from the total to zero on the last day.
//! - Actual values are only reported up to and including `today`.

use crate::model::{Task, ValidationError};
use chrono::{Days, NaiveDate};
use serde::Serialize;
use std::iter::successors;

/// One day of the burndown chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BurndownPoint {
    /// Zero-based offset from the sprint start.
    pub day: u32,
    pub date: NaiveDate,
    /// Remaining points on a perfectly linear burn.
    pub ideal: f64,
    /// Remaining points at the end of `date`; `None` for days after `today`.
    pub actual: Option<u64>,
}

/// Sprint start used when the caller does not provide one.
///
/// Earliest task creation date; `fallback` (the project creation date) when
/// there are no tasks.
pub fn default_sprint_start(tasks: &[Task], fallback: NaiveDate) -> NaiveDate {
    tasks
        .iter()
        .map(|task| task.created_at.date_naive())
        .min()
        .unwrap_or(fallback)
}

/// Longest sprint a chart can span.
pub const MAX_SPRINT_DAYS: u32 = 366;

/// Builds the burndown series.
///
/// # Errors
/// - `sprint_days` is zero, above `MAX_SPRINT_DAYS`, or runs past the
///   last representable date.
pub fn burndown(
    tasks: &[Task],
    sprint_start: NaiveDate,
    sprint_days: u32,
    today: NaiveDate,
) -> Result<Vec<BurndownPoint>, ValidationError> {
    if sprint_days == 0
        || sprint_days > MAX_SPRINT_DAYS
        || sprint_start
            .checked_add_days(Days::new(u64::from(sprint_days - 1)))
            .is_none()
    {
        return Err(ValidationError::InvalidSprintLength(sprint_days));
    }

    let total: u64 = tasks.iter().map(|task| u64::from(task.story_points)).sum();
    let completions: Vec<(NaiveDate, u64)> = tasks
        .iter()
        .filter(|task| task.is_done())
        .filter_map(|task| {
            task.completed_at
                .map(|at| (at.date_naive(), u64::from(task.story_points)))
        })
        .collect();

    let last_day = sprint_days - 1;
    let points = (0..sprint_days)
        .zip(successors(Some(sprint_start), |date| date.succ_opt()))
        .map(|(day, date)| {
            let ideal = if last_day == 0 {
                0.0
            } else {
                total as f64 * f64::from(last_day - day) / f64::from(last_day)
            };

            let actual = (date <= today).then(|| {
                let burned: u64 = completions
                    .iter()
                    .filter(|(completed_on, _)| *completed_on <= date)
                    .map(|(_, points)| points)
                    .sum();
                total.saturating_sub(burned)
            });

            BurndownPoint {
                day,
                date,
                ideal,
                actual,
            }
        })
        .collect();
    Ok(points)
}
