use std::collections::BTreeSet;

use chrono::{NaiveDate, TimeZone};

use crate::storage::journal::CompletionEvent;
use crate::utils::percentage::{Percentage, ratio_percentage};

use super::entities::{Task, TaskId};

/// How regularly a routine task got done over a date range.
#[derive(Debug)]
pub struct RoutineConsistency {
    pub task_id: TaskId,
    pub title: String,
    /// Distinct days with at least one completion.
    pub days_completed: usize,
    pub consistency: Percentage,
}

/// Returns per-routine statistics for the half-open date range `[start, end)`,
/// most consistent first. Completion timestamps are bucketed into days in the
/// given timezone.
pub fn routine_consistency<Tz: TimeZone>(
    routines: &[Task],
    completions: &[CompletionEvent],
    start: NaiveDate,
    end: NaiveDate,
    tz: &Tz,
) -> Vec<RoutineConsistency> {
    let total_days = (end - start).num_days().max(0) as usize;

    let mut stats = routines
        .iter()
        .map(|task| {
            let days = completions
                .iter()
                .filter(|event| event.task_id == task.id)
                .map(|event| event.completed_at.with_timezone(tz).date_naive())
                .filter(|day| *day >= start && *day < end)
                .collect::<BTreeSet<NaiveDate>>();
            RoutineConsistency {
                task_id: task.id,
                title: task.title.clone(),
                days_completed: days.len(),
                consistency: ratio_percentage(days.len(), total_days),
            }
        })
        .collect::<Vec<_>>();
    stats.sort_by(|a, b| b.days_completed.cmp(&a.days_completed));
    stats
}
