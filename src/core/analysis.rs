use chrono::{DateTime, Duration, Local, NaiveDate, Utc};

use crate::utils::time::day_bounds;

use super::task::{Task, TaskId};

/// Time range a report is computed for. Days follow the local calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    AllTime,
    Day(NaiveDate),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagUsage {
    pub tag: String,
    pub duration: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskUsage {
    pub id: TaskId,
    pub title: String,
    pub duration: Duration,
}

/// Aggregated view of the tracked time in one period. Produced on demand and
/// thrown away, the raw sessions stay the source of truth.
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub total: Duration,
    pub by_tag: Vec<TagUsage>,
    pub tasks: Vec<TaskUsage>,
}

/// Computes per-task and per-tag totals for the period. Tasks without time in
/// the period are dropped. A task tagged N ways contributes its whole time to
/// each of the N tag buckets, tags are categories, not a partition of the time,
/// so the per-tag column may sum to more than `total`.
///
/// Both breakdowns are ordered by descending duration; equal durations keep the
/// task list order.
pub fn analyze(tasks: &[Task], period: Period, as_of: DateTime<Utc>) -> AnalysisReport {
    let mut timed = Vec::new();
    for task in tasks {
        let duration = time_in_period(task, period, as_of);
        if duration > Duration::zero() {
            timed.push((task, duration));
        }
    }

    let total = timed
        .iter()
        .fold(Duration::zero(), |acc, (_, duration)| acc + *duration);

    let mut by_tag: Vec<TagUsage> = Vec::new();
    for (task, duration) in &timed {
        for tag in &task.tags {
            match by_tag.iter_mut().find(|usage| usage.tag == *tag) {
                Some(usage) => usage.duration += *duration,
                None => by_tag.push(TagUsage {
                    tag: tag.clone(),
                    duration: *duration,
                }),
            }
        }
    }
    by_tag.sort_by(|a, b| b.duration.cmp(&a.duration));

    let mut task_usages = timed
        .into_iter()
        .map(|(task, duration)| TaskUsage {
            id: task.id,
            title: task.title.clone(),
            duration,
        })
        .collect::<Vec<_>>();
    task_usages.sort_by(|a, b| b.duration.cmp(&a.duration));

    AnalysisReport {
        total,
        by_tag,
        tasks: task_usages,
    }
}

/// All-time total across every task, unaffected by how tasks are tagged.
pub fn total_elapsed(tasks: &[Task], as_of: DateTime<Utc>) -> Duration {
    tasks
        .iter()
        .fold(Duration::zero(), |acc, task| acc + task.elapsed(as_of))
}

/// Local calendar days on which any session started, newest first. The period
/// selector puts "today" and "all time" on top of this list itself.
pub fn available_days(tasks: &[Task]) -> Vec<NaiveDate> {
    let mut days = tasks
        .iter()
        .flat_map(|task| task.sessions.iter())
        .map(|session| session.start.with_timezone(&Local).date_naive())
        .collect::<Vec<_>>();
    days.sort();
    days.dedup();
    days.reverse();
    days
}

fn time_in_period(task: &Task, period: Period, as_of: DateTime<Utc>) -> Duration {
    match period {
        Period::AllTime => task.elapsed(as_of),
        Period::Day(day) => {
            let (from, to) = day_bounds(day);
            task.elapsed_within(from, to, as_of)
        }
    }
}
