//! View-state derivation over the task collection.
//!
//! Pure functions only: filtering, grouping into board columns, week
//! sub-grouping, summary counts and filter-dropdown value extraction.
//! Everything here is recomputed whenever the store notifies a change.

use std::collections::BTreeSet;

use crate::fields::{Status, WeekLabel, BOARD_ORDER, CANONICAL_WEEKS};
use crate::task::Task;

/// Filter criteria for the board. All populated criteria are ANDed.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TaskFilter {
    /// Case-insensitive substring match against feature name or APL.
    pub search: String,
    /// Exact designer match; `None` means all designers.
    pub designer: Option<String>,
    /// Exact PM match; `None` means all PMs.
    pub pm: Option<String>,
    /// Exact week-label match; `None` means all weeks.
    pub week: Option<WeekLabel>,
}

impl TaskFilter {
    pub fn clear(&mut self) {
        *self = TaskFilter::default();
    }

    fn matches(&self, task: &Task) -> bool {
        let needle = self.search.trim().to_lowercase();
        if !needle.is_empty() {
            let in_feature = task.feature_name.to_lowercase().contains(&needle);
            let in_apl = task
                .apl
                .as_ref()
                .map(|apl| apl.to_lowercase().contains(&needle))
                .unwrap_or(false);
            if !in_feature && !in_apl {
                return false;
            }
        }
        if let Some(designer) = &self.designer {
            if task.designer.as_deref() != Some(designer.as_str()) {
                return false;
            }
        }
        if let Some(pm) = &self.pm {
            if task.pm.as_deref() != Some(pm.as_str()) {
                return false;
            }
        }
        if let Some(week) = &self.week {
            if &task.week_label != week {
                return false;
            }
        }
        true
    }
}

/// Keep the tasks matching every populated criterion.
pub fn apply_filter<'a>(tasks: &'a [Task], filter: &TaskFilter) -> Vec<&'a Task> {
    tasks.iter().filter(|t| filter.matches(t)).collect()
}

/// Partition tasks into the five board columns, in board order.
///
/// Every status yields a bucket even when empty. Within a bucket, tasks are
/// sorted by creation time, newest first.
pub fn group_by_status<'a>(tasks: &[&'a Task]) -> Vec<(Status, Vec<&'a Task>)> {
    BOARD_ORDER
        .iter()
        .map(|&status| {
            let mut bucket: Vec<&Task> =
                tasks.iter().copied().filter(|t| t.status == status).collect();
            bucket.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            (status, bucket)
        })
        .collect()
}

/// Partition one column's tasks by week label.
///
/// Canonical weeks that have tasks come first in canonical order, then any
/// remaining labels in first-seen order. Blank labels collapse into the
/// "Other" group, which takes its place among the non-canonical labels.
pub fn group_by_week<'a>(tasks: &[&'a Task]) -> Vec<(String, Vec<&'a Task>)> {
    let mut keys: Vec<String> = Vec::new();
    let mut buckets: Vec<Vec<&Task>> = Vec::new();
    for task in tasks {
        let key = task.week_label.group_key();
        match keys.iter().position(|k| k == key) {
            Some(i) => buckets[i].push(*task),
            None => {
                keys.push(key.to_string());
                buckets.push(vec![*task]);
            }
        }
    }

    let mut ordered: Vec<(String, Vec<&Task>)> = Vec::new();
    for week in &CANONICAL_WEEKS {
        if let Some(i) = keys.iter().position(|k| k == week.label()) {
            ordered.push((keys[i].clone(), std::mem::take(&mut buckets[i])));
        }
    }
    for (i, key) in keys.iter().enumerate() {
        if !buckets[i].is_empty() {
            ordered.push((key.clone(), std::mem::take(&mut buckets[i])));
        }
    }
    ordered
}

/// Summary counts shown above the board. Display only; nothing downstream
/// depends on these for correctness.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BoardStats {
    pub total: usize,
    pub completed: usize,
    pub in_progress: usize,
    pub on_hold: usize,
}

pub fn board_stats(tasks: &[&Task]) -> BoardStats {
    let mut stats = BoardStats {
        total: tasks.len(),
        ..BoardStats::default()
    };
    for task in tasks {
        match task.status {
            Status::Completed => stats.completed += 1,
            Status::InProgress => stats.in_progress += 1,
            Status::OnHold => stats.on_hold += 1,
            _ => {}
        }
    }
    stats
}

/// All non-blank designer names across the unfiltered collection, trimmed,
/// deduplicated and sorted.
pub fn distinct_designers(tasks: &[Task]) -> Vec<String> {
    distinct(tasks.iter().map(|t| t.designer.as_deref()))
}

/// All non-blank PM names across the unfiltered collection, trimmed,
/// deduplicated and sorted.
pub fn distinct_pms(tasks: &[Task]) -> Vec<String> {
    distinct(tasks.iter().map(|t| t.pm.as_deref()))
}

fn distinct<'a>(values: impl Iterator<Item = Option<&'a str>>) -> Vec<String> {
    let set: BTreeSet<String> = values
        .flatten()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect();
    set.into_iter().collect()
}
