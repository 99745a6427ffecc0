//! Task record types.
//!
//! This module defines the `Task` record persisted by the backend, the
//! `NewTask` payload produced by the submission form, and the `TaskPatch`
//! partial update sent by the board and the detail editor.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::fields::{Status, WeekLabel};

/// A single design-tracking record.
///
/// `id`, `created_at` and `updated_at` are assigned by the backend and never
/// set by the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub week_label: WeekLabel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub week_start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fsd_presented: Option<NaiveDate>,
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub design_start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub design_end_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apl: Option<String>,
    pub feature_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pm: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub designer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub demo_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for creating a task. The backend assigns id and timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTask {
    pub week_label: WeekLabel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub week_start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fsd_presented: Option<NaiveDate>,
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub design_start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub design_end_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apl: Option<String>,
    pub feature_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pm: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub designer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub demo_date: Option<NaiveDate>,
}

/// Partial update for a task.
///
/// Each field distinguishes three cases: omitted (leave the stored value
/// alone), `Some(None)` (clear the stored value, serialized as an explicit
/// null), and `Some(Some(v))` (replace it). Only the fields the board and
/// detail editor may change are present.
#[derive(Debug, Default, Clone, Serialize)]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_description: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub designer: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pm: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub demo_date: Option<Option<NaiveDate>>,
}

impl TaskPatch {
    /// A patch that only moves the task to a new status.
    pub fn status_only(status: Status) -> Self {
        TaskPatch {
            status: Some(status),
            ..TaskPatch::default()
        }
    }

    /// Apply this patch to a task in place. Does not touch `updated_at`;
    /// that is the backend's job.
    pub fn apply_to(&self, task: &mut Task) {
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(ref desc) = self.task_description {
            task.task_description = desc.clone();
        }
        if let Some(ref designer) = self.designer {
            task.designer = designer.clone();
        }
        if let Some(ref pm) = self.pm {
            task.pm = pm.clone();
        }
        if let Some(demo) = self.demo_date {
            task.demo_date = demo;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_task() -> Task {
        Task {
            id: "t-1".to_string(),
            week_label: WeekLabel::Week1,
            week_start_date: None,
            fsd_presented: None,
            status: Status::InProgress,
            design_start_date: None,
            design_end_date: None,
            apl: Some("APL-204".to_string()),
            feature_name: "Quote panel".to_string(),
            pm: Some("Dana".to_string()),
            designer: Some("Sam".to_string()),
            task_description: Some("first pass".to_string()),
            demo_date: None,
            created_at: Utc.with_ymd_and_hms(2025, 6, 2, 9, 0, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2025, 6, 2, 9, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_patch_omitted_fields_do_not_serialize() {
        let patch = TaskPatch::status_only(Status::Completed);
        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(json, serde_json::json!({ "status": "Completed" }));
    }

    #[test]
    fn test_patch_clear_serializes_null() {
        let patch = TaskPatch {
            designer: Some(None),
            ..TaskPatch::default()
        };
        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(json, serde_json::json!({ "designer": null }));
    }

    #[test]
    fn test_patch_apply_replaces_and_clears() {
        let mut task = sample_task();
        let patch = TaskPatch {
            status: Some(Status::OnHold),
            task_description: Some(None),
            designer: Some(Some("Noor".to_string())),
            ..TaskPatch::default()
        };
        patch.apply_to(&mut task);
        assert_eq!(task.status, Status::OnHold);
        assert_eq!(task.task_description, None);
        assert_eq!(task.designer.as_deref(), Some("Noor"));
        // Untouched fields keep their values.
        assert_eq!(task.pm.as_deref(), Some("Dana"));
    }

    #[test]
    fn test_task_round_trips_through_json() {
        let task = sample_task();
        let json = serde_json::to_string(&task).unwrap();
        let back: Task = serde_json::from_str(&json).unwrap();
        assert_eq!(back, task);
    }
}
