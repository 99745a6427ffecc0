//! Detail editor: view and edit one task in isolation.
//!
//! Editable fields (status, description, designer, PM, demo date) are staged
//! as local copies on open. Saving is pessimistic: the remote update goes
//! first, and only a confirmed write touches the store and closes the
//! session. A failed write leaves the staged values and the store exactly as
//! they were. Blank staged text clears the stored field; the status selector
//! always carries a value, so status can never be cleared.

use chrono::NaiveDate;

use crate::error::Result;
use crate::fields::Status;
use crate::remote::TaskBackend;
use crate::store::TaskStore;
use crate::task::{Task, TaskPatch};

/// One open edit session.
#[derive(Debug, Clone)]
pub struct DetailEditor {
    /// The record as it looked when the session opened. Read-only fields are
    /// displayed from here.
    pub task: Task,
    pub status: Status,
    pub description: String,
    pub designer: String,
    pub pm: String,
    /// Staged as text so partial input survives; parsed on save.
    pub demo_date: String,
}

impl DetailEditor {
    /// Stage local copies of the editable fields from the current task.
    pub fn open(task: Task) -> Self {
        DetailEditor {
            status: task.status,
            description: task.task_description.clone().unwrap_or_default(),
            designer: task.designer.clone().unwrap_or_default(),
            pm: task.pm.clone().unwrap_or_default(),
            demo_date: task
                .demo_date
                .map(|d| d.to_string())
                .unwrap_or_default(),
            task,
        }
    }

    /// Build the partial update from the staged values.
    ///
    /// Fails with a field message when the demo date text is neither blank
    /// nor a valid `YYYY-MM-DD` date; nothing is sent in that case.
    pub fn staged_patch(&self) -> std::result::Result<TaskPatch, String> {
        let demo_date = match self.demo_date.trim() {
            "" => None,
            raw => Some(
                NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                    .map_err(|_| format!("Demo date '{raw}' is not a valid date (YYYY-MM-DD)"))?,
            ),
        };
        Ok(TaskPatch {
            status: Some(self.status),
            task_description: Some(blank_to_none(&self.description)),
            designer: Some(blank_to_none(&self.designer)),
            pm: Some(blank_to_none(&self.pm)),
            demo_date: Some(demo_date),
        })
    }

    /// The task as it will look once the staged patch is confirmed.
    fn merged(&self, patch: &TaskPatch) -> Task {
        let mut merged = self.task.clone();
        patch.apply_to(&mut merged);
        merged
    }

    /// Pessimistic save: remote first, store only after confirmation.
    ///
    /// Returns the merged task on success so the caller can close the
    /// session around it. On failure the store is untouched and the session
    /// stays open with the staged values intact.
    pub async fn save(&self, store: &TaskStore, backend: &dyn TaskBackend) -> Result<Task> {
        let patch = self
            .staged_patch()
            .map_err(crate::error::Error::Invalid)?;
        backend.update(&self.task.id, patch.clone()).await?;
        let merged = self.merged(&patch);
        store.update(merged.clone());
        Ok(merged)
    }

    /// Delete the task. Remote first; the store entry is only removed after
    /// the backend confirms. Callers ask the user for confirmation before
    /// getting here.
    pub async fn delete(&self, store: &TaskStore, backend: &dyn TaskBackend) -> Result<()> {
        backend.delete(&self.task.id).await?;
        store.remove(&self.task.id);
        Ok(())
    }
}

fn blank_to_none(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::WeekLabel;
    use crate::remote::testing::StubBackend;
    use chrono::{TimeZone, Utc};
    use std::sync::atomic::Ordering;

    fn sample() -> Task {
        Task {
            id: "t-1".to_string(),
            week_label: WeekLabel::Week2,
            week_start_date: None,
            fsd_presented: None,
            status: Status::InProgress,
            design_start_date: None,
            design_end_date: None,
            apl: Some("APL-11".to_string()),
            feature_name: "Quote panel".to_string(),
            pm: Some("Dana".to_string()),
            designer: Some("Sam".to_string()),
            task_description: Some("first pass".to_string()),
            demo_date: None,
            created_at: Utc.with_ymd_and_hms(2025, 6, 2, 9, 0, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2025, 6, 2, 9, 0, 0).unwrap(),
        }
    }

    fn store_with(task: Task) -> TaskStore {
        let store = TaskStore::new();
        store.set_all(vec![task]);
        store
    }

    #[test]
    fn test_open_stages_editable_fields() {
        let editor = DetailEditor::open(sample());
        assert_eq!(editor.status, Status::InProgress);
        assert_eq!(editor.description, "first pass");
        assert_eq!(editor.designer, "Sam");
        assert_eq!(editor.pm, "Dana");
        assert_eq!(editor.demo_date, "");
    }

    #[test]
    fn test_blank_staged_fields_clear() {
        let mut editor = DetailEditor::open(sample());
        editor.description.clear();
        editor.designer = "  ".to_string();

        let patch = editor.staged_patch().unwrap();
        assert_eq!(patch.task_description, Some(None));
        assert_eq!(patch.designer, Some(None));
        assert_eq!(patch.pm, Some(Some("Dana".to_string())));
        // Status always carries the selected value.
        assert_eq!(patch.status, Some(Status::InProgress));
    }

    #[test]
    fn test_invalid_demo_date_blocks_the_patch() {
        let mut editor = DetailEditor::open(sample());
        editor.demo_date = "next tuesday".to_string();
        assert!(editor.staged_patch().is_err());

        editor.demo_date = "2025-07-14".to_string();
        let patch = editor.staged_patch().unwrap();
        assert_eq!(
            patch.demo_date,
            Some(Some(NaiveDate::from_ymd_opt(2025, 7, 14).unwrap()))
        );
    }

    #[tokio::test]
    async fn test_save_failure_leaves_store_unchanged() {
        let task = sample();
        let store = store_with(task.clone());
        let backend = StubBackend::new(vec![task.clone()]);
        backend.fail_updates.store(true, Ordering::SeqCst);

        let mut editor = DetailEditor::open(task.clone());
        editor.description = "reworked".to_string();

        assert!(editor.save(&store, &backend).await.is_err());
        // Byte-for-byte unchanged from before the save attempt.
        assert_eq!(store.get("t-1").unwrap(), task);
        // Staged values survive for the still-open session.
        assert_eq!(editor.description, "reworked");
    }

    #[tokio::test]
    async fn test_save_success_merges_into_store() {
        let task = sample();
        let store = store_with(task.clone());
        let backend = StubBackend::new(vec![task]);

        let mut editor = DetailEditor::open(store.get("t-1").unwrap());
        editor.status = Status::OnHold;
        editor.description.clear();
        editor.demo_date = "2025-08-01".to_string();

        let merged = editor.save(&store, &backend).await.unwrap();
        assert_eq!(merged.status, Status::OnHold);
        assert_eq!(merged.task_description, None);
        assert_eq!(
            merged.demo_date,
            Some(NaiveDate::from_ymd_opt(2025, 8, 1).unwrap())
        );
        assert_eq!(store.get("t-1").unwrap(), merged);
    }

    #[tokio::test]
    async fn test_delete_failure_keeps_record() {
        let task = sample();
        let store = store_with(task.clone());
        let backend = StubBackend::new(vec![task.clone()]);
        backend.fail_deletes.store(true, Ordering::SeqCst);

        let editor = DetailEditor::open(task.clone());
        assert!(editor.delete(&store, &backend).await.is_err());
        assert_eq!(store.get("t-1").unwrap(), task);
    }

    #[tokio::test]
    async fn test_delete_success_removes_from_store() {
        let task = sample();
        let store = store_with(task.clone());
        let backend = StubBackend::new(vec![task.clone()]);

        let editor = DetailEditor::open(task);
        editor.delete(&store, &backend).await.unwrap();
        assert!(store.get("t-1").is_none());
    }
}
