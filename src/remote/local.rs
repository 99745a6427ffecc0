//! File-backed task backend.
//!
//! Stores the whole collection as one JSON file, written atomically via a
//! temp file and rename. Change events for every successful mutation go out
//! on an in-process broadcast channel, so a board running in the same
//! process sees its own writes the way it would see a hosted store's feed.

use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use chrono::Utc;
use tokio::sync::{broadcast, mpsc};
use tracing::warn;
use uuid::Uuid;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::remote::{ChangeEvent, ChangeFeed, TaskBackend};
use crate::task::{NewTask, Task, TaskPatch};

const FEED_CAPACITY: usize = 64;

/// JSON-file-backed implementation of [`TaskBackend`].
pub struct LocalBackend {
    path: PathBuf,
    tasks: Mutex<Vec<Task>>,
    events: broadcast::Sender<ChangeEvent>,
}

impl LocalBackend {
    /// Open the store at `path`, creating an empty collection if the file
    /// does not exist. A file that fails to parse is treated as empty rather
    /// than refusing to start; the broken file is only overwritten on the
    /// next successful mutation.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let tasks = match fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(tasks) => tasks,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "task file unreadable, starting empty");
                    Vec::new()
                }
            },
            Err(_) => Vec::new(),
        };
        let (events, _) = broadcast::channel(FEED_CAPACITY);
        LocalBackend {
            path,
            tasks: Mutex::new(tasks),
            events,
        }
    }

    /// Write the collection atomically: temp file in the same directory,
    /// flush, then rename over the target.
    fn save(&self, tasks: &[Task]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let tmp = self.path.with_extension("json.tmp");
        let mut f = File::create(&tmp)?;
        let data = serde_json::to_string_pretty(tasks)?;
        f.write_all(data.as_bytes())?;
        f.flush()?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn emit(&self, event: ChangeEvent) {
        // No receivers is fine; nobody has subscribed yet.
        let _ = self.events.send(event);
    }
}

#[async_trait]
impl TaskBackend for LocalBackend {
    async fn fetch_all(&self) -> Result<Vec<Task>> {
        let mut tasks = self.tasks.lock().unwrap().clone();
        tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(tasks)
    }

    async fn insert(&self, task: NewTask) -> Result<Task> {
        let now = Utc::now();
        let stored = Task {
            id: Uuid::new_v4().to_string(),
            week_label: task.week_label,
            week_start_date: task.week_start_date,
            fsd_presented: task.fsd_presented,
            status: task.status,
            design_start_date: task.design_start_date,
            design_end_date: task.design_end_date,
            apl: task.apl,
            feature_name: task.feature_name,
            pm: task.pm,
            designer: task.designer,
            task_description: task.task_description,
            demo_date: task.demo_date,
            created_at: now,
            updated_at: now,
        };
        {
            let mut tasks = self.tasks.lock().unwrap();
            tasks.push(stored.clone());
            self.save(&tasks)?;
        }
        self.emit(ChangeEvent::Inserted(stored.clone()));
        Ok(stored)
    }

    async fn update(&self, id: &str, patch: TaskPatch) -> Result<Task> {
        let updated = {
            let mut tasks = self.tasks.lock().unwrap();
            let task = tasks
                .iter_mut()
                .find(|t| t.id == id)
                .ok_or_else(|| Error::NotFound(id.to_string()))?;
            patch.apply_to(task);
            task.updated_at = Utc::now();
            let updated = task.clone();
            self.save(&tasks)?;
            updated
        };
        self.emit(ChangeEvent::Updated(updated.clone()));
        Ok(updated)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        {
            let mut tasks = self.tasks.lock().unwrap();
            let before = tasks.len();
            tasks.retain(|t| t.id != id);
            if tasks.len() == before {
                return Err(Error::NotFound(id.to_string()));
            }
            self.save(&tasks)?;
        }
        self.emit(ChangeEvent::Deleted(id.to_string()));
        Ok(())
    }

    async fn subscribe(&self) -> Result<ChangeFeed> {
        let mut events = self.events.subscribe();
        let (tx, rx) = mpsc::channel(FEED_CAPACITY);
        let producer = tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        if tx.send(event).await.is_err() {
                            break;
                        }
                    }
                    // A lagged receiver just skips what it missed; the feed
                    // makes no replay guarantee.
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "change feed lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
        Ok(ChangeFeed::new(rx, producer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{Status, WeekLabel};

    fn draft(feature: &str) -> NewTask {
        NewTask {
            week_label: WeekLabel::Week1,
            week_start_date: None,
            fsd_presented: None,
            status: Status::YetToStart,
            design_start_date: None,
            design_end_date: None,
            apl: None,
            feature_name: feature.to_string(),
            pm: None,
            designer: None,
            task_description: None,
            demo_date: None,
        }
    }

    #[tokio::test]
    async fn test_open_missing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::open(dir.path().join("tasks.json"));
        assert!(backend.fetch_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_insert_assigns_identity_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.json");
        let backend = LocalBackend::open(&path);

        let stored = backend.insert(draft("Quote panel")).await.unwrap();
        assert!(!stored.id.is_empty());
        assert_eq!(stored.created_at, stored.updated_at);

        // A fresh backend over the same file sees the record.
        let reopened = LocalBackend::open(&path);
        let tasks = reopened.fetch_all().await.unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id, stored.id);
    }

    #[tokio::test]
    async fn test_update_unknown_id_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::open(dir.path().join("tasks.json"));
        let err = backend
            .update("ghost", TaskPatch::status_only(Status::Completed))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_applies_patch_and_touches_updated_at() {
        let dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::open(dir.path().join("tasks.json"));
        let stored = backend.insert(draft("Quote panel")).await.unwrap();

        let patch = TaskPatch {
            status: Some(Status::InProgress),
            designer: Some(Some("Sam".to_string())),
            ..TaskPatch::default()
        };
        let updated = backend.update(&stored.id, patch).await.unwrap();
        assert_eq!(updated.status, Status::InProgress);
        assert_eq!(updated.designer.as_deref(), Some("Sam"));
        assert!(updated.updated_at >= stored.updated_at);
        assert_eq!(updated.created_at, stored.created_at);
    }

    #[tokio::test]
    async fn test_delete_removes_record() {
        let dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::open(dir.path().join("tasks.json"));
        let stored = backend.insert(draft("Quote panel")).await.unwrap();

        backend.delete(&stored.id).await.unwrap();
        assert!(backend.fetch_all().await.unwrap().is_empty());
        assert!(matches!(
            backend.delete(&stored.id).await.unwrap_err(),
            Error::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_fetch_all_orders_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::open(dir.path().join("tasks.json"));
        let first = backend.insert(draft("first")).await.unwrap();
        let second = backend.insert(draft("second")).await.unwrap();

        let tasks = backend.fetch_all().await.unwrap();
        // Newest first; ties broken by insertion order is not guaranteed,
        // so only assert when timestamps differ.
        if first.created_at != second.created_at {
            assert_eq!(tasks[0].id, second.id);
        }
        assert_eq!(tasks.len(), 2);
    }

    #[tokio::test]
    async fn test_mutations_reach_subscribers() {
        let dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::open(dir.path().join("tasks.json"));
        let mut feed = backend.subscribe().await.unwrap();

        let stored = backend.insert(draft("Quote panel")).await.unwrap();
        backend
            .update(&stored.id, TaskPatch::status_only(Status::OnHold))
            .await
            .unwrap();
        backend.delete(&stored.id).await.unwrap();

        match feed.next().await.unwrap() {
            ChangeEvent::Inserted(t) => assert_eq!(t.id, stored.id),
            other => panic!("expected insert, got {other:?}"),
        }
        match feed.next().await.unwrap() {
            ChangeEvent::Updated(t) => assert_eq!(t.status, Status::OnHold),
            other => panic!("expected update, got {other:?}"),
        }
        match feed.next().await.unwrap() {
            ChangeEvent::Deleted(id) => assert_eq!(id, stored.id),
            other => panic!("expected delete, got {other:?}"),
        }
        feed.unsubscribe();
    }

    #[tokio::test]
    async fn test_corrupt_file_starts_empty_without_clobbering() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.json");
        fs::write(&path, "{ not json").unwrap();

        let backend = LocalBackend::open(&path);
        assert!(backend.fetch_all().await.unwrap().is_empty());
        // Nothing written yet, the broken file is still on disk.
        assert_eq!(fs::read_to_string(&path).unwrap(), "{ not json");
    }
}
