//! Backend contract for the persistent task store.
//!
//! The tracker talks to its storage through the `TaskBackend` trait: full
//! fetch, insert, partial update, delete, and a live change feed. Two
//! implementations exist, a JSON-file backend for standalone use and an HTTP
//! client for a hosted store; callers never see past the trait.

pub mod http;
pub mod local;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::Result;
use crate::task::{NewTask, Task, TaskPatch};

/// A single change pushed by the backend's live feed.
#[derive(Debug, Clone)]
pub enum ChangeEvent {
    Inserted(Task),
    Updated(Task),
    /// Deletes carry only the id of the removed record.
    Deleted(String),
}

/// Storage contract for the task table.
#[async_trait]
pub trait TaskBackend: Send + Sync {
    /// Fetch the full collection, ordered by creation time descending.
    async fn fetch_all(&self) -> Result<Vec<Task>>;

    /// Create a task; the backend assigns id and timestamps and returns the
    /// stored record.
    async fn insert(&self, task: NewTask) -> Result<Task>;

    /// Apply a partial update to one task and return the stored result.
    async fn update(&self, id: &str, patch: TaskPatch) -> Result<Task>;

    /// Delete one task.
    async fn delete(&self, id: &str) -> Result<()>;

    /// Open the live change feed for the task table.
    async fn subscribe(&self) -> Result<ChangeFeed>;
}

/// Handle to an open change feed.
///
/// Owns the producer task pushing events into the channel. Dropping the
/// handle (or calling [`ChangeFeed::unsubscribe`]) aborts the producer, so a
/// consumer that goes away cannot leak the channel. Events missed while the
/// underlying transport reconnects are not replayed; consumers wanting full
/// consistency after a long gap re-run `fetch_all`.
pub struct ChangeFeed {
    rx: mpsc::Receiver<ChangeEvent>,
    producer: JoinHandle<()>,
}

impl ChangeFeed {
    pub(crate) fn new(rx: mpsc::Receiver<ChangeEvent>, producer: JoinHandle<()>) -> Self {
        ChangeFeed { rx, producer }
    }

    /// Next event in arrival order; `None` once the feed is closed for good.
    pub async fn next(&mut self) -> Option<ChangeEvent> {
        self.rx.recv().await
    }

    /// Tear the feed down explicitly.
    pub fn unsubscribe(self) {}
}

impl Drop for ChangeFeed {
    fn drop(&mut self) {
        self.producer.abort();
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory backend with switchable failure injection, for exercising
    //! the optimistic and pessimistic update protocols.

    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    use chrono::Utc;
    use tokio::sync::broadcast;

    use super::*;
    use crate::error::Error;

    pub struct StubBackend {
        tasks: Mutex<Vec<Task>>,
        events: broadcast::Sender<ChangeEvent>,
        pub fail_fetches: AtomicBool,
        pub fail_updates: AtomicBool,
        pub fail_deletes: AtomicBool,
    }

    impl StubBackend {
        pub fn new(tasks: Vec<Task>) -> Self {
            let (events, _) = broadcast::channel(64);
            StubBackend {
                tasks: Mutex::new(tasks),
                events,
                fail_fetches: AtomicBool::new(false),
                fail_updates: AtomicBool::new(false),
                fail_deletes: AtomicBool::new(false),
            }
        }

        pub fn emit(&self, event: ChangeEvent) {
            let _ = self.events.send(event);
        }

        pub fn stored(&self, id: &str) -> Option<Task> {
            self.tasks.lock().unwrap().iter().find(|t| t.id == id).cloned()
        }
    }

    #[async_trait]
    impl TaskBackend for StubBackend {
        async fn fetch_all(&self) -> Result<Vec<Task>> {
            if self.fail_fetches.load(Ordering::SeqCst) {
                return Err(Error::Backend("injected fetch failure".to_string()));
            }
            let mut tasks = self.tasks.lock().unwrap().clone();
            tasks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(tasks)
        }

        async fn insert(&self, task: NewTask) -> Result<Task> {
            let now = Utc::now();
            let stored = Task {
                id: uuid::Uuid::new_v4().to_string(),
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
            self.tasks.lock().unwrap().push(stored.clone());
            self.emit(ChangeEvent::Inserted(stored.clone()));
            Ok(stored)
        }

        async fn update(&self, id: &str, patch: TaskPatch) -> Result<Task> {
            if self.fail_updates.load(Ordering::SeqCst) {
                return Err(Error::Backend("injected update failure".to_string()));
            }
            let mut tasks = self.tasks.lock().unwrap();
            let task = tasks
                .iter_mut()
                .find(|t| t.id == id)
                .ok_or_else(|| Error::NotFound(id.to_string()))?;
            patch.apply_to(task);
            task.updated_at = Utc::now();
            let updated = task.clone();
            drop(tasks);
            self.emit(ChangeEvent::Updated(updated.clone()));
            Ok(updated)
        }

        async fn delete(&self, id: &str) -> Result<()> {
            if self.fail_deletes.load(Ordering::SeqCst) {
                return Err(Error::Backend("injected delete failure".to_string()));
            }
            let mut tasks = self.tasks.lock().unwrap();
            let before = tasks.len();
            tasks.retain(|t| t.id != id);
            if tasks.len() == before {
                return Err(Error::NotFound(id.to_string()));
            }
            drop(tasks);
            self.emit(ChangeEvent::Deleted(id.to_string()));
            Ok(())
        }

        async fn subscribe(&self) -> Result<ChangeFeed> {
            let mut events = self.events.subscribe();
            let (tx, rx) = mpsc::channel(64);
            let producer = tokio::spawn(async move {
                while let Ok(event) = events.recv().await {
                    if tx.send(event).await.is_err() {
                        break;
                    }
                }
            });
            Ok(ChangeFeed::new(rx, producer))
        }
    }
}
