//! In-memory task store shared by every view.
//!
//! The store is a plain cache with identity-keyed upsert semantics: it holds
//! the collection as last told to it and applies mutations in call order. It
//! carries no business logic. Consumers subscribe to a revision counter and
//! re-derive their view state whenever it moves.

use std::sync::RwLock;

use tokio::sync::watch;

use crate::task::Task;

/// Process-wide cache of task records.
///
/// All operations are synchronous and atomic with respect to readers: a
/// snapshot never observes a partially applied mutation. Every mutation call
/// bumps the revision watch channel, including calls that matched no entry.
pub struct TaskStore {
    tasks: RwLock<Vec<Task>>,
    revision: watch::Sender<u64>,
}

impl TaskStore {
    pub fn new() -> Self {
        let (revision, _) = watch::channel(0);
        TaskStore {
            tasks: RwLock::new(Vec::new()),
            revision,
        }
    }

    /// Replace the entire collection. Used after a full fetch; the sequence
    /// is taken as-is.
    pub fn set_all(&self, tasks: Vec<Task>) {
        *self.tasks.write().unwrap() = tasks;
        self.bump();
    }

    /// Insert a task at the front of the order (most-recent-first).
    ///
    /// Callers must guarantee id uniqueness; ids are backend-assigned.
    pub fn add(&self, task: Task) {
        self.tasks.write().unwrap().insert(0, task);
        self.bump();
    }

    /// Replace the entry with the same id in place, preserving its position.
    /// A no-op if no entry has that id.
    pub fn update(&self, task: Task) {
        {
            let mut tasks = self.tasks.write().unwrap();
            if let Some(slot) = tasks.iter_mut().find(|t| t.id == task.id) {
                *slot = task;
            }
        }
        self.bump();
    }

    /// Delete the entry with the given id; a no-op if absent.
    pub fn remove(&self, id: &str) {
        self.tasks.write().unwrap().retain(|t| t.id != id);
        self.bump();
    }

    pub fn get(&self, id: &str) -> Option<Task> {
        self.tasks.read().unwrap().iter().find(|t| t.id == id).cloned()
    }

    /// A consistent copy of the current collection.
    pub fn snapshot(&self) -> Vec<Task> {
        self.tasks.read().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.tasks.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Subscribe to mutation notifications. The carried value is a revision
    /// counter; consumers re-derive on every observed change.
    pub fn watch(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    fn bump(&self) {
        self.revision.send_modify(|rev| *rev += 1);
    }
}

impl Default for TaskStore {
    fn default() -> Self {
        Self::new()
    }
}
