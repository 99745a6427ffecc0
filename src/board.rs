//! Board interaction controller.
//!
//! Models one drag gesture: `idle → dragging(task) → idle`. A valid drop
//! runs the optimistic protocol as two explicit phases: `drop_on` mutates
//! the store immediately and hands back the pre-drag snapshot, then
//! `confirm_move` settles the remote write and restores the snapshot if it
//! failed. No retry, and no generation check on in-flight confirmations;
//! a write that reported failure but actually landed is re-corrected by the
//! next change event.

use crate::error::Result;
use crate::fields::Status;
use crate::remote::TaskBackend;
use crate::store::TaskStore;
use crate::task::{Task, TaskPatch};

/// Current drag gesture, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragState {
    Idle,
    Dragging { task_id: String },
}

/// Where a card was dropped: a column, or another card (which stands in for
/// that card's column).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropTarget {
    Column(Status),
    Card(String),
}

/// A speculative move waiting for remote confirmation. Holds the exact
/// pre-drag record for the compensating revert.
#[derive(Debug, Clone)]
pub struct PendingMove {
    pub task_id: String,
    pub new_status: Status,
    previous: Task,
}

/// Drag gesture state machine over the shared store.
#[derive(Debug, Default)]
pub struct BoardController {
    drag: DragState,
}

impl Default for DragState {
    fn default() -> Self {
        DragState::Idle
    }
}

impl BoardController {
    pub fn new() -> Self {
        BoardController { drag: DragState::Idle }
    }

    pub fn drag_state(&self) -> &DragState {
        &self.drag
    }

    /// Record which task is being dragged. No store mutation yet.
    pub fn begin_drag(&mut self, task_id: impl Into<String>) {
        self.drag = DragState::Dragging {
            task_id: task_id.into(),
        };
    }

    pub fn cancel_drag(&mut self) {
        self.drag = DragState::Idle;
    }

    /// Finish the gesture. Returns the pending move when the drop produced a
    /// real status change; `None` makes the whole gesture a no-op (no valid
    /// target, unknown task, or the target equals the current status).
    ///
    /// On a valid change the store is mutated here, before any network
    /// traffic, so the board reflects the move without delay.
    pub fn drop_on(&mut self, store: &TaskStore, target: DropTarget) -> Option<PendingMove> {
        let task_id = match std::mem::replace(&mut self.drag, DragState::Idle) {
            DragState::Dragging { task_id } => task_id,
            DragState::Idle => return None,
        };
        let task = store.get(&task_id)?;
        let new_status = match target {
            DropTarget::Column(status) => status,
            DropTarget::Card(other_id) => store.get(&other_id)?.status,
        };
        if new_status == task.status {
            return None;
        }

        let previous = task.clone();
        let mut moved = task;
        moved.status = new_status;
        store.update(moved);

        Some(PendingMove {
            task_id,
            new_status,
            previous,
        })
    }
}

/// Settle a speculative move against the backend.
///
/// On failure the store entry is restored to its exact pre-drag value and
/// the error is returned for the caller to surface.
pub async fn confirm_move(
    store: &TaskStore,
    backend: &dyn TaskBackend,
    pending: PendingMove,
) -> Result<()> {
    match backend
        .update(&pending.task_id, TaskPatch::status_only(pending.new_status))
        .await
    {
        Ok(_) => Ok(()),
        Err(e) => {
            store.update(pending.previous);
            Err(e)
        }
    }
}
