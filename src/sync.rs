//! Synchronization between the task store and the backend.
//!
//! The startup sequence is fetch-then-subscribe: a full fetch seeds the
//! store, then a pump task applies live change events to it in arrival
//! order. Insert events `add`, update events `update`, delete events
//! `remove`; no deduplication, no reordering. The pump is torn down by
//! dropping (or shutting down) the returned handle.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::debug;

use crate::error::Result;
use crate::remote::{ChangeEvent, TaskBackend};
use crate::store::TaskStore;

/// Replace the store contents with a fresh fetch.
///
/// On failure the store keeps its previous contents; the caller decides how
/// to surface the error (the board shows a banner).
pub async fn refresh(store: &TaskStore, backend: &dyn TaskBackend) -> Result<()> {
    let tasks = backend.fetch_all().await?;
    store.set_all(tasks);
    Ok(())
}

/// Apply one change event to the store.
pub fn apply_change(store: &TaskStore, event: ChangeEvent) {
    match event {
        ChangeEvent::Inserted(task) => store.add(task),
        ChangeEvent::Updated(task) => store.update(task),
        ChangeEvent::Deleted(id) => store.remove(&id),
    }
}

/// Running live-sync session: the subscription plus the pump applying its
/// events. Dropping the handle stops the pump and closes the feed.
pub struct SyncHandle {
    pump: JoinHandle<()>,
}

impl SyncHandle {
    pub fn shutdown(self) {}
}

impl Drop for SyncHandle {
    fn drop(&mut self) {
        self.pump.abort();
    }
}

/// Seed the store from the backend and start applying live changes.
///
/// Fetch failures abort startup; a board with nothing to show wants the
/// error. Once running, feed interruptions are the backend's problem and
/// stay invisible here.
pub async fn start(store: Arc<TaskStore>, backend: Arc<dyn TaskBackend>) -> Result<SyncHandle> {
    refresh(&store, backend.as_ref()).await?;
    let mut feed = backend.subscribe().await?;
    let pump = tokio::spawn(async move {
        while let Some(event) = feed.next().await {
            apply_change(&store, event);
        }
        debug!("change feed ended");
    });
    Ok(SyncHandle { pump })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{Status, WeekLabel};
    use crate::remote::testing::StubBackend;
    use crate::task::Task;
    use chrono::{TimeZone, Utc};
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    fn task(id: &str, status: Status, hour: u32) -> Task {
        Task {
            id: id.to_string(),
            week_label: WeekLabel::Week1,
            week_start_date: None,
            fsd_presented: None,
            status,
            design_start_date: None,
            design_end_date: None,
            apl: None,
            feature_name: format!("feature {id}"),
            pm: None,
            designer: None,
            task_description: None,
            demo_date: None,
            created_at: Utc.with_ymd_and_hms(2025, 6, 1, hour, 0, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2025, 6, 1, hour, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_refresh_seeds_store_newest_first() {
        let backend = StubBackend::new(vec![
            task("old", Status::Completed, 9),
            task("new", Status::YetToStart, 11),
        ]);
        let store = TaskStore::new();

        refresh(&store, &backend).await.unwrap();
        let ids: Vec<String> = store.snapshot().into_iter().map(|t| t.id).collect();
        assert_eq!(ids, ["new", "old"]);
    }

    #[tokio::test]
    async fn test_refresh_failure_leaves_store_untouched() {
        let backend = StubBackend::new(vec![task("a", Status::OnHold, 9)]);
        let store = TaskStore::new();
        refresh(&store, &backend).await.unwrap();
        let before = store.snapshot();

        backend.fail_fetches.store(true, Ordering::SeqCst);
        assert!(refresh(&store, &backend).await.is_err());
        assert_eq!(store.snapshot(), before);
    }

    #[tokio::test]
    async fn test_apply_change_routes_events() {
        let store = TaskStore::new();
        store.set_all(vec![task("a", Status::YetToStart, 9)]);

        apply_change(&store, ChangeEvent::Inserted(task("b", Status::OnHold, 10)));
        assert_eq!(store.snapshot()[0].id, "b");

        apply_change(&store, ChangeEvent::Updated(task("a", Status::Completed, 9)));
        assert_eq!(store.get("a").unwrap().status, Status::Completed);

        apply_change(&store, ChangeEvent::Deleted("b".to_string()));
        assert!(store.get("b").is_none());
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_pump_applies_feed_events_in_order() {
        let backend = Arc::new(StubBackend::new(vec![task("a", Status::YetToStart, 9)]));
        let store = Arc::new(TaskStore::new());
        let backend_dyn: Arc<dyn TaskBackend> = backend.clone();
        let handle = start(store.clone(), backend_dyn).await.unwrap();
        assert_eq!(store.len(), 1);

        let mut rev = store.watch();
        backend.emit(ChangeEvent::Inserted(task("b", Status::InProgress, 10)));
        backend.emit(ChangeEvent::Updated(task("b", Status::Completed, 10)));
        // Notifications coalesce, so wait on the observable state rather
        // than counting wakeups.
        tokio::time::timeout(Duration::from_secs(2), async {
            while store.get("b").map(|b| b.status) != Some(Status::Completed) {
                rev.changed().await.unwrap();
            }
        })
        .await
        .expect("pump should apply events");
        handle.shutdown();
    }

    #[tokio::test]
    async fn test_dropped_handle_stops_applying_events() {
        let backend = Arc::new(StubBackend::new(Vec::new()));
        let store = Arc::new(TaskStore::new());
        let backend_dyn: Arc<dyn TaskBackend> = backend.clone();
        let handle = start(store.clone(), backend_dyn).await.unwrap();
        drop(handle);
        // Give the abort a moment to land.
        tokio::time::sleep(Duration::from_millis(20)).await;

        backend.emit(ChangeEvent::Inserted(task("late", Status::OnHold, 9)));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(store.get("late").is_none());
    }
}
