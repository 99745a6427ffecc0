//! HTTP task backend.
//!
//! Client for a PostgREST-style hosted store: one task table addressed with
//! `id=eq.` filters, partial updates via PATCH, and a streaming
//! newline-delimited JSON change feed. Transport-level reconnection is
//! handled here and kept invisible to consumers; events missed during a gap
//! are gone (no replay).

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::remote::{ChangeEvent, ChangeFeed, TaskBackend};
use crate::task::{NewTask, Task, TaskPatch};

const TABLE: &str = "fx_design_tasks";
const FEED_CAPACITY: usize = 64;
const RECONNECT_MIN: Duration = Duration::from_secs(2);
const RECONNECT_MAX: Duration = Duration::from_secs(30);

/// `TaskBackend` over a hosted REST + change-stream API.
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    access_token: Option<String>,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        HttpBackend {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            access_token: None,
        }
    }

    /// Attach a user session token; requests authenticate as that user
    /// instead of the bare API key.
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{TABLE}", self.base_url)
    }

    fn stream_url(&self) -> String {
        format!("{}/realtime/v1/stream?table={TABLE}", self.base_url)
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let bearer = self.access_token.as_deref().unwrap_or(&self.api_key);
        req.header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {bearer}"))
    }
}

#[async_trait]
impl TaskBackend for HttpBackend {
    async fn fetch_all(&self) -> Result<Vec<Task>> {
        let req = self
            .client
            .get(self.table_url())
            .query(&[("select", "*"), ("order", "created_at.desc")]);
        let tasks = self
            .authorize(req)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(tasks)
    }

    async fn insert(&self, task: NewTask) -> Result<Task> {
        let req = self
            .client
            .post(self.table_url())
            .header("Prefer", "return=representation")
            .json(&task);
        let mut rows: Vec<Task> = self
            .authorize(req)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        rows.pop()
            .ok_or_else(|| Error::Backend("insert returned no record".to_string()))
    }

    async fn update(&self, id: &str, patch: TaskPatch) -> Result<Task> {
        let req = self
            .client
            .patch(self.table_url())
            .query(&[("id", format!("eq.{id}"))])
            .header("Prefer", "return=representation")
            .json(&patch);
        let mut rows: Vec<Task> = self
            .authorize(req)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        rows.pop().ok_or_else(|| Error::NotFound(id.to_string()))
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let req = self
            .client
            .delete(self.table_url())
            .query(&[("id", format!("eq.{id}"))]);
        self.authorize(req).send().await?.error_for_status()?;
        Ok(())
    }

    async fn subscribe(&self) -> Result<ChangeFeed> {
        let client = self.client.clone();
        let url = self.stream_url();
        let api_key = self.api_key.clone();
        let bearer = self
            .access_token
            .clone()
            .unwrap_or_else(|| self.api_key.clone());

        let (tx, rx) = mpsc::channel(FEED_CAPACITY);
        let producer = tokio::spawn(async move {
            let mut backoff = RECONNECT_MIN;
            loop {
                match open_stream(&client, &url, &api_key, &bearer, &tx).await {
                    Ok(()) => backoff = RECONNECT_MIN,
                    Err(Error::FeedClosed) => return,
                    Err(e) => debug!(error = %e, "change stream dropped, reconnecting"),
                }
                tokio::time::sleep(backoff).await;
                backoff = (backoff * 2).min(RECONNECT_MAX);
            }
        });
        Ok(ChangeFeed::new(rx, producer))
    }
}

/// Read one connection's worth of events, forwarding decoded changes.
/// Returns `Ok(())` on a clean end-of-stream, `Error::FeedClosed` when the
/// consumer has gone away, and any other error on transport trouble.
async fn open_stream(
    client: &reqwest::Client,
    url: &str,
    api_key: &str,
    bearer: &str,
    tx: &mpsc::Sender<ChangeEvent>,
) -> Result<()> {
    let resp = client
        .get(url)
        .header("apikey", api_key)
        .header("Authorization", format!("Bearer {bearer}"))
        .send()
        .await?
        .error_for_status()?;

    let mut stream = resp.bytes_stream();
    let mut buf: Vec<u8> = Vec::new();
    while let Some(chunk) = stream.next().await {
        buf.extend_from_slice(&chunk?);
        while let Some(newline) = buf.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = buf.drain(..=newline).collect();
            let line = &line[..line.len() - 1];
            if line.is_empty() {
                continue;
            }
            match decode_event(line) {
                Some(event) => {
                    if tx.send(event).await.is_err() {
                        return Err(Error::FeedClosed);
                    }
                }
                None => warn!("skipping undecodable change event"),
            }
        }
    }
    Ok(())
}

#[derive(Deserialize)]
struct WireEvent {
    #[serde(rename = "eventType")]
    event_type: String,
    #[serde(default)]
    record: Option<Task>,
    #[serde(default)]
    old_record: Option<WireId>,
}

#[derive(Deserialize)]
struct WireId {
    id: String,
}

fn decode_event(line: &[u8]) -> Option<ChangeEvent> {
    let wire: WireEvent = serde_json::from_slice(line).ok()?;
    match wire.event_type.as_str() {
        "INSERT" => wire.record.map(ChangeEvent::Inserted),
        "UPDATE" => wire.record.map(ChangeEvent::Updated),
        "DELETE" => wire
            .old_record
            .map(|old| ChangeEvent::Deleted(old.id))
            .or_else(|| wire.record.map(|r| ChangeEvent::Deleted(r.id))),
        other => {
            warn!(event_type = other, "unknown change event type");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::Status;

    #[test]
    fn test_decode_insert_event() {
        let line = br#"{"eventType":"INSERT","record":{"id":"t-1","week_label":"Week 1","status":"In progress","feature_name":"Quote panel","created_at":"2025-06-02T09:00:00Z","updated_at":"2025-06-02T09:00:00Z"}}"#;
        match decode_event(line) {
            Some(ChangeEvent::Inserted(task)) => {
                assert_eq!(task.id, "t-1");
                assert_eq!(task.status, Status::InProgress);
            }
            other => panic!("expected insert, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_delete_event_carries_only_id() {
        let line = br#"{"eventType":"DELETE","old_record":{"id":"t-9"}}"#;
        match decode_event(line) {
            Some(ChangeEvent::Deleted(id)) => assert_eq!(id, "t-9"),
            other => panic!("expected delete, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_rejects_garbage_and_unknown_types() {
        assert!(decode_event(b"not json").is_none());
        assert!(decode_event(br#"{"eventType":"TRUNCATE"}"#).is_none());
        // Insert without a record payload is undecodable, not a panic.
        assert!(decode_event(br#"{"eventType":"INSERT"}"#).is_none());
    }
}
