//! Error types shared across the store, backends and sync layer.

use thiserror::Error;

/// Failures surfaced by backend and sync operations.
///
/// Nothing here is fatal to a session: callers convert every variant into a
/// recoverable UI state (banner, status message, revert, stay-open).
#[derive(Debug, Error)]
pub enum Error {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("task {0} not found")]
    NotFound(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("malformed record: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("change feed closed")]
    FeedClosed,

    #[error("not signed in; run `fxt login` first")]
    Unauthenticated,

    #[error("{0}")]
    Invalid(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Backend(String),
}

pub type Result<T> = std::result::Result<T, Error>;
