//! Passwordless authentication.
//!
//! The auth issuer is an external collaborator: it mails a one-time code to
//! an address and exchanges that code for a session token. This module holds
//! the trait contract, the HTTP implementation, and the on-disk session
//! cache that `ui` and `submit` check before talking to a hosted backend.

use std::fs;
use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Result;

/// A signed-in session, as cached on disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub email: String,
    pub access_token: String,
    pub signed_in_at: DateTime<Utc>,
}

/// Contract with the passwordless auth issuer.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Ask the issuer to email a one-time sign-in code to `email`.
    async fn request_magic_link(&self, email: &str) -> Result<()>;

    /// Exchange the emailed code for a session.
    async fn redeem_code(&self, email: &str, code: &str) -> Result<Session>;
}

/// HTTP implementation against an OTP endpoint.
pub struct HttpAuth {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpAuth {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        HttpAuth {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }
}

#[derive(Deserialize)]
struct VerifyResponse {
    access_token: String,
}

#[async_trait]
impl AuthProvider for HttpAuth {
    async fn request_magic_link(&self, email: &str) -> Result<()> {
        self.client
            .post(format!("{}/auth/v1/otp", self.base_url))
            .header("apikey", &self.api_key)
            .json(&serde_json::json!({ "email": email, "create_user": true }))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn redeem_code(&self, email: &str, code: &str) -> Result<Session> {
        let resp: VerifyResponse = self
            .client
            .post(format!("{}/auth/v1/verify", self.base_url))
            .header("apikey", &self.api_key)
            .json(&serde_json::json!({
                "type": "magiclink",
                "email": email,
                "token": code,
            }))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(Session {
            email: email.to_string(),
            access_token: resp.access_token,
            signed_in_at: Utc::now(),
        })
    }
}

/// Read the cached session, if any. An unreadable file counts as signed out.
pub fn load_session(path: &Path) -> Option<Session> {
    let raw = fs::read_to_string(path).ok()?;
    match serde_json::from_str(&raw) {
        Ok(session) => Some(session),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "session file unreadable");
            None
        }
    }
}

pub fn save_session(path: &Path, session: &Session) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, serde_json::to_string_pretty(session)?)?;
    Ok(())
}

/// Drop the cached session. Already signed out is fine.
pub fn clear_session(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session {
            email: "dana@example.dev".to_string(),
            access_token: "tok-1".to_string(),
            signed_in_at: Utc::now(),
        }
    }

    #[test]
    fn test_session_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        assert!(load_session(&path).is_none());
        save_session(&path, &session()).unwrap();
        let loaded = load_session(&path).unwrap();
        assert_eq!(loaded.email, "dana@example.dev");
        assert_eq!(loaded.access_token, "tok-1");
    }

    #[test]
    fn test_clear_session_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        save_session(&path, &session()).unwrap();

        clear_session(&path).unwrap();
        assert!(load_session(&path).is_none());
        clear_session(&path).unwrap();
    }

    #[test]
    fn test_corrupt_session_counts_as_signed_out() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "{ nope").unwrap();
        assert!(load_session(&path).is_none());
    }
}
