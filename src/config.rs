//! Layered configuration.
//!
//! Defaults, then a TOML file in the user config directory (or a path given
//! via `--config`), then `FXT_`-prefixed environment variables. Out of the
//! box the tracker runs against a local JSON task file; pointing it at a
//! hosted backend takes a `backend = "http"` stanza with a URL and API key.

use std::path::{Path, PathBuf};

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Which `TaskBackend` implementation to run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Local,
    Http,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub backend: BackendKind,
    /// Base URL of the hosted backend; required when `backend = "http"`.
    pub url: Option<String>,
    /// API key for the hosted backend.
    pub api_key: Option<String>,
    /// Task file for the local backend; defaults into the user data dir.
    pub data_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            backend: BackendKind::Local,
            url: None,
            api_key: None,
            data_file: None,
        }
    }
}

impl Config {
    /// Load configuration, optionally from an explicit file path.
    pub fn load(path: Option<&Path>) -> Result<Config> {
        let file = path
            .map(Path::to_path_buf)
            .unwrap_or_else(default_config_file);
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(file))
            .merge(Env::prefixed("FXT_"))
            .extract()
            .map_err(|e| Error::Config(e.to_string()))
    }

    /// Resolved task file path for the local backend.
    pub fn data_file(&self) -> PathBuf {
        self.data_file
            .clone()
            .unwrap_or_else(|| data_dir().join("tasks.json"))
    }

    /// Validate the pieces the HTTP backend needs.
    pub fn http_endpoint(&self) -> Result<(&str, &str)> {
        let url = self
            .url
            .as_deref()
            .ok_or_else(|| Error::Config("backend = \"http\" requires `url`".to_string()))?;
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| Error::Config("backend = \"http\" requires `api_key`".to_string()))?;
        Ok((url, api_key))
    }
}

/// User config directory for this tool.
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("fx-tracker")
}

/// User data directory for this tool.
pub fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("fx-tracker")
}

fn default_config_file() -> PathBuf {
    config_dir().join("config.toml")
}

/// Stored session location.
pub fn session_file() -> PathBuf {
    config_dir().join("session.json")
}

/// Log file used while a TUI owns the terminal.
pub fn log_file() -> PathBuf {
    data_dir().join("fxt.log")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_to_local_backend() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        let cfg = Config::load(Some(&missing)).unwrap();
        assert_eq!(cfg.backend, BackendKind::Local);
        assert!(cfg.url.is_none());
    }

    #[test]
    fn test_file_values_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "backend = \"http\"").unwrap();
        writeln!(f, "url = \"https://tracker.example.dev\"").unwrap();
        writeln!(f, "api_key = \"k-123\"").unwrap();

        let cfg = Config::load(Some(&path)).unwrap();
        assert_eq!(cfg.backend, BackendKind::Http);
        let (url, key) = cfg.http_endpoint().unwrap();
        assert_eq!(url, "https://tracker.example.dev");
        assert_eq!(key, "k-123");
    }

    #[test]
    fn test_http_endpoint_requires_url_and_key() {
        let cfg = Config {
            backend: BackendKind::Http,
            ..Config::default()
        };
        assert!(cfg.http_endpoint().is_err());
    }
}
