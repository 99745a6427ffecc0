//! Command implementations for the CLI interface.
//!
//! One handler per subcommand: the dashboard and submission TUIs, the
//! magic-link sign-in flow, and shell completions. Handlers wire the store,
//! backend and sync layer together and hand the result to the TUI layer.

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{CommandFactory, Subcommand};
use clap_complete::{generate, Shell};
use tokio::runtime::Handle;
use tracing::warn;

use crate::auth::{self, AuthProvider, HttpAuth};
use crate::cli::Cli;
use crate::config::{self, BackendKind, Config};
use crate::error::Error;
use crate::remote::{http::HttpBackend, local::LocalBackend, TaskBackend};
use crate::store::TaskStore;
use crate::sync;
use crate::tui::app::BoardApp;
use crate::tui::form::SubmitApp;
use crate::tui::run::{run_board_tui, run_submit_tui};

#[derive(Subcommand)]
pub enum Commands {
    /// Launch the kanban dashboard.
    Ui,

    /// Open the task submission form.
    Submit,

    /// Sign in with an emailed magic-link code.
    Login {
        /// Email address to sign in with; prompted for when omitted.
        #[arg(long)]
        email: Option<String>,
    },

    /// Sign out and discard the stored session.
    Logout,

    /// Generate shell completion scripts.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Build the configured backend. The HTTP backend requires a stored session;
/// without one the caller is told to sign in first.
fn build_backend(config: &Config) -> anyhow::Result<Arc<dyn TaskBackend>> {
    match config.backend {
        BackendKind::Local => Ok(Arc::new(LocalBackend::open(config.data_file()))),
        BackendKind::Http => {
            let (url, api_key) = config.http_endpoint()?;
            let session =
                auth::load_session(&config::session_file()).ok_or(Error::Unauthenticated)?;
            Ok(Arc::new(
                HttpBackend::new(url, api_key).with_access_token(session.access_token),
            ))
        }
    }
}

/// Launch the dashboard: seed the store, start live sync, run the board.
pub async fn cmd_ui(config: &Config) -> anyhow::Result<()> {
    let backend = build_backend(config)?;
    let store = Arc::new(TaskStore::new());

    // A failed initial load still opens the board; it renders empty columns
    // under an error banner and `r` retries.
    let (sync_handle, load_error) = match sync::start(store.clone(), backend.clone()).await {
        Ok(handle) => (Some(handle), None),
        Err(e) => {
            warn!(error = %e, "initial load failed");
            (None, Some(e.to_string()))
        }
    };

    let mut app = BoardApp::new(store, backend, Handle::current(), sync_handle, load_error);
    tokio::task::spawn_blocking(move || run_board_tui(&mut app)).await??;
    Ok(())
}

/// Open the submission form.
pub async fn cmd_submit(config: &Config) -> anyhow::Result<()> {
    let backend = build_backend(config)?;
    let mut app = SubmitApp::new(backend, Handle::current());
    tokio::task::spawn_blocking(move || run_submit_tui(&mut app)).await??;
    Ok(())
}

/// Magic-link sign-in: request the emailed code, redeem it, cache the
/// session.
pub async fn cmd_login(config: &Config, email: Option<String>) -> anyhow::Result<()> {
    if config.backend == BackendKind::Local {
        println!("The local backend needs no sign-in.");
        return Ok(());
    }
    let (url, api_key) = config.http_endpoint().context("login needs a hosted backend")?;

    let email = match email {
        Some(email) => email,
        None => prompt("Email address: ")?,
    };
    let email = email.trim().to_string();
    if email.is_empty() {
        bail!("an email address is required");
    }

    let issuer = HttpAuth::new(url, api_key);
    issuer.request_magic_link(&email).await?;
    println!("Check your email for the sign-in code.");

    let code = prompt("Code: ")?;
    let session = issuer.redeem_code(&email, code.trim()).await?;
    auth::save_session(&config::session_file(), &session)?;
    println!("Signed in as {}.", session.email);
    Ok(())
}

/// Discard the cached session.
pub fn cmd_logout() -> anyhow::Result<()> {
    auth::clear_session(&config::session_file())?;
    println!("Signed out.");
    Ok(())
}

/// Print completion script for the given shell.
pub fn cmd_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
}

fn prompt(label: &str) -> anyhow::Result<String> {
    print!("{label}");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line)
}
