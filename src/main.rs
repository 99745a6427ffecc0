//! # FXT - FX Design Tracker
//!
//! A terminal dashboard for design-team task tracking: structured task
//! records, a kanban board grouped by status and week, and live
//! synchronization against a shared backend.
//!
//! ## Key Features
//!
//! - **Kanban Dashboard**: Five status columns with counts, colors, search
//!   and designer/PM/week filters, plus optional week grouping inside
//!   columns
//! - **Instant Card Moves**: Ctrl+←/→ moves a card optimistically and
//!   reverts it if the backend rejects the write
//! - **Detail Editing**: Status, description, designer, PM and demo date
//!   editable in place; saves only land after the backend confirms
//! - **Live Updates**: A change feed keeps every connected client's board
//!   current without reloading
//! - **Two Backends**: A local JSON task file out of the box, or a hosted
//!   store with magic-link sign-in
//!
//! ## Quick Start
//!
//! ```bash
//! # Open the dashboard against the local task file
//! fxt ui
//!
//! # Submit a new task
//! fxt submit
//!
//! # Sign in to a hosted backend (configured in config.toml)
//! fxt login --email you@company.com
//! ```
//!
//! Configuration lives in the user config directory (`config.toml`), task
//! data for the local backend in the user data directory. Point the tracker
//! at a hosted backend with:
//!
//! ```toml
//! backend = "http"
//! url = "https://tracker.example.dev"
//! api_key = "..."
//! ```

use std::fs;
use std::sync::Mutex;

use clap::Parser;
use tracing_subscriber::EnvFilter;

pub mod auth;
pub mod board;
pub mod cli;
pub mod cmd;
pub mod config;
pub mod editor;
pub mod error;
pub mod fields;
pub mod form;
pub mod remote;
pub mod store;
pub mod sync;
pub mod task;
pub mod view;
pub mod tui {
    pub mod app;
    pub mod colors;
    pub mod form;
    pub mod input;
    pub mod run;
}

use cli::Cli;
use cmd::Commands;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.command)?;

    let config = config::Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Ui => cmd::cmd_ui(&config).await?,
        Commands::Submit => cmd::cmd_submit(&config).await?,
        Commands::Login { email } => cmd::cmd_login(&config, email).await?,
        Commands::Logout => cmd::cmd_logout()?,
        Commands::Completions { shell } => cmd::cmd_completions(shell),
    }
    Ok(())
}

/// Route logs away from stdout while a TUI owns the terminal.
fn init_tracing(command: &Commands) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_env("FXT_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    match command {
        Commands::Ui | Commands::Submit => {
            fs::create_dir_all(config::data_dir())?;
            let file = fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(config::log_file())?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}
