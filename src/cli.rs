use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;

/// Terminal client for the FX design-team task tracker.
/// Runs against a local task file by default; point --config at a TOML file
/// to use a hosted backend.
#[derive(Parser)]
#[command(name = "fxt", version, about = "Design-team task tracking dashboard")]
pub struct Cli {
    /// Path to the configuration file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}
