//! Root CLI structure with global options.

use std::path::PathBuf;

use clap::Parser;

use crate::commands::Commands;
use crate::config::SettingsOverrides;

/// Voice and vision assistant session controller.
///
/// Without a subcommand, `run` is assumed.
#[derive(Debug, Parser)]
#[command(name = "aurasight")]
#[command(about = "Ask questions about what the camera sees, by voice")]
#[command(version)]
pub struct Cli {
    /// JSON settings file
    #[arg(long, env = "AURASIGHT_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub overrides: SettingsOverrides,

    #[command(subcommand)]
    pub command: Option<Commands>,
}
