//! Subcommands.

use clap::Subcommand;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Commands {
    /// Start a session with an interactive console (default)
    Run,

    /// Print the active voice command vocabulary
    Vocabulary,

    /// Print the effective settings as JSON
    Config,
}
