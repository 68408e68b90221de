//! Console front end for AuraSight.
//!
//! The binary in `main.rs` is the composition root; this library holds the
//! argument parser, settings loading and the console presentation layer so
//! they can be unit tested.

#![deny(unused_crate_dependencies)]

// Used by the binary only.
use dotenvy as _;
use tracing_subscriber as _;

pub mod commands;
pub mod config;
pub mod console;
pub mod parser;

pub use commands::Commands;
pub use config::{SettingsOverrides, load_settings};
pub use console::run_console;
pub use parser::Cli;
