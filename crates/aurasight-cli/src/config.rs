//! Settings loading: JSON file, then environment and flag overrides, then
//! validation.

use std::path::Path;

use anyhow::Context;
use aurasight_core::{SessionSettings, validate_settings};
use clap::Args;

/// Per-invocation overrides for individual settings.
#[derive(Debug, Clone, Default, Args)]
pub struct SettingsOverrides {
    /// Length of the question recording, in seconds
    #[arg(long, env = "AURASIGHT_RECORD_SECS", global = true)]
    pub record_secs: Option<f32>,

    /// Ambient listening window of the command listener, in seconds
    #[arg(long, env = "AURASIGHT_LISTEN_TIMEOUT", global = true)]
    pub listen_timeout: Option<f32>,

    /// Listener sleep while the session is busy, in milliseconds
    #[arg(long, env = "AURASIGHT_POLL_MS", global = true)]
    pub poll_ms: Option<u64>,

    /// Do not start the voice command listener
    #[arg(long, global = true)]
    pub no_listener: bool,
}

impl SettingsOverrides {
    fn apply(&self, settings: &mut SessionSettings) {
        if let Some(secs) = self.record_secs {
            settings.record_duration_secs = secs;
        }
        if let Some(secs) = self.listen_timeout {
            settings.listen_timeout_secs = secs;
        }
        if let Some(ms) = self.poll_ms {
            settings.busy_poll_interval_ms = ms;
        }
        if self.no_listener {
            settings.listener_enabled = false;
        }
    }
}

/// Build the effective settings.
///
/// A missing `path` means built-in defaults; a path that cannot be read or
/// parsed is an error rather than a silent fallback.
pub fn load_settings(
    path: Option<&Path>,
    overrides: &SettingsOverrides,
) -> anyhow::Result<SessionSettings> {
    let mut settings = match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read settings file {}", path.display()))?;
            let settings: SessionSettings = serde_json::from_str(&raw)
                .with_context(|| format!("Invalid settings file {}", path.display()))?;
            tracing::debug!(path = %path.display(), "Loaded settings file");
            settings
        }
        None => SessionSettings::default(),
    };

    overrides.apply(&mut settings);
    settings.normalize();
    validate_settings(&settings).context("Invalid settings")?;

    Ok(settings)
}
