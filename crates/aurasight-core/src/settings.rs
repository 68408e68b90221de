//! Session settings and validation.
//!
//! Pure domain types with no infrastructure dependencies; the CLI decides
//! where settings come from (file, environment, flags).

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::operation::CommandBinding;

/// Default length of the Start/Followup voice recording.
pub const DEFAULT_RECORD_DURATION_SECS: f32 = 5.0;

/// Default ambient listening window of the command listener.
pub const DEFAULT_LISTEN_TIMEOUT_SECS: f32 = 5.0;

/// Default sleep between busy checks of the command listener.
pub const DEFAULT_BUSY_POLL_INTERVAL_MS: u64 = 500;

/// Settings for one session and its command listener.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Fixed length of the question recording, in seconds.
    pub record_duration_secs: f32,

    /// How long the listener waits for a command utterance, in seconds.
    pub listen_timeout_secs: f32,

    /// Listener sleep while the session is busy, in milliseconds.
    pub busy_poll_interval_ms: u64,

    /// Whether the voice command listener runs at all.
    pub listener_enabled: bool,

    /// Replacement command vocabulary, evaluated in order.
    /// `None` keeps the built-in vocabulary.
    pub vocabulary: Option<Vec<CommandBinding>>,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            record_duration_secs: DEFAULT_RECORD_DURATION_SECS,
            listen_timeout_secs: DEFAULT_LISTEN_TIMEOUT_SECS,
            busy_poll_interval_ms: DEFAULT_BUSY_POLL_INTERVAL_MS,
            listener_enabled: true,
            vocabulary: None,
        }
    }
}

impl SessionSettings {
    /// Length of the question recording.
    ///
    /// A negative, NaN or overflowing value (one that never passed
    /// [`validate_settings`]) falls back to the default instead of panicking.
    pub fn record_duration(&self) -> Duration {
        secs_or_default(
            "record_duration_secs",
            self.record_duration_secs,
            DEFAULT_RECORD_DURATION_SECS,
        )
    }

    /// Listening window of the command listener. Same fallback as
    /// [`Self::record_duration`].
    pub fn listen_timeout(&self) -> Duration {
        secs_or_default(
            "listen_timeout_secs",
            self.listen_timeout_secs,
            DEFAULT_LISTEN_TIMEOUT_SECS,
        )
    }

    pub const fn busy_poll_interval(&self) -> Duration {
        Duration::from_millis(self.busy_poll_interval_ms)
    }

    /// Lower-case and trim every vocabulary phrase.
    ///
    /// Matching runs against lower-cased transcripts, so a phrase with
    /// capitals would never match.
    pub fn normalize(&mut self) {
        if let Some(vocabulary) = self.vocabulary.as_mut() {
            for binding in vocabulary.iter_mut() {
                let normalized = binding.phrase.trim().to_lowercase();
                if normalized != binding.phrase {
                    tracing::debug!(from = %binding.phrase, to = %normalized, "Normalized vocabulary phrase");
                    binding.phrase = normalized;
                }
            }
        }
    }
}

fn secs_or_default(field: &'static str, secs: f32, default: f32) -> Duration {
    Duration::try_from_secs_f32(secs).unwrap_or_else(|e| {
        tracing::warn!(field, value = secs, error = %e, "Unusable duration, using default");
        Duration::from_secs_f32(default)
    })
}

/// Settings validation error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SettingsError {
    #[error("Record duration must be between 0.5 and 60 seconds, got {0}")]
    InvalidRecordDuration(f32),

    #[error("Listen timeout must be between 0.5 and 60 seconds, got {0}")]
    InvalidListenTimeout(f32),

    #[error("Busy poll interval must be between 10 and 10,000 ms, got {0}")]
    InvalidPollInterval(u64),

    #[error("Command vocabulary cannot be empty")]
    EmptyVocabulary,

    #[error("Command phrase for '{0}' cannot be empty")]
    EmptyPhrase(String),
}

/// Validate settings values.
pub fn validate_settings(settings: &SessionSettings) -> Result<(), SettingsError> {
    if !(0.5..=60.0).contains(&settings.record_duration_secs) {
        return Err(SettingsError::InvalidRecordDuration(
            settings.record_duration_secs,
        ));
    }

    if !(0.5..=60.0).contains(&settings.listen_timeout_secs) {
        return Err(SettingsError::InvalidListenTimeout(
            settings.listen_timeout_secs,
        ));
    }

    if !(10..=10_000).contains(&settings.busy_poll_interval_ms) {
        return Err(SettingsError::InvalidPollInterval(
            settings.busy_poll_interval_ms,
        ));
    }

    if let Some(vocabulary) = &settings.vocabulary {
        if vocabulary.is_empty() {
            return Err(SettingsError::EmptyVocabulary);
        }
        if let Some(binding) = vocabulary.iter().find(|b| b.phrase.trim().is_empty()) {
            return Err(SettingsError::EmptyPhrase(binding.operation.to_string()));
        }
    }

    Ok(())
}
