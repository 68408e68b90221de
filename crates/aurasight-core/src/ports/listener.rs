//! Ambient speech recognition for voice commands.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::ListenError;

/// Listens for one short utterance and returns its text.
#[async_trait]
pub trait AmbientListener: Send + Sync {
    /// Wait up to `timeout` for speech to begin, then return the recognized
    /// text.
    ///
    /// Returns [`ListenError::Timeout`] when nobody spoke and
    /// [`ListenError::Unrecognized`] when speech could not be transcribed.
    async fn listen(&self, timeout: Duration) -> Result<String, ListenError>;
}
