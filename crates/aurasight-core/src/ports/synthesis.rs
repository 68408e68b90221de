//! Text-to-speech.

use async_trait::async_trait;

use crate::domain::SpeechAudio;
use crate::error::SynthesisError;

/// Turns text into playable audio.
#[async_trait]
pub trait SynthesisPort: Send + Sync {
    /// Synthesize `text`. Empty text is allowed and should produce
    /// (near-)silent audio rather than an error.
    async fn synthesize(&self, text: &str) -> Result<SpeechAudio, SynthesisError>;
}
