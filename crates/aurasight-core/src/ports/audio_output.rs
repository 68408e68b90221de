//! Audio output device abstraction.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::SpeechAudio;
use crate::error::PlaybackError;

/// One active audio rendering.
///
/// `wait_done` and `stop` may be called from different tasks at the same
/// time; `stop` must make any pending `wait_done` return.
#[async_trait]
pub trait PlaybackHandle: Send + Sync {
    /// Resolve once the audio has drained or the handle was stopped.
    async fn wait_done(&self);

    /// Force-terminate output. Idempotent.
    fn stop(&self);

    /// Whether audio is still being rendered.
    fn is_playing(&self) -> bool;
}

/// Device that can start rendering [`SpeechAudio`].
pub trait AudioOutput: Send + Sync {
    /// Begin playback immediately and return a handle to it.
    fn play(&self, audio: SpeechAudio) -> Result<Arc<dyn PlaybackHandle>, PlaybackError>;
}
