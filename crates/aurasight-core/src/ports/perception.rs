//! Speech-to-text and visual question answering.

use async_trait::async_trait;

use crate::domain::{AudioClip, Image};
use crate::error::{InferenceError, TranscriptionError};

/// Transcription plus a multi-turn question-answering engine.
///
/// Implementations own the conversation history: `summarize` and `answer`
/// seed it, `followup` reads and extends it, `clear_history` empties it.
/// All methods take `&self`; implementations synchronise internally.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PerceptionPort: Send + Sync {
    /// Transcribe a recording. An empty string means no speech was heard.
    async fn transcribe(&self, clip: &AudioClip) -> Result<String, TranscriptionError>;

    /// Describe the scene in `image`.
    async fn summarize(&self, image: &Image) -> Result<String, InferenceError>;

    /// Answer `question` about `image`.
    async fn answer(&self, image: &Image, question: &str) -> Result<String, InferenceError>;

    /// Answer `question` using only the conversation so far.
    async fn followup(&self, question: &str) -> Result<String, InferenceError>;

    /// Forget every previous turn.
    async fn clear_history(&self);
}

/// Answer the question if one was asked, otherwise describe the scene.
pub async fn answer_or_summarize(
    perception: &dyn PerceptionPort,
    image: &Image,
    question: &str,
) -> Result<String, InferenceError> {
    if question.is_empty() {
        perception.summarize(image).await
    } else {
        perception.answer(image, question).await
    }
}
