//! Domain payloads passed between the session and its gateways.
//!
//! The session never inspects pixels or samples; it only moves these values
//! from one gateway to the next. Payload formats are the gateways' concern.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Image ──────────────────────────────────────────────────────────

/// Encoding of an [`Image`] payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Jpeg,
    Png,
    /// Raw 8-bit RGB, row-major.
    Rgb8,
}

/// One captured camera frame.
///
/// The pixel buffer is reference counted so the same frame can be handed to
/// the presentation layer and to the perception gateway without copying.
#[derive(Debug, Clone)]
pub struct Image {
    pub width: u32,
    pub height: u32,
    pub format: ImageFormat,
    pub data: Arc<[u8]>,
    pub captured_at: DateTime<Utc>,
}

impl Image {
    /// Build an image stamped with the current time.
    pub fn new(width: u32, height: u32, format: ImageFormat, data: impl Into<Arc<[u8]>>) -> Self {
        Self {
            width,
            height,
            format,
            data: data.into(),
            captured_at: Utc::now(),
        }
    }

    /// Size of the encoded payload in bytes.
    pub fn byte_len(&self) -> usize {
        self.data.len()
    }
}

// ── Audio ──────────────────────────────────────────────────────────

/// A fixed-duration microphone recording (mono PCM f32).
#[derive(Debug, Clone)]
pub struct AudioClip {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl AudioClip {
    pub const fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Playback length of the clip.
    #[allow(clippy::cast_precision_loss)]
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.samples.len() as f64 / f64::from(self.sample_rate))
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Audio produced by speech synthesis, ready to be played.
#[derive(Debug, Clone)]
pub struct SpeechAudio {
    /// PCM f32 samples.
    pub samples: Vec<f32>,

    /// Sample rate of the audio (e.g., 24 000 Hz).
    pub sample_rate: u32,

    /// Duration of the audio.
    pub duration: Duration,

    /// The text this audio speaks.
    pub text: String,
}

// ── Conversation history ───────────────────────────────────────────

/// Who said a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Assistant,
}

/// One entry of the multi-turn history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub speaker: Speaker,
    pub text: String,
}

/// Persistent multi-turn conversation held by a perception gateway.
///
/// The session controls its lifecycle (it is only emptied by ClearHistory)
/// but never reads it directly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationHistory {
    turns: Vec<Turn>,
}

impl ConversationHistory {
    pub const fn new() -> Self {
        Self { turns: Vec::new() }
    }

    /// Record a user question followed by the assistant's reply.
    pub fn push_exchange(&mut self, question: impl Into<String>, answer: impl Into<String>) {
        self.turns.push(Turn {
            speaker: Speaker::User,
            text: question.into(),
        });
        self.turns.push(Turn {
            speaker: Speaker::Assistant,
            text: answer.into(),
        });
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Most recent assistant reply, if any.
    pub fn last_answer(&self) -> Option<&str> {
        self.turns
            .iter()
            .rev()
            .find(|t| t.speaker == Speaker::Assistant)
            .map(|t| t.text.as_str())
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }
}
