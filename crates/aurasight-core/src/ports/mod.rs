//! Port definitions for the collaborators the session drives.
//!
//! Ports are narrow call contracts. Adapters (camera, microphone, speech
//! recognizer, LLM, TTS, audio device) implement them outside the core so
//! they can be swapped without touching the session logic.
//!
//! # Design Rules
//!
//! - No adapter types here; payloads are the domain types in [`crate::domain`].
//! - Every port is `Send + Sync` and used as `Arc<dyn Port>`.
//! - Calls may block for a long time (model latency); the session treats
//!   them as plain awaits with no timeout of its own.

mod audio_output;
mod capture;
mod listener;
mod perception;
mod synthesis;

pub use audio_output::{AudioOutput, PlaybackHandle};
pub use capture::CapturePort;
pub use listener::AmbientListener;
pub use perception::{PerceptionPort, answer_or_summarize};
pub use synthesis::SynthesisPort;
