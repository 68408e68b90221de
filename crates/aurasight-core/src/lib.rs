//! # aurasight-core
//!
//! Domain types, events, errors and port definitions shared by the
//! AuraSight session controller and its adapters.
//!
//! - [`domain`] - payloads moved between gateways (image, audio, history)
//! - [`events`] - phases, statuses and [`SessionEvent`]
//! - [`ports`] - collaborator traits (capture, perception, synthesis, output, listener)
//! - [`settings`] - [`SessionSettings`] and validation

#![deny(unused_crate_dependencies)]

pub mod domain;
pub mod error;
pub mod events;
pub mod operation;
pub mod ports;
pub mod settings;

// Re-export commonly used types for convenience
pub use domain::{AudioClip, ConversationHistory, Image, ImageFormat, Speaker, SpeechAudio, Turn};
pub use error::{
    CaptureError, InferenceError, ListenError, PlaybackError, SessionError, SynthesisError,
    TranscriptionError,
};
pub use events::{Phase, SessionEvent, Status};
pub use operation::{CommandBinding, Operation, ParseOperationError};
pub use ports::{
    AmbientListener, AudioOutput, CapturePort, PerceptionPort, PlaybackHandle, SynthesisPort,
};
pub use settings::{SessionSettings, SettingsError, validate_settings};
