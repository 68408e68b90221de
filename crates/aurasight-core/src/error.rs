//! Error taxonomy for the session core and its gateways.
//!
//! Each gateway family owns a small error type so adapters can report
//! failures precisely. [`SessionError`] is what the session operations
//! return; it wraps the gateway errors and adds the two state errors
//! (`InoperableState`, `AlreadyBusy`).

use thiserror::Error;

/// Camera or microphone acquisition failed.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// No camera could be opened.
    #[error("Camera unavailable: {0}")]
    CameraUnavailable(String),

    /// No microphone could be opened.
    #[error("Microphone unavailable: {0}")]
    MicrophoneUnavailable(String),

    /// Device opened but reading from it failed.
    #[error("Capture I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Speech-to-text backend failure.
#[derive(Debug, Error)]
#[error("Transcription failed: {0}")]
pub struct TranscriptionError(pub String);

/// Summarize / answer / follow-up backend failure.
#[derive(Debug, Error)]
#[error("Inference failed: {0}")]
pub struct InferenceError(pub String);

/// Text-to-speech backend failure.
#[derive(Debug, Error)]
#[error("Speech synthesis failed: {0}")]
pub struct SynthesisError(pub String);

/// Audio output failure.
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// A previous playback has not been cleared yet.
    #[error("A response is already playing")]
    AlreadyPlaying,

    /// Failed to open or write to the audio output device.
    #[error("Failed to open audio output stream: {0}")]
    OutputStream(String),
}

/// Ambient listening failure, as seen by the command listener.
///
/// `Timeout` and `Unrecognized` are the normal "nothing heard" outcomes;
/// only `Backend` is worth a log line.
#[derive(Debug, Error)]
pub enum ListenError {
    /// Nobody spoke within the listening window.
    #[error("No speech within the listening window")]
    Timeout,

    /// Speech was heard but could not be turned into text.
    #[error("Speech was not recognized")]
    Unrecognized,

    /// Microphone or recognizer failure.
    #[error("Listener backend error: {0}")]
    Backend(String),
}

/// Errors returned by session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Transcription(#[from] TranscriptionError),

    #[error(transparent)]
    Inference(#[from] InferenceError),

    #[error(transparent)]
    Synthesis(#[from] SynthesisError),

    #[error(transparent)]
    Playback(#[from] PlaybackError),

    /// The session was switched off; only Reset is accepted.
    #[error("Session is disabled, reset it first")]
    InoperableState,

    /// A Start/Followup workflow is already running.
    #[error("A workflow is already running")]
    AlreadyBusy,
}

impl SessionError {
    /// Whether this error came from an external gateway (as opposed to
    /// the session refusing the operation).
    pub const fn is_gateway_failure(&self) -> bool {
        matches!(
            self,
            Self::Capture(_)
                | Self::Transcription(_)
                | Self::Inference(_)
                | Self::Synthesis(_)
                | Self::Playback(_)
        )
    }
}
