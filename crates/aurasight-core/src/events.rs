//! Session phases, user-visible statuses and the events published to the
//! presentation layer.
//!
//! ```text
//!   Idle → Capturing → Listening → Thinking → Synthesizing → Playing → Idle
//!     ▲        │            │           │            │
//!     └────────┴────────────┴───────────┴────────────┘  (failure)
//!
//!   any ──Off──▶ Disabled ──Reset──▶ Idle
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::Image;
use crate::operation::Operation;

/// Current stage of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// No workflow running and nothing playing.
    Idle,
    /// Acquiring a camera frame.
    Capturing,
    /// Recording the user's spoken question.
    Listening,
    /// Transcribing and running inference.
    Thinking,
    /// Turning the answer into speech.
    Synthesizing,
    /// A response is being played back.
    Playing,
    /// Switched off; only Reset is accepted.
    Disabled,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Idle => "idle",
            Self::Capturing => "capturing",
            Self::Listening => "listening",
            Self::Thinking => "thinking",
            Self::Synthesizing => "synthesizing",
            Self::Playing => "playing",
            Self::Disabled => "disabled",
        };
        f.write_str(label)
    }
}

/// Human-readable progress shown by the presentation layer.
///
/// The exact strings are formatting, not contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Idle,
    CapturingImage,
    RecordingVoice,
    Thinking,
    Synthesizing,
    PlayingResponse,
    Done,
    Failed,
    Stopped,
    SessionEnded,
    HistoryCleared,
}

impl Status {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::CapturingImage => "Capturing image...",
            Self::RecordingVoice => "Recording voice...",
            Self::Thinking => "Thinking...",
            Self::Synthesizing => "Synthesizing...",
            Self::PlayingResponse => "Playing response...",
            Self::Done => "Done.",
            Self::Failed => "Failed.",
            Self::Stopped => "Stopped recording.",
            Self::SessionEnded => "Session ended. All actions stopped.",
            Self::HistoryCleared => "History cleared.",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Events emitted by the session to the UI / application layer.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// Phase changed. Fires once per actual change, never for a no-op.
    PhaseChanged(Phase),

    /// New status line.
    Status(Status),

    /// A Start workflow captured its frame.
    ImageReady(Image),

    /// A workflow failed; `message` is suitable for an error dialog.
    Error {
        operation: Operation,
        message: String,
    },

    /// The control surface should be enabled (`true`) or disabled.
    EnabledChanged(bool),
}
