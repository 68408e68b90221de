//! # aurasight-session
//!
//! The orchestration layer of AuraSight: the session state machine, the
//! playback controller it drives, and the background voice command
//! listener that feeds it.
//!
//! ```text
//!  console / UI ──┐
//!                 ├─► Session::dispatch ──► workflow task ──► gateways
//!  CommandListener┘          │                                  │
//!        ▲                   └──────► PlaybackController ◄──────┘
//!        └──── EchoGate ◄──────────────────────┘
//! ```

#![deny(unused_crate_dependencies)]

// Used only by the integration tests.
#[cfg(test)]
use mockall as _;

pub mod adapters;
pub mod gate;
pub mod listener;
pub mod playback;
pub mod session;
pub mod supervisor;
pub mod vocabulary;

// Re-export key types for convenience
pub use gate::EchoGate;
pub use listener::{CommandListener, ListenOutcome};
pub use playback::{PlaybackController, PlaybackDoneCallback, PlaybackRef};
pub use session::{Session, SessionGateways, SessionSnapshot};
pub use supervisor::WorkflowSupervisor;
pub use vocabulary::Vocabulary;
