//! Listening gate for the voice command listener.
//!
//! The playback controller holds the gate for as long as a response is
//! audible, and [`CommandListener`](crate::CommandListener) skips its
//! listening window while it is held. Otherwise the listener would
//! transcribe the answer coming out of the speaker and dispatch whatever
//! command word the answer happened to contain.
//!
//! The gate remembers which playback holds it, so a late release from a
//! playback that was already replaced cannot reopen it.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// No playback holds the gate. Playback ids start at 1.
const OPEN: u64 = 0;

/// Shared between the playback controller and the command listener.
#[derive(Debug, Clone, Default)]
pub struct EchoGate {
    holder: Arc<AtomicU64>,
}

impl EchoGate {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Close the gate on behalf of `playback_id`.
    pub fn hold(&self, playback_id: u64) {
        self.holder.store(playback_id, Ordering::SeqCst);
        tracing::debug!(playback_id, "Response audible, command listener paused");
    }

    /// Reopen the gate if `playback_id` still holds it.
    ///
    /// Returns `false` when another playback (or none) holds it.
    pub fn release(&self, playback_id: u64) -> bool {
        let released = self
            .holder
            .compare_exchange(playback_id, OPEN, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok();
        if released {
            tracing::debug!(playback_id, "Response over, command listener resumed");
        }
        released
    }

    #[must_use]
    pub fn is_held(&self) -> bool {
        self.holder.load(Ordering::SeqCst) != OPEN
    }

    /// Id of the playback holding the gate.
    #[must_use]
    pub fn holder(&self) -> Option<u64> {
        match self.holder.load(Ordering::SeqCst) {
            OPEN => None,
            id => Some(id),
        }
    }
}
