//! Playback controller. Owns at most one live response playback.
//!
//! `play` starts output and spawns a completion waiter. The waiter and
//! `stop` race for the single live slot under one mutex: whoever takes the
//! slot first wins, the other sees it already cleared. Only a natural
//! completion fires the `on_done` callback.
//!
//! The slot mutex is never held while the output device starts; a device
//! that is slow to open only delays the caller of `play`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use aurasight_core::{AudioOutput, PlaybackError, PlaybackHandle, SpeechAudio};

use crate::gate::EchoGate;

/// Callback invoked with the playback id when audio drains naturally.
pub type PlaybackDoneCallback = Box<dyn FnOnce(u64) + Send + 'static>;

/// Reference to a started playback, usable for inspection.
#[derive(Clone)]
pub struct PlaybackRef {
    id: u64,
    handle: Arc<dyn PlaybackHandle>,
}

impl PlaybackRef {
    pub const fn id(&self) -> u64 {
        self.id
    }

    pub fn is_playing(&self) -> bool {
        self.handle.is_playing()
    }
}

impl std::fmt::Debug for PlaybackRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackRef").field("id", &self.id).finish()
    }
}

struct LivePlayback {
    id: u64,
    handle: Arc<dyn PlaybackHandle>,
}

type LiveSlot = Arc<Mutex<Option<LivePlayback>>>;

fn lock_slot(slot: &Mutex<Option<LivePlayback>>) -> std::sync::MutexGuard<'_, Option<LivePlayback>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Starts, watches and force-stops response playback.
pub struct PlaybackController {
    output: Arc<dyn AudioOutput>,
    live: LiveSlot,
    next_id: AtomicU64,
    echo_gate: EchoGate,
}

impl PlaybackController {
    pub fn new(output: Arc<dyn AudioOutput>, echo_gate: EchoGate) -> Self {
        Self {
            output,
            live: Arc::new(Mutex::new(None)),
            next_id: AtomicU64::new(1),
            echo_gate,
        }
    }

    /// Start playing `audio`.
    ///
    /// Fails with [`PlaybackError::AlreadyPlaying`] while a previous
    /// playback is still live. Must be called from within a Tokio runtime:
    /// the completion waiter is a spawned task.
    pub fn play(
        &self,
        audio: SpeechAudio,
        on_done: Option<PlaybackDoneCallback>,
    ) -> Result<PlaybackRef, PlaybackError> {
        if self.is_playing() {
            return Err(PlaybackError::AlreadyPlaying);
        }

        let duration = audio.duration;
        let handle = self.output.play(audio)?;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);

        let mut live = lock_slot(&self.live);
        if live.is_some() {
            // Another play claimed the slot while this device was starting.
            drop(live);
            handle.stop();
            return Err(PlaybackError::AlreadyPlaying);
        }
        *live = Some(LivePlayback {
            id,
            handle: Arc::clone(&handle),
        });
        self.echo_gate.hold(id);
        drop(live);

        tracing::debug!(
            playback_id = id,
            duration_ms = duration.as_millis(),
            "Playback started"
        );

        self.spawn_completion_waiter(id, Arc::clone(&handle), on_done);

        Ok(PlaybackRef { id, handle })
    }

    /// Force-stop the live playback, if any.
    ///
    /// Returns `true` when something was stopped. Idempotent.
    pub fn stop(&self) -> bool {
        let taken = lock_slot(&self.live).take();
        let Some(playback) = taken else {
            return false;
        };

        playback.handle.stop();
        self.echo_gate.release(playback.id);
        tracing::debug!(playback_id = playback.id, "Playback stopped");
        true
    }

    /// Whether a playback currently holds the live slot.
    pub fn is_playing(&self) -> bool {
        lock_slot(&self.live).is_some()
    }

    /// Id of the live playback, if any.
    pub fn current_id(&self) -> Option<u64> {
        lock_slot(&self.live).as_ref().map(|p| p.id)
    }

    fn spawn_completion_waiter(
        &self,
        id: u64,
        handle: Arc<dyn PlaybackHandle>,
        on_done: Option<PlaybackDoneCallback>,
    ) {
        let live = Arc::clone(&self.live);
        let echo_gate = self.echo_gate.clone();

        tokio::spawn(async move {
            handle.wait_done().await;

            let finished_naturally = {
                let mut slot = lock_slot(&live);
                if slot.as_ref().is_some_and(|p| p.id == id) {
                    slot.take();
                    true
                } else {
                    false
                }
            };

            // stop() already cleared the slot and the gate.
            if !finished_naturally {
                return;
            }

            echo_gate.release(id);
            tracing::debug!(playback_id = id, "Playback finished naturally");
            if let Some(cb) = on_done {
                cb(id);
            }
        });
    }
}
