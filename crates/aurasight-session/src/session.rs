//! Session state machine.
//!
//! A [`Session`] sequences one workflow at a time through the gateways:
//!
//! ```text
//!   Start:    capture image → record question → transcribe → answer/summarize
//!             → synthesize → play
//!   Followup: record question → transcribe → follow-up → synthesize → play
//! ```
//!
//! # Locking discipline
//!
//! `phase`, `busy`, `enabled` and `recording` live in one std mutex that is
//! never held across an `.await`. Gateway calls, including starting the
//! output device, run with no lock held. Every phase change and its event
//! happen inside the same critical section, so events are emitted in
//! transition order and never duplicated.
//!
//! # Cancellation
//!
//! Only playback is forcibly cancellable. `Stop` clears the recording flag
//! and silences playback but does not interrupt a gateway call in flight;
//! `Off` flips `enabled` and bumps the session epoch. A workflow belongs to
//! the epoch it started in; once that epoch is gone its transitions, events
//! and response are dropped, even if `Reset` re-enabled the session first.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use aurasight_core::ports::answer_or_summarize;
use aurasight_core::{
    AudioOutput, CapturePort, Operation, PerceptionPort, Phase, SessionError, SessionEvent,
    SessionSettings, SpeechAudio, Status, SynthesisPort,
};
use tokio::sync::mpsc;

use crate::gate::EchoGate;
use crate::playback::PlaybackController;
use crate::supervisor::WorkflowSupervisor;

// ── Gateways ───────────────────────────────────────────────────────

/// The collaborators a session drives.
#[derive(Clone)]
pub struct SessionGateways {
    pub capture: Arc<dyn CapturePort>,
    pub perception: Arc<dyn PerceptionPort>,
    pub synthesis: Arc<dyn SynthesisPort>,
    pub output: Arc<dyn AudioOutput>,
}

// ── State ──────────────────────────────────────────────────────────

// Four independent flags guarded together; an enum would not capture
// "disabled while a workflow is still busy".
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug)]
struct SessionState {
    phase: Phase,
    busy: bool,
    enabled: bool,
    recording: bool,
    /// Playback started by the last workflow, until it finishes or is stopped.
    playback_id: Option<u64>,
    /// Bumped by every `Off`.
    epoch: u64,
}

impl SessionState {
    /// Whether a workflow started in `epoch` may still drive the session.
    const fn owns(&self, epoch: u64) -> bool {
        self.enabled && self.epoch == epoch
    }
}

/// Point-in-time copy of the session flags.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub phase: Phase,
    pub busy: bool,
    pub enabled: bool,
    pub recording: bool,
    pub playing: bool,
}

/// The two operations that run as workflows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Workflow {
    Start,
    Followup,
}

impl Workflow {
    const fn operation(self) -> Operation {
        match self {
            Self::Start => Operation::Start,
            Self::Followup => Operation::Followup,
        }
    }
}

struct SessionInner {
    state: Mutex<SessionState>,
    gateways: SessionGateways,
    playback: PlaybackController,
    echo_gate: EchoGate,
    workflows: WorkflowSupervisor,
    event_tx: mpsc::UnboundedSender<SessionEvent>,
    receiver_dropped: AtomicBool,
    record_duration: Duration,
}

// ── Session ────────────────────────────────────────────────────────

/// Process-wide session controller. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl Session {
    /// Create an idle, enabled session.
    ///
    /// Returns the session and a receiver for [`SessionEvent`]s. `settings`
    /// should have passed [`aurasight_core::validate_settings`]; an unusable
    /// record duration falls back to the default.
    #[must_use]
    pub fn new(
        gateways: SessionGateways,
        settings: &SessionSettings,
    ) -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let echo_gate = EchoGate::new();
        let playback = PlaybackController::new(Arc::clone(&gateways.output), echo_gate.clone());

        let inner = SessionInner {
            state: Mutex::new(SessionState {
                phase: Phase::Idle,
                busy: false,
                enabled: true,
                recording: false,
                playback_id: None,
                epoch: 0,
            }),
            gateways,
            playback,
            echo_gate,
            workflows: WorkflowSupervisor::new(),
            event_tx,
            receiver_dropped: AtomicBool::new(false),
            record_duration: settings.record_duration(),
        };

        (
            Self {
                inner: Arc::new(inner),
            },
            event_rx,
        )
    }

    // ── Queries ────────────────────────────────────────────────────

    pub fn phase(&self) -> Phase {
        self.inner.lock_state().phase
    }

    pub fn is_busy(&self) -> bool {
        self.inner.lock_state().busy
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.lock_state().enabled
    }

    /// The cooperative recording flag: set by a workflow, cleared by Stop.
    pub fn is_recording(&self) -> bool {
        self.inner.lock_state().recording
    }

    pub fn is_playing(&self) -> bool {
        self.inner.playback.is_playing()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.inner.lock_state();
        SessionSnapshot {
            phase: state.phase,
            busy: state.busy,
            enabled: state.enabled,
            recording: state.recording,
            playing: self.inner.playback.is_playing(),
        }
    }

    /// Gate held by the playback controller while a response is audible.
    pub fn echo_gate(&self) -> EchoGate {
        self.inner.echo_gate.clone()
    }

    /// Wait for the in-flight workflow, if any, to finish.
    pub async fn join_workflow(&self) {
        self.inner.workflows.join().await;
    }

    // ── Operations ─────────────────────────────────────────────────

    /// Run `operation`. This is the single entry point shared by the presentation
    /// layer and the command listener.
    pub async fn dispatch(&self, operation: Operation) -> Result<(), SessionError> {
        match operation {
            Operation::Start => self.start(),
            Operation::Stop => self.stop(),
            Operation::Followup => self.followup(),
            Operation::ClearHistory => self.clear_history().await,
            Operation::Off => self.off(),
            Operation::Reset => self.reset(),
        }
    }

    /// Spawn a Start workflow.
    ///
    /// Rejected with [`SessionError::AlreadyBusy`] (no effect, no queueing)
    /// while another workflow runs.
    pub fn start(&self) -> Result<(), SessionError> {
        self.begin(Workflow::Start)
    }

    /// Spawn a Followup workflow. Same admission rules as [`Self::start`].
    pub fn followup(&self) -> Result<(), SessionError> {
        self.begin(Workflow::Followup)
    }

    /// Clear the recording flag and silence any playing response.
    ///
    /// Does not interrupt a capture or model call already in flight.
    pub fn stop(&self) -> Result<(), SessionError> {
        let inner = &self.inner;
        let mut state = inner.lock_state();
        if !state.enabled {
            return Err(SessionError::InoperableState);
        }

        state.recording = false;
        if inner.playback.stop() {
            state.playback_id = None;
        }

        if state.phase == Phase::Playing {
            inner.transition(&mut state, Phase::Idle, Status::Stopped);
        } else {
            inner.emit(SessionEvent::Status(Status::Stopped));
        }

        tracing::info!(busy = state.busy, "Stop requested");
        Ok(())
    }

    /// Forget the conversation history. Independent of busy and phase.
    pub async fn clear_history(&self) -> Result<(), SessionError> {
        self.inner.ensure_enabled()?;

        self.inner.gateways.perception.clear_history().await;

        self.inner
            .emit_if_enabled(SessionEvent::Status(Status::HistoryCleared));
        tracing::info!("Conversation history cleared");
        Ok(())
    }

    /// Switch the session off. Everything but Reset is refused afterwards.
    pub fn off(&self) -> Result<(), SessionError> {
        let inner = &self.inner;
        let mut state = inner.lock_state();
        if !state.enabled {
            return Err(SessionError::InoperableState);
        }

        state.enabled = false;
        state.recording = false;
        state.epoch += 1;
        // Best-effort: handles swallow their own device errors.
        inner.playback.stop();
        state.playback_id = None;

        inner.set_phase(&mut state, Phase::Disabled);
        inner.emit(SessionEvent::Status(Status::SessionEnded));
        inner.emit(SessionEvent::EnabledChanged(false));

        tracing::info!(busy = state.busy, "Session switched off");
        Ok(())
    }

    /// Re-enable a switched-off session. History is left untouched.
    ///
    /// A no-op on an enabled session.
    pub fn reset(&self) -> Result<(), SessionError> {
        let inner = &self.inner;
        let mut state = inner.lock_state();
        if state.enabled {
            tracing::debug!("Reset on an enabled session ignored");
            return Ok(());
        }

        state.enabled = true;
        inner.set_phase(&mut state, Phase::Idle);
        inner.emit(SessionEvent::EnabledChanged(true));
        inner.emit(SessionEvent::Status(Status::Idle));

        tracing::info!("Session reset");
        Ok(())
    }

    // ── Workflows ──────────────────────────────────────────────────

    fn begin(&self, workflow: Workflow) -> Result<(), SessionError> {
        let operation = workflow.operation();
        let inner = &self.inner;

        let mut state = inner.lock_state();
        if !state.enabled {
            return Err(SessionError::InoperableState);
        }
        if state.busy {
            tracing::debug!(%operation, "Workflow already running, request ignored");
            return Err(SessionError::AlreadyBusy);
        }

        state.busy = true;
        state.recording = true;

        // Barge-in: a new question silences the previous answer.
        if inner.playback.stop() {
            state.playback_id = None;
        }

        let (phase, status) = match workflow {
            Workflow::Start => (Phase::Capturing, Status::CapturingImage),
            Workflow::Followup => (Phase::Listening, Status::RecordingVoice),
        };
        inner.transition(&mut state, phase, status);
        let epoch = state.epoch;
        drop(state);

        tracing::info!(%operation, epoch, "Workflow started");

        let guard = BusyGuard {
            inner: Arc::clone(&self.inner),
            epoch,
        };
        let session = self.clone();
        inner.workflows.spawn(operation, async move {
            session.run(workflow, guard).await;
        });

        Ok(())
    }

    async fn run(self, workflow: Workflow, guard: BusyGuard) {
        let epoch = guard.epoch;
        let result = match workflow {
            Workflow::Start => self.run_start(epoch).await,
            Workflow::Followup => self.run_followup(epoch).await,
        };

        if let Err(err) = result {
            self.inner.fail(epoch, workflow.operation(), &err);
        }

        // Busy is released only after the failure transition is visible.
        drop(guard);
    }

    async fn run_start(&self, epoch: u64) -> Result<(), SessionError> {
        let gateways = &self.inner.gateways;

        let image = gateways.capture.capture_image().await?;
        tracing::debug!(
            width = image.width,
            height = image.height,
            bytes = image.byte_len(),
            "Image captured"
        );
        self.inner.emit_for(epoch, SessionEvent::ImageReady(image.clone()));

        self.inner.advance(epoch, Phase::Listening, Status::RecordingVoice);
        let clip = gateways
            .capture
            .capture_audio(self.inner.record_duration)
            .await?;

        self.inner.advance(epoch, Phase::Thinking, Status::Thinking);
        let transcript = gateways.perception.transcribe(&clip).await?;
        let question = transcript.trim();
        tracing::info!(question, "Question transcribed");

        let reply = answer_or_summarize(gateways.perception.as_ref(), &image, question).await?;

        self.respond(epoch, reply).await
    }

    async fn run_followup(&self, epoch: u64) -> Result<(), SessionError> {
        let gateways = &self.inner.gateways;

        let clip = gateways
            .capture
            .capture_audio(self.inner.record_duration)
            .await?;

        self.inner.advance(epoch, Phase::Thinking, Status::Thinking);
        let transcript = gateways.perception.transcribe(&clip).await?;
        let question = transcript.trim();
        tracing::info!(question, "Follow-up transcribed");

        // Nothing heard: an empty reply is still synthesized and played.
        let reply = if question.is_empty() {
            String::new()
        } else {
            gateways.perception.followup(question).await?
        };

        self.respond(epoch, reply).await
    }

    async fn respond(&self, epoch: u64, reply: String) -> Result<(), SessionError> {
        self.inner.advance(epoch, Phase::Synthesizing, Status::Synthesizing);
        let audio = self.inner.gateways.synthesis.synthesize(&reply).await?;
        self.hand_off(epoch, audio)
    }

    /// Move to Playing and give the audio to the playback controller.
    ///
    /// The output device is started with no session lock held, so Stop or
    /// Off can land in between; both are re-checked before the playback is
    /// recorded.
    fn hand_off(&self, epoch: u64, audio: SpeechAudio) -> Result<(), SessionError> {
        let inner = &self.inner;
        {
            let mut state = inner.lock_state();
            if !state.owns(epoch) {
                tracing::info!(epoch, "Session switched off during workflow, response dropped");
                return Ok(());
            }
            inner.transition(&mut state, Phase::Playing, Status::PlayingResponse);
        }

        let weak: Weak<SessionInner> = Arc::downgrade(&self.inner);
        let playback = inner.playback.play(
            audio,
            Some(Box::new(move |id| {
                if let Some(inner) = weak.upgrade() {
                    inner.playback_finished(id);
                }
            })),
        )?;
        let id = playback.id();

        let mut state = inner.lock_state();
        if !state.owns(epoch) || state.phase != Phase::Playing {
            // Stop or Off ran while the device was starting and found no
            // live playback to silence.
            inner.playback.stop();
            tracing::info!(playback_id = id, "Response interrupted while starting");
            return Ok(());
        }

        if inner.playback.current_id() == Some(id) {
            state.playback_id = Some(id);
        } else {
            // Drained before the id was recorded; the callback was ignored.
            inner.transition(&mut state, Phase::Idle, Status::Done);
        }
        Ok(())
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("state", &*self.inner.lock_state())
            .finish_non_exhaustive()
    }
}

// ── Internal helpers ───────────────────────────────────────────────

impl SessionInner {
    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_enabled(&self) -> Result<(), SessionError> {
        if self.lock_state().enabled {
            Ok(())
        } else {
            Err(SessionError::InoperableState)
        }
    }

    /// Transition from within a workflow step started in `epoch`.
    fn advance(&self, epoch: u64, phase: Phase, status: Status) {
        let mut state = self.lock_state();
        if !state.owns(epoch) {
            tracing::debug!(?phase, epoch, "Transition dropped, workflow orphaned by Off");
            return;
        }
        self.transition(&mut state, phase, status);
    }

    /// Apply a workflow transition unless the session is disabled.
    fn transition(&self, state: &mut SessionState, phase: Phase, status: Status) {
        if !state.enabled {
            tracing::debug!(?phase, "Transition suppressed, session disabled");
            return;
        }
        self.set_phase(state, phase);
        self.emit(SessionEvent::Status(status));
    }

    /// Change phase, emitting exactly one event for an actual change.
    fn set_phase(&self, state: &mut SessionState, phase: Phase) {
        if state.phase != phase {
            tracing::debug!(old = ?state.phase, new = ?phase, "Session phase transition");
            state.phase = phase;
            self.emit(SessionEvent::PhaseChanged(phase));
        }
    }

    /// Abort the current workflow after a gateway failure.
    fn fail(&self, epoch: u64, operation: Operation, err: &SessionError) {
        tracing::warn!(%operation, error = %err, "Workflow failed");

        let mut state = self.lock_state();
        if !state.owns(epoch) {
            return;
        }
        self.transition(&mut state, Phase::Idle, Status::Failed);
        self.emit(SessionEvent::Error {
            operation,
            message: err.to_string(),
        });
    }

    /// Completion callback from the playback controller.
    fn playback_finished(&self, id: u64) {
        let mut state = self.lock_state();
        if state.playback_id != Some(id) {
            return;
        }
        state.playback_id = None;
        if state.phase == Phase::Playing {
            self.transition(&mut state, Phase::Idle, Status::Done);
        }
    }

    fn emit_if_enabled(&self, event: SessionEvent) {
        let state = self.lock_state();
        if state.enabled {
            self.emit(event);
        }
    }

    /// Emit a workflow event unless the workflow's epoch has ended.
    fn emit_for(&self, epoch: u64, event: SessionEvent) {
        let state = self.lock_state();
        if state.owns(epoch) {
            self.emit(event);
        }
    }

    /// Emit a session event (a dropped receiver is logged once).
    fn emit(&self, event: SessionEvent) {
        if self.event_tx.send(event).is_err() && !self.receiver_dropped.swap(true, Ordering::SeqCst)
        {
            tracing::warn!("Session event receiver dropped");
        }
    }
}

/// Releases `busy` on every workflow exit path, including panics.
struct BusyGuard {
    inner: Arc<SessionInner>,
    /// Epoch the workflow was started in.
    epoch: u64,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        let mut state = self.inner.lock_state();
        state.busy = false;
        state.recording = false;

        // Still mid-workflow means the workflow never reached a terminal
        // transition (it panicked). An orphaned workflow leaves the phase to
        // whoever owns it now.
        let stranded = matches!(
            state.phase,
            Phase::Capturing | Phase::Listening | Phase::Thinking | Phase::Synthesizing
        );
        if stranded && state.owns(self.epoch) {
            self.inner.transition(&mut state, Phase::Idle, Status::Failed);
        }
    }
}
