//! Shared test doubles for the session integration tests.
//!
//! Each gateway can be told to fail, and the capture gateway can be held
//! mid-recording so a test can observe the session while a workflow is in
//! flight.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use aurasight_core::{
    AmbientListener, AudioClip, CaptureError, CapturePort, Image, ImageFormat, InferenceError,
    ListenError, Phase, PerceptionPort, SessionEvent, SessionSettings, SpeechAudio,
    SynthesisError, SynthesisPort, TranscriptionError,
};
use aurasight_session::adapters::{SimulatedOutput, SimulatedPerception, SimulatedSynthesis};
use aurasight_session::{Session, SessionGateways};
use tokio::sync::{Notify, mpsc};

// ── Capture ────────────────────────────────────────────────────────

#[derive(Default)]
pub struct TestCapture {
    pub fail_image: AtomicBool,
    pub fail_audio: AtomicBool,
    /// When set, `capture_audio` waits for [`Self::release`].
    pub hold_audio: AtomicBool,
    release: Notify,
    pub image_calls: AtomicUsize,
    pub audio_calls: AtomicUsize,
}

impl TestCapture {
    pub fn release(&self) {
        self.hold_audio.store(false, Ordering::SeqCst);
        self.release.notify_one();
    }
}

#[async_trait]
impl CapturePort for TestCapture {
    async fn capture_image(&self) -> Result<Image, CaptureError> {
        self.image_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_image.load(Ordering::SeqCst) {
            return Err(CaptureError::CameraUnavailable("no camera".into()));
        }
        Ok(Image::new(4, 4, ImageFormat::Rgb8, vec![0u8; 48]))
    }

    async fn capture_audio(&self, _duration: Duration) -> Result<AudioClip, CaptureError> {
        self.audio_calls.fetch_add(1, Ordering::SeqCst);
        if self.hold_audio.load(Ordering::SeqCst) {
            self.release.notified().await;
        }
        if self.fail_audio.load(Ordering::SeqCst) {
            return Err(CaptureError::MicrophoneUnavailable("no microphone".into()));
        }
        Ok(AudioClip::new(vec![0.0; 160], 16_000))
    }
}

// ── Perception ─────────────────────────────────────────────────────

/// [`SimulatedPerception`] plus failure switches and a call log.
#[derive(Default)]
pub struct TestPerception {
    inner: SimulatedPerception,
    pub fail_transcribe: AtomicBool,
    /// When set, `transcribe` panics instead of returning.
    pub panic_transcribe: AtomicBool,
    pub fail_inference: AtomicBool,
    calls: Mutex<Vec<String>>,
}

impl TestPerception {
    pub fn queue_transcript(&self, text: &str) {
        self.inner.queue_transcript(text);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn history_len(&self) -> usize {
        self.inner.history().len()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn check_inference(&self) -> Result<(), InferenceError> {
        if self.fail_inference.load(Ordering::SeqCst) {
            return Err(InferenceError("model offline".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl PerceptionPort for TestPerception {
    async fn transcribe(&self, clip: &AudioClip) -> Result<String, TranscriptionError> {
        self.record("transcribe".into());
        if self.panic_transcribe.swap(false, Ordering::SeqCst) {
            panic!("recognizer aborted");
        }
        if self.fail_transcribe.load(Ordering::SeqCst) {
            return Err(TranscriptionError("recognizer crashed".into()));
        }
        self.inner.transcribe(clip).await
    }

    async fn summarize(&self, image: &Image) -> Result<String, InferenceError> {
        self.record("summarize".into());
        self.check_inference()?;
        self.inner.summarize(image).await
    }

    async fn answer(&self, image: &Image, question: &str) -> Result<String, InferenceError> {
        self.record(format!("answer:{question}"));
        self.check_inference()?;
        self.inner.answer(image, question).await
    }

    async fn followup(&self, question: &str) -> Result<String, InferenceError> {
        self.record(format!("followup:{question}"));
        self.check_inference()?;
        self.inner.followup(question).await
    }

    async fn clear_history(&self) {
        self.record("clear_history".into());
        self.inner.clear_history().await;
    }
}

// ── Synthesis ──────────────────────────────────────────────────────

#[derive(Default)]
pub struct TestSynthesis {
    inner: SimulatedSynthesis,
    pub fail: AtomicBool,
    spoken: Mutex<Vec<String>>,
}

impl TestSynthesis {
    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().unwrap().clone()
    }
}

#[async_trait]
impl SynthesisPort for TestSynthesis {
    async fn synthesize(&self, text: &str) -> Result<SpeechAudio, SynthesisError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(SynthesisError("voice not loaded".into()));
        }
        self.spoken.lock().unwrap().push(text.to_string());
        self.inner.synthesize(text).await
    }
}

// ── Listener ───────────────────────────────────────────────────────

/// Counts `listen` calls; each call hears nothing for the whole window.
#[derive(Default)]
pub struct CountingListener {
    pub calls: AtomicUsize,
    pub fail: AtomicBool,
}

impl CountingListener {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AmbientListener for CountingListener {
    async fn listen(&self, timeout: Duration) -> Result<String, ListenError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(ListenError::Backend("microphone unplugged".into()));
        }
        tokio::time::sleep(timeout).await;
        Err(ListenError::Timeout)
    }
}

// ── Rig ────────────────────────────────────────────────────────────

pub struct Rig {
    pub session: Session,
    pub events: mpsc::UnboundedReceiver<SessionEvent>,
    pub capture: Arc<TestCapture>,
    pub perception: Arc<TestPerception>,
    pub synthesis: Arc<TestSynthesis>,
    pub output: Arc<SimulatedOutput>,
}

impl Rig {
    pub fn new() -> Self {
        Self::with_settings(&SessionSettings::default())
    }

    pub fn with_settings(settings: &SessionSettings) -> Self {
        let capture = Arc::new(TestCapture::default());
        let perception = Arc::new(TestPerception::default());
        let synthesis = Arc::new(TestSynthesis::default());
        let output = Arc::new(SimulatedOutput::new());

        let gateways = SessionGateways {
            capture: capture.clone(),
            perception: perception.clone(),
            synthesis: synthesis.clone(),
            output: output.clone(),
        };
        let (session, events) = Session::new(gateways, settings);

        Self {
            session,
            events,
            capture,
            perception,
            synthesis,
            output,
        }
    }

    /// Drain all pending events.
    pub fn drain(&mut self) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }

    /// Yield until the session reaches `phase`.
    pub async fn wait_for_phase(&self, phase: Phase) {
        for _ in 0..1_000 {
            if self.session.phase() == phase {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("session never reached {phase:?}, stuck in {:?}", self.session.phase());
    }
}

/// Phase changes in `events`, in order.
pub fn phases(events: &[SessionEvent]) -> Vec<Phase> {
    events
        .iter()
        .filter_map(|e| match e {
            SessionEvent::PhaseChanged(p) => Some(*p),
            _ => None,
        })
        .collect()
}
