//! In-process gateway adapters.
//!
//! These stand in for camera, microphone, models and speaker so the session
//! can be driven end to end from a console or a test without hardware.
//! Timing follows the Tokio clock, which makes them usable under a paused
//! test runtime.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use aurasight_core::{
    AmbientListener, AudioClip, AudioOutput, CaptureError, CapturePort, ConversationHistory,
    Image, ImageFormat, InferenceError, ListenError, PerceptionPort, PlaybackError,
    PlaybackHandle, SpeechAudio, SynthesisError, SynthesisPort, TranscriptionError,
};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

const MIC_SAMPLE_RATE: u32 = 16_000;
const TTS_SAMPLE_RATE: u32 = 24_000;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ── Capture ────────────────────────────────────────────────────────

/// Camera and microphone that produce silent, uniformly gray media.
#[derive(Debug, Clone)]
pub struct SimulatedCapture {
    width: u32,
    height: u32,
    /// Whether `capture_audio` takes as long as the requested duration.
    realtime: bool,
}

impl SimulatedCapture {
    /// A 640x480 camera whose recordings take real (Tokio) time.
    pub const fn new() -> Self {
        Self {
            width: 640,
            height: 480,
            realtime: true,
        }
    }

    /// Same, but recordings return immediately.
    pub const fn instant() -> Self {
        Self {
            width: 640,
            height: 480,
            realtime: false,
        }
    }
}

impl Default for SimulatedCapture {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CapturePort for SimulatedCapture {
    async fn capture_image(&self) -> Result<Image, CaptureError> {
        let len = (self.width as usize) * (self.height as usize) * 3;
        Ok(Image::new(
            self.width,
            self.height,
            ImageFormat::Rgb8,
            vec![0x80u8; len],
        ))
    }

    async fn capture_audio(&self, duration: Duration) -> Result<AudioClip, CaptureError> {
        if self.realtime {
            tokio::time::sleep(duration).await;
        }

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let len = (duration.as_secs_f64() * f64::from(MIC_SAMPLE_RATE)) as usize;
        Ok(AudioClip::new(vec![0.0; len], MIC_SAMPLE_RATE))
    }
}

// ── Perception ─────────────────────────────────────────────────────

/// Scripted transcriber plus a template-based question answerer that keeps
/// a real [`ConversationHistory`].
///
/// Transcripts are served from a queue filled with
/// [`queue_transcript`](Self::queue_transcript); an empty queue transcribes
/// as silence.
#[derive(Debug, Default)]
pub struct SimulatedPerception {
    transcripts: Mutex<VecDeque<String>>,
    history: Mutex<ConversationHistory>,
}

impl SimulatedPerception {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the text the next `transcribe` call returns.
    pub fn queue_transcript(&self, text: impl Into<String>) {
        lock(&self.transcripts).push_back(text.into());
    }

    /// Copy of the conversation so far.
    pub fn history(&self) -> ConversationHistory {
        lock(&self.history).clone()
    }
}

#[async_trait]
impl PerceptionPort for SimulatedPerception {
    async fn transcribe(&self, clip: &AudioClip) -> Result<String, TranscriptionError> {
        let text = lock(&self.transcripts).pop_front().unwrap_or_default();
        tracing::debug!(
            duration_ms = clip.duration().as_millis(),
            text = %text,
            "Simulated transcription"
        );
        Ok(text)
    }

    async fn summarize(&self, image: &Image) -> Result<String, InferenceError> {
        let reply = format!(
            "I see a plain gray scene, {} by {} pixels.",
            image.width, image.height
        );
        lock(&self.history).push_exchange("Describe what you see.", reply.clone());
        Ok(reply)
    }

    async fn answer(&self, image: &Image, question: &str) -> Result<String, InferenceError> {
        let reply = format!(
            "You asked \"{question}\". All I can make out is a gray {}x{} frame.",
            image.width, image.height
        );
        lock(&self.history).push_exchange(question, reply.clone());
        Ok(reply)
    }

    async fn followup(&self, question: &str) -> Result<String, InferenceError> {
        let mut history = lock(&self.history);
        let reply = match history.last_answer() {
            Some(previous) => format!("Earlier I said: {previous} As for \"{question}\", nothing has changed."),
            None => "We haven't talked about anything yet.".to_string(),
        };
        history.push_exchange(question, reply.clone());
        Ok(reply)
    }

    async fn clear_history(&self) {
        lock(&self.history).clear();
    }
}

// ── Synthesis ──────────────────────────────────────────────────────

/// Produces silence whose length tracks the number of words spoken.
#[derive(Debug, Clone)]
pub struct SimulatedSynthesis {
    words_per_second: f32,
}

impl SimulatedSynthesis {
    pub const fn new() -> Self {
        Self {
            words_per_second: 3.0,
        }
    }
}

impl Default for SimulatedSynthesis {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SynthesisPort for SimulatedSynthesis {
    async fn synthesize(&self, text: &str) -> Result<SpeechAudio, SynthesisError> {
        #[allow(clippy::cast_precision_loss)]
        let words = text.split_whitespace().count() as f32;
        let duration = Duration::from_secs_f32(words / self.words_per_second);

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let len = (duration.as_secs_f64() * f64::from(TTS_SAMPLE_RATE)) as usize;

        Ok(SpeechAudio {
            samples: vec![0.0; len],
            sample_rate: TTS_SAMPLE_RATE,
            duration,
            text: text.to_string(),
        })
    }
}

// ── Output ─────────────────────────────────────────────────────────

/// Silent speaker: each playback simply lasts `audio.duration`.
#[derive(Debug, Default)]
pub struct SimulatedOutput {
    plays: AtomicUsize,
}

impl SimulatedOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of playbacks started so far.
    pub fn plays(&self) -> usize {
        self.plays.load(Ordering::SeqCst)
    }
}

impl AudioOutput for SimulatedOutput {
    fn play(&self, audio: SpeechAudio) -> Result<Arc<dyn PlaybackHandle>, PlaybackError> {
        self.plays.fetch_add(1, Ordering::SeqCst);
        tracing::info!(text = %audio.text, "Speaking");
        Ok(Arc::new(TimedPlayback::start(audio.duration)))
    }
}

/// Playback that ends at a deadline on the Tokio clock, or when stopped.
#[derive(Debug)]
pub struct TimedPlayback {
    deadline: Instant,
    stopped: CancellationToken,
}

impl TimedPlayback {
    pub fn start(duration: Duration) -> Self {
        Self {
            deadline: Instant::now() + duration,
            stopped: CancellationToken::new(),
        }
    }
}

#[async_trait]
impl PlaybackHandle for TimedPlayback {
    async fn wait_done(&self) {
        tokio::select! {
            () = tokio::time::sleep_until(self.deadline) => {}
            () = self.stopped.cancelled() => {}
        }
    }

    fn stop(&self) {
        self.stopped.cancel();
    }

    fn is_playing(&self) -> bool {
        !self.stopped.is_cancelled() && Instant::now() < self.deadline
    }
}

// ── Listener ───────────────────────────────────────────────────────

/// Ambient listener fed with utterances over a channel.
///
/// Each `listen` call takes the next utterance sent through the paired
/// sender, or times out.
#[derive(Debug)]
pub struct ChannelListener {
    utterances: tokio::sync::Mutex<mpsc::UnboundedReceiver<String>>,
}

impl ChannelListener {
    /// Create a listener and the sender that feeds it.
    pub fn new() -> (Self, mpsc::UnboundedSender<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                utterances: tokio::sync::Mutex::new(rx),
            },
            tx,
        )
    }
}

#[async_trait]
impl AmbientListener for ChannelListener {
    async fn listen(&self, timeout: Duration) -> Result<String, ListenError> {
        let mut utterances = self.utterances.lock().await;
        match tokio::time::timeout(timeout, utterances.recv()).await {
            Err(_) => Err(ListenError::Timeout),
            Ok(None) => Err(ListenError::Backend("utterance channel closed".to_string())),
            Ok(Some(text)) if text.trim().is_empty() => Err(ListenError::Unrecognized),
            Ok(Some(text)) => Ok(text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn followup_without_history_says_so() {
        let perception = SimulatedPerception::new();
        let reply = perception.followup("and then?").await.unwrap();
        assert!(reply.contains("haven't talked"));
    }

    #[tokio::test]
    async fn followup_builds_on_previous_answer() {
        let perception = SimulatedPerception::new();
        let image = SimulatedCapture::instant().capture_image().await.unwrap();

        perception.answer(&image, "what is this").await.unwrap();
        let reply = perception.followup("are you sure").await.unwrap();

        assert!(reply.starts_with("Earlier I said"));
        assert_eq!(perception.history().len(), 4);

        perception.clear_history().await;
        assert!(perception.history().is_empty());
    }

    #[tokio::test]
    async fn transcripts_are_served_in_order() {
        let perception = SimulatedPerception::new();
        perception.queue_transcript("first");
        perception.queue_transcript("second");
        let clip = AudioClip::new(vec![], MIC_SAMPLE_RATE);

        assert_eq!(perception.transcribe(&clip).await.unwrap(), "first");
        assert_eq!(perception.transcribe(&clip).await.unwrap(), "second");
        assert_eq!(perception.transcribe(&clip).await.unwrap(), "");
    }

    #[tokio::test]
    async fn synthesis_length_follows_word_count() {
        let synthesis = SimulatedSynthesis::new();
        let audio = synthesis.synthesize("one two three").await.unwrap();
        assert_eq!(audio.duration, Duration::from_secs(1));

        let silent = synthesis.synthesize("").await.unwrap();
        assert_eq!(silent.duration, Duration::ZERO);
        assert!(silent.samples.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn timed_playback_ends_at_deadline_or_stop() {
        let natural = TimedPlayback::start(Duration::from_secs(2));
        assert!(natural.is_playing());
        natural.wait_done().await;
        assert!(!natural.is_playing());

        let stopped = TimedPlayback::start(Duration::from_secs(60));
        stopped.stop();
        stopped.wait_done().await;
        assert!(!stopped.is_playing());
    }

    #[tokio::test(start_paused = true)]
    async fn channel_listener_outcomes() {
        let (listener, tx) = ChannelListener::new();
        let window = Duration::from_secs(5);

        assert!(matches!(listener.listen(window).await, Err(ListenError::Timeout)));

        tx.send("   ".to_string()).unwrap();
        assert!(matches!(
            listener.listen(window).await,
            Err(ListenError::Unrecognized)
        ));

        tx.send("Start".to_string()).unwrap();
        assert_eq!(listener.listen(window).await.unwrap(), "Start");

        drop(tx);
        assert!(matches!(
            listener.listen(window).await,
            Err(ListenError::Backend(_))
        ));
    }
}
