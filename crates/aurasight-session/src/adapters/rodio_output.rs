//! Response playback on the default output device via `rodio`.
//!
//! `rodio::OutputStream` is `!Send` on some platforms, so a single audio
//! thread opens the stream once in [`RodioOutput::new`] and keeps it until
//! the output is dropped. `play` only asks that thread for a fresh `Sink`
//! with the samples queued; the `Sink` is `Send + Sync` and comes back over
//! a channel.

use std::sync::Arc;
use std::sync::mpsc;
use std::thread;

use async_trait::async_trait;
use aurasight_core::{AudioOutput, PlaybackError, PlaybackHandle, SpeechAudio};
use rodio::buffer::SamplesBuffer;
use rodio::{OutputStream, Sink};
use tokio_util::sync::CancellationToken;

enum OutputCommand {
    /// Queue `audio` on a new sink and hand the sink back.
    Play {
        audio: SpeechAudio,
        reply: mpsc::Sender<Result<Arc<Sink>, PlaybackError>>,
    },
    Shutdown,
}

fn thread_died() -> PlaybackError {
    PlaybackError::OutputStream("audio thread died".to_string())
}

/// Plays synthesized speech on the default output device.
pub struct RodioOutput {
    cmd_tx: mpsc::Sender<OutputCommand>,
    thread: Option<thread::JoinHandle<()>>,
}

impl RodioOutput {
    /// Spawn the audio thread and open the default output stream on it.
    ///
    /// Fails if no output device can be opened.
    pub fn new() -> Result<Self, PlaybackError> {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (init_tx, init_rx) = mpsc::channel();

        let thread = thread::Builder::new()
            .name("aurasight-audio".into())
            .spawn(move || Self::run(&cmd_rx, &init_tx))
            .map_err(|e| PlaybackError::OutputStream(format!("failed to spawn audio thread: {e}")))?;

        init_rx.recv().map_err(|_| thread_died())??;
        tracing::info!("Audio output opened");

        Ok(Self {
            cmd_tx,
            thread: Some(thread),
        })
    }

    /// Body of the audio thread. The stream never leaves it.
    fn run(
        cmd_rx: &mpsc::Receiver<OutputCommand>,
        init_tx: &mpsc::Sender<Result<(), PlaybackError>>,
    ) {
        let (_stream, handle) = match OutputStream::try_default() {
            Ok(pair) => pair,
            Err(e) => {
                let _ = init_tx.send(Err(PlaybackError::OutputStream(e.to_string())));
                return;
            }
        };
        if init_tx.send(Ok(())).is_err() {
            return;
        }

        while let Ok(command) = cmd_rx.recv() {
            match command {
                OutputCommand::Play { audio, reply } => {
                    let sink = Sink::try_new(&handle)
                        .map(|sink| {
                            sink.append(SamplesBuffer::new(1, audio.sample_rate, audio.samples));
                            Arc::new(sink)
                        })
                        .map_err(|e| PlaybackError::OutputStream(e.to_string()));
                    let _ = reply.send(sink);
                }
                OutputCommand::Shutdown => break,
            }
        }

        tracing::debug!("Audio thread exiting");
    }
}

impl AudioOutput for RodioOutput {
    fn play(&self, audio: SpeechAudio) -> Result<Arc<dyn PlaybackHandle>, PlaybackError> {
        let (reply, reply_rx) = mpsc::channel();
        self.cmd_tx
            .send(OutputCommand::Play { audio, reply })
            .map_err(|_| thread_died())?;
        let sink = reply_rx.recv().map_err(|_| thread_died())??;

        Ok(Arc::new(RodioPlayback {
            sink,
            done: CancellationToken::new(),
        }))
    }
}

impl Drop for RodioOutput {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(OutputCommand::Shutdown);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl std::fmt::Debug for RodioOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RodioOutput")
            .field("running", &self.thread.is_some())
            .finish_non_exhaustive()
    }
}

struct RodioPlayback {
    sink: Arc<Sink>,
    done: CancellationToken,
}

#[async_trait]
impl PlaybackHandle for RodioPlayback {
    async fn wait_done(&self) {
        // `stop` empties the sink, which also ends `sleep_until_end`.
        let sink = Arc::clone(&self.sink);
        let drained = tokio::task::spawn_blocking(move || sink.sleep_until_end());

        tokio::select! {
            _ = drained => {
                self.done.cancel();
                tracing::debug!("Output sink drained");
            }
            () = self.done.cancelled() => {}
        }
    }

    fn stop(&self) {
        self.sink.stop();
        self.done.cancel();
    }

    fn is_playing(&self) -> bool {
        !self.done.is_cancelled() && !self.sink.empty()
    }
}
