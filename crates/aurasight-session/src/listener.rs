//! Background voice command listener.
//!
//! Loops for the life of the process: while the session is busy (or its
//! own response is playing) it sleeps without touching the microphone;
//! otherwise it listens for one utterance, matches it against the
//! [`Vocabulary`] and dispatches the bound operation through
//! [`Session::dispatch`], exactly like a direct caller would.
//!
//! The busy check is not atomic with the listen call. A workflow starting
//! in between only means one stray listening window.

use std::sync::Arc;
use std::time::Duration;

use aurasight_core::{AmbientListener, ListenError, Operation, SessionError, SessionSettings};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::gate::EchoGate;
use crate::session::Session;
use crate::vocabulary::Vocabulary;

/// What one listener iteration did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenOutcome {
    /// Session busy or speaking; the microphone was not touched.
    Busy,
    /// Nothing (intelligible) was said within the window.
    Silent,
    /// The listening backend failed; logged and ignored.
    Failed,
    /// Speech was heard but matched no command.
    Unmatched,
    /// The operation was accepted by the session.
    Dispatched(Operation),
    /// The session refused the operation (busy or switched off).
    Rejected(Operation),
}

pub struct CommandListener {
    session: Session,
    echo_gate: EchoGate,
    listener: Arc<dyn AmbientListener>,
    vocabulary: Vocabulary,
    listen_timeout: Duration,
    poll_interval: Duration,
}

impl CommandListener {
    /// Durations come from `settings`, which should have passed
    /// [`aurasight_core::validate_settings`].
    pub fn new(
        session: Session,
        listener: Arc<dyn AmbientListener>,
        vocabulary: Vocabulary,
        settings: &SessionSettings,
    ) -> Self {
        let echo_gate = session.echo_gate();
        Self {
            session,
            echo_gate,
            listener,
            vocabulary,
            listen_timeout: settings.listen_timeout(),
            poll_interval: settings.busy_poll_interval(),
        }
    }

    /// Run the loop on its own task until `cancel` fires.
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(cancel))
    }

    pub async fn run(self, cancel: CancellationToken) {
        tracing::info!(
            commands = self.vocabulary.bindings().len(),
            "Command listener started"
        );

        loop {
            let outcome = tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                outcome = self.step() => outcome,
            };

            // Back off instead of spinning on a busy session or a broken mic.
            if matches!(outcome, ListenOutcome::Busy | ListenOutcome::Failed) {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    () = tokio::time::sleep(self.poll_interval) => {}
                }
            }
        }

        tracing::info!("Command listener stopped");
    }

    /// Run a single iteration: check busy, listen once, dispatch a match.
    pub async fn step(&self) -> ListenOutcome {
        if self.session.is_busy() || self.echo_gate.is_held() {
            return ListenOutcome::Busy;
        }

        let heard = match self.listener.listen(self.listen_timeout).await {
            Ok(text) => text,
            Err(ListenError::Timeout | ListenError::Unrecognized) => return ListenOutcome::Silent,
            Err(e) => {
                tracing::warn!(error = %e, "Ambient listening failed");
                return ListenOutcome::Failed;
            }
        };

        let text = heard.to_lowercase();
        tracing::info!(text = %text, "Voice command heard");

        let Some(binding) = self.vocabulary.match_utterance(&text) else {
            tracing::debug!("No command matched");
            return ListenOutcome::Unmatched;
        };
        let operation = binding.operation;

        match self.session.dispatch(operation).await {
            Ok(()) => ListenOutcome::Dispatched(operation),
            Err(SessionError::AlreadyBusy) => {
                tracing::debug!(%operation, "Voice command ignored: workflow in progress");
                ListenOutcome::Rejected(operation)
            }
            Err(SessionError::InoperableState) => {
                tracing::info!(%operation, "Voice command ignored: session is off");
                ListenOutcome::Rejected(operation)
            }
            Err(e) => {
                tracing::warn!(%operation, error = %e, "Voice command failed");
                ListenOutcome::Rejected(operation)
            }
        }
    }
}

impl std::fmt::Debug for CommandListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandListener")
            .field("vocabulary", &self.vocabulary)
            .field("listen_timeout", &self.listen_timeout)
            .field("poll_interval", &self.poll_interval)
            .finish_non_exhaustive()
    }
}
