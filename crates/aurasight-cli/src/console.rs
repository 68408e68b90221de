//! Interactive console: the presentation layer of `aurasight run`.
//!
//! Each stdin line is an operation name, `say <text>` (speak to the command
//! listener), `answer <text>` (what the next recorded question will
//! transcribe to), `help` or `quit`. Session events are printed as status
//! lines as they arrive.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use aurasight_core::{
    AudioOutput, Operation, ParseOperationError, SessionError, SessionEvent, SessionSettings,
};
use aurasight_session::adapters::{
    ChannelListener, SimulatedCapture, SimulatedPerception, SimulatedSynthesis,
};
use aurasight_session::{CommandListener, Session, SessionGateways, Vocabulary};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;

/// One parsed console line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Operation(Operation),
    Say(String),
    Answer(String),
    Help,
    Quit,
}

/// Parse a console line. Blank lines parse to `None`.
pub fn parse_line(line: &str) -> Result<Option<ConsoleCommand>, ParseOperationError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (head, rest) = line
        .split_once(char::is_whitespace)
        .map_or((line, ""), |(head, rest)| (head, rest.trim()));

    let command = match head.to_lowercase().as_str() {
        "say" => ConsoleCommand::Say(rest.to_string()),
        "answer" => ConsoleCommand::Answer(rest.to_string()),
        "help" | "?" => ConsoleCommand::Help,
        "quit" | "exit" => ConsoleCommand::Quit,
        _ => ConsoleCommand::Operation(Operation::from_str(line)?),
    };
    Ok(Some(command))
}

/// Status line for `event`, if it is worth printing.
pub fn render_event(event: &SessionEvent) -> Option<String> {
    match event {
        SessionEvent::Status(status) => Some(format!("[status] {status}")),
        SessionEvent::ImageReady(image) => Some(format!(
            "[image]  {}x{} {:?} ({} bytes)",
            image.width,
            image.height,
            image.format,
            image.byte_len()
        )),
        SessionEvent::Error { operation, message } => {
            Some(format!("[error]  {operation} failed: {message}"))
        }
        SessionEvent::EnabledChanged(false) => {
            Some("Session is off. Type `reset` to resume.".to_string())
        }
        SessionEvent::EnabledChanged(true) => Some(help_text(true)),
        SessionEvent::PhaseChanged(phase) => {
            tracing::debug!(%phase, "Phase changed");
            None
        }
    }
}

/// Commands available in the current state.
pub fn help_text(enabled: bool) -> String {
    if !enabled {
        return "Commands: reset, quit".to_string();
    }
    "Commands: start, stop, followup, clear, off, reset, \
     say <utterance>, answer <question>, help, quit"
        .to_string()
}

#[cfg(feature = "local-audio")]
fn audio_output() -> anyhow::Result<Arc<dyn AudioOutput>> {
    let output = aurasight_session::adapters::RodioOutput::new()
        .context("Failed to open the default audio output device")?;
    Ok(Arc::new(output))
}

#[cfg(not(feature = "local-audio"))]
#[allow(clippy::unnecessary_wraps)]
fn audio_output() -> anyhow::Result<Arc<dyn AudioOutput>> {
    Ok(Arc::new(aurasight_session::adapters::SimulatedOutput::new()))
}

/// Run a session with the console attached until `quit`, EOF or Ctrl-C.
pub async fn run_console(settings: &SessionSettings) -> anyhow::Result<()> {
    let perception = Arc::new(SimulatedPerception::new());
    let gateways = SessionGateways {
        capture: Arc::new(SimulatedCapture::new()),
        perception: perception.clone(),
        synthesis: Arc::new(SimulatedSynthesis::new()),
        output: audio_output()?,
    };
    let (session, mut events) = Session::new(gateways, settings);

    let renderer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            if let Some(line) = render_event(&event) {
                println!("{line}");
            }
        }
    });

    let cancel = CancellationToken::new();
    let (ambient, say_tx) = ChannelListener::new();
    let listener_task = settings.listener_enabled.then(|| {
        CommandListener::new(
            session.clone(),
            Arc::new(ambient),
            Vocabulary::from_settings(settings.vocabulary.as_deref()),
            settings,
        )
        .spawn(cancel.clone())
    });

    tracing::info!(
        listener = settings.listener_enabled,
        record_secs = settings.record_duration_secs,
        "Session ready"
    );
    println!("{}", help_text(true));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            line = lines.next_line() => line.context("Failed to read from stdin")?,
        };
        // EOF
        let Some(line) = line else { break };

        let command = match parse_line(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                println!("{e}. Type `help` for commands.");
                continue;
            }
        };

        match command {
            ConsoleCommand::Quit => break,
            ConsoleCommand::Help => println!("{}", help_text(session.is_enabled())),
            ConsoleCommand::Answer(text) => perception.queue_transcript(text),
            ConsoleCommand::Say(text) => {
                if listener_task.is_none() {
                    println!("Voice commands are disabled.");
                } else if say_tx.send(text).is_err() {
                    tracing::warn!("Command listener is gone");
                }
            }
            ConsoleCommand::Operation(operation) => match session.dispatch(operation).await {
                Ok(()) => {}
                Err(SessionError::AlreadyBusy) => {
                    println!("Still working on the last question.");
                }
                Err(SessionError::InoperableState) => {
                    println!("Session is off. Type `reset` to resume.");
                }
                Err(e) => println!("{operation} failed: {e}"),
            },
        }
    }

    cancel.cancel();
    if session.is_enabled() {
        session.stop()?;
    }
    session.join_workflow().await;
    if let Some(task) = listener_task {
        task.await.context("Command listener task failed")?;
    }

    drop(session);
    // Let queued status lines flush.
    let _ = tokio::time::timeout(Duration::from_millis(200), renderer).await;

    tracing::info!("Session closed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use aurasight_core::{Image, ImageFormat, Status};

    #[test]
    fn test_parse_operations() {
        assert_eq!(
            parse_line("start").unwrap(),
            Some(ConsoleCommand::Operation(Operation::Start))
        );
        assert_eq!(
            parse_line("  Clear ").unwrap(),
            Some(ConsoleCommand::Operation(Operation::ClearHistory))
        );
        assert_eq!(
            parse_line("follow up").unwrap(),
            Some(ConsoleCommand::Operation(Operation::Followup))
        );
        assert!(parse_line("dance").is_err());
    }

    #[test]
    fn test_parse_text_commands() {
        assert_eq!(
            parse_line("say   please stop now").unwrap(),
            Some(ConsoleCommand::Say("please stop now".to_string()))
        );
        assert_eq!(
            parse_line("answer what color is this").unwrap(),
            Some(ConsoleCommand::Answer("what color is this".to_string()))
        );
        assert_eq!(parse_line("quit").unwrap(), Some(ConsoleCommand::Quit));
        assert_eq!(parse_line("   ").unwrap(), None);
    }

    #[test]
    fn test_render_events() {
        assert_eq!(
            render_event(&SessionEvent::Status(Status::Thinking)).as_deref(),
            Some("[status] Thinking...")
        );

        let image = Image::new(2, 2, ImageFormat::Rgb8, vec![0u8; 12]);
        let line = render_event(&SessionEvent::ImageReady(image)).unwrap();
        assert!(line.contains("2x2"));
        assert!(line.contains("12 bytes"));

        let error = SessionEvent::Error {
            operation: Operation::Start,
            message: "Camera unavailable: busy".to_string(),
        };
        assert_eq!(
            render_event(&error).as_deref(),
            Some("[error]  start failed: Camera unavailable: busy")
        );

        assert!(render_event(&SessionEvent::PhaseChanged(aurasight_core::Phase::Idle)).is_none());
    }

    #[test]
    fn test_disabled_help_only_offers_reset() {
        let help = help_text(false);
        assert!(help.contains("reset"));
        assert!(!help.contains("start"));
        assert!(help_text(true).contains("followup"));
    }
}
