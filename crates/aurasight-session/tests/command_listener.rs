//! Integration tests for the background command listener.

mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use aurasight_core::{Operation, Phase, SessionEvent, SessionSettings, Status};
use aurasight_session::adapters::ChannelListener;
use aurasight_session::{CommandListener, ListenOutcome, Vocabulary};
use common::{CountingListener, Rig};
use tokio_util::sync::CancellationToken;

fn settings() -> SessionSettings {
    SessionSettings {
        listen_timeout_secs: 1.0,
        busy_poll_interval_ms: 100,
        ..Default::default()
    }
}

#[tokio::test(start_paused = true)]
async fn no_listening_while_busy_then_resumes() {
    let rig = Rig::with_settings(&settings());
    let counting = Arc::new(CountingListener::default());

    rig.capture.hold_audio.store(true, Ordering::SeqCst);
    rig.session.start().unwrap();
    rig.wait_for_phase(Phase::Listening).await;

    let cancel = CancellationToken::new();
    let task = CommandListener::new(
        rig.session.clone(),
        counting.clone(),
        Vocabulary::builtin(),
        &settings(),
    )
    .spawn(cancel.clone());

    tokio::time::sleep(Duration::from_secs(3)).await;
    assert_eq!(counting.calls(), 0);

    rig.capture.release();
    rig.session.join_workflow().await;

    // Still gated while the response plays.
    assert!(rig.session.is_playing());
    assert_eq!(counting.calls(), 0);

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert!(!rig.session.is_playing());
    assert!(counting.calls() > 0);

    cancel.cancel();
    task.await.unwrap();
}

#[tokio::test]
async fn step_reports_busy_without_listening() {
    let rig = Rig::with_settings(&settings());
    let counting = Arc::new(CountingListener::default());
    let listener = CommandListener::new(
        rig.session.clone(),
        counting.clone(),
        Vocabulary::builtin(),
        &settings(),
    );

    rig.capture.hold_audio.store(true, Ordering::SeqCst);
    rig.session.start().unwrap();

    assert_eq!(listener.step().await, ListenOutcome::Busy);
    assert_eq!(counting.calls(), 0);

    rig.capture.release();
    rig.session.join_workflow().await;
}

#[tokio::test(start_paused = true)]
async fn utterances_dispatch_through_the_session() {
    let mut rig = Rig::with_settings(&settings());
    let (ambient, say) = ChannelListener::new();
    let listener = CommandListener::new(
        rig.session.clone(),
        Arc::new(ambient),
        Vocabulary::builtin(),
        &settings(),
    );

    say.send("Please STOP now".into()).unwrap();
    assert_eq!(
        listener.step().await,
        ListenOutcome::Dispatched(Operation::Stop)
    );
    assert!(
        rig.drain()
            .iter()
            .any(|e| matches!(e, SessionEvent::Status(Status::Stopped)))
    );

    say.send("what a nice day".into()).unwrap();
    assert_eq!(listener.step().await, ListenOutcome::Unmatched);

    assert_eq!(listener.step().await, ListenOutcome::Silent);

    say.send("ok".into()).unwrap();
    assert_eq!(
        listener.step().await,
        ListenOutcome::Dispatched(Operation::Off)
    );
    assert!(!rig.session.is_enabled());

    say.send("start".into()).unwrap();
    assert_eq!(
        listener.step().await,
        ListenOutcome::Rejected(Operation::Start)
    );

    say.send("restart".into()).unwrap();
    assert_eq!(
        listener.step().await,
        ListenOutcome::Dispatched(Operation::Reset)
    );
    assert!(rig.session.is_enabled());
}

#[tokio::test(start_paused = true)]
async fn voice_start_runs_a_workflow() {
    let rig = Rig::with_settings(&settings());
    let (ambient, say) = ChannelListener::new();
    let listener = CommandListener::new(
        rig.session.clone(),
        Arc::new(ambient),
        Vocabulary::builtin(),
        &settings(),
    );

    rig.perception.queue_transcript("what is this");
    say.send("start".into()).unwrap();
    assert_eq!(
        listener.step().await,
        ListenOutcome::Dispatched(Operation::Start)
    );

    rig.session.join_workflow().await;
    assert_eq!(rig.output.plays(), 1);
}

#[tokio::test(start_paused = true)]
async fn backend_errors_never_stop_the_loop() {
    let rig = Rig::with_settings(&settings());
    let failing = Arc::new(CountingListener::default());
    failing.fail.store(true, Ordering::SeqCst);

    let cancel = CancellationToken::new();
    let task = CommandListener::new(
        rig.session.clone(),
        failing.clone(),
        Vocabulary::builtin(),
        &settings(),
    )
    .spawn(cancel.clone());

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(failing.calls() > 3);
    assert!(!task.is_finished());

    cancel.cancel();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn custom_vocabulary_replaces_builtin() {
    let rig = Rig::with_settings(&settings());
    let (ambient, say) = ChannelListener::new();
    let vocabulary = Vocabulary::new([aurasight_core::CommandBinding::new(
        "look",
        Operation::Start,
    )]);
    let listener = CommandListener::new(
        rig.session.clone(),
        Arc::new(ambient),
        vocabulary,
        &settings(),
    );

    say.send("stop".into()).unwrap();
    assert_eq!(listener.step().await, ListenOutcome::Unmatched);

    say.send("look at this".into()).unwrap();
    assert_eq!(
        listener.step().await,
        ListenOutcome::Dispatched(Operation::Start)
    );
    rig.session.join_workflow().await;
}
