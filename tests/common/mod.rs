//! Shared utilities for integration tests.

#![allow(
    dead_code,
    reason = "shared test utilities are not used by all test binaries"
)]

use std::{io, time::Duration};

use remotewire::{
    Remote,
    RemoteConfig,
    RemoteEvent,
    message::{Message, RequestConnect},
};
use remotewire_testing::{MockPlayer, PlayerPeer};
use tokio::{sync::mpsc::UnboundedReceiver, time::timeout};

pub type TestResult<T = ()> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

const EVENT_TIMEOUT: Duration = Duration::from_secs(5);

/// Next event, failing the test after a timeout.
pub async fn next_event(events: &mut UnboundedReceiver<RemoteEvent>) -> TestResult<RemoteEvent> {
    let event = timeout(EVENT_TIMEOUT, events.recv())
        .await
        .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "no event"))?;
    event.ok_or_else(|| "event channel closed".into())
}

/// Skip events until one matches `pred`.
pub async fn wait_for(
    events: &mut UnboundedReceiver<RemoteEvent>,
    pred: impl Fn(&RemoteEvent) -> bool,
) -> TestResult<RemoteEvent> {
    loop {
        let event = next_event(events).await?;
        if pred(&event) {
            return Ok(event);
        }
    }
}

/// A remote connected to a mock player that has completed the initial sync.
pub struct Session {
    pub remote: Remote,
    pub events: UnboundedReceiver<RemoteEvent>,
    pub peer: PlayerPeer,
    pub player: MockPlayer,
}

/// Spawn a remote with `config`, connect it and finish the initial sync.
#[expect(
    clippy::panic_in_result_fn,
    reason = "asserts provide clearer diagnostics in tests"
)]
pub async fn synced_session(config: RemoteConfig) -> TestResult<Session> {
    let player = MockPlayer::bind().await?;
    let (remote, mut events) = Remote::spawn(config);
    remote.connect(player.session("test"))?;
    let mut peer = player.accept().await?;

    assert_eq!(
        peer.recv().await?,
        Some(Message::Connect(RequestConnect { auth_code: None }))
    );
    peer.send(Message::FirstDataSentComplete).await?;
    wait_for(&mut events, |event| *event == RemoteEvent::Connected).await?;

    Ok(Session {
        remote,
        events,
        peer,
        player,
    })
}
