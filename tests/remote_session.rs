//! Integration tests for the connection lifecycle against a mock player.

use std::time::Duration;

use remotewire::{
    Command,
    Remote,
    RemoteConfig,
    RemoteEvent,
    codec::encode_length_header,
    message::{Message, RequestConnect, Volume},
};
use remotewire_testing::MockPlayer;
use tokio::net::TcpListener;

mod common;
use common::{TestResult, next_event, synced_session, wait_for};

#[tokio::test]
#[expect(
    clippy::panic_in_result_fn,
    reason = "asserts provide clearer diagnostics in tests"
)]
async fn connect_authenticates_and_reports_sync() -> TestResult {
    let player = MockPlayer::bind().await?;
    let (remote, mut events) = Remote::spawn(RemoteConfig::default());
    let session = player.session("den").with_auth_code(1234);
    remote.connect(session.clone())?;

    let mut peer = player.accept().await?;
    assert_eq!(
        peer.recv().await?,
        Some(Message::Connect(RequestConnect {
            auth_code: Some(1234)
        }))
    );
    assert_eq!(
        next_event(&mut events).await?,
        RemoteEvent::TransportConnected { session }
    );

    peer.send(Message::FirstDataSentComplete).await?;
    assert_eq!(next_event(&mut events).await?, RemoteEvent::Connected);

    remote.disconnect()?;
    assert_eq!(
        next_event(&mut events).await?,
        RemoteEvent::Disconnected { reason: None }
    );
    assert!(peer.closed().await, "remote should close the socket");

    remote.shutdown().await?;
    Ok(())
}

#[tokio::test]
#[expect(
    clippy::panic_in_result_fn,
    reason = "asserts provide clearer diagnostics in tests"
)]
async fn refused_connection_reports_error_and_disconnect() -> TestResult {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);

    let (remote, mut events) = Remote::spawn(RemoteConfig::default());
    remote.connect(remotewire::ConnectionSession::new(
        "gone",
        addr.ip().to_string(),
        addr.port(),
    ))?;

    assert!(matches!(
        next_event(&mut events).await?,
        RemoteEvent::ConnectionError(_)
    ));
    assert_eq!(
        next_event(&mut events).await?,
        RemoteEvent::Disconnected { reason: None }
    );

    remote.shutdown().await?;
    Ok(())
}

#[tokio::test]
#[expect(
    clippy::panic_in_result_fn,
    reason = "asserts provide clearer diagnostics in tests"
)]
async fn oversized_frame_closes_connection() -> TestResult {
    let mut session = synced_session(RemoteConfig::default()).await?;

    let declared = u32::try_from(remotewire::codec::MAX_ENVELOPE_LENGTH + 1)?;
    session.peer.send_raw(&encode_length_header(declared)).await?;

    assert!(matches!(
        next_event(&mut session.events).await?,
        RemoteEvent::ConnectionError(_)
    ));
    assert!(matches!(
        next_event(&mut session.events).await?,
        RemoteEvent::Disconnected { .. }
    ));
    assert!(session.peer.closed().await);

    session.remote.shutdown().await?;
    Ok(())
}

#[tokio::test]
#[expect(
    clippy::panic_in_result_fn,
    reason = "asserts provide clearer diagnostics in tests"
)]
async fn malformed_payload_is_skipped() -> TestResult {
    let mut session = synced_session(RemoteConfig::default()).await?;

    let garbage = [0xFF_u8, 0xFF, 0xFF];
    let mut frame = encode_length_header(3).to_vec();
    frame.extend_from_slice(&garbage);
    session.peer.send_raw(&frame).await?;
    session
        .peer
        .send(Message::SetVolume(Volume { volume: 30 }))
        .await?;

    assert_eq!(
        next_event(&mut session.events).await?,
        RemoteEvent::VolumeChanged(30)
    );

    session.remote.shutdown().await?;
    Ok(())
}

#[tokio::test]
#[expect(
    clippy::panic_in_result_fn,
    reason = "asserts provide clearer diagnostics in tests"
)]
async fn commands_reach_the_player_in_order() -> TestResult {
    let mut session = synced_session(RemoteConfig::default()).await?;

    session.remote.set_volume(55)?;
    session.remote.send(Command::RequestAllPlaylists)?;
    session.remote.send(Command::RequestSavedRadios)?;

    assert_eq!(
        session.peer.recv().await?,
        Some(Message::SetVolume(Volume { volume: 55 }))
    );
    assert!(matches!(
        session.peer.recv().await?,
        Some(Message::RequestPlaylists(request)) if request.include_closed
    ));
    assert_eq!(session.peer.recv().await?, Some(Message::RequestSavedRadios));

    session.remote.shutdown().await?;
    Ok(())
}

#[tokio::test]
#[expect(
    clippy::panic_in_result_fn,
    reason = "asserts provide clearer diagnostics in tests"
)]
async fn peer_close_resets_and_allows_reconnect() -> TestResult {
    let session = synced_session(RemoteConfig::default()).await?;
    let common::Session {
        remote,
        mut events,
        peer,
        player,
    } = session;
    drop(peer);

    assert_eq!(
        wait_for(&mut events, |event| matches!(event, RemoteEvent::Disconnected { .. })).await?,
        RemoteEvent::Disconnected { reason: None }
    );

    remote.connect(player.session("again"))?;
    let mut peer = player.accept().await?;
    assert!(matches!(peer.recv().await?, Some(Message::Connect(_))));

    remote.shutdown().await?;
    Ok(())
}

#[tokio::test]
#[expect(
    clippy::panic_in_result_fn,
    reason = "asserts provide clearer diagnostics in tests"
)]
async fn connect_times_out() -> TestResult {
    // A non-routable address keeps the SYN unanswered.
    let config = RemoteConfig::default().connect_timeout(Duration::from_millis(100));
    let (remote, mut events) = Remote::spawn(config);
    remote.connect(remotewire::ConnectionSession::new("void", "10.255.255.1", 5500))?;

    let event = next_event(&mut events).await?;
    assert!(
        matches!(&event, RemoteEvent::ConnectionError(message) if !message.is_empty()),
        "unexpected event: {event:?}"
    );
    assert!(matches!(
        next_event(&mut events).await?,
        RemoteEvent::Disconnected { .. }
    ));

    remote.shutdown().await?;
    Ok(())
}
