//! Sans-io connection state machine.
//!
//! [`ConnectionMachine`] never touches a socket. Every input (transport
//! notification, decoded frame, user command) returns [`Effects`]: messages
//! to write, events to publish, and whether the socket must be closed. The
//! runtime applies them in that order.

use std::{io, path::PathBuf};

use tracing::{debug, info, warn};

use super::{ConnectionState, PlayerState};
use crate::{
    config::RemoteConfig,
    download::{CancelHandle, DownloadCoordinator, DownloadFs, LibraryChunkReceiver, LocalFs},
    event::RemoteEvent,
    message::{Envelope, Message, RequestConnect, WireFormat},
    metrics::{self, ErrorKind},
    session::ConnectionSession,
};

/// Work produced by one input to the [`ConnectionMachine`].
#[derive(Debug, Default, PartialEq)]
pub struct Effects {
    /// Messages to write, in order.
    pub outbound: Vec<Message>,
    /// Events to publish, in order.
    pub events: Vec<RemoteEvent>,
    /// Close the socket once `outbound` has been written.
    pub close: bool,
}

impl Effects {
    pub(crate) fn event(&mut self, event: RemoteEvent) { self.events.push(event); }

    /// Merge `other` after the effects already collected.
    pub fn extend(&mut self, other: Self) {
        self.outbound.extend(other.outbound);
        self.events.extend(other.events);
        self.close |= other.close;
    }
}

/// Protocol state for one remote connection at a time.
pub struct ConnectionMachine<F: DownloadFs + Clone = LocalFs> {
    pub(super) state: ConnectionState,
    pub(super) session: Option<ConnectionSession>,
    pub(super) player: PlayerState,
    pub(super) disconnect_reason: Option<String>,
    pub(super) downloads: DownloadCoordinator<F>,
    pub(super) library: LibraryChunkReceiver<F>,
    pub(super) download_dir: PathBuf,
}

impl ConnectionMachine {
    /// Machine writing downloads to the local filesystem.
    #[must_use]
    pub fn new(config: &RemoteConfig) -> Self { Self::with_fs(LocalFs, config) }
}

impl<F: DownloadFs + Clone> ConnectionMachine<F> {
    /// Machine writing downloads through `fs`.
    pub fn with_fs(fs: F, config: &RemoteConfig) -> Self {
        let attempts = config.write_retry_limit_value();
        let download_dir = config.download_dir_value().to_path_buf();
        Self {
            state: ConnectionState::Disconnected,
            session: None,
            player: PlayerState::default(),
            disconnect_reason: None,
            downloads: DownloadCoordinator::new(
                fs.clone(),
                download_dir.clone(),
                config.overwrite_downloads_value(),
                attempts,
            ),
            library: LibraryChunkReceiver::new(fs, config.library_dir_value().to_path_buf(), attempts),
            download_dir,
        }
    }

    #[must_use]
    pub const fn state(&self) -> ConnectionState { self.state }

    #[must_use]
    pub fn player(&self) -> &PlayerState { &self.player }

    #[must_use]
    pub fn session(&self) -> Option<&ConnectionSession> { self.session.as_ref() }

    /// Reason the player gave for closing the session, if any.
    #[must_use]
    pub fn disconnect_reason(&self) -> Option<&str> { self.disconnect_reason.as_deref() }

    /// Handle for cancelling song downloads from another task.
    #[must_use]
    pub fn cancel_handle(&self) -> CancelHandle { self.downloads.cancel_handle() }

    /// Start a connection attempt to `session`.
    ///
    /// State from any previous connection is discarded first.
    pub fn begin_connect(&mut self, session: ConnectionSession) -> Effects {
        self.clear_session_state();
        info!(session = %session.name, addr = %session.address(), "connecting");
        self.library.set_session(session.name.clone());
        self.session = Some(session);
        self.state = ConnectionState::Connecting;
        Effects::default()
    }

    /// The TCP connection is established: authenticate.
    pub fn on_transport_connected(&mut self) -> Effects {
        let mut fx = Effects::default();
        let Some(session) = self.session.clone() else {
            warn!("transport connected without a session");
            fx.close = true;
            return fx;
        };
        self.state = ConnectionState::AwaitingSync;
        metrics::inc_connections();
        self.send(
            &mut fx,
            Message::Connect(RequestConnect {
                auth_code: session.auth_code,
            }),
        );
        fx.event(RemoteEvent::TransportConnected { session });
        fx
    }

    /// The connection attempt failed or timed out.
    pub fn on_connect_failed(&mut self, message: String) -> Effects {
        warn!(error = %message, "connection attempt failed");
        metrics::inc_errors(ErrorKind::Transport);
        let mut fx = Effects::default();
        fx.event(RemoteEvent::ConnectionError(message));
        fx.extend(self.finish_disconnect(false));
        fx
    }

    /// A socket error on an established connection.
    ///
    /// Only a refused-class error closes the socket; other errors are
    /// reported and left to the peer's close or an explicit disconnect.
    pub fn on_transport_error(&mut self, error: &io::Error) -> Effects {
        warn!(error = %error, kind = ?error.kind(), "transport error");
        metrics::inc_errors(ErrorKind::Transport);
        let mut fx = Effects::default();
        fx.event(RemoteEvent::ConnectionError(error.to_string()));
        if error.kind() == io::ErrorKind::ConnectionRefused {
            self.disconnect_reason = Some(error.to_string());
            fx.extend(self.begin_disconnect());
        }
        fx
    }

    /// The stream violated the framing rules.
    pub fn on_framing_error(&mut self, message: String) -> Effects {
        warn!(error = %message, "corrupted stream");
        metrics::inc_errors(ErrorKind::Framing);
        let mut fx = Effects::default();
        fx.event(RemoteEvent::ConnectionError(message));
        fx.extend(self.begin_disconnect());
        fx
    }

    /// Decode and dispatch one envelope payload.
    ///
    /// Undecodable payloads are logged and dropped.
    pub fn on_frame(&mut self, payload: &[u8]) -> Effects {
        let mut fx = Effects::default();
        metrics::inc_frames(metrics::Direction::Inbound);
        match Envelope::from_bytes(payload) {
            Ok(envelope) => {
                debug!(
                    msg_type = %envelope.message.msg_type(),
                    version = envelope.version,
                    "message received"
                );
                self.dispatch(envelope.message, &mut fx);
            }
            Err(err) => {
                warn!(length = payload.len(), error = %err, "dropping undecodable envelope");
                metrics::inc_errors(ErrorKind::Decode);
            }
        }
        fx
    }

    /// Ask the runtime to close the socket.
    pub fn begin_disconnect(&mut self) -> Effects {
        if matches!(
            self.state,
            ConnectionState::Disconnected | ConnectionState::Disconnecting
        ) {
            return Effects::default();
        }
        info!(state = %self.state, "disconnecting");
        self.state = ConnectionState::Disconnecting;
        Effects {
            close: true,
            ..Effects::default()
        }
    }

    /// The socket is gone: clear all session state.
    pub fn on_closed(&mut self) -> Effects {
        let was_connected = self.state.is_connected() || self.state == ConnectionState::Disconnecting;
        self.finish_disconnect(was_connected)
    }

    fn finish_disconnect(&mut self, was_connected: bool) -> Effects {
        if self.state == ConnectionState::Disconnected && self.session.is_none() {
            return Effects::default();
        }
        if was_connected {
            metrics::dec_connections();
        }
        let reason = self.disconnect_reason.take();
        info!(reason = reason.as_deref().unwrap_or("none"), "disconnected");
        self.clear_session_state();
        self.session = None;
        self.state = ConnectionState::Disconnected;
        let mut fx = Effects::default();
        fx.event(RemoteEvent::Disconnected { reason });
        fx
    }

    fn clear_session_state(&mut self) {
        self.player.reset();
        self.downloads.reset();
        self.library.reset();
        self.disconnect_reason = None;
    }

    /// Queue `message` if the connection can carry it.
    pub(super) fn send(&self, fx: &mut Effects, message: Message) {
        if !self.state.is_connected() {
            debug!(
                msg_type = %message.msg_type(),
                state = %self.state,
                "dropping outbound message while not connected"
            );
            return;
        }
        fx.outbound.push(message);
    }
}

#[cfg(test)]
#[path = "machine_tests.rs"]
mod tests;
