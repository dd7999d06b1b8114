//! Async driver for [`ConnectionMachine`].
//!
//! The worker owns the socket and runs a biased `tokio::select!` loop over
//! shutdown, user commands and inbound frames, in that priority order.
//! Everything protocol-related is delegated to the machine; this module only
//! moves bytes and applies [`Effects`].

use std::{io, net::SocketAddr};

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use tokio::{
    net::{TcpSocket, TcpStream, lookup_host},
    sync::mpsc,
    time::timeout,
};
use tokio_util::{codec::Framed, sync::CancellationToken};
use tracing::{Instrument, debug, info_span, warn};

use super::{Command, ConnectionMachine, Effects};
use crate::{
    codec::{CodecError, EnvelopeCodec, RecoveryPolicy},
    config::RemoteConfig,
    event::RemoteEvent,
    message::{Envelope, Message, WireFormat},
    metrics::{self, Direction},
    session::ConnectionSession,
};

type Transport = Framed<TcpStream, EnvelopeCodec>;

/// One wake-up of the session loop.
enum Wake {
    Shutdown,
    Command(Option<Command>),
    Frame(Option<Result<Bytes, CodecError>>),
}

/// What the worker does once a session ends.
enum Next {
    Idle,
    Reconnect(ConnectionSession),
    Exit,
}

/// Connection worker task.
pub(crate) struct Worker {
    config: RemoteConfig,
    machine: ConnectionMachine,
    commands: mpsc::UnboundedReceiver<Command>,
    events: mpsc::UnboundedSender<RemoteEvent>,
    shutdown: CancellationToken,
}

impl Worker {
    pub(crate) fn new(
        config: RemoteConfig,
        machine: ConnectionMachine,
        commands: mpsc::UnboundedReceiver<Command>,
        events: mpsc::UnboundedSender<RemoteEvent>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            config,
            machine,
            commands,
            events,
            shutdown,
        }
    }

    /// Serve commands until shutdown or until every command sender is gone.
    pub(crate) async fn run(mut self) {
        let mut pending = None;
        loop {
            let session = match pending.take() {
                Some(session) => session,
                None => match self.idle().await {
                    Some(session) => session,
                    None => break,
                },
            };

            let span = info_span!(
                "remote.connect",
                session.name = %session.name,
                peer.addr = %session.address()
            );
            let Some(transport) = self.connect(session).instrument(span).await else {
                continue;
            };

            let span = info_span!("remote.session");
            match self.serve(transport).instrument(span).await {
                Next::Idle => {}
                Next::Reconnect(session) => pending = Some(session),
                Next::Exit => break,
            }
        }
        debug!("connection worker stopped");
    }

    /// Wait for a connect request while no connection is up.
    async fn idle(&mut self) -> Option<ConnectionSession> {
        loop {
            let command = tokio::select! {
                biased;

                () = self.shutdown.cancelled() => return None,
                command = self.commands.recv() => command?,
            };
            match command {
                Command::Connect(session) => return Some(session),
                Command::Disconnect => debug!("already disconnected"),
                other => {
                    let fx = self.machine.handle(other);
                    self.publish(fx.events);
                }
            }
        }
    }

    async fn connect(&mut self, session: ConnectionSession) -> Option<Transport> {
        let address = session.address();
        let fx = self.machine.begin_connect(session);
        self.publish(fx.events);

        let limit = self.config.connect_timeout_value();
        let stream = match timeout(limit, open(&self.config, &address)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(err)) => {
                let fx = self.machine.on_connect_failed(err.to_string());
                self.publish(fx.events);
                return None;
            }
            Err(_) => {
                let fx = self.machine.on_connect_failed(format!(
                    "Unable to connect to {address} within {} ms",
                    limit.as_millis()
                ));
                self.publish(fx.events);
                return None;
            }
        };

        let mut transport = Framed::new(
            stream,
            EnvelopeCodec::new(self.config.max_envelope_length_value()),
        );
        let fx = self.machine.on_transport_connected();
        if !self.apply(&mut transport, fx).await {
            self.teardown(transport).await;
            return None;
        }
        Some(transport)
    }

    async fn serve(&mut self, mut transport: Transport) -> Next {
        loop {
            let wake = tokio::select! {
                biased;

                () = self.shutdown.cancelled() => Wake::Shutdown,
                command = self.commands.recv() => Wake::Command(command),
                frame = transport.next() => Wake::Frame(frame),
            };

            let fx = match wake {
                Wake::Shutdown | Wake::Command(None) => {
                    self.disconnect(transport).await;
                    return Next::Exit;
                }
                Wake::Command(Some(Command::Connect(session))) => {
                    self.disconnect(transport).await;
                    return Next::Reconnect(session);
                }
                Wake::Command(Some(Command::Disconnect)) => {
                    self.disconnect(transport).await;
                    return Next::Idle;
                }
                Wake::Command(Some(command)) => self.machine.handle(command),
                Wake::Frame(Some(Ok(payload))) => self.machine.on_frame(&payload),
                Wake::Frame(Some(Err(err))) => self.on_codec_error(err),
                Wake::Frame(None) => {
                    debug!("peer closed the connection");
                    self.teardown(transport).await;
                    return Next::Idle;
                }
            };

            if !self.apply(&mut transport, fx).await {
                self.teardown(transport).await;
                return Next::Idle;
            }
        }
    }

    fn on_codec_error(&mut self, err: CodecError) -> Effects {
        if err.default_recovery_policy() == RecoveryPolicy::Drop {
            warn!(error = %err, error_type = err.error_type(), "dropping envelope");
            return Effects::default();
        }
        match err {
            CodecError::Io(io_err) => self.machine.on_transport_error(&io_err),
            other => self.machine.on_framing_error(other.to_string()),
        }
    }

    /// Write outbound messages, then publish events.
    ///
    /// Returns `false` when the socket must be closed.
    async fn apply(&mut self, transport: &mut Transport, fx: Effects) -> bool {
        for message in fx.outbound {
            if let Err(err) = write(transport, message).await {
                let failed = self.machine.on_transport_error(&err);
                self.publish(fx.events);
                self.publish(failed.events);
                self.machine.begin_disconnect();
                return false;
            }
        }
        self.publish(fx.events);
        !fx.close
    }

    async fn disconnect(&mut self, transport: Transport) {
        let fx = self.machine.begin_disconnect();
        self.publish(fx.events);
        self.teardown(transport).await;
    }

    /// Close the socket within the teardown bound, then clear session state.
    async fn teardown(&mut self, mut transport: Transport) {
        let limit = self.config.teardown_timeout_value();
        match timeout(limit, SinkExt::<Bytes>::close(&mut transport)).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => debug!(error = %err, "error while closing socket"),
            Err(_) => warn!(timeout_ms = limit.as_millis(), "socket teardown timed out"),
        }
        drop(transport);
        let fx = self.machine.on_closed();
        self.publish(fx.events);
    }

    fn publish(&self, events: Vec<RemoteEvent>) {
        for event in events {
            if self.events.send(event).is_err() {
                debug!("event receiver dropped");
                return;
            }
        }
    }
}

async fn open(config: &RemoteConfig, address: &str) -> io::Result<TcpStream> {
    let addr: SocketAddr = lookup_host(address).await?.next().ok_or_else(|| {
        io::Error::new(io::ErrorKind::AddrNotAvailable, format!("{address} did not resolve"))
    })?;
    let socket = if addr.is_ipv4() {
        TcpSocket::new_v4()?
    } else {
        TcpSocket::new_v6()?
    };
    config.apply_socket_options(&socket)?;
    socket.connect(addr).await
}

async fn write(transport: &mut Transport, message: Message) -> io::Result<()> {
    let msg_type = message.msg_type();
    let payload = Envelope::new(message)
        .to_bytes()
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
    transport.send(Bytes::from(payload)).await.map_err(io::Error::from)?;
    metrics::inc_frames(Direction::Outbound);
    debug!(%msg_type, "message sent");
    Ok(())
}
