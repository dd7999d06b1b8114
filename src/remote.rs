//! Front-end facing handle to the connection worker.
//!
//! [`Remote::spawn`] starts the worker on the current Tokio runtime and
//! returns the handle together with the receiving end of the event channel.
//! The handle is the only producer of [`Command`]s and the receiver the only
//! consumer of [`RemoteEvent`]s.

use thiserror::Error;
use tokio::{sync::mpsc, task::JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::{
    config::RemoteConfig,
    connection::{Command, ConnectionMachine, runtime::Worker},
    download::CancelHandle,
    event::RemoteEvent,
    message::EngineState,
    session::ConnectionSession,
};

/// Errors returned by [`Remote`].
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The worker has exited and no longer accepts commands.
    #[error("connection worker has stopped")]
    WorkerStopped,
    /// The worker task panicked or was aborted.
    #[error("connection worker failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Handle used to drive the remote player.
pub struct Remote {
    commands: mpsc::UnboundedSender<Command>,
    cancel: CancelHandle,
    shutdown: CancellationToken,
    worker: JoinHandle<()>,
}

impl Remote {
    /// Start a connection worker configured by `config`.
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn spawn(config: RemoteConfig) -> (Self, mpsc::UnboundedReceiver<RemoteEvent>) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let shutdown = CancellationToken::new();
        let machine = ConnectionMachine::new(&config);
        let cancel = machine.cancel_handle();
        let worker = Worker::new(config, machine, command_rx, event_tx, shutdown.clone());
        let remote = Self {
            commands: command_tx,
            cancel,
            shutdown,
            worker: tokio::spawn(worker.run()),
        };
        (remote, event_rx)
    }

    /// Queue `command` for the worker.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::WorkerStopped`] if the worker has exited.
    pub fn send(&self, command: Command) -> Result<(), RemoteError> {
        self.commands
            .send(command)
            .map_err(|_| RemoteError::WorkerStopped)
    }

    /// Connect to `session`, replacing any current connection.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::WorkerStopped`] if the worker has exited.
    pub fn connect(&self, session: ConnectionSession) -> Result<(), RemoteError> {
        self.send(Command::Connect(session))
    }

    /// Close the current connection.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::WorkerStopped`] if the worker has exited.
    pub fn disconnect(&self) -> Result<(), RemoteError> { self.send(Command::Disconnect) }

    /// # Errors
    ///
    /// Returns [`RemoteError::WorkerStopped`] if the worker has exited.
    pub fn set_engine_state(&self, state: EngineState) -> Result<(), RemoteError> {
        self.send(Command::SetEngineState(state))
    }

    /// # Errors
    ///
    /// Returns [`RemoteError::WorkerStopped`] if the worker has exited.
    pub fn set_volume(&self, volume: i32) -> Result<(), RemoteError> {
        self.send(Command::SetVolume(volume))
    }

    /// Ask the player for its library snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::WorkerStopped`] if the worker has exited.
    pub fn request_library(&self) -> Result<(), RemoteError> { self.send(Command::RequestLibrary) }

    /// Cancel the running song download.
    ///
    /// Takes effect at the next chunk boundary without waiting behind queued
    /// commands.
    pub fn cancel_download(&self) { self.cancel.cancel(); }

    /// Disconnect and wait for the worker to exit.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::Join`] if the worker panicked.
    pub async fn shutdown(self) -> Result<(), RemoteError> {
        self.shutdown.cancel();
        self.worker.await?;
        Ok(())
    }
}
