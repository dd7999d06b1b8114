//! Events published by the connection worker.
//!
//! The worker is the only producer and the front end the only consumer.
//! Collections are sent as immutable snapshots that the consumer may keep
//! without copying.

use std::{path::PathBuf, sync::Arc};

use crate::{
    message::{EngineState, FileEntry, Playlist, RadioStream, RepeatMode, ShuffleMode, SongMetadata},
    session::ConnectionSession,
};

/// Notification sent from the connection worker to its consumer.
#[derive(Clone, Debug, PartialEq)]
pub enum RemoteEvent {
    /// The TCP connection is up and the `CONNECT` request has been sent.
    TransportConnected { session: ConnectionSession },
    /// The player finished its initial data sync.
    Connected,
    /// A connection attempt or an open connection reported an error.
    ConnectionError(String),
    /// The connection closed and all session state was cleared.
    Disconnected { reason: Option<String> },
    ServerInfo { version: String, state: EngineState },
    EngineStateChanged(EngineState),
    VolumeChanged(i32),
    ShuffleChanged(ShuffleMode),
    RepeatChanged(RepeatMode),
    /// Playback position of the active song, in seconds.
    TrackPosition(i32),
    /// `row` is the song's position in the displayed playlist, if present.
    ActiveSongChanged { row: Option<usize>, song: SongMetadata },
    PlaylistsChanged(Arc<[Playlist]>),
    SongsChanged { playlist_id: i32, songs: Arc<[SongMetadata]> },
    ActivePlaylistChanged(i32),
    RemoteFilesChanged { path: String, files: Arc<[FileEntry]> },
    RadioStreamsChanged(Arc<[RadioStream]>),
    /// Fraction of the current batch received, in `0.0..=1.0`.
    DownloadProgress(f64),
    DownloadComplete {
        completed: u32,
        total: u32,
        errors: Vec<String>,
    },
    /// Fraction of the library snapshot received, in `0.0..=1.0`.
    LibraryProgress(f64),
    /// A verified library snapshot is ready at `path`.
    LibraryDownloaded { path: PathBuf },
    LibraryFailed(String),
}
