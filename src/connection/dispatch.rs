//! Routing of inbound messages.

use tracing::{debug, info, warn};

use super::{ConnectionMachine, ConnectionState, Effects};
use crate::{
    download::{DownloadFs, LibraryOutcome},
    event::RemoteEvent,
    message::{EngineState, Message, ResponseSongFileChunk, ResponseSongOffer},
};

impl<F: DownloadFs + Clone> ConnectionMachine<F> {
    pub(super) fn dispatch(&mut self, message: Message, fx: &mut Effects) {
        match message {
            Message::KeepAlive => debug!("keep alive"),
            Message::Disconnect(response) => {
                let reason = response.reason.text();
                info!(reason, "player closed the session");
                self.disconnect_reason = Some(reason.to_owned());
            }
            Message::Info(info) => {
                debug!(version = %info.version, state = ?info.state, "player info");
                self.player.set_server_info(info.version.clone(), info.state);
                fx.event(RemoteEvent::ServerInfo {
                    version: info.version,
                    state: info.state,
                });
            }
            Message::CurrentMetainfo(current) => {
                let row = self.player.set_active_song(current.song.clone());
                fx.event(RemoteEvent::ActiveSongChanged {
                    row,
                    song: current.song,
                });
            }
            Message::SetVolume(volume) => {
                self.player.set_volume(volume.volume);
                fx.event(RemoteEvent::VolumeChanged(volume.volume));
            }
            Message::UpdateTrackPosition(position) => {
                self.player.set_track_position(position.position);
                fx.event(RemoteEvent::TrackPosition(position.position));
            }
            Message::Shuffle(shuffle) => {
                self.player.set_shuffle(shuffle.mode);
                fx.event(RemoteEvent::ShuffleChanged(shuffle.mode));
            }
            Message::Repeat(repeat) => {
                self.player.set_repeat(repeat.mode);
                fx.event(RemoteEvent::RepeatChanged(repeat.mode));
            }
            Message::Play => self.engine_changed(EngineState::Playing, fx),
            Message::Pause => self.engine_changed(EngineState::Paused, fx),
            Message::Stop => self.engine_changed(EngineState::Idle, fx),
            Message::Playlists(response) => {
                let playlists = self.player.replace_playlists(response.playlists);
                fx.event(RemoteEvent::PlaylistsChanged(playlists));
            }
            Message::PlaylistSongs(response) => {
                let playlist_id = response.playlist.id;
                let songs = self.player.replace_songs(playlist_id, response.songs);
                fx.event(RemoteEvent::SongsChanged { playlist_id, songs });
            }
            Message::ActivePlaylistChanged(playlist) => {
                self.player.set_active_playlist(playlist.playlist_id);
                fx.event(RemoteEvent::ActivePlaylistChanged(playlist.playlist_id));
            }
            Message::ListFiles(response) => {
                let path = response.relative_path;
                let files = self.player.replace_files(path.clone(), response.files);
                fx.event(RemoteEvent::RemoteFilesChanged { path, files });
            }
            Message::SavedRadios(response) => {
                let streams = self.player.replace_radio_streams(response.streams);
                fx.event(RemoteEvent::RadioStreamsChanged(streams));
            }
            Message::FirstDataSentComplete => self.on_sync_complete(fx),
            Message::DownloadTotalSize(total) => {
                self.downloads
                    .on_total_size_announced(total.file_count, total.total_size);
                fx.event(RemoteEvent::DownloadProgress(0.0));
            }
            Message::SongFileChunk(chunk) => self.on_song_chunk(&chunk, fx),
            Message::DownloadQueueEmpty => {
                if let Some(summary) = self.downloads.on_queue_empty() {
                    fx.event(RemoteEvent::DownloadComplete {
                        completed: summary.completed,
                        total: summary.total,
                        errors: summary.errors,
                    });
                }
            }
            Message::LibraryChunk(chunk) => match self.library.on_chunk(&chunk) {
                LibraryOutcome::Progress(fraction) => fx.event(RemoteEvent::LibraryProgress(fraction)),
                LibraryOutcome::Ready(path) => {
                    fx.event(RemoteEvent::LibraryProgress(1.0));
                    fx.event(RemoteEvent::LibraryDownloaded { path });
                }
                LibraryOutcome::Failed(err) => fx.event(RemoteEvent::LibraryFailed(err.to_string())),
                LibraryOutcome::Ignored => {}
            },
            other => debug!(msg_type = %other.msg_type(), "unhandled message"),
        }
    }

    fn engine_changed(&mut self, state: EngineState, fx: &mut Effects) {
        self.player.transition(state);
        fx.event(RemoteEvent::EngineStateChanged(state));
    }

    /// The first sync completion moves the session to streaming. Repeats,
    /// including stale ones from a previous session, are ignored.
    fn on_sync_complete(&mut self, fx: &mut Effects) {
        match self.state {
            ConnectionState::AwaitingSync => {
                self.state = ConnectionState::Streaming;
                self.player.mark_initialized();
                info!("initial sync complete");
                fx.event(RemoteEvent::Connected);
            }
            state => debug!(%state, "ignoring repeated sync completion"),
        }
    }

    fn on_song_chunk(&mut self, chunk: &ResponseSongFileChunk, fx: &mut Effects) {
        let report = self.downloads.on_chunk(chunk);
        if let Some(accepted) = report.offer_accepted {
            self.send(fx, Message::SongOfferResponse(ResponseSongOffer { accepted }));
        }
        if let Some(fraction) = report.progress {
            fx.event(RemoteEvent::DownloadProgress(fraction));
        }
        if let Some(summary) = report.summary {
            if !summary.errors.is_empty() {
                warn!(errors = summary.errors.len(), "download batch finished with errors");
            }
            fx.event(RemoteEvent::DownloadComplete {
                completed: summary.completed,
                total: summary.total,
                errors: summary.errors,
            });
        }
    }
}
