//! User-issued commands and the messages they produce.

use std::path::PathBuf;

use tracing::{debug, error, warn};

use super::{ConnectionMachine, Effects, player::NO_PLAYLIST};
use crate::{
    download::{DownloadFs, DownloadSummary},
    event::RemoteEvent,
    message::{
        DownloadItem,
        EngineState,
        Message,
        PlaylistRef,
        Repeat,
        RepeatMode,
        RequestAppendFiles,
        RequestChangeSong,
        RequestDownloadSongs,
        RequestInsertUrls,
        RequestListFiles,
        RequestPlaylists,
        RequestRemoveSongs,
        RequestUpdatePlaylist,
        Shuffle,
        ShuffleMode,
        TrackPosition,
        Volume,
    },
    session::ConnectionSession,
};

/// Remote directory used when no path is known yet.
pub const ROOT_PATH: &str = "./";

/// An action requested by the front end.
///
/// `row` arguments index the displayed playlist's song list and `index`
/// arguments index the playlist or radio snapshots last published.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Open a connection, closing the current one first.
    Connect(ConnectionSession),
    Disconnect,
    ChangeSong(usize),
    NextSong,
    PreviousSong,
    SetTrackPosition(i32),
    SetVolume(i32),
    SetEngineState(EngineState),
    /// Toggle between playing and paused.
    PlayPause,
    Stop,
    Shuffle(ShuffleMode),
    Repeat(RepeatMode),
    /// Show the songs of the playlist at `index`.
    ChangePlaylist(usize),
    /// List `sub` below `path`; an empty `path` means the remote root.
    RequestFiles { path: String, sub: Option<String> },
    AppendFiles(RequestAppendFiles),
    CreatePlaylist(String),
    /// Mark a playlist as favourite so the player keeps it.
    SavePlaylist(i32),
    RenamePlaylist { playlist_id: i32, name: String },
    ClearPlaylist(i32),
    /// Close a playlist and refresh the displayed one.
    ClosePlaylist(i32),
    OpenPlaylist(i32),
    /// Request every playlist, closed ones included.
    RequestAllPlaylists,
    /// Queue the saved radio at `index` into the displayed playlist and play it.
    AddRadioToPlaylist(usize),
    InsertUrls { playlist_id: i32, urls: Vec<String>, play_now: bool },
    RemoveSongs { playlist_id: i32, song_ids: Vec<i32> },
    DownloadCurrentSong,
    /// Download a playlist into `<download_dir>/playlists/<name>`.
    DownloadPlaylist { playlist_id: i32, name: String },
    /// Download files below a remote directory.
    DownloadFiles { path: String, names: Vec<String> },
    RequestSavedRadios,
    RequestLibrary,
}

impl<F: DownloadFs + Clone> ConnectionMachine<F> {
    /// Turn `command` into outbound messages and local state changes.
    ///
    /// Lifecycle commands are owned by the runtime and ignored here, as is
    /// everything issued while no connection is up.
    pub fn handle(&mut self, command: Command) -> Effects {
        let mut fx = Effects::default();
        if !self.state.is_connected() {
            debug!(?command, state = %self.state, "dropping command while not connected");
            return fx;
        }
        match command {
            Command::Connect(_) | Command::Disconnect => {
                debug!("lifecycle command reached the protocol layer");
            }
            Command::ChangeSong(row) => self.change_song(row, &mut fx),
            Command::NextSong => {
                let row = self.player.active_song_row().map_or(0, |row| row + 1);
                self.change_song(row, &mut fx);
            }
            Command::PreviousSong => {
                if let Some(row) = self.player.active_song_row().and_then(|row| row.checked_sub(1)) {
                    self.change_song(row, &mut fx);
                }
            }
            Command::SetTrackPosition(position) => {
                self.send(&mut fx, Message::SetTrackPosition(TrackPosition { position }));
            }
            Command::SetVolume(volume) => self.send(&mut fx, Message::SetVolume(Volume { volume })),
            Command::SetEngineState(state) => self.set_engine_state(state, &mut fx),
            Command::PlayPause => {
                let next = if self.player.engine_state() == EngineState::Playing {
                    EngineState::Paused
                } else {
                    EngineState::Playing
                };
                self.set_engine_state(next, &mut fx);
            }
            Command::Stop => self.set_engine_state(EngineState::Idle, &mut fx),
            Command::Shuffle(mode) => self.send(&mut fx, Message::Shuffle(Shuffle { mode })),
            Command::Repeat(mode) => self.send(&mut fx, Message::Repeat(Repeat { mode })),
            Command::ChangePlaylist(index) => match self.player.playlist_at(index) {
                Some(playlist) => {
                    let playlist_id = playlist.id;
                    self.send(&mut fx, Message::RequestPlaylistSongs(PlaylistRef { playlist_id }));
                }
                None => warn!(index, "no playlist at index"),
            },
            Command::RequestFiles { path, sub } => {
                let relative_path = browse_path(&path, sub.as_deref());
                debug!(%relative_path, "requesting remote files");
                self.send(&mut fx, Message::RequestFiles(RequestListFiles { relative_path }));
            }
            Command::AppendFiles(request) => self.send(&mut fx, Message::AppendFiles(request)),
            Command::CreatePlaylist(name) => self.update_playlist(
                RequestUpdatePlaylist {
                    new_playlist_name: Some(name),
                    create_new_playlist: true,
                    ..RequestUpdatePlaylist::default()
                },
                &mut fx,
            ),
            Command::SavePlaylist(playlist_id) => self.update_playlist(
                RequestUpdatePlaylist {
                    playlist_id: Some(playlist_id),
                    favorite: true,
                    ..RequestUpdatePlaylist::default()
                },
                &mut fx,
            ),
            Command::RenamePlaylist { playlist_id, name } => self.update_playlist(
                RequestUpdatePlaylist {
                    playlist_id: Some(playlist_id),
                    new_playlist_name: Some(name),
                    ..RequestUpdatePlaylist::default()
                },
                &mut fx,
            ),
            Command::ClearPlaylist(playlist_id) => self.update_playlist(
                RequestUpdatePlaylist {
                    playlist_id: Some(playlist_id),
                    clear_playlist: true,
                    ..RequestUpdatePlaylist::default()
                },
                &mut fx,
            ),
            Command::ClosePlaylist(playlist_id) => {
                self.send(&mut fx, Message::ClosePlaylist(PlaylistRef { playlist_id }));
                let displayed = self.player.displayed_playlist_id();
                if displayed != NO_PLAYLIST {
                    self.send(
                        &mut fx,
                        Message::RequestPlaylistSongs(PlaylistRef {
                            playlist_id: displayed,
                        }),
                    );
                }
            }
            Command::OpenPlaylist(playlist_id) => {
                self.send(&mut fx, Message::OpenPlaylist(PlaylistRef { playlist_id }));
            }
            Command::RequestAllPlaylists => self.send(
                &mut fx,
                Message::RequestPlaylists(RequestPlaylists {
                    include_closed: true,
                }),
            ),
            Command::AddRadioToPlaylist(index) => match self.player.radio_at(index) {
                Some(radio) => {
                    let request = RequestInsertUrls {
                        playlist_id: self.player.displayed_playlist_id(),
                        urls: vec![radio.url.clone()],
                        play_now: true,
                    };
                    self.send(&mut fx, Message::InsertUrls(request));
                }
                None => warn!(index, "no radio stream at index"),
            },
            Command::InsertUrls {
                playlist_id,
                urls,
                play_now,
            } => self.send(
                &mut fx,
                Message::InsertUrls(RequestInsertUrls {
                    playlist_id,
                    urls,
                    play_now,
                }),
            ),
            Command::RemoveSongs { playlist_id, song_ids } => self.send(
                &mut fx,
                Message::RemoveSongs(RequestRemoveSongs {
                    playlist_id,
                    songs: song_ids,
                }),
            ),
            Command::DownloadCurrentSong => {
                let destination = self.download_dir.clone();
                self.request_download(
                    destination,
                    RequestDownloadSongs::new(DownloadItem::CurrentItem),
                    &mut fx,
                );
            }
            Command::DownloadPlaylist { playlist_id, name } => {
                let destination = self.download_dir.join("playlists").join(&name);
                let mut request = RequestDownloadSongs::new(DownloadItem::APlaylist);
                request.playlist_id = Some(playlist_id);
                self.request_download(destination, request, &mut fx);
            }
            Command::DownloadFiles { path, names } => {
                let destination = self.download_dir.clone();
                let mut request = RequestDownloadSongs::new(DownloadItem::Urls);
                request.relative_path = Some(path);
                request.urls = names;
                self.request_download(destination, request, &mut fx);
            }
            Command::RequestSavedRadios => self.send(&mut fx, Message::RequestSavedRadios),
            Command::RequestLibrary => self.send(&mut fx, Message::GetLibrary),
        }
        fx
    }

    fn change_song(&mut self, row: usize, fx: &mut Effects) {
        let playlist_id = self.player.displayed_playlist_id();
        if !self.send_change_song(row, playlist_id, fx) {
            error!(row, "no song at row");
            return;
        }
        self.player.transition(EngineState::Playing);
        fx.event(RemoteEvent::EngineStateChanged(EngineState::Playing));
    }

    fn send_change_song(&self, row: usize, playlist_id: i32, fx: &mut Effects) -> bool {
        let Some(song) = self.player.song_at(row) else {
            return false;
        };
        let request = RequestChangeSong {
            song_index: song.index,
            playlist_id: (playlist_id != NO_PLAYLIST).then_some(playlist_id),
        };
        self.send(fx, Message::ChangeSong(request));
        true
    }

    /// Send the message for `state`.
    ///
    /// When playback resumes from `Idle` the player would otherwise start an
    /// unrelated track, so the active song is selected again explicitly.
    fn set_engine_state(&mut self, state: EngineState, fx: &mut Effects) {
        let message = match state {
            EngineState::Playing => Message::Play,
            EngineState::Paused => Message::Pause,
            EngineState::Empty | EngineState::Idle => Message::Stop,
        };
        let local = if matches!(message, Message::Stop) {
            EngineState::Idle
        } else {
            state
        };
        let previous = self.player.transition(local);
        let replay = previous == EngineState::Idle && matches!(message, Message::Play);
        self.send(fx, message);
        fx.event(RemoteEvent::EngineStateChanged(local));

        if replay {
            if let Some(row) = self.player.active_song_row() {
                let playlist_id = self.player.active_playlist_id();
                debug!(row, playlist_id, "replaying active song after idle");
                self.send_change_song(row, playlist_id, fx);
            }
        }
    }

    fn update_playlist(&self, request: RequestUpdatePlaylist, fx: &mut Effects) {
        self.send(fx, Message::UpdatePlaylist(request));
    }

    fn request_download(
        &mut self,
        destination: PathBuf,
        request: RequestDownloadSongs,
        fx: &mut Effects,
    ) {
        if let Err(err) = self.downloads.prepare_destination(destination) {
            warn!(error = %err, "download destination unusable");
            let summary = DownloadSummary::failed(&err);
            fx.event(RemoteEvent::DownloadComplete {
                completed: summary.completed,
                total: summary.total,
                errors: summary.errors,
            });
            return;
        }
        self.send(fx, Message::DownloadSongs(request));
    }
}

/// Remote directory to list for `sub` below `path`.
///
/// ```
/// use remotewire::connection::browse_path;
///
/// assert_eq!(browse_path("", None), "./");
/// assert_eq!(browse_path("./Music", Some("Jazz")), "./Music/Jazz");
/// assert_eq!(browse_path("./", Some("Rock")), "./Rock");
/// ```
#[must_use]
pub fn browse_path(path: &str, sub: Option<&str>) -> String {
    let mut current = if path.is_empty() {
        ROOT_PATH.to_owned()
    } else {
        path.to_owned()
    };
    if let Some(sub) = sub.filter(|sub| !sub.is_empty()) {
        if !current.ends_with('/') {
            current.push('/');
        }
        current.push_str(sub);
    }
    current
}
