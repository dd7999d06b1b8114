//! Local mirror of the remote player's state.
//!
//! Collections are held as `Arc<[T]>` snapshots and always replaced whole,
//! so handing one to an event is a reference-count bump.

use std::sync::Arc;

use crate::message::{
    EngineState,
    FileEntry,
    Playlist,
    RadioStream,
    RepeatMode,
    ShuffleMode,
    SongMetadata,
};

/// Playlist id meaning "none".
pub const NO_PLAYLIST: i32 = 0;

/// Everything the player has told us during the current connection.
#[derive(Clone, Debug, Default)]
pub struct PlayerState {
    server_version: String,
    engine_state: EngineState,
    previous_engine_state: EngineState,
    volume: i32,
    shuffle: ShuffleMode,
    repeat: RepeatMode,
    track_position: i32,
    playlists: Arc<[Playlist]>,
    displayed_playlist_id: i32,
    songs: Arc<[SongMetadata]>,
    active_song: Option<SongMetadata>,
    active_song_row: Option<usize>,
    active_playlist_id: i32,
    remote_path: String,
    remote_files: Arc<[FileEntry]>,
    radio_streams: Arc<[RadioStream]>,
    initialized: bool,
}

impl PlayerState {
    /// Forget everything learned from the previous connection.
    pub fn reset(&mut self) { *self = Self::default(); }

    #[must_use]
    pub fn server_version(&self) -> &str { &self.server_version }

    #[must_use]
    pub const fn engine_state(&self) -> EngineState { self.engine_state }

    /// State the engine was in before the last transition.
    #[must_use]
    pub const fn previous_engine_state(&self) -> EngineState { self.previous_engine_state }

    #[must_use]
    pub const fn volume(&self) -> i32 { self.volume }

    #[must_use]
    pub const fn shuffle(&self) -> ShuffleMode { self.shuffle }

    #[must_use]
    pub const fn repeat(&self) -> RepeatMode { self.repeat }

    #[must_use]
    pub const fn track_position(&self) -> i32 { self.track_position }

    #[must_use]
    pub fn playlists(&self) -> Arc<[Playlist]> { Arc::clone(&self.playlists) }

    #[must_use]
    pub const fn displayed_playlist_id(&self) -> i32 { self.displayed_playlist_id }

    /// Position of the displayed playlist in the playlist snapshot.
    #[must_use]
    pub fn displayed_playlist_index(&self) -> Option<usize> {
        self.playlists
            .iter()
            .position(|playlist| playlist.id == self.displayed_playlist_id)
    }

    #[must_use]
    pub fn songs(&self) -> Arc<[SongMetadata]> { Arc::clone(&self.songs) }

    #[must_use]
    pub fn active_song(&self) -> Option<&SongMetadata> { self.active_song.as_ref() }

    /// Row of the active song in the displayed playlist.
    #[must_use]
    pub const fn active_song_row(&self) -> Option<usize> { self.active_song_row }

    #[must_use]
    pub const fn active_playlist_id(&self) -> i32 { self.active_playlist_id }

    #[must_use]
    pub fn remote_path(&self) -> &str { &self.remote_path }

    #[must_use]
    pub fn remote_files(&self) -> Arc<[FileEntry]> { Arc::clone(&self.remote_files) }

    #[must_use]
    pub fn radio_streams(&self) -> Arc<[RadioStream]> { Arc::clone(&self.radio_streams) }

    /// Whether the player finished its initial data sync.
    #[must_use]
    pub const fn is_initialized(&self) -> bool { self.initialized }

    #[must_use]
    pub fn playlist_at(&self, index: usize) -> Option<&Playlist> { self.playlists.get(index) }

    #[must_use]
    pub fn song_at(&self, row: usize) -> Option<&SongMetadata> { self.songs.get(row) }

    #[must_use]
    pub fn radio_at(&self, index: usize) -> Option<&RadioStream> { self.radio_streams.get(index) }

    /// Move the engine to `state`, returning the state it left.
    pub fn transition(&mut self, state: EngineState) -> EngineState {
        self.previous_engine_state = self.engine_state;
        self.engine_state = state;
        self.previous_engine_state
    }

    pub(crate) fn set_server_info(&mut self, version: String, state: EngineState) {
        self.server_version = version;
        self.transition(state);
    }

    pub(crate) fn set_volume(&mut self, volume: i32) { self.volume = volume; }

    pub(crate) fn set_shuffle(&mut self, mode: ShuffleMode) { self.shuffle = mode; }

    pub(crate) fn set_repeat(&mut self, mode: RepeatMode) { self.repeat = mode; }

    pub(crate) fn set_track_position(&mut self, position: i32) { self.track_position = position; }

    /// Store the playing song and return its row in the displayed playlist.
    pub(crate) fn set_active_song(&mut self, song: SongMetadata) -> Option<usize> {
        self.active_song = Some(song);
        self.refresh_active_row()
    }

    /// Replace the playlist snapshot. The displayed playlist is cleared.
    pub(crate) fn replace_playlists(&mut self, playlists: Vec<Playlist>) -> Arc<[Playlist]> {
        self.playlists = playlists.into();
        self.displayed_playlist_id = NO_PLAYLIST;
        self.playlists()
    }

    /// Replace the displayed playlist and its songs.
    ///
    /// Before the initial sync completes the first listed playlist is also
    /// taken as the active one.
    pub(crate) fn replace_songs(
        &mut self,
        playlist_id: i32,
        songs: Vec<SongMetadata>,
    ) -> Arc<[SongMetadata]> {
        self.displayed_playlist_id = playlist_id;
        if !self.initialized {
            self.active_playlist_id = playlist_id;
        }
        self.songs = songs.into();
        self.refresh_active_row();
        self.songs()
    }

    pub(crate) fn set_active_playlist(&mut self, playlist_id: i32) {
        self.displayed_playlist_id = playlist_id;
        self.active_playlist_id = playlist_id;
    }

    pub(crate) fn replace_files(&mut self, path: String, files: Vec<FileEntry>) -> Arc<[FileEntry]> {
        self.remote_path = path;
        self.remote_files = files.into();
        self.remote_files()
    }

    pub(crate) fn replace_radio_streams(&mut self, streams: Vec<RadioStream>) -> Arc<[RadioStream]> {
        self.radio_streams = streams.into();
        self.radio_streams()
    }

    pub(crate) fn mark_initialized(&mut self) { self.initialized = true; }

    fn refresh_active_row(&mut self) -> Option<usize> {
        self.active_song_row = self.active_song.as_ref().and_then(|active| {
            self.songs.iter().position(|song| song.id == active.id)
        });
        self.active_song_row
    }
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};

    use super::*;

    fn song(id: i32, index: i32) -> SongMetadata {
        SongMetadata {
            id,
            index,
            title: format!("song {id}"),
            ..SongMetadata::default()
        }
    }

    fn playlist(id: i32) -> Playlist {
        Playlist {
            id,
            name: format!("list {id}"),
            ..Playlist::default()
        }
    }

    #[fixture]
    fn populated() -> PlayerState {
        let mut state = PlayerState::default();
        state.replace_playlists(vec![playlist(1), playlist(4)]);
        state.replace_songs(4, vec![song(10, 0), song(11, 1), song(12, 2)]);
        state.set_active_song(song(11, 1));
        state.replace_files("./".into(), vec![FileEntry::default()]);
        state.replace_radio_streams(vec![RadioStream::default()]);
        state
    }

    #[rstest]
    fn active_row_follows_song_list(mut populated: PlayerState) {
        assert_eq!(populated.active_song_row(), Some(1));
        populated.replace_songs(4, vec![song(11, 0)]);
        assert_eq!(populated.active_song_row(), Some(0));
        populated.replace_songs(1, vec![song(99, 0)]);
        assert_eq!(populated.active_song_row(), None);
    }

    #[rstest]
    fn first_song_list_sets_active_playlist(populated: PlayerState) {
        assert_eq!(populated.active_playlist_id(), 4);
        assert_eq!(populated.displayed_playlist_index(), Some(1));
    }

    #[rstest]
    fn song_lists_after_sync_keep_active_playlist(mut populated: PlayerState) {
        populated.mark_initialized();
        populated.replace_songs(1, Vec::new());
        assert_eq!(populated.active_playlist_id(), 4);
        assert_eq!(populated.displayed_playlist_id(), 1);
    }

    #[rstest]
    fn new_playlists_clear_displayed_playlist(mut populated: PlayerState) {
        populated.replace_playlists(vec![playlist(7)]);
        assert_eq!(populated.displayed_playlist_id(), NO_PLAYLIST);
        assert_eq!(populated.displayed_playlist_index(), None);
    }

    #[rstest]
    fn reset_empties_everything(mut populated: PlayerState) {
        populated.reset();
        assert!(populated.playlists().is_empty());
        assert!(populated.songs().is_empty());
        assert!(populated.remote_files().is_empty());
        assert!(populated.radio_streams().is_empty());
        assert_eq!(populated.active_playlist_id(), NO_PLAYLIST);
        assert!(populated.active_song().is_none());
    }

    #[test]
    fn transition_records_previous_state() {
        let mut state = PlayerState::default();
        state.transition(EngineState::Idle);
        assert_eq!(state.transition(EngineState::Playing), EngineState::Idle);
        assert_eq!(state.previous_engine_state(), EngineState::Idle);
        assert_eq!(state.transition(EngineState::Paused), EngineState::Playing);
    }
}
