//! Payload and value types carried by [`Message`](super::Message) variants.
//!
//! Every type here is an immutable value built fresh for each send or
//! receive. Collections arrive whole and are replaced whole by the
//! connection state.

use bincode::{Decode, Encode};

/// Playback engine state reported by the player.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Encode, Decode)]
pub enum EngineState {
    /// No playlist loaded.
    #[default]
    Empty,
    /// Stopped with a playlist loaded.
    Idle,
    Playing,
    Paused,
}

/// Shuffle modes understood by the player.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Encode, Decode)]
pub enum ShuffleMode {
    #[default]
    Off,
    All,
    InsideAlbum,
    Albums,
}

/// Repeat modes understood by the player.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Encode, Decode)]
pub enum RepeatMode {
    #[default]
    Off,
    Track,
    Album,
    Playlist,
}

/// Why the player closed the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Encode, Decode)]
pub enum ReasonDisconnect {
    ServerShutdown,
    WrongAuthCode,
    NotAuthenticated,
    DownloadForbidden,
}

impl ReasonDisconnect {
    /// Human readable explanation suitable for display.
    #[must_use]
    pub const fn text(self) -> &'static str {
        match self {
            Self::ServerShutdown => "Server shutdown",
            Self::WrongAuthCode => "Wrong auth code",
            Self::NotAuthenticated => "Not authenticated",
            Self::DownloadForbidden => "Download forbidden",
        }
    }
}

/// Selection of songs a download request refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Encode, Decode)]
pub enum DownloadItem {
    /// The song currently playing.
    CurrentItem,
    /// Explicit server-side paths.
    Urls,
    /// Every song of one playlist.
    APlaylist,
}

/// Metadata describing one song.
#[derive(Clone, Debug, Default, PartialEq, Encode, Decode)]
pub struct SongMetadata {
    /// Unique id of the song.
    pub id: i32,
    /// Row of the song within its playlist.
    pub index: i32,
    pub title: String,
    pub album: String,
    pub artist: String,
    pub album_artist: String,
    pub track: i32,
    pub disc: i32,
    pub pretty_year: String,
    pub genre: String,
    pub play_count: i32,
    pub pretty_length: String,
    /// Length in seconds.
    pub length: i32,
    pub is_local: bool,
    pub filename: String,
    /// File size in bytes.
    pub file_size: u64,
    /// 0.0 (no stars) to 1.0 (five stars).
    pub rating: f32,
    pub url: String,
    pub art_automatic: String,
    pub art_manual: String,
}

/// Summary of one playlist.
#[derive(Clone, Debug, Default, PartialEq, Eq, Encode, Decode)]
pub struct Playlist {
    pub id: i32,
    pub name: String,
    pub item_count: i32,
    pub active: bool,
    pub closed: bool,
    pub favorite: bool,
}

/// One entry of a remote directory listing.
#[derive(Clone, Debug, Default, PartialEq, Eq, Encode, Decode)]
pub struct FileEntry {
    pub filename: String,
    pub is_dir: bool,
}

/// A saved internet radio stream.
#[derive(Clone, Debug, Default, PartialEq, Eq, Encode, Decode)]
pub struct RadioStream {
    pub name: String,
    pub url: String,
    pub logo_url: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Encode, Decode)]
pub struct RequestConnect {
    /// Numeric authentication code, when the player requires one.
    pub auth_code: Option<i32>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Encode, Decode)]
pub struct ResponseDisconnect {
    pub reason: ReasonDisconnect,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Encode, Decode)]
pub struct ResponseInfo {
    pub version: String,
    pub state: EngineState,
}

#[derive(Clone, Debug, Default, PartialEq, Encode, Decode)]
pub struct ResponseCurrentMetadata {
    pub song: SongMetadata,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Encode, Decode)]
pub struct Volume {
    /// Percentage in `0..=100`.
    pub volume: i32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Encode, Decode)]
pub struct TrackPosition {
    /// Position in seconds.
    pub position: i32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Encode, Decode)]
pub struct Shuffle {
    pub mode: ShuffleMode,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Encode, Decode)]
pub struct Repeat {
    pub mode: RepeatMode,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Encode, Decode)]
pub struct RequestPlaylists {
    pub include_closed: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Encode, Decode)]
pub struct ResponsePlaylists {
    pub playlists: Vec<Playlist>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Encode, Decode)]
pub struct PlaylistRef {
    pub playlist_id: i32,
}

#[derive(Clone, Debug, Default, PartialEq, Encode, Decode)]
pub struct ResponsePlaylistSongs {
    pub playlist: Playlist,
    pub songs: Vec<SongMetadata>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Encode, Decode)]
pub struct RequestChangeSong {
    /// Row of the song within its playlist.
    pub song_index: i32,
    /// Playlist holding the song; the player's current one when absent.
    pub playlist_id: Option<i32>,
}

/// Playlist mutation; unset fields leave the playlist untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq, Encode, Decode)]
pub struct RequestUpdatePlaylist {
    pub playlist_id: Option<i32>,
    pub new_playlist_name: Option<String>,
    pub favorite: bool,
    pub create_new_playlist: bool,
    pub clear_playlist: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Encode, Decode)]
pub struct RequestListFiles {
    pub relative_path: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Encode, Decode)]
pub struct ResponseListFiles {
    pub relative_path: String,
    pub files: Vec<FileEntry>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Encode, Decode)]
pub struct RequestAppendFiles {
    pub playlist_id: Option<i32>,
    pub new_playlist_name: Option<String>,
    pub relative_path: String,
    pub files: Vec<String>,
    pub play_now: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Encode, Decode)]
pub struct RequestRemoveSongs {
    pub playlist_id: i32,
    pub songs: Vec<i32>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Encode, Decode)]
pub struct RequestInsertUrls {
    pub playlist_id: i32,
    pub urls: Vec<String>,
    pub play_now: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Encode, Decode)]
pub struct ResponseSavedRadios {
    pub streams: Vec<RadioStream>,
}

#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode)]
pub struct RequestDownloadSongs {
    pub item: DownloadItem,
    pub playlist_id: Option<i32>,
    pub relative_path: Option<String>,
    pub urls: Vec<String>,
    pub song_ids: Vec<i32>,
}

impl RequestDownloadSongs {
    /// Request for `item` with every optional selector unset.
    #[must_use]
    pub fn new(item: DownloadItem) -> Self {
        Self {
            item,
            playlist_id: None,
            relative_path: None,
            urls: Vec::new(),
            song_ids: Vec::new(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Encode, Decode)]
pub struct ResponseSongOffer {
    pub accepted: bool,
}

/// One chunk of a song transfer.
///
/// Chunk `0` is the offer: it carries metadata only and must be answered
/// with a [`ResponseSongOffer`]. Data chunks are numbered `1..=chunk_count`
/// and the last one carries the SHA-1 of the whole file.
#[derive(Clone, Debug, Default, PartialEq, Encode, Decode)]
pub struct ResponseSongFileChunk {
    pub chunk_number: u32,
    pub chunk_count: u32,
    /// 1-based position of the file within its batch.
    pub file_number: u32,
    /// Declared size of the whole file in bytes.
    pub size: u64,
    pub song_metadata: Option<SongMetadata>,
    pub data: Vec<u8>,
    /// Lower-case hex SHA-1 of the file, set on the last chunk.
    pub file_hash: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Encode, Decode)]
pub struct ResponseDownloadTotalSize {
    pub file_count: u32,
    pub total_size: u64,
}

/// One chunk of a library snapshot transfer, numbered `1..=chunk_count`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Encode, Decode)]
pub struct ResponseLibraryChunk {
    pub chunk_number: u32,
    pub chunk_count: u32,
    /// Declared size of the whole snapshot in bytes.
    pub size: u64,
    pub data: Vec<u8>,
    /// Lower-case hex SHA-1 of the snapshot, set on the last chunk.
    pub file_hash: Option<String>,
}
