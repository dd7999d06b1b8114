//! The closed protocol message catalog.
//!
//! An [`Envelope`] pairs the protocol version with exactly one [`Message`]
//! variant. Envelopes are serialised with bincode's standard configuration
//! and carried as the payload of one length-prefixed frame (see
//! [`crate::codec`]).

use bincode::error::{DecodeError, EncodeError};
use bincode::{Decode, Encode, config, decode_from_slice, encode_to_vec};
use thiserror::Error;

pub mod payload;

pub use payload::*;

/// Version stamped on every outbound envelope.
pub const PROTOCOL_VERSION: i32 = 21;

/// Errors raised while converting envelopes to and from bytes.
#[derive(Debug, Error)]
pub enum MessageError {
    #[error("failed to encode envelope: {0}")]
    Encode(#[from] EncodeError),
    #[error("failed to decode envelope: {0}")]
    Decode(#[from] DecodeError),
}

/// Types that travel as bincode bytes.
///
/// Implemented for every type deriving [`Encode`] and [`Decode`].
pub trait WireFormat: Encode + Decode<()> {
    /// Serialise into a fresh byte vector.
    ///
    /// # Errors
    ///
    /// Returns [`MessageError::Encode`] if serialisation fails.
    fn to_bytes(&self) -> Result<Vec<u8>, MessageError> {
        Ok(encode_to_vec(self, config::standard())?)
    }

    /// Deserialise from a byte slice.
    ///
    /// Bytes following the decoded value are ignored so that newer peers may
    /// append fields.
    ///
    /// # Errors
    ///
    /// Returns [`MessageError::Decode`] if the bytes do not describe a value
    /// of this type.
    fn from_bytes(bytes: &[u8]) -> Result<Self, MessageError>
    where
        Self: Sized,
    {
        let (value, _consumed) = decode_from_slice(bytes, config::standard())?;
        Ok(value)
    }
}

impl<T> WireFormat for T where T: Encode + Decode<()> {}

/// One protocol message together with its version stamp.
///
/// ```
/// use remotewire::message::{Envelope, Message, PROTOCOL_VERSION, WireFormat};
///
/// let bytes = Envelope::new(Message::Play).to_bytes().expect("encode");
/// let decoded = Envelope::from_bytes(&bytes).expect("decode");
/// assert_eq!(decoded.version, PROTOCOL_VERSION);
/// assert_eq!(decoded.message, Message::Play);
/// ```
#[derive(Clone, Debug, PartialEq, Encode, Decode)]
pub struct Envelope {
    pub version: i32,
    pub message: Message,
}

impl Envelope {
    /// Wrap `message` with the current [`PROTOCOL_VERSION`].
    #[must_use]
    pub fn new(message: Message) -> Self {
        Self {
            version: PROTOCOL_VERSION,
            message,
        }
    }
}

impl From<Message> for Envelope {
    fn from(message: Message) -> Self { Self::new(message) }
}

/// Every message the player and the remote exchange.
///
/// The variant doubles as the wire tag; see [`Message::msg_type`].
#[derive(Clone, Debug, PartialEq, Encode, Decode)]
pub enum Message {
    Connect(RequestConnect),
    Disconnect(ResponseDisconnect),
    KeepAlive,
    Info(ResponseInfo),
    CurrentMetainfo(ResponseCurrentMetadata),
    SetVolume(Volume),
    SetTrackPosition(TrackPosition),
    UpdateTrackPosition(TrackPosition),
    Play,
    Pause,
    Stop,
    Next,
    Previous,
    Shuffle(Shuffle),
    Repeat(Repeat),
    RequestPlaylists(RequestPlaylists),
    Playlists(ResponsePlaylists),
    RequestPlaylistSongs(PlaylistRef),
    PlaylistSongs(ResponsePlaylistSongs),
    ActivePlaylistChanged(PlaylistRef),
    ChangeSong(RequestChangeSong),
    UpdatePlaylist(RequestUpdatePlaylist),
    ClosePlaylist(PlaylistRef),
    OpenPlaylist(PlaylistRef),
    RequestFiles(RequestListFiles),
    ListFiles(ResponseListFiles),
    AppendFiles(RequestAppendFiles),
    RemoveSongs(RequestRemoveSongs),
    InsertUrls(RequestInsertUrls),
    RequestSavedRadios,
    SavedRadios(ResponseSavedRadios),
    DownloadSongs(RequestDownloadSongs),
    SongOfferResponse(ResponseSongOffer),
    SongFileChunk(ResponseSongFileChunk),
    DownloadTotalSize(ResponseDownloadTotalSize),
    DownloadQueueEmpty,
    GetLibrary,
    LibraryChunk(ResponseLibraryChunk),
    FirstDataSentComplete,
}

/// Payload-free key identifying a [`Message`] kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MsgType {
    Connect,
    Disconnect,
    KeepAlive,
    Info,
    CurrentMetainfo,
    SetVolume,
    SetTrackPosition,
    UpdateTrackPosition,
    Play,
    Pause,
    Stop,
    Next,
    Previous,
    Shuffle,
    Repeat,
    RequestPlaylists,
    Playlists,
    RequestPlaylistSongs,
    PlaylistSongs,
    ActivePlaylistChanged,
    ChangeSong,
    UpdatePlaylist,
    ClosePlaylist,
    OpenPlaylist,
    RequestFiles,
    ListFiles,
    AppendFiles,
    RemoveSongs,
    InsertUrls,
    RequestSavedRadios,
    SavedRadios,
    DownloadSongs,
    SongOfferResponse,
    SongFileChunk,
    DownloadTotalSize,
    DownloadQueueEmpty,
    GetLibrary,
    LibraryChunk,
    FirstDataSentComplete,
}

impl MsgType {
    /// Protocol name of the kind, used in diagnostics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Connect => "CONNECT",
            Self::Disconnect => "DISCONNECT",
            Self::KeepAlive => "KEEP_ALIVE",
            Self::Info => "INFO",
            Self::CurrentMetainfo => "CURRENT_METAINFO",
            Self::SetVolume => "SET_VOLUME",
            Self::SetTrackPosition => "SET_TRACK_POSITION",
            Self::UpdateTrackPosition => "UPDATE_TRACK_POSITION",
            Self::Play => "PLAY",
            Self::Pause => "PAUSE",
            Self::Stop => "STOP",
            Self::Next => "NEXT",
            Self::Previous => "PREVIOUS",
            Self::Shuffle => "SHUFFLE",
            Self::Repeat => "REPEAT",
            Self::RequestPlaylists => "REQUEST_PLAYLISTS",
            Self::Playlists => "PLAYLISTS",
            Self::RequestPlaylistSongs => "REQUEST_PLAYLIST_SONGS",
            Self::PlaylistSongs => "PLAYLIST_SONGS",
            Self::ActivePlaylistChanged => "ACTIVE_PLAYLIST_CHANGED",
            Self::ChangeSong => "CHANGE_SONG",
            Self::UpdatePlaylist => "UPDATE_PLAYLIST",
            Self::ClosePlaylist => "CLOSE_PLAYLIST",
            Self::OpenPlaylist => "OPEN_PLAYLIST",
            Self::RequestFiles => "REQUEST_FILES",
            Self::ListFiles => "LIST_FILES",
            Self::AppendFiles => "APPEND_FILES",
            Self::RemoveSongs => "REMOVE_SONGS",
            Self::InsertUrls => "INSERT_URLS",
            Self::RequestSavedRadios => "REQUEST_SAVED_RADIOS",
            Self::SavedRadios => "SAVED_RADIOS",
            Self::DownloadSongs => "DOWNLOAD_SONGS",
            Self::SongOfferResponse => "SONG_OFFER_RESPONSE",
            Self::SongFileChunk => "SONG_FILE_CHUNK",
            Self::DownloadTotalSize => "DOWNLOAD_TOTAL_SIZE",
            Self::DownloadQueueEmpty => "DOWNLOAD_QUEUE_EMPTY",
            Self::GetLibrary => "GET_LIBRARY",
            Self::LibraryChunk => "LIBRARY_CHUNK",
            Self::FirstDataSentComplete => "FIRST_DATA_SENT_COMPLETE",
        }
    }
}

impl std::fmt::Display for MsgType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.write_str(self.as_str()) }
}

impl Message {
    /// Kind of this message.
    #[must_use]
    pub const fn msg_type(&self) -> MsgType {
        match self {
            Self::Connect(_) => MsgType::Connect,
            Self::Disconnect(_) => MsgType::Disconnect,
            Self::KeepAlive => MsgType::KeepAlive,
            Self::Info(_) => MsgType::Info,
            Self::CurrentMetainfo(_) => MsgType::CurrentMetainfo,
            Self::SetVolume(_) => MsgType::SetVolume,
            Self::SetTrackPosition(_) => MsgType::SetTrackPosition,
            Self::UpdateTrackPosition(_) => MsgType::UpdateTrackPosition,
            Self::Play => MsgType::Play,
            Self::Pause => MsgType::Pause,
            Self::Stop => MsgType::Stop,
            Self::Next => MsgType::Next,
            Self::Previous => MsgType::Previous,
            Self::Shuffle(_) => MsgType::Shuffle,
            Self::Repeat(_) => MsgType::Repeat,
            Self::RequestPlaylists(_) => MsgType::RequestPlaylists,
            Self::Playlists(_) => MsgType::Playlists,
            Self::RequestPlaylistSongs(_) => MsgType::RequestPlaylistSongs,
            Self::PlaylistSongs(_) => MsgType::PlaylistSongs,
            Self::ActivePlaylistChanged(_) => MsgType::ActivePlaylistChanged,
            Self::ChangeSong(_) => MsgType::ChangeSong,
            Self::UpdatePlaylist(_) => MsgType::UpdatePlaylist,
            Self::ClosePlaylist(_) => MsgType::ClosePlaylist,
            Self::OpenPlaylist(_) => MsgType::OpenPlaylist,
            Self::RequestFiles(_) => MsgType::RequestFiles,
            Self::ListFiles(_) => MsgType::ListFiles,
            Self::AppendFiles(_) => MsgType::AppendFiles,
            Self::RemoveSongs(_) => MsgType::RemoveSongs,
            Self::InsertUrls(_) => MsgType::InsertUrls,
            Self::RequestSavedRadios => MsgType::RequestSavedRadios,
            Self::SavedRadios(_) => MsgType::SavedRadios,
            Self::DownloadSongs(_) => MsgType::DownloadSongs,
            Self::SongOfferResponse(_) => MsgType::SongOfferResponse,
            Self::SongFileChunk(_) => MsgType::SongFileChunk,
            Self::DownloadTotalSize(_) => MsgType::DownloadTotalSize,
            Self::DownloadQueueEmpty => MsgType::DownloadQueueEmpty,
            Self::GetLibrary => MsgType::GetLibrary,
            Self::LibraryChunk(_) => MsgType::LibraryChunk,
            Self::FirstDataSentComplete => MsgType::FirstDataSentComplete,
        }
    }
}

#[cfg(test)]
mod tests;
