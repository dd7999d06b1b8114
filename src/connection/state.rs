//! Connection lifecycle states.

use std::fmt;

/// Where the connection currently is in its lifecycle.
///
/// ```text
/// Disconnected -> Connecting -> AwaitingSync -> Streaming
///       ^                            |              |
///       +------- Disconnecting <-----+--------------+
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    /// A TCP connect is in flight and the connect timeout is armed.
    Connecting,
    /// `CONNECT` was sent; waiting for the player's initial data sync.
    AwaitingSync,
    /// The initial sync completed.
    Streaming,
    /// The socket is being torn down.
    Disconnecting,
}

impl ConnectionState {
    /// Whether outbound messages may be written.
    #[must_use]
    pub const fn is_connected(self) -> bool { matches!(self, Self::AwaitingSync | Self::Streaming) }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::AwaitingSync => "awaiting_sync",
            Self::Streaming => "streaming",
            Self::Disconnecting => "disconnecting",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}
