//! Runtime configuration for the remote.
//!
//! [`RemoteConfig`] is a by-value builder. Every setter consumes and returns
//! the configuration so options can be chained:
//!
//! ```
//! use std::time::Duration;
//!
//! use remotewire::config::RemoteConfig;
//!
//! let config = RemoteConfig::default()
//!     .connect_timeout(Duration::from_millis(500))
//!     .download_dir("/tmp/music")
//!     .overwrite_downloads(true);
//! assert_eq!(config.connect_timeout_value(), Duration::from_millis(500));
//! assert!(config.overwrite_downloads_value());
//! ```

use std::{
    io,
    path::{Path, PathBuf},
    time::Duration,
};

use socket2::{SockRef, TcpKeepalive};
use tokio::net::TcpSocket;

use crate::codec::MAX_ENVELOPE_LENGTH;

/// Connect attempts abort after this long without a transport connection.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(2000);
/// Upper bound on waiting for the transport to close during teardown.
pub const DEFAULT_TEARDOWN_TIMEOUT: Duration = Duration::from_millis(2000);
/// Write attempts per chunk before the file is abandoned.
pub const DEFAULT_WRITE_RETRY_LIMIT: u32 = 10;
/// Port the player listens on unless configured otherwise.
pub const DEFAULT_PORT: u16 = 5500;

/// Configuration shared by the connection worker and the download subsystem.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteConfig {
    connect_timeout: Duration,
    teardown_timeout: Duration,
    max_envelope_length: usize,
    write_retry_limit: u32,
    download_dir: PathBuf,
    library_dir: PathBuf,
    overwrite_downloads: bool,
    keepalive: Option<Duration>,
    nodelay: bool,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            teardown_timeout: DEFAULT_TEARDOWN_TIMEOUT,
            max_envelope_length: MAX_ENVELOPE_LENGTH,
            write_retry_limit: DEFAULT_WRITE_RETRY_LIMIT,
            download_dir: PathBuf::from("downloads"),
            library_dir: PathBuf::from("library"),
            overwrite_downloads: false,
            keepalive: Some(Duration::from_secs(30)),
            nodelay: true,
        }
    }
}

impl RemoteConfig {
    /// Set how long a connect attempt may take.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the bounded wait applied while closing the socket.
    #[must_use]
    pub fn teardown_timeout(mut self, timeout: Duration) -> Self {
        self.teardown_timeout = timeout;
        self
    }

    /// Set the largest envelope accepted or sent.
    ///
    /// Values above [`MAX_ENVELOPE_LENGTH`] are clamped.
    #[must_use]
    pub fn max_envelope_length(mut self, length: usize) -> Self {
        self.max_envelope_length = length.min(MAX_ENVELOPE_LENGTH);
        self
    }

    /// Set how many write calls a chunk may take before its file is abandoned.
    ///
    /// A limit of zero is raised to one.
    #[must_use]
    pub fn write_retry_limit(mut self, attempts: u32) -> Self {
        self.write_retry_limit = attempts.max(1);
        self
    }

    /// Set the root directory for song downloads.
    #[must_use]
    pub fn download_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.download_dir = path.into();
        self
    }

    /// Set the directory holding library snapshots.
    #[must_use]
    pub fn library_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.library_dir = path.into();
        self
    }

    /// Replace files that already exist in the download directory.
    #[must_use]
    pub fn overwrite_downloads(mut self, enabled: bool) -> Self {
        self.overwrite_downloads = enabled;
        self
    }

    /// Configure `SO_KEEPALIVE`; `None` disables it.
    #[must_use]
    pub fn keepalive(mut self, idle: Option<Duration>) -> Self {
        self.keepalive = idle;
        self
    }

    /// Configure `TCP_NODELAY`.
    #[must_use]
    pub fn nodelay(mut self, enabled: bool) -> Self {
        self.nodelay = enabled;
        self
    }

    #[must_use]
    pub const fn connect_timeout_value(&self) -> Duration { self.connect_timeout }

    #[must_use]
    pub const fn teardown_timeout_value(&self) -> Duration { self.teardown_timeout }

    #[must_use]
    pub const fn max_envelope_length_value(&self) -> usize { self.max_envelope_length }

    #[must_use]
    pub const fn write_retry_limit_value(&self) -> u32 { self.write_retry_limit }

    #[must_use]
    pub fn download_dir_value(&self) -> &Path { &self.download_dir }

    #[must_use]
    pub fn library_dir_value(&self) -> &Path { &self.library_dir }

    #[must_use]
    pub const fn overwrite_downloads_value(&self) -> bool { self.overwrite_downloads }

    pub(crate) fn apply_socket_options(&self, socket: &TcpSocket) -> io::Result<()> {
        socket.set_nodelay(self.nodelay)?;
        match self.keepalive {
            Some(idle) => {
                socket.set_keepalive(true)?;
                let sock_ref = SockRef::from(socket);
                sock_ref.set_tcp_keepalive(&TcpKeepalive::new().with_time(idle))?;
            }
            None => socket.set_keepalive(false)?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_player_expectations() {
        let config = RemoteConfig::default();
        assert_eq!(config.connect_timeout_value(), Duration::from_millis(2000));
        assert_eq!(config.teardown_timeout_value(), Duration::from_millis(2000));
        assert_eq!(config.max_envelope_length_value(), 128 * 1024 * 1024);
        assert_eq!(config.write_retry_limit_value(), 10);
        assert!(!config.overwrite_downloads_value());
    }

    #[test]
    fn limits_are_clamped() {
        let config = RemoteConfig::default()
            .max_envelope_length(usize::MAX)
            .write_retry_limit(0);
        assert_eq!(config.max_envelope_length_value(), MAX_ENVELOPE_LENGTH);
        assert_eq!(config.write_retry_limit_value(), 1);
    }

    #[tokio::test]
    async fn socket_options_apply_to_fresh_socket() {
        let socket = TcpSocket::new_v4().expect("create socket");
        RemoteConfig::default()
            .apply_socket_options(&socket)
            .expect("apply options");
        assert!(socket.nodelay().expect("read nodelay"));
        assert!(socket.keepalive().expect("read keepalive"));
    }
}
