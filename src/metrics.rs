//! Metric helpers for `remotewire`.
//!
//! Thin wrappers around the [`metrics`](https://docs.rs/metrics) crate. With
//! the `metrics` feature disabled every helper compiles to a no-op.

#[cfg(feature = "metrics")]
use metrics::{counter, gauge};

/// Name of the gauge tracking open player connections.
pub const CONNECTIONS_ACTIVE: &str = "remotewire_connections_active";
/// Name of the counter tracking processed envelopes.
pub const FRAMES_PROCESSED: &str = "remotewire_frames_processed_total";
/// Name of the counter tracking error occurrences.
pub const ERRORS_TOTAL: &str = "remotewire_errors_total";
/// Name of the counter tracking downloaded payload bytes.
pub const DOWNLOAD_BYTES: &str = "remotewire_download_bytes_total";

/// Direction of envelope processing.
#[derive(Clone, Copy, Debug)]
pub enum Direction {
    /// Received from the player.
    Inbound,
    /// Sent to the player.
    Outbound,
}

impl Direction {
    #[cfg_attr(not(feature = "metrics"), expect(dead_code, reason = "only labels metrics"))]
    fn as_str(self) -> &'static str {
        match self {
            Direction::Inbound => "inbound",
            Direction::Outbound => "outbound",
        }
    }
}

/// Category label for [`ERRORS_TOTAL`].
#[derive(Clone, Copy, Debug)]
pub enum ErrorKind {
    Framing,
    Decode,
    Transport,
    Download,
}

impl ErrorKind {
    #[cfg_attr(not(feature = "metrics"), expect(dead_code, reason = "only labels metrics"))]
    fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Framing => "framing",
            ErrorKind::Decode => "decode",
            ErrorKind::Transport => "transport",
            ErrorKind::Download => "download",
        }
    }
}

/// Increment the active connections gauge.
#[cfg(feature = "metrics")]
pub fn inc_connections() { gauge!(CONNECTIONS_ACTIVE).increment(1.0); }

/// Decrement the active connections gauge.
#[cfg(feature = "metrics")]
pub fn dec_connections() { gauge!(CONNECTIONS_ACTIVE).decrement(1.0); }

/// Record a processed envelope for the given direction.
#[cfg(feature = "metrics")]
pub fn inc_frames(direction: Direction) {
    counter!(FRAMES_PROCESSED, "direction" => direction.as_str()).increment(1);
}

/// Record an error occurrence.
#[cfg(feature = "metrics")]
pub fn inc_errors(kind: ErrorKind) {
    counter!(ERRORS_TOTAL, "kind" => kind.as_str()).increment(1);
}

/// Record payload bytes received for a download.
#[cfg(feature = "metrics")]
pub fn add_download_bytes(bytes: u64) { counter!(DOWNLOAD_BYTES).increment(bytes); }

#[cfg(not(feature = "metrics"))]
pub fn inc_connections() {}

#[cfg(not(feature = "metrics"))]
pub fn dec_connections() {}

#[cfg(not(feature = "metrics"))]
pub fn inc_frames(_direction: Direction) {}

#[cfg(not(feature = "metrics"))]
pub fn inc_errors(_kind: ErrorKind) {}

#[cfg(not(feature = "metrics"))]
pub fn add_download_bytes(_bytes: u64) {}
