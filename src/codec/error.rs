//! Error types for the envelope codec.
//!
//! The taxonomy separates wire-level framing faults from payload decoding
//! failures, transport I/O errors and end-of-stream conditions:
//!
//! - [`FramingError`]: the length prefix itself is unacceptable.
//! - [`ProtocolError`]: a well-framed payload could not be decoded into a message.
//! - [`EofError`]: the peer closed the stream mid-envelope.
//! - [`CodecError`]: top-level enum wrapping all categories plus I/O errors.
//!
//! Each error carries a default [`RecoveryPolicy`] via
//! [`CodecError::default_recovery_policy`].

use std::io;

use thiserror::Error;

use super::recovery::RecoveryPolicy;

/// Errors raised while reading or writing the envelope length prefix.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FramingError {
    /// The length prefix announces more than the permitted maximum.
    ///
    /// The stream cannot be resynchronised after this, so the connection is
    /// closed.
    #[error("envelope exceeds max length: {size} > {max}")]
    OversizedFrame {
        /// Length announced by the prefix (or the outbound payload size).
        size: usize,
        /// Maximum allowed payload size.
        max: usize,
    },
}

/// Errors raised after an envelope has been framed successfully.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// The payload bytes do not decode into a known message.
    #[error("undecodable {length} byte payload: {reason}")]
    UndecodablePayload {
        /// Payload size in bytes.
        length: usize,
        /// Decoder diagnostic.
        reason: String,
    },
}

/// End-of-stream conditions.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum EofError {
    /// The peer closed the stream while a payload was outstanding.
    #[error("premature EOF: {bytes_received} bytes of {expected} byte envelope received")]
    MidFrame {
        /// Payload bytes received before EOF.
        bytes_received: usize,
        /// Length announced by the prefix.
        expected: usize,
    },

    /// The peer closed the stream part way through a length prefix.
    #[error("premature EOF during header: {bytes_received} of {header_size} header bytes")]
    MidHeader {
        /// Header bytes received before EOF.
        bytes_received: usize,
        /// Expected header size.
        header_size: usize,
    },
}

/// Top-level codec error.
///
/// # Examples
///
/// ```
/// use remotewire::codec::{CodecError, FramingError, RecoveryPolicy};
///
/// let err = CodecError::Framing(FramingError::OversizedFrame {
///     size: 200 * 1024 * 1024,
///     max: 128 * 1024 * 1024,
/// });
/// assert_eq!(err.default_recovery_policy(), RecoveryPolicy::Disconnect);
/// assert!(err.should_disconnect());
/// ```
#[derive(Debug, Error)]
pub enum CodecError {
    /// Length prefix error.
    #[error("framing error: {0}")]
    Framing(#[from] FramingError),

    /// Payload decoding error.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Transport I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// End-of-stream handling.
    #[error("EOF: {0}")]
    Eof(#[from] EofError),
}

impl CodecError {
    /// Returns the recommended recovery policy for this error.
    ///
    /// | Error Type | Policy |
    /// |------------|--------|
    /// | `Framing` | `Disconnect` |
    /// | `Protocol` | `Drop` |
    /// | `Io` | `Disconnect` |
    /// | `Eof` | `Disconnect` |
    ///
    /// ```
    /// use remotewire::codec::{CodecError, ProtocolError, RecoveryPolicy};
    ///
    /// let err = CodecError::Protocol(ProtocolError::UndecodablePayload {
    ///     length: 3,
    ///     reason: "unexpected end".into(),
    /// });
    /// assert_eq!(err.default_recovery_policy(), RecoveryPolicy::Drop);
    /// ```
    #[must_use]
    pub fn default_recovery_policy(&self) -> RecoveryPolicy {
        match self {
            Self::Protocol(_) => RecoveryPolicy::Drop,
            Self::Framing(_) | Self::Io(_) | Self::Eof(_) => RecoveryPolicy::Disconnect,
        }
    }

    /// Returns true if the connection should be terminated.
    #[must_use]
    pub fn should_disconnect(&self) -> bool {
        self.default_recovery_policy() == RecoveryPolicy::Disconnect
    }

    /// Returns the error category as a string for logging and metrics.
    ///
    /// One of: `"framing"`, `"protocol"`, `"io"`, or `"eof"`.
    #[must_use]
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Framing(_) => "framing",
            Self::Protocol(_) => "protocol",
            Self::Io(_) => "io",
            Self::Eof(_) => "eof",
        }
    }
}

impl From<CodecError> for io::Error {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::Io(e) => e,
            CodecError::Framing(e) => io::Error::new(io::ErrorKind::InvalidData, e),
            CodecError::Protocol(e) => io::Error::new(io::ErrorKind::InvalidData, e),
            CodecError::Eof(e) => io::Error::new(io::ErrorKind::UnexpectedEof, e),
        }
    }
}
