//! Length-prefixed envelope framing for the player control stream.
//!
//! Every protocol message travels as a 4-byte big-endian length followed by
//! exactly that many payload bytes. [`EnvelopeCodec`] implements both halves
//! of this contract for `tokio_util`'s [`Framed`](tokio_util::codec::Framed)
//! adapter:
//!
//! - decoding is partial-delivery safe: the codec remembers the declared length
//!   across read notifications and yields one payload per complete envelope,
//!   so a single readiness event may surface several envelopes;
//! - a declared length above the configured ceiling is a fatal
//!   [`FramingError::OversizedFrame`] raised before any payload is buffered;
//! - encoding writes the header and payload into one contiguous frame.
//!
//! # Error Handling
//!
//! Errors are reported through [`CodecError`]. Each variant maps to a
//! [`RecoveryPolicy`] telling the connection runtime whether to drop the
//! offending envelope or tear the connection down.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

pub mod error;
pub mod recovery;

pub use error::{CodecError, EofError, FramingError, ProtocolError};
pub use recovery::RecoveryPolicy;

/// Length prefix header size (4 bytes for a big-endian `u32`).
pub const LENGTH_HEADER_SIZE: usize = 4;

/// Largest payload a peer may announce (128 MiB).
///
/// Anything larger is treated as a corrupted stream.
pub const MAX_ENVELOPE_LENGTH: usize = 128 * 1024 * 1024;

/// Upper bound on a single buffer reservation while waiting for payload bytes.
///
/// The declared length is trusted only once the bytes actually arrive.
const RESERVE_STEP: usize = 64 * 1024;

/// Serialise an envelope length in network byte order.
#[must_use]
pub fn encode_length_header(length: u32) -> [u8; LENGTH_HEADER_SIZE] {
    #[expect(
        clippy::big_endian_bytes,
        reason = "The envelope header is defined in network byte order."
    )]
    length.to_be_bytes()
}

/// Parse an envelope length from its on-wire representation.
#[must_use]
pub fn decode_length_header(bytes: [u8; LENGTH_HEADER_SIZE]) -> u32 {
    #[expect(
        clippy::big_endian_bytes,
        reason = "The envelope header is defined in network byte order."
    )]
    u32::from_be_bytes(bytes)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DecodeState {
    /// Waiting for the 4-byte header.
    Head,
    /// Header consumed; waiting for this many payload bytes.
    Payload(usize),
}

/// Codec for the length-prefixed envelope stream.
///
/// # Examples
///
/// ```
/// use bytes::{Bytes, BytesMut};
/// use remotewire::codec::EnvelopeCodec;
/// use tokio_util::codec::{Decoder, Encoder};
///
/// let mut codec = EnvelopeCodec::default();
/// let mut wire = BytesMut::new();
/// codec
///     .encode(Bytes::from_static(b"ping"), &mut wire)
///     .expect("encode envelope");
/// assert_eq!(&wire[..4], &[0, 0, 0, 4]);
///
/// let payload = codec
///     .decode(&mut wire)
///     .expect("decode envelope")
///     .expect("complete envelope");
/// assert_eq!(payload.as_ref(), b"ping");
/// ```
#[derive(Clone, Debug)]
pub struct EnvelopeCodec {
    max_length: usize,
    state: DecodeState,
}

impl EnvelopeCodec {
    /// Construct a codec accepting payloads up to `max_length` bytes.
    ///
    /// The limit is clamped to [`MAX_ENVELOPE_LENGTH`].
    #[must_use]
    pub fn new(max_length: usize) -> Self {
        Self {
            max_length: max_length.min(MAX_ENVELOPE_LENGTH),
            state: DecodeState::Head,
        }
    }

    /// Maximum payload length accepted in either direction.
    #[must_use]
    pub const fn max_length(&self) -> usize { self.max_length }

    /// Whether a header has been consumed and its payload is still pending.
    #[must_use]
    pub const fn is_mid_envelope(&self) -> bool { matches!(self.state, DecodeState::Payload(_)) }

    fn decode_head(&self, src: &mut BytesMut) -> Result<Option<usize>, CodecError> {
        let Some(header) = src
            .get(..LENGTH_HEADER_SIZE)
            .and_then(|slice| <[u8; LENGTH_HEADER_SIZE]>::try_from(slice).ok())
        else {
            return Ok(None);
        };

        let declared = decode_length_header(header) as usize;
        if declared > self.max_length {
            return Err(FramingError::OversizedFrame {
                size: declared,
                max: self.max_length,
            }
            .into());
        }

        src.advance(LENGTH_HEADER_SIZE);
        Ok(Some(declared))
    }
}

impl Default for EnvelopeCodec {
    fn default() -> Self { Self::new(MAX_ENVELOPE_LENGTH) }
}

impl Decoder for EnvelopeCodec {
    type Item = Bytes;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let expected = match self.state {
            DecodeState::Head => match self.decode_head(src)? {
                Some(expected) => {
                    self.state = DecodeState::Payload(expected);
                    expected
                }
                None => return Ok(None),
            },
            DecodeState::Payload(expected) => expected,
        };

        if src.len() < expected {
            src.reserve((expected - src.len()).min(RESERVE_STEP));
            return Ok(None);
        }

        self.state = DecodeState::Head;
        Ok(Some(src.split_to(expected).freeze()))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(payload) = self.decode(src)? {
            return Ok(Some(payload));
        }

        match self.state {
            DecodeState::Head if src.is_empty() => Ok(None),
            DecodeState::Head => Err(EofError::MidHeader {
                bytes_received: src.len(),
                header_size: LENGTH_HEADER_SIZE,
            }
            .into()),
            DecodeState::Payload(expected) => Err(EofError::MidFrame {
                bytes_received: src.len(),
                expected,
            }
            .into()),
        }
    }
}

impl Encoder<Bytes> for EnvelopeCodec {
    type Error = CodecError;

    fn encode(&mut self, item: Bytes, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let oversized = || FramingError::OversizedFrame {
            size: item.len(),
            max: self.max_length,
        };
        if item.len() > self.max_length {
            return Err(oversized().into());
        }
        let length = u32::try_from(item.len()).map_err(|_| oversized())?;

        dst.reserve(LENGTH_HEADER_SIZE + item.len());
        dst.put_slice(&encode_length_header(length));
        dst.put_slice(&item);
        Ok(())
    }
}
