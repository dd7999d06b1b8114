//! Remote control client for a networked media player.
//!
//! The player speaks length-prefixed, versioned binary envelopes over TCP.
//! This crate frames and decodes them ([`codec`], [`message`]), runs the
//! connection lifecycle and protocol dispatch ([`connection`]), reassembles
//! chunked song and library transfers ([`download`]) and exposes the whole
//! thing to a front end through [`remote::Remote`] and a stream of
//! [`event::RemoteEvent`]s.

pub mod codec;
pub mod config;
pub mod connection;
pub mod download;
pub mod event;
pub mod message;
pub mod metrics;
pub mod remote;
pub mod session;

pub use codec::{CodecError, EnvelopeCodec};
pub use config::RemoteConfig;
pub use connection::{Command, ConnectionMachine, ConnectionState};
pub use event::RemoteEvent;
pub use message::{Envelope, Message, MsgType};
pub use remote::{Remote, RemoteError};
pub use session::{ConnectionSession, InMemorySessionStore, SessionStore};
