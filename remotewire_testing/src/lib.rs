//! Test fixtures for `remotewire`.
//!
//! [`MockPlayer`] is a loop-back server speaking the envelope codec, so
//! integration tests can script the player side of a session. The
//! [`chunks`] builders produce chunked transfers with real SHA-1 digests.
//!
//! ```rust,no_run
//! use remotewire::message::Message;
//! use remotewire_testing::MockPlayer;
//!
//! # async fn example() -> std::io::Result<()> {
//! let player = MockPlayer::bind().await?;
//! let mut peer = player.accept().await?;
//! peer.send(Message::FirstDataSentComplete).await?;
//! # Ok(())
//! # }
//! ```

pub mod chunks;
pub mod player;

pub use chunks::{library_transfer, sha1_hex, song_transfer};
pub use player::{MockPlayer, PlayerPeer};
