//! Connection lifecycle and protocol dispatch.
//!
//! [`ConnectionMachine`] holds the protocol logic: lifecycle states, the
//! player mirror, inbound routing and outbound command construction. It is
//! driven by a worker task that owns the socket and feeds it transport
//! notifications, decoded frames and [`Command`]s.

mod commands;
mod dispatch;
mod machine;
mod player;
pub(crate) mod runtime;
mod state;

pub use commands::{Command, ROOT_PATH, browse_path};
pub use machine::{ConnectionMachine, Effects};
pub use player::{NO_PLAYLIST, PlayerState};
pub use state::ConnectionState;
