//! Named connection profiles.
//!
//! A [`ConnectionSession`] describes one player endpoint. Persisting
//! sessions is the job of a [`SessionStore`]; the connection worker only
//! borrows a session for the duration of one connection attempt and reports
//! back through [`RemoteEvent::TransportConnected`](crate::event::RemoteEvent)
//! and [`RemoteEvent::RemoteFilesChanged`](crate::event::RemoteEvent).

use std::sync::{PoisonError, RwLock};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_PORT;

/// Connection parameters for one player.
///
/// ```
/// use remotewire::session::ConnectionSession;
///
/// let session = ConnectionSession::new("living room", "192.168.1.20", 5500).with_auth_code(1234);
/// assert_eq!(session.address(), "192.168.1.20:5500");
/// assert_eq!(session.auth_code, Some(1234));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionSession {
    pub name: String,
    pub host: String,
    pub port: u16,
    pub auth_code: Option<i32>,
    /// Last remote directory browsed through this session.
    #[serde(default)]
    pub browse_path: String,
}

impl ConnectionSession {
    #[must_use]
    pub fn new(name: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
            port,
            auth_code: None,
            browse_path: String::new(),
        }
    }

    #[must_use]
    pub fn with_auth_code(mut self, code: i32) -> Self {
        self.auth_code = Some(code);
        self
    }

    /// `host:port` string suitable for address resolution.
    #[must_use]
    pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

impl Default for ConnectionSession {
    fn default() -> Self { Self::new("default", "127.0.0.1", DEFAULT_PORT) }
}

/// Storage for connection profiles.
///
/// Implementations must be safe to share between the event consumer and
/// whatever front end edits profiles.
pub trait SessionStore: Send + Sync {
    /// Look up a profile by name.
    fn get(&self, name: &str) -> Option<ConnectionSession>;

    /// Insert or replace a profile.
    fn save(&self, session: ConnectionSession);

    /// Delete a profile, returning it if it existed.
    fn remove(&self, name: &str) -> Option<ConnectionSession>;

    /// Names of all stored profiles, sorted.
    fn names(&self) -> Vec<String>;

    /// Profile most recently connected to.
    fn last_used(&self) -> Option<ConnectionSession>;

    /// Store `session` and mark it as most recently used.
    fn record_connected(&self, session: ConnectionSession);

    /// Remember the remote directory last browsed through `name`.
    ///
    /// Returns `false` if no such profile exists.
    fn update_browse_path(&self, name: &str, path: &str) -> bool;
}

/// Process-local [`SessionStore`].
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: DashMap<String, ConnectionSession>,
    last_used: RwLock<Option<String>>,
}

impl InMemorySessionStore {
    #[must_use]
    pub fn new() -> Self { Self::default() }
}

impl SessionStore for InMemorySessionStore {
    fn get(&self, name: &str) -> Option<ConnectionSession> {
        self.sessions.get(name).map(|entry| entry.value().clone())
    }

    fn save(&self, session: ConnectionSession) { self.sessions.insert(session.name.clone(), session); }

    fn remove(&self, name: &str) -> Option<ConnectionSession> {
        let removed = self.sessions.remove(name).map(|(_, session)| session);
        let mut last = self.last_used.write().unwrap_or_else(PoisonError::into_inner);
        if last.as_deref() == Some(name) {
            *last = None;
        }
        removed
    }

    fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.sessions.iter().map(|entry| entry.key().clone()).collect();
        names.sort_unstable();
        names
    }

    fn last_used(&self) -> Option<ConnectionSession> {
        let last = self.last_used.read().unwrap_or_else(PoisonError::into_inner);
        last.as_deref().and_then(|name| self.get(name))
    }

    fn record_connected(&self, session: ConnectionSession) {
        let name = session.name.clone();
        match self.sessions.get_mut(&name) {
            Some(mut existing) => {
                let browse_path = std::mem::take(&mut existing.browse_path);
                *existing = ConnectionSession {
                    browse_path: if session.browse_path.is_empty() {
                        browse_path
                    } else {
                        session.browse_path
                    },
                    ..session
                };
            }
            None => {
                self.sessions.insert(name.clone(), session);
            }
        }
        *self.last_used.write().unwrap_or_else(PoisonError::into_inner) = Some(name);
    }

    fn update_browse_path(&self, name: &str, path: &str) -> bool {
        match self.sessions.get_mut(name) {
            Some(mut session) => {
                path.clone_into(&mut session.browse_path);
                true
            }
            None => false,
        }
    }
}
