//! Logged-in session
//!
//! The session is a small JSON record under the `session` key. Games only ask
//! "who is playing right now"; no session means guest mode.

use serde::{Deserialize, Serialize};

use super::storage::{KeyValueStore, StorageError, read_json, write_json};

/// Storage key of the session record
pub const SESSION_KEY: &str = "session";

/// An authenticated session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub username: String,
    /// Epoch millis after which the session is no longer valid
    pub expires: f64,
}

impl Session {
    /// Session for `username` lasting `minutes` from `now`
    pub fn new(username: impl Into<String>, now_ms: f64, minutes: u32) -> Self {
        Self {
            username: username.into(),
            expires: now_ms + f64::from(minutes) * 60.0 * 1000.0,
        }
    }

    pub fn is_expired(&self, now_ms: f64) -> bool {
        now_ms > self.expires
    }
}

/// Supplies the current player's identity
pub trait SessionProvider {
    /// The valid session at `now_ms`, or `None` for guest play
    fn current_session(&self, now_ms: f64) -> Option<Session>;
}

/// A fixed identity (useful headless and in tests)
impl SessionProvider for Option<Session> {
    fn current_session(&self, now_ms: f64) -> Option<Session> {
        self.as_ref().filter(|s| !s.is_expired(now_ms)).cloned()
    }
}

/// Always plays as a guest
#[derive(Debug, Clone, Copy, Default)]
pub struct Guest;

impl SessionProvider for Guest {
    fn current_session(&self, _now_ms: f64) -> Option<Session> {
        None
    }
}

/// Session backed by the `session` storage key
#[derive(Debug, Clone)]
pub struct StoredSession<S> {
    store: S,
}

impl<S: KeyValueStore> StoredSession<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Start a session for `username`, replacing any existing one
    pub fn open(&self, username: &str, now_ms: f64, minutes: u32) -> Result<Session, StorageError> {
        let session = Session::new(username, now_ms, minutes);
        write_json(&self.store, SESSION_KEY, &session)?;
        log::info!("Session opened for {} ({} min)", username, minutes);
        Ok(session)
    }

    /// End the session
    pub fn clear(&self) -> Result<(), StorageError> {
        self.store.remove(SESSION_KEY)
    }

    /// The stored record regardless of expiry
    pub fn stored(&self) -> Option<Session> {
        read_json(&self.store, SESSION_KEY)
    }
}

impl<S: KeyValueStore> SessionProvider for StoredSession<S> {
    fn current_session(&self, now_ms: f64) -> Option<Session> {
        self.stored().filter(|s| !s.is_expired(now_ms))
    }
}
