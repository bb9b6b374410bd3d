//! Local accounts
//!
//! Registration and login against the `users` record in storage. Passwords
//! are kept as BLAKE3 digests. Three wrong passwords lock the account for
//! thirty seconds.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::platform::clock::iso8601;
use crate::platform::session::{Session, StoredSession};
use crate::platform::storage::{KeyValueStore, StorageError, read_json, write_json};
use crate::settings::Settings;
use crate::stats::{LoginRecord, UserStats, track_session_start};

/// LocalStorage key of the user directory
pub const USERS_KEY: &str = "users";

pub const MIN_PASSWORD_LEN: usize = 4;
pub const MAX_LOGIN_ATTEMPTS: u32 = 3;
pub const LOCKOUT_MS: f64 = 30.0 * 1000.0;

/// Why a registration or login was refused
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Username is required.")]
    EmptyUsername,
    #[error("Username already exists.")]
    UsernameTaken,
    #[error("Passwords do not match.")]
    PasswordMismatch,
    #[error("Password must be at least {min} characters.")]
    PasswordTooShort { min: usize },
    #[error("User does not exist.")]
    UnknownUser,
    #[error("User is blocked. Try again in {seconds_left}s.")]
    Blocked { seconds_left: u64 },
    #[error("Wrong password. Attempts: {attempts}/{max}")]
    WrongPassword { attempts: u32, max: u32 },
    #[error("Too many attempts! User blocked for {seconds} seconds.")]
    LockedOut { seconds: u64 },
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// A stored account, including its play statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserRecord {
    pub username: String,
    pub email: String,
    pub password_digest: String,
    pub login_attempts: u32,
    /// Epoch millis until which logins are refused
    pub blocked_until: f64,
    pub account_created: Option<String>,
    pub last_login: Option<String>,
    pub total_logins: u32,
    /// Newest first
    pub login_history: Vec<LoginRecord>,
    pub stats: UserStats,
}

/// All accounts, keyed by username
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Users {
    records: BTreeMap<String, UserRecord>,
}

impl Users {
    /// Load the directory; missing or corrupt data reads as no users
    pub fn load(store: &dyn KeyValueStore) -> Self {
        read_json(store, USERS_KEY).unwrap_or_default()
    }

    pub fn save(&self, store: &dyn KeyValueStore) -> Result<(), StorageError> {
        write_json(store, USERS_KEY, self)
    }

    pub fn get(&self, username: &str) -> Option<&UserRecord> {
        self.records.get(username)
    }

    pub fn get_mut(&mut self, username: &str) -> Option<&mut UserRecord> {
        self.records.get_mut(username)
    }

    pub fn contains(&self, username: &str) -> bool {
        self.records.contains_key(username)
    }

    pub fn insert(&mut self, record: UserRecord) {
        self.records.insert(record.username.clone(), record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Registration/login front door
pub struct Accounts<S> {
    store: S,
    sessions: StoredSession<S>,
    register_minutes: u32,
    login_minutes: u32,
}

impl<S: KeyValueStore + Clone> Accounts<S> {
    pub fn new(store: S, settings: &Settings) -> Self {
        Self {
            sessions: StoredSession::new(store.clone()),
            store,
            register_minutes: settings.register_session_minutes,
            login_minutes: settings.login_session_minutes,
        }
    }

    /// Create an account and log it in
    pub fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
        confirm: &str,
        now_ms: f64,
    ) -> Result<Session, AuthError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(AuthError::EmptyUsername);
        }

        let mut users = Users::load(&self.store);
        if users.contains(username) {
            return Err(AuthError::UsernameTaken);
        }
        if password != confirm {
            return Err(AuthError::PasswordMismatch);
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::PasswordTooShort {
                min: MIN_PASSWORD_LEN,
            });
        }

        let mut record = UserRecord {
            username: username.to_string(),
            email: email.trim().to_string(),
            password_digest: password_digest(username, password),
            account_created: Some(iso8601(now_ms)),
            ..Default::default()
        };
        track_session_start(&mut record, now_ms);
        users.insert(record);
        users.save(&self.store)?;

        log::info!("Registered {}", username);
        Ok(self.sessions.open(username, now_ms, self.register_minutes)?)
    }

    /// Check credentials and open a session
    pub fn login(&self, username: &str, password: &str, now_ms: f64) -> Result<Session, AuthError> {
        let username = username.trim();
        let mut users = Users::load(&self.store);
        let record = users.get_mut(username).ok_or(AuthError::UnknownUser)?;

        if now_ms < record.blocked_until {
            let seconds_left = ((record.blocked_until - now_ms) / 1000.0).ceil() as u64;
            return Err(AuthError::Blocked { seconds_left });
        }

        if record.password_digest != password_digest(username, password) {
            record.login_attempts += 1;
            let err = if record.login_attempts >= MAX_LOGIN_ATTEMPTS {
                record.blocked_until = now_ms + LOCKOUT_MS;
                record.login_attempts = 0;
                log::warn!("Locked out {} after repeated failures", username);
                AuthError::LockedOut {
                    seconds: (LOCKOUT_MS / 1000.0) as u64,
                }
            } else {
                AuthError::WrongPassword {
                    attempts: record.login_attempts,
                    max: MAX_LOGIN_ATTEMPTS,
                }
            };
            users.save(&self.store)?;
            return Err(err);
        }

        record.login_attempts = 0;
        track_session_start(record, now_ms);
        users.save(&self.store)?;

        log::info!("Logged in {}", username);
        Ok(self.sessions.open(username, now_ms, self.login_minutes)?)
    }

    /// End the current session
    pub fn logout(&self) -> Result<(), AuthError> {
        self.sessions.clear()?;
        log::info!("Logged out");
        Ok(())
    }

    /// Drop an expired session. Returns true if one was cleared, which is
    /// the cue to send the player back to the login page.
    pub fn expire_session(&self, now_ms: f64) -> bool {
        match self.sessions.stored() {
            Some(session) if session.is_expired(now_ms) => {
                if let Err(e) = self.sessions.clear() {
                    log::warn!("Failed to clear expired session: {}", e);
                }
                log::info!("Session for {} expired", session.username);
                true
            }
            _ => false,
        }
    }

    pub fn sessions(&self) -> &StoredSession<S> {
        &self.sessions
    }
}

/// Salted digest stored instead of the password
fn password_digest(username: &str, password: &str) -> String {
    blake3::hash(format!("{}:{}", username, password).as_bytes())
        .to_hex()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{MemoryStore, SessionProvider};

    fn accounts() -> (MemoryStore, Accounts<MemoryStore>) {
        let store = MemoryStore::new();
        let accounts = Accounts::new(store.clone(), &Settings::default());
        (store, accounts)
    }

    #[test]
    fn test_register_validates_input() {
        let (_, accounts) = accounts();
        assert!(matches!(
            accounts.register("  ", "a@b.c", "pass", "pass", 0.0),
            Err(AuthError::EmptyUsername)
        ));
        assert!(matches!(
            accounts.register("ada", "a@b.c", "pass", "pasz", 0.0),
            Err(AuthError::PasswordMismatch)
        ));
        assert!(matches!(
            accounts.register("ada", "a@b.c", "abc", "abc", 0.0),
            Err(AuthError::PasswordTooShort { min: 4 })
        ));

        accounts.register("ada", "a@b.c", "abcd", "abcd", 0.0).unwrap();
        assert!(matches!(
            accounts.register("ada", "x@y.z", "efgh", "efgh", 0.0),
            Err(AuthError::UsernameTaken)
        ));
    }

    #[test]
    fn test_register_opens_session_and_hides_password() {
        let (store, accounts) = accounts();
        let session = accounts.register("ada", "a@b.c", "hunter2", "hunter2", 0.0).unwrap();
        assert_eq!(session.expires, 60.0 * 60_000.0);

        let raw = store.get(USERS_KEY).unwrap();
        assert!(!raw.contains("hunter2"));

        let users = Users::load(&store);
        let record = users.get("ada").unwrap();
        assert_eq!(record.total_logins, 1);
        assert_eq!(record.account_created.as_deref(), Some("1970-01-01T00:00:00.000Z"));
    }

    #[test]
    fn test_login_lockout_after_three_failures() {
        let (_, accounts) = accounts();
        accounts.register("ada", "", "secret", "secret", 0.0).unwrap();
        accounts.logout().unwrap();

        assert!(matches!(
            accounts.login("ada", "nope", 1000.0),
            Err(AuthError::WrongPassword { attempts: 1, max: 3 })
        ));
        assert!(matches!(
            accounts.login("ada", "nope", 2000.0),
            Err(AuthError::WrongPassword { attempts: 2, max: 3 })
        ));
        assert!(matches!(
            accounts.login("ada", "nope", 3000.0),
            Err(AuthError::LockedOut { seconds: 30 })
        ));

        // Even the right password is refused while blocked
        assert!(matches!(
            accounts.login("ada", "secret", 3500.0),
            Err(AuthError::Blocked { seconds_left: 30 })
        ));

        let session = accounts.login("ada", "secret", 33_001.0).unwrap();
        assert_eq!(session.username, "ada");
        assert_eq!(session.expires, 33_001.0 + 30.0 * 60_000.0);
    }

    #[test]
    fn test_login_unknown_user() {
        let (_, accounts) = accounts();
        assert!(matches!(
            accounts.login("ghost", "x", 0.0),
            Err(AuthError::UnknownUser)
        ));
    }

    #[test]
    fn test_expire_session() {
        let (_, accounts) = accounts();
        accounts.register("ada", "", "secret", "secret", 0.0).unwrap();
        assert!(!accounts.expire_session(1000.0));
        assert!(accounts.sessions().current_session(1000.0).is_some());

        assert!(accounts.expire_session(61.0 * 60_000.0));
        assert!(accounts.sessions().stored().is_none());
    }

    #[test]
    fn test_old_records_gain_defaults() {
        let store = MemoryStore::new();
        store
            .set(
                USERS_KEY,
                r#"{"ada":{"username":"ada","email":"a@b.c","loginAttempts":0,"blockedUntil":0}}"#,
            )
            .unwrap();
        let users = Users::load(&store);
        let record = users.get("ada").unwrap();
        assert_eq!(record.stats.game1.games_played, 0);
        assert!(record.login_history.is_empty());
    }
}
