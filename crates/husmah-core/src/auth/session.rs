use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};

use super::clock::Clock;
use super::store::KeyValueStore;
use crate::models::User;

/// Maximum session lifetime in milliseconds (30 minutes).
pub const SESSION_TIMEOUT_MS: i64 = 30 * 60 * 1000;

/// Key holding the serialized `User`
pub const USER_KEY: &str = "user";

/// Key holding the session start as decimal epoch milliseconds
pub const LOGIN_TIME_KEY: &str = "loginTime";

/// Key holding the backend's last-login timestamp, if it sent one
pub const LAST_LOGIN_KEY: &str = "lastLoginAt";

/// What is currently in storage, after interpretation
#[derive(Debug)]
enum Record {
    Absent,
    Corrupt,
    Expired,
    Valid(User),
}

/// Durable holder of the current session.
///
/// None of these operations fail: unreadable data counts as no session and
/// failed writes are logged.
pub struct SessionStore {
    backend: Box<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
}

impl SessionStore {
    pub fn new(backend: impl KeyValueStore + 'static, clock: Arc<dyn Clock>) -> Self {
        Self {
            backend: Box::new(backend),
            clock,
        }
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn now_millis(&self) -> i64 {
        self.clock.now_millis()
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.backend.get(key) {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "Failed to read session key");
                None
            }
        }
    }

    fn write(&mut self, key: &str, value: &str) {
        if let Err(e) = self.backend.set(key, value) {
            warn!(key, error = %e, "Failed to write session key");
        }
    }

    fn delete(&mut self, key: &str) {
        if let Err(e) = self.backend.remove(key) {
            warn!(key, error = %e, "Failed to remove session key");
        }
    }

    fn login_time(&self) -> Option<i64> {
        self.read(LOGIN_TIME_KEY)?.trim().parse().ok()
    }

    /// Milliseconds since the stored start. `None` when the start lies in
    /// the future or is too far back to measure, both of which mean the
    /// stored value cannot be trusted.
    fn elapsed_since(&self, started: i64) -> Option<i64> {
        let elapsed = self.now_millis().checked_sub(started)?;
        (elapsed >= 0).then_some(elapsed)
    }

    fn record(&self) -> Record {
        let (Some(raw_user), Some(started)) = (self.read(USER_KEY), self.login_time()) else {
            return Record::Absent;
        };
        let user: User = match serde_json::from_str(&raw_user) {
            Ok(user) => user,
            Err(e) => {
                debug!(error = %e, "Stored identity is not a valid user");
                return Record::Corrupt;
            }
        };
        match self.elapsed_since(started) {
            Some(elapsed) if elapsed < SESSION_TIMEOUT_MS => Record::Valid(user),
            Some(_) => Record::Expired,
            None => {
                debug!(started, "Stored start time is out of range");
                Record::Corrupt
            }
        }
    }

    /// True iff an identity and start time are stored, both parse, and less
    /// than 30 minutes have elapsed.
    pub fn is_valid(&self) -> bool {
        matches!(self.record(), Record::Valid(_))
    }

    /// Start a new session for `user`, replacing any previous one.
    pub fn set_user(&mut self, user: &User) {
        let raw = match serde_json::to_string(user) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "Failed to serialize user");
                return;
            }
        };
        let now = self.now_millis();
        self.write(USER_KEY, &raw);
        self.write(LOGIN_TIME_KEY, &now.to_string());
        match user.last_login_at {
            Some(ref at) => self.write(LAST_LOGIN_KEY, at),
            None => self.delete(LAST_LOGIN_KEY),
        }
        debug!(email = %user.email, started_at = now, "Session started");
    }

    /// Remove every session field.
    pub fn clear(&mut self) {
        self.delete(USER_KEY);
        self.delete(LAST_LOGIN_KEY);
        self.delete(LOGIN_TIME_KEY);
    }

    /// The signed-in user, if the session is valid. A corrupt identity
    /// clears the store.
    pub fn get_user(&mut self) -> Option<User> {
        match self.record() {
            Record::Valid(user) => Some(user),
            Record::Corrupt => {
                warn!("Clearing corrupt session data");
                self.clear();
                None
            }
            Record::Absent | Record::Expired => None,
        }
    }

    /// Restart the session window if the session is still valid.
    pub fn extend(&mut self) -> bool {
        if !self.is_valid() {
            return false;
        }
        let now = self.now_millis();
        self.write(LOGIN_TIME_KEY, &now.to_string());
        debug!(started_at = now, "Session extended");
        true
    }

    /// Time left before the session expires, never negative.
    pub fn remaining(&self) -> Duration {
        let elapsed = self
            .login_time()
            .and_then(|started| self.elapsed_since(started));
        match elapsed {
            Some(elapsed) => Duration::milliseconds((SESSION_TIMEOUT_MS - elapsed).max(0)),
            None => Duration::zero(),
        }
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.login_time()?)
    }

    /// The backend's last-login timestamp recorded at sign-in
    pub fn last_login_at(&self) -> Option<String> {
        self.read(LAST_LOGIN_KEY)
    }

    /// Direct access to the backing store
    pub fn backend_mut(&mut self) -> &mut dyn KeyValueStore {
        self.backend.as_mut()
    }
}
