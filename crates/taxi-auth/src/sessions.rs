//! Server-side sessions.
//!
//! The browser holds only a signed session key; the data lives in a
//! [`SessionBackend`]. [`InMemorySessionBackend`] keeps sessions in a map
//! behind an async `RwLock`, so they are lost on restart.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use taxi_core::TaxiResult;
use tokio::sync::RwLock;

/// Length of generated session keys.
pub const SESSION_KEY_LENGTH: usize = 32;

/// Generates a random alphanumeric string of `len` characters.
pub fn generate_key(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Data stored for one session.
#[derive(Debug, Clone)]
pub struct SessionData {
    /// The key identifying this session.
    pub session_key: String,
    /// Arbitrary JSON values keyed by name.
    pub data: HashMap<String, serde_json::Value>,
    /// When the session stops being valid.
    pub expire_date: DateTime<Utc>,
    /// Whether `data` changed since the session was loaded.
    pub modified: bool,
}

impl SessionData {
    /// Creates an empty session with a fresh random key that expires
    /// `lifetime_seconds` from now.
    pub fn new(lifetime_seconds: i64) -> Self {
        Self::with_key(generate_key(SESSION_KEY_LENGTH), lifetime_seconds)
    }

    /// Creates an empty session with the given key.
    pub fn with_key(session_key: String, lifetime_seconds: i64) -> Self {
        Self {
            session_key,
            data: HashMap::new(),
            expire_date: Utc::now() + Duration::seconds(lifetime_seconds),
            modified: false,
        }
    }

    /// Reads a value.
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.data.get(key)
    }

    /// Writes a value.
    pub fn set(&mut self, key: &str, value: serde_json::Value) {
        self.data.insert(key.to_string(), value);
        self.modified = true;
    }

    /// Removes a value, returning it.
    pub fn remove(&mut self, key: &str) -> Option<serde_json::Value> {
        let removed = self.data.remove(key);
        if removed.is_some() {
            self.modified = true;
        }
        removed
    }

    /// Removes every value.
    pub fn clear(&mut self) {
        self.data.clear();
        self.modified = true;
    }

    /// Gives the session a new key, keeping its data. Done on login so a
    /// key known before authentication cannot be reused afterwards.
    pub fn cycle_key(&mut self) -> String {
        let old = std::mem::replace(&mut self.session_key, generate_key(SESSION_KEY_LENGTH));
        self.modified = true;
        old
    }

    /// Returns `true` once the expiry date has passed.
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expire_date
    }

    /// Number of stored values.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Persistence for session data.
#[async_trait]
pub trait SessionBackend: Send + Sync {
    /// Loads a live session. Missing and expired sessions are `None`.
    async fn load(&self, session_key: &str) -> TaxiResult<Option<SessionData>>;

    /// Stores a session under its key.
    async fn save(&self, session: &SessionData) -> TaxiResult<()>;

    /// Deletes a session.
    async fn delete(&self, session_key: &str) -> TaxiResult<()>;
}

/// Sessions kept in process memory.
///
/// Expired entries are evicted when they are loaded, and every save sweeps
/// the rest, so abandoned sessions do not outlive their expiry by more than
/// one write.
#[derive(Debug, Default, Clone)]
pub struct InMemorySessionBackend {
    sessions: Arc<RwLock<HashMap<String, SessionData>>>,
}

impl InMemorySessionBackend {
    /// Creates an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sessions, expired ones included.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Returns `true` if no sessions are stored.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

fn clear_expired(sessions: &mut HashMap<String, SessionData>) {
    let before = sessions.len();
    sessions.retain(|_, s| !s.is_expired());
    let removed = before - sessions.len();
    if removed > 0 {
        tracing::debug!(removed, "Cleared expired sessions");
    }
}

#[async_trait]
impl SessionBackend for InMemorySessionBackend {
    async fn load(&self, session_key: &str) -> TaxiResult<Option<SessionData>> {
        {
            let sessions = self.sessions.read().await;
            match sessions.get(session_key) {
                None => return Ok(None),
                Some(s) if !s.is_expired() => {
                    let mut s = s.clone();
                    s.modified = false;
                    return Ok(Some(s));
                }
                Some(_) => {}
            }
        }
        let mut sessions = self.sessions.write().await;
        if sessions.get(session_key).is_some_and(SessionData::is_expired) {
            sessions.remove(session_key);
        }
        Ok(None)
    }

    async fn save(&self, session: &SessionData) -> TaxiResult<()> {
        let mut sessions = self.sessions.write().await;
        clear_expired(&mut sessions);
        sessions.insert(session.session_key.clone(), session.clone());
        Ok(())
    }

    async fn delete(&self, session_key: &str) -> TaxiResult<()> {
        self.sessions.write().await.remove(session_key);
        Ok(())
    }
}
