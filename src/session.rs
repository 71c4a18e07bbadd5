use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Name of the cookie carrying the session token
pub const SESSION_COOKIE: &str = "sid";

/// Opaque session identifier carried in the session cookie
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    /// Generate a fresh random session ID
    pub fn generate() -> Self {
        SessionId(Uuid::new_v4().to_string())
    }

    /// Accept a token from a cookie if it looks like one we issued
    pub fn parse(token: &str) -> Option<Self> {
        Uuid::parse_str(token).ok().map(|id| SessionId(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-session state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionData {
    /// Stored filename of the most recently uploaded spreadsheet
    pub uploaded_file: Option<String>,
}

/// Server-side session storage with expiry
///
/// Implementations must be safe to share between request handlers.
pub trait SessionStore: Send + Sync {
    /// Data for a live session, or `None` if unknown or expired
    fn get(&self, id: &SessionId) -> Option<SessionData>;

    /// Store data for a session and refresh its expiry
    fn set(&self, id: SessionId, data: SessionData);

    /// Drop every expired session, returning how many were removed
    fn purge_expired(&self) -> usize;
}

#[derive(Debug)]
struct Entry {
    data: SessionData,
    expires_at: Instant,
}

/// In-memory [`SessionStore`] with a fixed time-to-live
#[derive(Debug)]
pub struct MemorySessionStore {
    ttl: Duration,
    sessions: RwLock<HashMap<SessionId, Entry>>,
}

impl MemorySessionStore {
    pub fn new(ttl: Duration) -> Self {
        MemorySessionStore {
            ttl,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Number of stored sessions, expired ones included until purged
    pub fn len(&self) -> usize {
        self.sessions.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, id: &SessionId) -> Option<SessionData> {
        let sessions = self.sessions.read().unwrap_or_else(|e| e.into_inner());

        sessions
            .get(id)
            .filter(|entry| entry.expires_at > Instant::now())
            .map(|entry| entry.data.clone())
    }

    fn set(&self, id: SessionId, data: SessionData) {
        let entry = Entry {
            data,
            expires_at: Instant::now() + self.ttl,
        };

        // Entries are independent, so a poisoned lock is still safe to use
        let mut sessions = self.sessions.write().unwrap_or_else(|e| e.into_inner());
        sessions.insert(id, entry);
    }

    fn purge_expired(&self) -> usize {
        let mut sessions = self.sessions.write().unwrap_or_else(|e| e.into_inner());
        let before = sessions.len();
        let now = Instant::now();
        sessions.retain(|_, entry| entry.expires_at > now);
        before - sessions.len()
    }
}
