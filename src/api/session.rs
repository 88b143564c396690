//! Per-upload editing sessions
//!
//! Each session owns one [`GridStore`] behind its own mutex, so edits to
//! different sessions never contend and every store operation runs under a
//! single lock acquisition.
//!
//! The registry is bounded: sessions idle for longer than the TTL are
//! dropped, and once `max_sessions` is reached the least recently used
//! session makes room for a new one.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::{Duration, Instant};

use tracing::info;
use uuid::Uuid;

use crate::core::GridStore;

pub type SharedStore = Arc<Mutex<GridStore>>;

/// Default cap on live sessions
pub const DEFAULT_MAX_SESSIONS: usize = 1000;

/// Default idle time after which a session is discarded
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(60 * 60);

struct Session {
    store: SharedStore,
    last_access: Mutex<Instant>,
    /// Access order; larger means more recent
    last_tick: AtomicU64,
}

impl Session {
    fn touch(&self, tick: u64) {
        *self
            .last_access
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Instant::now();
        self.last_tick.store(tick, Ordering::Relaxed);
    }

    fn idle_for(&self, now: Instant) -> Duration {
        let last = *self
            .last_access
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        now.saturating_duration_since(last)
    }
}

pub struct SessionRegistry {
    sessions: RwLock<HashMap<Uuid, Session>>,
    clock: AtomicU64,
    max_sessions: usize,
    ttl: Duration,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::with_limits(DEFAULT_MAX_SESSIONS, DEFAULT_SESSION_TTL)
    }
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding at most `max_sessions` (at least one) sessions,
    /// each discarded after `ttl` without access
    pub fn with_limits(max_sessions: usize, ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            clock: AtomicU64::new(0),
            max_sessions: max_sessions.max(1),
            ttl,
        }
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed)
    }

    /// Register a store under a fresh session id.
    ///
    /// Expired sessions are swept first; if the registry is still full the
    /// least recently used session is evicted.
    pub fn create(&self, store: GridStore) -> Uuid {
        let id = Uuid::new_v4();
        let rows = store.row_count();
        let session = Session {
            store: Arc::new(Mutex::new(store)),
            last_access: Mutex::new(Instant::now()),
            last_tick: AtomicU64::new(self.tick()),
        };

        let mut sessions = self
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        let now = Instant::now();
        let before = sessions.len();
        sessions.retain(|_, s| s.idle_for(now) <= self.ttl);
        let expired = before - sessions.len();
        if expired > 0 {
            info!(expired, "idle sessions discarded");
        }

        while sessions.len() >= self.max_sessions {
            let oldest = sessions
                .iter()
                .min_by_key(|(_, s)| s.last_tick.load(Ordering::Relaxed))
                .map(|(id, _)| *id);
            match oldest {
                Some(old) => {
                    sessions.remove(&old);
                    info!(session = %old, "session evicted to make room");
                }
                None => break,
            }
        }

        sessions.insert(id, session);
        info!(session = %id, rows, "session created");
        id
    }

    /// Look up a live session and mark it as used
    pub fn get(&self, id: &Uuid) -> Option<SharedStore> {
        let sessions = self
            .sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let session = sessions.get(id)?;
        if session.idle_for(Instant::now()) > self.ttl {
            return None;
        }
        session.touch(self.tick());
        Some(session.store.clone())
    }

    /// Drop a session; returns false if it did not exist
    pub fn remove(&self, id: &Uuid) -> bool {
        let removed = self
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
            .is_some();
        if removed {
            info!(session = %id, "session discarded");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn max_sessions(&self) -> usize {
        self.max_sessions
    }
}
