//! # Configuration Session State
//!
//! One shopper's in-progress picks for one product, held server-side.
//!
//! ## Session Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Session State Operations                             │
//! │                                                                         │
//! │  Shopper Action           Command                  State Change         │
//! │  ──────────────           ───────                  ────────────         │
//! │                                                                         │
//! │  Open product ──────────► start_session() ───────► insert(session)     │
//! │                                                                         │
//! │  Pick option ───────────► select_option() ───────► selection.select()  │
//! │                                                                         │
//! │  Reset option ──────────► clear_option() ────────► selection.clear()   │
//! │                                                                         │
//! │  Open dropdown ─────────► session_available_options() (read only)      │
//! │                                                                         │
//! │  Add to cart ───────────► finish_session() ──────► remove(id) if Ok    │
//! │                                                                         │
//! │  Navigate away ─────────► end_session() ─────────► remove(id)          │
//! │                                                                         │
//! │  NOTE: The lock is taken for a copy or a write and released before     │
//! │        any database call. Sessions idle longer than the idle timeout   │
//! │        are dropped on access and before every insert.                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use forma_core::Selection;
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

/// Idle time after which a session is discarded.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// A shopper's configuration of one product.
///
/// Sessions store the product id, not a catalog snapshot. Every command
/// reloads the product so admin changes are picked up between calls.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationSession {
    pub id: Uuid,
    pub product_id: String,
    pub selection: Selection,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ConfigurationSession {
    /// Starts an empty session for `product_id`.
    pub fn new(product_id: impl Into<String>) -> Self {
        let now = Utc::now();
        ConfigurationSession {
            id: Uuid::new_v4(),
            product_id: product_id.into(),
            selection: Selection::new(),
            started_at: now,
            updated_at: now,
        }
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Whether the session has been idle for longer than `timeout` at `now`.
    pub fn is_idle(&self, now: DateTime<Utc>, timeout: Duration) -> bool {
        now.signed_duration_since(self.updated_at)
            .to_std()
            .is_ok_and(|idle| idle > timeout)
    }
}

/// Open configuration sessions, bounded by a limit and an idle timeout.
#[derive(Debug, Clone)]
pub struct SessionState {
    sessions: Arc<Mutex<HashMap<Uuid, ConfigurationSession>>>,
    limit: usize,
    idle_timeout: Duration,
}

impl SessionState {
    pub fn new(limit: usize) -> Self {
        SessionState {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            limit,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }

    /// Sets the idle timeout.
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Stores a new session after dropping idle ones.
    ///
    /// ## Returns
    /// - `Ok(id)` on success
    /// - `Err(String)` if the session limit is still reached
    pub fn insert(&self, session: ConfigurationSession) -> Result<Uuid, String> {
        let mut sessions = self.lock();
        self.evict_idle_locked(&mut sessions);
        if sessions.len() >= self.limit {
            return Err(format!(
                "Too many open configuration sessions (max {})",
                self.limit
            ));
        }
        let id = session.id;
        sessions.insert(id, session);
        Ok(id)
    }

    /// Returns a copy of the session.
    pub fn get(&self, id: &Uuid) -> Option<ConfigurationSession> {
        let mut sessions = self.lock();
        self.drop_if_idle(&mut sessions, id);
        sessions.get(id).cloned()
    }

    /// Executes a function with write access to one session.
    ///
    /// Returns `None` if the session does not exist.
    pub fn with_session_mut<F, R>(&self, id: &Uuid, f: F) -> Option<R>
    where
        F: FnOnce(&mut ConfigurationSession) -> R,
    {
        let mut sessions = self.lock();
        self.drop_if_idle(&mut sessions, id);
        sessions.get_mut(id).map(|session| {
            let result = f(session);
            session.touch();
            result
        })
    }

    /// Removes and returns the session.
    pub fn remove(&self, id: &Uuid) -> Option<ConfigurationSession> {
        self.lock().remove(id)
    }

    /// Number of open sessions.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn evict_idle_locked(&self, sessions: &mut HashMap<Uuid, ConfigurationSession>) -> usize {
        let now = Utc::now();
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_idle(now, self.idle_timeout));
        let evicted = before - sessions.len();
        if evicted > 0 {
            debug!(evicted, open = sessions.len(), "Evicted idle configuration sessions");
        }
        evicted
    }

    fn drop_if_idle(&self, sessions: &mut HashMap<Uuid, ConfigurationSession>, id: &Uuid) {
        let idle = sessions
            .get(id)
            .is_some_and(|s| s.is_idle(Utc::now(), self.idle_timeout));
        if idle {
            sessions.remove(id);
            debug!(session_id = %id, "Configuration session expired");
        }
    }

    // A panic while holding the lock leaves the map itself consistent,
    // so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, ConfigurationSession>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
