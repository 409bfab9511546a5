//! In-memory store of finished conversions.
//!
//! Each JSON-mode conversion registers its pages under a fresh UUID v4 so the
//! client can come back for individual pages or a ZIP of all of them. The
//! store is the only mutable state shared between requests; one mutex guards
//! it and is never held across an `.await` or an encode/zip step.
//!
//! Sessions expire after a TTL and the store holds at most `max_sessions`
//! entries; inserting into a full store evicts the oldest session first.

use crate::output::RenderedPage;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::{debug, info};
use uuid::Uuid;

/// Opaque session identifier.
pub type SessionId = Uuid;

/// Lifecycle limits for stored sessions.
#[derive(Debug, Clone, Copy)]
pub struct SessionPolicy {
    /// How long a session stays retrievable after creation.
    pub ttl: Duration,
    /// Upper bound on live sessions.
    pub max_sessions: usize,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(3600),
            max_sessions: 256,
        }
    }
}

struct Entry {
    pages: Arc<[RenderedPage]>,
    created: Instant,
}

/// Thread-safe session map. Cheap to clone; clones share the same map.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Mutex<HashMap<SessionId, Entry>>>,
    policy: SessionPolicy,
}

impl SessionStore {
    pub fn new(policy: SessionPolicy) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            policy: SessionPolicy {
                max_sessions: policy.max_sessions.max(1),
                ..policy
            },
        }
    }

    pub fn policy(&self) -> SessionPolicy {
        self.policy
    }

    /// Store `pages` under a new session id and return the id.
    ///
    /// The page list is frozen from here on.
    pub fn put(&self, pages: Vec<RenderedPage>) -> SessionId {
        let now = Instant::now();
        let id = Uuid::new_v4();
        let page_count = pages.len();

        let mut map = self.lock();
        Self::purge_locked(&mut map, now, self.policy.ttl);
        while map.len() >= self.policy.max_sessions {
            let Some(oldest) = map
                .iter()
                .min_by_key(|(_, e)| e.created)
                .map(|(key, _)| *key)
            else {
                break;
            };
            map.remove(&oldest);
            info!("Session store full, evicted oldest session {}", oldest);
        }
        map.insert(
            id,
            Entry {
                pages: pages.into(),
                created: now,
            },
        );
        debug!("Stored session {} ({} pages, {} live)", id, page_count, map.len());
        id
    }

    /// Look up a session's pages. Expired sessions are treated as absent.
    pub fn get(&self, id: &SessionId) -> Option<Arc<[RenderedPage]>> {
        let map = self.lock();
        map.get(id)
            .filter(|e| e.created.elapsed() < self.policy.ttl)
            .map(|e| Arc::clone(&e.pages))
    }

    /// Drop every expired session, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let mut map = self.lock();
        Self::purge_locked(&mut map, Instant::now(), self.policy.ttl)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn purge_locked(map: &mut HashMap<SessionId, Entry>, now: Instant, ttl: Duration) -> usize {
        let before = map.len();
        map.retain(|_, e| now.duration_since(e.created) < ttl);
        before - map.len()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<SessionId, Entry>> {
        // every mutation is a single HashMap call, so a poisoned map is consistent
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(SessionPolicy::default())
    }
}
