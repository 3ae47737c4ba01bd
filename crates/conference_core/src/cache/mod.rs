//! Key-value cache client contract and an in-process implementation.
//!
//! # Responsibility
//! - Let read paths consume cached values without knowing the backend.
//! - Provide a TTL-aware in-memory cache for single-process deployments.
//!
//! # Invariants
//! - Expired entries are never returned.
//! - Cache reads never fail; backend trouble reads as a miss.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Read access to a shared key-value cache.
pub trait CacheClient {
    /// Returns the live value stored under `key`.
    fn get(&self, key: &str) -> Option<String>;
}

impl<C: CacheClient + ?Sized> CacheClient for &C {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: String,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |deadline| now < deadline)
    }
}

/// Thread-safe in-memory cache with optional per-entry TTL.
#[derive(Debug, Default)]
pub struct InMemoryCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` under `key`, replacing any previous entry.
    ///
    /// `ttl = None` keeps the entry until it is replaced or removed.
    pub fn put(&self, key: impl Into<String>, value: impl Into<String>, ttl: Option<Duration>) {
        let entry = CacheEntry {
            value: value.into(),
            expires_at: ttl.map(|ttl| Instant::now() + ttl),
        };
        self.lock().insert(key.into(), entry);
    }

    /// Removes `key`, returning whether a live entry was present.
    pub fn remove(&self, key: &str) -> bool {
        let now = Instant::now();
        self.lock()
            .remove(key)
            .is_some_and(|entry| entry.is_live(now))
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        // A panicked writer cannot leave an entry half-written.
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl CacheClient for InMemoryCache {
    fn get(&self, key: &str) -> Option<String> {
        let now = Instant::now();
        let mut entries = self.lock();
        match entries.get(key) {
            Some(entry) if entry.is_live(now) => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }
}
