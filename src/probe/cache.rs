//! In-memory caching layer for probe results.

use crate::types::Presence;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Cache entry with TTL.
#[derive(Debug, Clone)]
struct CacheEntry {
    presence: Presence,
    expires_at: Instant,
}

/// Thread-safe cache of definitive probe results, keyed by provider and identity.
#[derive(Debug, Clone)]
pub struct ProbeCache {
    cache: Arc<DashMap<(String, String), CacheEntry>>,
    ttl: Duration,
}

impl ProbeCache {
    /// Create a new cache with the given TTL.
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: Arc::new(DashMap::new()),
            ttl,
        }
    }

    /// Get a cached result if it exists and hasn't expired.
    pub fn get(&self, provider: &str, identity: &str) -> Option<Presence> {
        let key = (provider.to_string(), identity.to_string());
        let entry = self.cache.get(&key)?;
        if Instant::now() < entry.expires_at {
            return Some(entry.presence);
        }
        drop(entry);
        self.cache.remove(&key);
        None
    }

    /// Store a result. Indeterminate results are never cached.
    pub fn set(&self, provider: &str, identity: &str, presence: Presence) {
        if !presence.is_definitive() {
            return;
        }
        let entry = CacheEntry {
            presence,
            expires_at: Instant::now() + self.ttl,
        };
        self.cache
            .insert((provider.to_string(), identity.to_string()), entry);
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}
