use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

use crate::clock::SharedClock;

pub const DEFAULT_TTL_SECS: i64 = 5 * 60;

struct Entry<V> {
    data: V,
    stored_at: DateTime<Utc>,
}

/// String-keyed store whose entries expire `ttl` after they were written.
/// Expired entries are dropped lazily on `get`; there is no size bound.
///
/// Every `invalidate_prefix` bumps a generation counter for that prefix, so a
/// value computed before an invalidation can be refused with
/// [`TtlCache::set_if_unchanged`].
pub struct TtlCache<V> {
    entries: HashMap<String, Entry<V>>,
    generations: HashMap<String, u64>,
    ttl: Duration,
    clock: SharedClock,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(ttl: Duration, clock: SharedClock) -> Self {
        Self {
            entries: HashMap::new(),
            generations: HashMap::new(),
            ttl,
            clock,
        }
    }

    pub fn get(&mut self, key: &str) -> Option<V> {
        let now = self.clock.now();
        let expired = match self.entries.get(key) {
            Some(entry) => now - entry.stored_at > self.ttl,
            None => return None,
        };

        if expired {
            self.entries.remove(key);
            tracing::debug!(key, "cache entry expired");
            return None;
        }

        self.entries.get(key).map(|e| e.data.clone())
    }

    pub fn set(&mut self, key: impl Into<String>, data: V) {
        let stored_at = self.clock.now();
        self.entries.insert(key.into(), Entry { data, stored_at });
    }

    pub fn invalidate(&mut self, key: &str) {
        self.entries.remove(key);
    }

    /// Store `data` only if `prefix` has not been invalidated since
    /// `generation` was read. Returns whether the value was stored.
    pub fn set_if_unchanged(
        &mut self,
        key: impl Into<String>,
        data: V,
        prefix: &str,
        generation: u64,
    ) -> bool {
        if self.generation(prefix) != generation {
            return false;
        }
        self.set(key, data);
        true
    }

    /// Drop every entry whose key starts with `prefix`.
    pub fn invalidate_prefix(&mut self, prefix: &str) {
        self.entries.retain(|k, _| !k.starts_with(prefix));
        *self.generations.entry(prefix.to_string()).or_default() += 1;
    }

    /// Number of times `prefix` has been invalidated.
    pub fn generation(&self, prefix: &str) -> u64 {
        self.generations.get(prefix).copied().unwrap_or(0)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
