//! In-memory memoization with a time-to-live window.
//!
//! Entries are `(key, value, inserted_at)` triples checked on lookup and
//! evicted lazily when read past their window; there is no background sweep.
//! The clock is injected so tests can drive expiry deterministically.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Time source for expiry checks.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// The real wall clock.
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

struct Entry<V> {
    value: V,
    inserted_at: Instant,
}

/// Process-wide memo cache with per-cache TTL.
///
/// Unbounded in key count; the expected cardinality is a handful of city
/// queries. The mutex only satisfies the runtime's `Sync` requirement —
/// there is no coordination logic on top of it.
pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: Mutex<HashMap<K, Entry<V>>>,
    clock: Arc<dyn Clock>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    /// Create a cache backed by the system clock.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    /// Create a cache with an injected clock.
    #[must_use]
    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// Look up a fresh value. Expired entries are removed on read and
    /// reported as misses.
    pub fn get(&self, key: &K) -> Option<V> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().expect("cache lock poisoned");

        match entries.get(key) {
            Some(entry) if now.duration_since(entry.inserted_at) < self.ttl => {
                tracing::debug!("cache hit");
                Some(entry.value.clone())
            }
            Some(_) => {
                tracing::debug!("cache entry expired");
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Store a value, stamping it with the current time.
    pub fn insert(&self, key: K, value: V) {
        let inserted_at = self.clock.now();
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        entries.insert(key, Entry { value, inserted_at });
    }

    /// Number of live-or-expired entries currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().expect("cache lock poisoned").len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
