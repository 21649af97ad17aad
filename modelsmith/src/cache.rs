//! Expiring key/value cache for generated data-access objects.
//!
//! Entries expire after a fixed window. Expired entries are dropped lazily:
//! a read or write that happens more than one purge interval after the last
//! sweep triggers another sweep, so no background task is needed.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Default entry lifetime.
pub const DEFAULT_EXPIRATION: Duration = Duration::from_secs(5 * 60);

/// Default interval between sweeps of expired entries.
pub const DEFAULT_PURGE_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug)]
struct Entry<V> {
    value: V,
    expires_at: Instant,
}

#[derive(Debug)]
struct Inner<V> {
    entries: HashMap<String, Entry<V>>,
    last_purge: Instant,
}

/// A cloneable handle to a shared expiring cache.
///
/// ## Examples
///
/// ```
/// use std::time::Duration;
/// use modelsmith::Cache;
///
/// let cache: Cache<String> = Cache::new(Duration::from_secs(60), Duration::from_secs(10));
/// cache.set("7", "gear".to_string());
/// assert_eq!(cache.get("7"), Some("gear".to_string()));
///
/// cache.delete("7");
/// assert_eq!(cache.get("7"), None);
/// ```
#[derive(Debug)]
pub struct Cache<V> {
    inner: Arc<Mutex<Inner<V>>>,
    expiration: Duration,
    purge_interval: Duration,
}

impl<V> Clone for Cache<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            expiration: self.expiration,
            purge_interval: self.purge_interval,
        }
    }
}

impl<V: Clone> Default for Cache<V> {
    fn default() -> Self {
        Self::new(DEFAULT_EXPIRATION, DEFAULT_PURGE_INTERVAL)
    }
}

impl<V: Clone> Cache<V> {
    pub fn new(expiration: Duration, purge_interval: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                entries: HashMap::new(),
                last_purge: Instant::now(),
            })),
            expiration,
            purge_interval,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner<V>> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let now = Instant::now();
        if now.duration_since(inner.last_purge) >= self.purge_interval {
            inner.entries.retain(|_, entry| entry.expires_at > now);
            inner.last_purge = now;
        }
        inner
    }

    /// Returns a live entry.
    pub fn get(&self, key: &str) -> Option<V> {
        let inner = self.lock();
        inner
            .entries
            .get(key)
            .filter(|entry| entry.expires_at > Instant::now())
            .map(|entry| entry.value.clone())
    }

    /// Inserts or replaces an entry with the default expiration.
    pub fn set(&self, key: impl Into<String>, value: V) {
        let expires_at = Instant::now() + self.expiration;
        self.lock()
            .entries
            .insert(key.into(), Entry { value, expires_at });
    }

    pub fn delete(&self, key: &str) {
        self.lock().entries.remove(key);
    }

    /// Number of stored entries, expired or not.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn expiration(&self) -> Duration {
        self.expiration
    }
}

/// Builds a cache key from primary-key parts, joined with `:`.
///
/// `\` and `:` inside a part are backslash-escaped, so distinct key tuples
/// never share a cache key.
///
/// ## Examples
///
/// ```
/// use modelsmith::cache::cache_key;
///
/// assert_eq!(cache_key(&[&7]), "7");
/// assert_eq!(cache_key(&[&1, &"eu"]), "1:eu");
/// assert_eq!(cache_key(&[&"a:b", &"c"]), "a\\:b:c");
/// ```
pub fn cache_key(parts: &[&dyn std::fmt::Display]) -> String {
    parts
        .iter()
        .map(|p| p.to_string().replace('\\', "\\\\").replace(':', "\\:"))
        .collect::<Vec<_>>()
        .join(":")
}
