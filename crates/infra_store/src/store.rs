//! The cache store capability and its in-process implementations.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;

/// Process-wide key → bytes store with per-entry TTL.
///
/// Implementations must make each `set` atomic per key: a reader sees either
/// the previous value or the whole new one. No cross-key guarantees.
pub trait CacheStore: Send + Sync {
    /// Fetch a live entry. Expired entries are absent.
    fn get(&self, key: &str) -> Option<Vec<u8>>;

    /// Store `value` under `key`, replacing any previous entry.
    fn set(&self, key: &str, value: Vec<u8>, ttl: Duration);
}

impl<S: CacheStore + ?Sized> CacheStore for Arc<S> {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) {
        (**self).set(key, value, ttl)
    }
}

struct Entry {
    value: Vec<u8>,
    /// `None` when `now + ttl` overflows `Instant`.
    expires_at: Option<Instant>,
}

impl Entry {
    #[inline]
    fn is_live(&self, now: Instant) -> bool {
        !matches!(self.expires_at, Some(at) if now >= at)
    }
}

/// Physical entry count that triggers the first sweep.
pub const DEFAULT_SWEEP_THRESHOLD: usize = 1024;

/// Concurrent in-memory store.
///
/// Expired entries are treated as absent and removed lazily on read, by
/// [`MemoryStore::purge_expired`], or by a sweep inside `set` once the map
/// reaches the sweep threshold. After each sweep the threshold becomes twice
/// the surviving count (never below the configured minimum), so the map holds
/// at most about twice its live entries plus the minimum.
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use infra_store::{CacheStore, MemoryStore};
///
/// let store = MemoryStore::new();
/// store.set("spot_1", b"payload".to_vec(), Duration::from_secs(60));
/// assert_eq!(store.get("spot_1").as_deref(), Some(&b"payload"[..]));
/// assert!(store.get("spot_2").is_none());
/// ```
pub struct MemoryStore {
    entries: DashMap<String, Entry>,
    min_sweep: usize,
    next_sweep: AtomicUsize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::with_sweep_threshold(DEFAULT_SWEEP_THRESHOLD)
    }
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store that sweeps once `threshold` entries are held.
    pub fn with_sweep_threshold(threshold: usize) -> Self {
        let threshold = threshold.max(1);
        Self {
            entries: DashMap::new(),
            min_sweep: threshold,
            next_sweep: AtomicUsize::new(threshold),
        }
    }

    /// Number of entries held, expired or not.
    pub fn physical_len(&self) -> usize {
        self.entries.len()
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries.iter().filter(|e| e.is_live(now)).count()
    }

    /// True when no live entry remains.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every expired entry.
    pub fn purge_expired(&self) {
        let now = Instant::now();
        self.entries.retain(|_, e| e.is_live(now));
    }

    fn maybe_sweep(&self) {
        let held = self.entries.len();
        if held < self.next_sweep.load(Ordering::Relaxed) {
            return;
        }
        self.purge_expired();
        let live = self.entries.len();
        self.next_sweep
            .store(live.saturating_mul(2).max(self.min_sweep), Ordering::Relaxed);
        tracing::debug!(held, live, "cache swept");
    }

    /// Drop everything.
    pub fn clear(&self) {
        self.entries.clear();
    }
}

impl CacheStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        let now = Instant::now();
        {
            let entry = self.entries.get(key)?;
            if entry.is_live(now) {
                return Some(entry.value.clone());
            }
        }
        // Read guard released above; removing while holding it deadlocks the shard.
        self.entries.remove_if(key, |_, e| !e.is_live(now));
        tracing::trace!(key, "cache entry expired");
        None
    }

    fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) {
        let entry = Entry {
            value,
            expires_at: Instant::now().checked_add(ttl),
        };
        self.entries.insert(key.to_string(), entry);
        self.maybe_sweep();
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("entries", &self.entries.len())
            .field("next_sweep", &self.next_sweep.load(Ordering::Relaxed))
            .finish()
    }
}

/// A store that never retains anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopStore;

impl CacheStore for NoopStore {
    fn get(&self, _key: &str) -> Option<Vec<u8>> {
        None
    }

    fn set(&self, _key: &str, _value: Vec<u8>, _ttl: Duration) {}
}
