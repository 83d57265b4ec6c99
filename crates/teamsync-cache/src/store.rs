//! The invalidation seam and the stores behind it.
//!
//! [`QueryCache`] is deliberately a one-method trait: the real-time client
//! only ever *writes* invalidations, it never reads cached values, so the
//! seam exposes nothing else. Invalidation is fire-and-forget bookkeeping
//! with no failure mode visible to the caller; a missed mark only means the
//! UI reads a slightly older result until the next refetch.

use std::collections::HashMap;

use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use tracing::debug;

use crate::key::QueryKey;

/// Write-side contract of the query cache.
///
/// Implementations must be idempotent (marking an already-stale entry stale
/// again changes nothing), non-blocking, and silent about unknown keys.
pub trait QueryCache: Send + Sync {
    /// Mark the entry under `key` stale so the next read refetches it.
    fn invalidate(&self, key: &QueryKey);
}

/// One cached result with its staleness flag.
#[derive(Clone, Debug, PartialEq)]
pub struct CachedEntry {
    /// The cached query result.
    pub value: Value,
    /// Whether a refetch is due before this value is trusted again.
    pub stale: bool,
}

// ─────────────────────────────────────────────────────────────────────────────
// MemoryQueryCache
// ─────────────────────────────────────────────────────────────────────────────

/// In-process stale-marking store.
///
/// The reading side `put`s fetched results and `get`s them back with their
/// staleness flag; the real-time client reaches in only through
/// [`QueryCache::invalidate`]. Entries are never evicted here: staleness is
/// a refetch trigger, not a deletion.
pub struct MemoryQueryCache {
    entries: RwLock<HashMap<QueryKey, CachedEntry>>,
}

impl MemoryQueryCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Store a freshly fetched result under `key`, clearing any staleness.
    pub fn put(&self, key: QueryKey, value: Value) {
        let mut entries = self.entries.write();
        let _ = entries.insert(key, CachedEntry {
            value,
            stale: false,
        });
    }

    /// The entry under `key`, staleness flag included.
    #[must_use]
    pub fn get(&self, key: &QueryKey) -> Option<CachedEntry> {
        self.entries.read().get(key).cloned()
    }

    /// Staleness of the entry under `key`, or `None` when nothing is cached.
    #[must_use]
    pub fn is_stale(&self, key: &QueryKey) -> Option<bool> {
        self.entries.read().get(key).map(|e| e.stale)
    }

    /// Number of cached entries, stale or not.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.entries.read().len()
    }
}

impl Default for MemoryQueryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryCache for MemoryQueryCache {
    fn invalidate(&self, key: &QueryKey) {
        let mut entries = self.entries.write();
        if let Some(entry) = entries.get_mut(key) {
            entry.stale = true;
            debug!(key = %key, "marked cached query stale");
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// RecordingCache
// ─────────────────────────────────────────────────────────────────────────────

/// Cache double that records every invalidation in arrival order.
///
/// Exported for use by downstream crates' tests, which assert on the exact
/// key sequence the sync client issues.
#[derive(Default)]
pub struct RecordingCache {
    invalidations: Mutex<Vec<QueryKey>>,
}

impl RecordingCache {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all invalidations seen so far, in order.
    #[must_use]
    pub fn invalidations(&self) -> Vec<QueryKey> {
        self.invalidations.lock().clone()
    }

    /// Drain and return the recorded invalidations.
    #[must_use]
    pub fn take(&self) -> Vec<QueryKey> {
        std::mem::take(&mut *self.invalidations.lock())
    }

    /// Whether nothing has been invalidated yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.invalidations.lock().is_empty()
    }
}

impl QueryCache for RecordingCache {
    fn invalidate(&self, key: &QueryKey) {
        self.invalidations.lock().push(key.clone());
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
