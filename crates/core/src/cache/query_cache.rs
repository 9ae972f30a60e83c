//! In-memory read result cache.
//!
//! Entries are keyed by query fingerprint and expire after a fixed TTL.
//! There is no background timer: once the map grows past the sweep threshold,
//! the next insert purges every expired entry.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use serde::Serialize;

use super::clock::{Clock, SystemClock};
use super::table::references_table;
use crate::executor::QueryOutput;

/// Default TTL for cached read results (5 minutes).
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Default entry count that triggers an expiry sweep.
pub const DEFAULT_SWEEP_THRESHOLD: usize = 100;

/// Expiry and sweep tuning for [`QueryCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheSettings {
    pub ttl: Duration,
    pub sweep_threshold: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self { ttl: DEFAULT_TTL, sweep_threshold: DEFAULT_SWEEP_THRESHOLD }
    }
}

/// Point-in-time cache counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, schemars::JsonSchema)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

/// Cached payload with the SQL text it was produced from.
#[derive(Debug, Clone)]
struct CacheEntry {
    sql: Arc<str>,
    payload: QueryOutput,
    stored_at: Instant,
}

/// Process-local, best-effort cache of read results.
///
/// Uses a HashMap behind a std RwLock; every critical section is purely
/// in-memory and never spans storage I/O.
#[derive(Debug)]
pub struct QueryCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    settings: CacheSettings,
    clock: Arc<dyn Clock>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl QueryCache {
    /// Create a cache driven by the system clock.
    pub fn new(settings: CacheSettings) -> Self {
        Self::with_clock(settings, Arc::new(SystemClock))
    }

    /// Create a cache driven by the given clock.
    pub fn with_clock(settings: CacheSettings, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            settings,
            clock,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn settings(&self) -> CacheSettings {
        self.settings
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_fresh(&self, entry: &CacheEntry, now: Instant) -> bool {
        now.saturating_duration_since(entry.stored_at) < self.settings.ttl
    }

    /// Look up a fresh entry.
    ///
    /// A stale entry counts as a miss and is dropped.
    pub fn get(&self, fingerprint: &str) -> Option<QueryOutput> {
        let now = self.clock.now();
        let stale = {
            let entries = self.read();
            match entries.get(fingerprint) {
                Some(entry) if self.is_fresh(entry, now) => {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    return Some(entry.payload.clone());
                }
                Some(_) => true,
                None => false,
            }
        };

        if stale {
            let mut entries = self.write();
            if entries.get(fingerprint).is_some_and(|e| !self.is_fresh(e, now)) {
                entries.remove(fingerprint);
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Store a payload, replacing any existing entry for the fingerprint.
    pub fn put(&self, fingerprint: String, sql: &str, payload: QueryOutput) {
        let now = self.clock.now();
        let mut entries = self.write();
        entries.insert(fingerprint, CacheEntry { sql: Arc::from(sql), payload, stored_at: now });

        if entries.len() > self.settings.sweep_threshold {
            let before = entries.len();
            entries.retain(|_, entry| self.is_fresh(entry, now));
            tracing::debug!(before, after = entries.len(), "swept expired query cache entries");
        }
    }

    /// Evict every entry whose SQL text mentions `table`.
    ///
    /// Returns the number of evicted entries.
    pub fn invalidate_table(&self, table: &str) -> usize {
        let mut entries = self.write();
        let before = entries.len();
        entries.retain(|_, entry| !references_table(&entry.sql, table));
        before - entries.len()
    }

    /// Drop every entry. Returns the number of dropped entries.
    pub fn clear(&self) -> usize {
        let mut entries = self.write();
        let count = entries.len();
        entries.clear();
        count
    }

    /// Number of stored entries, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(CacheSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::clock::ManualClock;
    use crate::executor::WriteResult;
    use crate::store::Row;

    fn rows(n: i64) -> QueryOutput {
        let mut row = Row::new();
        row.insert("id".into(), serde_json::json!(n));
        QueryOutput::Rows(Arc::new(vec![row]))
    }

    fn manual_cache(settings: CacheSettings) -> (QueryCache, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        (QueryCache::with_clock(settings, clock.clone()), clock)
    }

    #[test]
    fn test_put_and_get() {
        let (cache, _clock) = manual_cache(CacheSettings::default());
        cache.put("fp".into(), "SELECT id FROM resources", rows(1));

        assert_eq!(cache.get("fp"), Some(rows(1)));
        assert_eq!(cache.get("other"), None);
        assert_eq!(cache.stats(), CacheStats { entries: 1, hits: 1, misses: 1 });
    }

    #[test]
    fn test_put_overwrites() {
        let (cache, _clock) = manual_cache(CacheSettings::default());
        cache.put("fp".into(), "SELECT id FROM resources", rows(1));
        cache.put("fp".into(), "SELECT id FROM resources", rows(2));

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("fp"), Some(rows(2)));
    }

    #[test]
    fn test_expired_entry_is_never_served() {
        let (cache, clock) = manual_cache(CacheSettings::default());
        cache.put("fp".into(), "SELECT id FROM resources", rows(1));

        clock.advance(DEFAULT_TTL - Duration::from_millis(1));
        assert!(cache.get("fp").is_some());

        clock.advance(Duration::from_millis(2));
        assert_eq!(cache.get("fp"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_expiry_boundary_is_exclusive() {
        let (cache, clock) = manual_cache(CacheSettings::default());
        cache.put("fp".into(), "SELECT 1", rows(1));

        clock.advance(DEFAULT_TTL);
        assert_eq!(cache.get("fp"), None);
    }

    #[test]
    fn test_sweep_after_threshold() {
        let (cache, clock) = manual_cache(CacheSettings { ttl: Duration::from_secs(10), sweep_threshold: 3 });
        for i in 0..3 {
            cache.put(format!("old-{i}"), "SELECT 1", rows(i));
        }
        clock.advance(Duration::from_secs(11));

        // at the threshold nothing is swept yet
        assert_eq!(cache.len(), 3);

        cache.put("fresh".into(), "SELECT 1", rows(9));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("fresh"), Some(rows(9)));
    }

    #[test]
    fn test_invalidate_table() {
        let (cache, _clock) = manual_cache(CacheSettings::default());
        cache.put("a".into(), "SELECT * FROM resources r WHERE r.id = ?", rows(1));
        cache.put("b".into(), "SELECT * FROM categories c LEFT JOIN resources r ON r.category_id = c.id", rows(2));
        cache.put("c".into(), "SELECT * FROM categories", rows(3));

        assert_eq!(cache.invalidate_table("resources"), 2);
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.get("b"), None);
        assert_eq!(cache.get("c"), Some(rows(3)));
    }

    #[test]
    fn test_clear() {
        let (cache, _clock) = manual_cache(CacheSettings::default());
        cache.put("a".into(), "SELECT 1", rows(1));
        cache.put("b".into(), "SELECT 2", QueryOutput::Write(WriteResult { last_insert_id: 1, rows_affected: 1 }));

        assert_eq!(cache.clear(), 2);
        assert!(cache.is_empty());
    }
}
