//! In-process report cache backed by DashMap.
//! Entries are keyed by a content hash of (dataset fingerprint, request), so a
//! new upload can never be served results computed for a previous one.

use dashmap::DashMap;
use sales_core::fingerprint::sha256_hex_parts;
use sales_core::SalesResult;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// Content-hash key for one (dataset, request) pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    digest: String,
    dataset: String,
}

impl CacheKey {
    /// Hash `fingerprint` together with the canonical JSON form of `request`.
    pub fn new<T: Serialize>(fingerprint: &str, request: &T) -> SalesResult<Self> {
        let canonical = serde_json::to_vec(request)?;
        Ok(Self {
            digest: sha256_hex_parts(&[fingerprint.as_bytes(), &canonical]),
            dataset: fingerprint.to_string(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.digest
    }

    pub fn dataset(&self) -> &str {
        &self.dataset
    }
}

struct CacheEntry<V> {
    value: V,
    dataset: String,
    /// Insertion order; the smallest is evicted first.
    seq: u64,
}

/// Memoized analysis results for the current session.
pub struct ReportCache<V> {
    store: DashMap<String, CacheEntry<V>>,
    max_entries: usize,
    next_seq: AtomicU64,
}

impl<V: Clone> ReportCache<V> {
    pub fn new(max_entries: usize) -> Self {
        Self {
            store: DashMap::with_capacity(max_entries),
            max_entries,
            next_seq: AtomicU64::new(0),
        }
    }

    pub fn get(&self, key: &CacheKey) -> Option<V> {
        match self.store.get(key.as_str()) {
            Some(entry) => {
                metrics::counter!("report_cache.hit").increment(1);
                debug!(key = %key.as_str(), "Report cache hit");
                Some(entry.value.clone())
            }
            None => {
                metrics::counter!("report_cache.miss").increment(1);
                None
            }
        }
    }

    /// Insert or replace. When full, the oldest entries make room for a new key.
    pub fn put(&self, key: CacheKey, value: V) {
        if self.max_entries == 0 {
            return;
        }
        if !self.store.contains_key(key.as_str()) {
            while self.store.len() >= self.max_entries {
                if !self.evict_oldest() {
                    break;
                }
            }
        }
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        self.store.insert(
            key.digest,
            CacheEntry {
                value,
                dataset: key.dataset,
                seq,
            },
        );
    }

    fn evict_oldest(&self) -> bool {
        let oldest = self
            .store
            .iter()
            .min_by_key(|entry| entry.seq)
            .map(|entry| entry.key().clone());
        match oldest {
            Some(digest) => {
                self.store.remove(&digest);
                metrics::counter!("report_cache.evicted").increment(1);
                debug!(key = %digest, "Evicted oldest cached report");
                true
            }
            None => false,
        }
    }

    /// Drop every entry computed from the dataset with `fingerprint`.
    pub fn invalidate_dataset(&self, fingerprint: &str) -> usize {
        let before = self.store.len();
        self.store.retain(|_, entry| entry.dataset != fingerprint);
        let removed = before - self.store.len();
        debug!(removed, "Invalidated cached reports for dataset");
        removed
    }

    pub fn clear(&self) {
        self.store.clear();
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}
