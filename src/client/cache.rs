//! Process-lifetime cache of crawl results
//!
//! Keyed by (source, domain, canonicalized keyword set). Entries are served
//! until their TTL elapses and then treated as absent, which triggers a
//! fresh fetch. Nothing here survives a restart.
//!
//! Concurrency model: last-writer-wins per key. A reader sees either a
//! complete entry or no entry, never a partial write.

use crate::model::{CrawlResult, SourceId};
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

struct CacheEntry {
    result: CrawlResult,
    stored_at: Instant,
}

/// Shared TTL cache for crawl results.
pub struct CrawlCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl: Duration,
    enabled: bool,
}

impl CrawlCache {
    pub fn new(enabled: bool, ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            enabled,
        }
    }

    /// A disabled cache: every lookup misses, every store is a no-op.
    pub fn disabled() -> Self {
        Self::new(false, Duration::ZERO)
    }

    /// Canonical cache key. Keywords are lowercased and sorted so the same
    /// set always maps to the same entry regardless of caller order.
    pub fn key(source: SourceId, domain: &str, keywords: &[String]) -> String {
        let mut normalized: Vec<String> = keywords.iter().map(|k| k.to_lowercase()).collect();
        normalized.sort();
        normalized.dedup();
        format!("{}:{}:{}", source, domain.to_lowercase(), normalized.join(","))
    }

    /// Returns the cached result for a key if present and fresh.
    pub fn get(&self, key: &str) -> Option<CrawlResult> {
        if !self.enabled {
            return None;
        }

        let entries = self.entries.read().unwrap();
        let entry = entries.get(key)?;
        if entry.stored_at.elapsed() > self.ttl {
            tracing::debug!(key, "cache entry expired");
            return None;
        }
        tracing::debug!(key, "cache hit");
        Some(entry.result.clone())
    }

    /// Stores a result under a key, replacing any previous entry.
    ///
    /// Failed results are cached too: a source that just rejected us stays
    /// rejected for the TTL window, and re-hammering it would only make the
    /// block worse.
    pub fn store(&self, key: String, result: CrawlResult) {
        if !self.enabled {
            return;
        }

        let mut entries = self.entries.write().unwrap();
        entries.insert(
            key,
            CacheEntry {
                result,
                stored_at: Instant::now(),
            },
        );
    }

    /// Drops expired entries. Called opportunistically by the orchestrator;
    /// correctness never depends on it since `get` checks age itself.
    pub fn evict_expired(&self) {
        if !self.enabled {
            return;
        }
        let mut entries = self.entries.write().unwrap();
        entries.retain(|_, entry| entry.stored_at.elapsed() <= self.ttl);
    }

    /// Number of live (possibly stale) entries.
    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
