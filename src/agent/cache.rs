//! Session-scoped answer memoization with lazy TTL expiry.
//!
//! Keys are the SHA-256 of the lowercased, trimmed question. Expired
//! entries are dropped when read or by an explicit [`AnswerCache::clean_expired`];
//! nothing sweeps in the background.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use indexmap::IndexMap;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tokio::time::Instant;

/// Entry lifetime when none is given.
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// A cache hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedAnswer {
    /// Stored answer text.
    pub answer: String,
    /// Stored confidence (0-100).
    pub confidence: u8,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    answer: String,
    confidence: u8,
    inserted_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.inserted_at) > self.ttl
    }
}

/// One entry in a [`CacheStats`] snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct CacheEntryStats {
    /// Hex key.
    pub key: String,
    /// Stored answer.
    pub answer: String,
    /// Age in milliseconds.
    pub age_ms: u64,
    /// Whether the entry would be dropped on the next read.
    pub expired: bool,
}

/// Cache snapshot for the observability surface.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    /// Entries currently held, expired ones included.
    pub size: usize,
    /// Per-entry detail in insertion order.
    pub entries: Vec<CacheEntryStats>,
}

/// In-memory question → answer cache.
#[derive(Debug)]
pub struct AnswerCache {
    default_ttl: Duration,
    entries: Mutex<IndexMap<String, CacheEntry>>,
}

impl Default for AnswerCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl AnswerCache {
    /// Creates an empty cache with the given default TTL.
    #[must_use]
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            default_ttl,
            entries: Mutex::new(IndexMap::new()),
        }
    }

    /// Derives the cache key for a question.
    #[must_use]
    pub fn key(question: &str) -> String {
        let normalized = question.trim().to_lowercase();
        let digest = Sha256::digest(normalized.as_bytes());
        digest.iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Looks up a question. Expired entries are removed and reported as a miss.
    pub fn get(&self, question: &str) -> Option<CachedAnswer> {
        let key = Self::key(question);
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let expired = entries.get(&key)?.is_expired(Instant::now());
        if expired {
            entries.shift_remove(&key);
            return None;
        }
        entries.get(&key).map(|e| CachedAnswer {
            answer: e.answer.clone(),
            confidence: e.confidence,
        })
    }

    /// Stores an answer, replacing any previous entry for the same key.
    pub fn set(&self, question: &str, answer: &str, confidence: u8, ttl: Option<Duration>) {
        let key = Self::key(question);
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.shift_remove(&key);
        entries.insert(
            key,
            CacheEntry {
                answer: answer.to_string(),
                confidence,
                inserted_at: Instant::now(),
                ttl: ttl.unwrap_or(self.default_ttl),
            },
        );
    }

    /// Drops every expired entry. Returns how many were removed.
    pub fn clean_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|_, e| !e.is_expired(now));
        before - entries.len()
    }

    /// Removes everything.
    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Number of held entries, expired ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// True if nothing is held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot for inspection.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        let now = Instant::now();
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        CacheStats {
            size: entries.len(),
            entries: entries
                .iter()
                .map(|(key, e)| CacheEntryStats {
                    key: key.clone(),
                    answer: e.answer.clone(),
                    age_ms: u64::try_from(now.duration_since(e.inserted_at).as_millis())
                        .unwrap_or(u64::MAX),
                    expired: e.is_expired(now),
                })
                .collect(),
        }
    }
}
