use std::{
    collections::HashMap,
    hash::{DefaultHasher, Hash, Hasher},
    sync::Arc,
    time::{Duration, Instant},
};

use parking_lot::RwLock;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::types::ResultEnvelope;

/// How many leading characters of pasted text feed the content hash.
/// Collisions only cause a wrong cache hit, never corruption.
const FINGERPRINT_CHARS: usize = 1000;

/// Fingerprint for a video-sourced request.
pub fn video_fingerprint(video_id: &str) -> String {
    format!("yt:{video_id}")
}

/// Fingerprint for a pasted transcript: non-cryptographic hash over the
/// first [`FINGERPRINT_CHARS`] characters.
pub fn content_fingerprint(text: &str) -> String {
    let head: String = text.chars().take(FINGERPRINT_CHARS).collect();
    let mut hasher = DefaultHasher::new();
    head.hash(&mut hasher);
    format!("txt:{:016x}", hasher.finish())
}

struct CacheEntry {
    envelope: ResultEnvelope,
    inserted_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, ttl: Duration) -> bool {
        self.inserted_at.elapsed() >= ttl
    }
}

/// Process-wide expiring map from content fingerprint to result envelope.
///
/// Logical expiry is authoritative: `get` treats an expired-but-unswept
/// entry as a miss. The periodic sweep only reclaims memory. There is no
/// size bound or LRU; entries are small and TTL-bounded, which is a known
/// scaling limit rather than a defect.
pub struct ResultCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl ResultCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the live entry for `key`, or `None` if absent or expired.
    pub fn get(&self, key: &str) -> Option<ResultEnvelope> {
        let entries = self.entries.read();
        entries
            .get(key)
            .filter(|e| !e.is_expired(self.ttl))
            .map(|e| e.envelope.clone())
    }

    /// Inserts or overwrites; the TTL window restarts for this key.
    pub fn set(&self, key: &str, envelope: ResultEnvelope) {
        let mut entries = self.entries.write();
        entries.insert(
            key.to_string(),
            CacheEntry {
                envelope,
                inserted_at: Instant::now(),
            },
        );
    }

    pub fn delete(&self, key: &str) -> bool {
        self.entries.write().remove(key).is_some()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Number of live (unexpired) entries.
    pub fn len(&self) -> usize {
        let entries = self.entries.read();
        entries.values().filter(|e| !e.is_expired(self.ttl)).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes expired entries, returning how many were reclaimed.
    pub fn purge_expired(&self) -> usize {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, e| !e.is_expired(self.ttl));
        before - entries.len()
    }

    /// Starts the advisory sweep task. The interval should be substantially
    /// shorter than the TTL.
    pub fn spawn_sweeper(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let cache = Arc::clone(self);
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(every);
            // the first tick fires immediately; skip it
            tick.tick().await;
            loop {
                tick.tick().await;
                let removed = cache.purge_expired();
                if removed > 0 {
                    debug!(removed, live = cache.len(), "cache sweep");
                }
            }
        })
    }
}
