use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::repo::Record;

/// Default time-to-live for cached table reads.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60);

struct CacheEntry {
    stored_at: Instant,
    records: Arc<Vec<Record>>,
}

/// Process-wide read cache keyed by table name.
///
/// A hit within the TTL returns the previous record set without a store
/// round-trip. The repo invalidates the whole cache after every mutation;
/// `clear` is also public for callers that must observe writes made
/// outside this process.
pub struct ReadCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl ReadCache {
    pub fn new(ttl: Duration) -> Self {
        ReadCache {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, table: &str) -> Option<Arc<Vec<Record>>> {
        let guard = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let entry = guard.get(table)?;
        if entry.stored_at.elapsed() <= self.ttl {
            Some(entry.records.clone())
        } else {
            None
        }
    }

    pub fn put(&self, table: &str, records: Vec<Record>) -> Arc<Vec<Record>> {
        let records = Arc::new(records);
        let mut guard = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        guard.insert(
            table.to_string(),
            CacheEntry {
                stored_at: Instant::now(),
                records: records.clone(),
            },
        );
        records
    }

    pub fn clear(&self) {
        let mut guard = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        guard.clear();
    }
}

impl Default for ReadCache {
    fn default() -> Self {
        ReadCache::new(DEFAULT_TTL)
    }
}
