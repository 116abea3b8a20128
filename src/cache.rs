use crate::models::{DateWindow, HitRecord};
use chrono::{DateTime, Duration, Utc};

/// Default lifetime of a cached response, one hour.
pub const DEFAULT_TTL_SECS: i64 = 3600;

#[derive(Debug, Clone)]
struct CacheEntry {
    window: DateWindow,
    records: Vec<HitRecord>,
    written_at: DateTime<Utc>,
}

/// Single-slot cache holding the most recent response.
#[derive(Debug, Clone)]
pub struct ResponseCache {
    ttl: Duration,
    entry: Option<CacheEntry>,
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, entry: None }
    }

    pub fn lookup(&self, window: DateWindow, now: DateTime<Utc>) -> Option<&[HitRecord]> {
        let entry = self.entry.as_ref()?;
        let fresh = now - entry.written_at < self.ttl;
        (fresh && entry.window == window).then_some(entry.records.as_slice())
    }

    pub fn store(&mut self, window: DateWindow, records: Vec<HitRecord>, now: DateTime<Utc>) {
        self.entry = Some(CacheEntry {
            window,
            records,
            written_at: now,
        });
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(Duration::seconds(DEFAULT_TTL_SECS))
    }
}
