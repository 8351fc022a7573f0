//! Edge response cache: serialized envelopes keyed by keyword + coarse
//! region bucket.
//!
//! Values are opaque JSON blobs, never live objects, so a cache hit is
//! byte-identical to the response that was first computed. The cache is
//! best-effort: losing it costs latency, not correctness.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::future::Cache;
use moka::Expiry;

use crate::matching::normalize;

/// Injected cache capability. Implementations must be best-effort and never
/// fail the request path.
#[async_trait]
pub trait ResponseCache: Send + Sync {
    async fn get(&self, key: &str) -> Option<String>;
    async fn set(&self, key: &str, body: String, ttl: Duration);
}

/// Cache key for an aggregated search: normalized keyword + coarse region
/// bucket. Coordinates are never part of the key.
#[must_use]
pub fn ai_search_key(keyword: &str, bucket: &str) -> String {
    format!("ai-search:{}:{bucket}", normalize(keyword))
}

/// Coarse region bucket: `nogps` without a usable location, else the two
/// nearest region codes joined with a hyphen, canonically ordered. Ordering
/// keeps the key space at one bucket per unordered pair.
#[must_use]
pub fn region_bucket(codes: Option<(&str, &str)>) -> String {
    match codes {
        None => "nogps".to_string(),
        Some((a, b)) if a <= b => format!("{a}-{b}"),
        Some((a, b)) => format!("{b}-{a}"),
    }
}

#[derive(Clone)]
struct CacheEntry {
    body: String,
    ttl: Duration,
}

/// Reads each entry's TTL off the entry itself, so one cache serves
/// endpoint classes with different lifetimes.
struct PerEntryExpiry;

impl Expiry<String, CacheEntry> for PerEntryExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CacheEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// In-process [`ResponseCache`] over `moka`.
pub struct MemoryCache {
    inner: Cache<String, CacheEntry>,
}

impl MemoryCache {
    #[must_use]
    pub fn new(capacity: u64) -> Self {
        let inner = Cache::builder()
            .max_capacity(capacity)
            .expire_after(PerEntryExpiry)
            .build();
        Self { inner }
    }
}

#[async_trait]
impl ResponseCache for MemoryCache {
    async fn get(&self, key: &str) -> Option<String> {
        self.inner.get(key).await.map(|entry| entry.body)
    }

    async fn set(&self, key: &str, body: String, ttl: Duration) {
        self.inner.insert(key.to_string(), CacheEntry { body, ttl }).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_is_canonically_ordered() {
        assert_eq!(region_bucket(Some(("23", "11"))), "11-23");
        assert_eq!(region_bucket(Some(("11", "23"))), "11-23");
        assert_eq!(region_bucket(None), "nogps");
    }

    #[test]
    fn key_normalizes_keyword() {
        assert_eq!(ai_search_key("  시간  여행 ", "nogps"), "ai-search:시간 여행:nogps");
        assert_eq!(ai_search_key("SF", "11-23"), "ai-search:sf:11-23");
    }

    #[tokio::test]
    async fn round_trip_is_byte_identical() {
        let cache = MemoryCache::new(100);
        let body = r#"{"mode":"no-gps","seedBook":{"title":"아몬드"},"recommendations":[],"regions":[]}"#;

        cache.set("ai-search:아몬드:nogps", body.to_string(), Duration::from_secs(60)).await;
        let hit = cache.get("ai-search:아몬드:nogps").await.unwrap();

        assert_eq!(hit.as_bytes(), body.as_bytes());
    }

    #[tokio::test]
    async fn per_entry_ttl_expires_independently() {
        let cache = MemoryCache::new(100);
        cache.set("short", "a".to_string(), Duration::from_millis(50)).await;
        cache.set("long", "b".to_string(), Duration::from_secs(60)).await;

        assert!(cache.get("short").await.is_some());

        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(cache.get("short").await.is_none());
        assert!(cache.get("long").await.is_some());
    }

    #[tokio::test]
    async fn miss_returns_none() {
        let cache = MemoryCache::new(100);
        assert!(cache.get("absent").await.is_none());
    }
}
