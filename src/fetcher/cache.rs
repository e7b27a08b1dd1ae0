use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};
use super::rate_limiter::RateLimitRule;

/// Longest a response is kept, whatever the rate limits say.
const MAX_TTL: Duration = Duration::from_secs(60 * 60);

#[derive(Debug)]
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

/// Response memo keyed by the request that produced it.
#[derive(Debug)]
pub struct Cache<V> {
    entries: Mutex<HashMap<String, CacheEntry<V>>>,
}

impl<V> Default for Cache<V> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

/// Canonical key: `serde_json::Value` keeps object keys sorted, so field order never matters.
pub fn cache_key<K: Serialize + ?Sized>(parts: &K) -> Option<String> {
    match serde_json::to_value(parts) {
        Ok(value) => Some(value.to_string()),
        Err(e) => {
            warn!("Request can not be used as a cache key: {}", e);
            None
        }
    }
}

impl<V: Clone> Cache<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get<K: Serialize + ?Sized>(&self, parts: &K) -> Option<V> {
        let key = cache_key(parts)?;
        let now = Instant::now();
        let mut entries = self.entries.lock();

        match entries.get(&key) {
            Some(entry) if now <= entry.expires_at => {
                debug!("Cache hit");
                Some(entry.value.clone())
            }
            Some(_) => {
                entries.remove(&key);
                None
            }
            None => None,
        }
    }

    pub fn set<K: Serialize + ?Sized>(&self, parts: &K, value: V, ttl: Duration) {
        let Some(key) = cache_key(parts) else {
            return;
        };
        let expires_at = Instant::now() + ttl.min(MAX_TTL);
        self.entries.lock().insert(key, CacheEntry { value, expires_at });
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Longest time any of `rules` needs to reset; asking again sooner would only spend
/// budget on an answer we already have.
pub fn derive_ttl(rules: &[Arc<RateLimitRule>]) -> Duration {
    rules
        .iter()
        .map(|rule| rule.time_until_reset())
        .max()
        .unwrap_or_default()
        .min(MAX_TTL)
}
