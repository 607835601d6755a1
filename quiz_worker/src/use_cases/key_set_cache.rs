use jsonwebtoken::jwk::JwkSet;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::domain::ports::KeySetSource;

pub const DEFAULT_MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

struct CachedKeySet {
    keys: Arc<JwkSet>,
    fetched_at: Instant,
}

// Process-wide cache of signing key sets, keyed by issuer domain.
// Entries are filled on first use and live for the whole process.
pub struct KeySetCache {
    entries: RwLock<HashMap<String, CachedKeySet>>,
    // Lower bound between two fetches of the same domain on a kid miss.
    min_refresh_interval: Duration,
}

impl Default for KeySetCache {
    fn default() -> Self {
        Self::with_min_refresh_interval(DEFAULT_MIN_REFRESH_INTERVAL)
    }
}

impl KeySetCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_min_refresh_interval(min_refresh_interval: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            min_refresh_interval,
        }
    }

    pub async fn get_or_fetch(
        &self,
        domain: &str,
        source: &dyn KeySetSource,
    ) -> Result<Arc<JwkSet>, String> {
        if let Some(entry) = self.entries.read().await.get(domain) {
            return Ok(entry.keys.clone());
        }

        // Fetch without holding the lock; two racing misses both fetch and the last insert wins.
        self.refresh(domain, source).await
    }

    // Unconditionally re-fetch a domain's keys and replace the cached entry.
    pub async fn refresh(
        &self,
        domain: &str,
        source: &dyn KeySetSource,
    ) -> Result<Arc<JwkSet>, String> {
        let keys = Arc::new(source.fetch_key_set(domain).await?);
        self.entries.write().await.insert(
            domain.to_string(),
            CachedKeySet {
                keys: keys.clone(),
                fetched_at: Instant::now(),
            },
        );
        Ok(keys)
    }

    // Re-fetch only when the cached entry is older than the refresh interval.
    // `Ok(None)` means the refresh was skipped.
    pub async fn refresh_if_stale(
        &self,
        domain: &str,
        source: &dyn KeySetSource,
    ) -> Result<Option<Arc<JwkSet>>, String> {
        {
            let mut entries = self.entries.write().await;
            if let Some(entry) = entries.get_mut(domain) {
                if entry.fetched_at.elapsed() < self.min_refresh_interval {
                    return Ok(None);
                }
                // Claim the slot so concurrent misses in the same window skip the fetch.
                entry.fetched_at = Instant::now();
            }
        }

        self.refresh(domain, source).await.map(Some)
    }

    pub async fn contains(&self, domain: &str) -> bool {
        self.entries.read().await.contains_key(domain)
    }
}
