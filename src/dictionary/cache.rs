use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

use super::oracle::DictionaryOracle;

/// How long cached lookups stay valid by default.
pub const DEFAULT_DEFINITION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

struct CacheEntry {
    result: Option<Vec<String>>,
    fetched_at: Instant,
}

/// Caching wrapper around another oracle.
///
/// Both positive and negative results are cached to bound upstream call
/// volume, but every entry expires after the TTL so a flaky upstream can
/// never pin a stale negative forever.
pub struct CachedOracle {
    upstream: Arc<dyn DictionaryOracle>,
    ttl: Duration,
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl CachedOracle {
    pub fn new(upstream: Arc<dyn DictionaryOracle>) -> Self {
        Self::with_ttl(upstream, DEFAULT_DEFINITION_TTL)
    }

    pub fn with_ttl(upstream: Arc<dyn DictionaryOracle>, ttl: Duration) -> Self {
        Self {
            upstream,
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl DictionaryOracle for CachedOracle {
    async fn lookup(&self, word: &str) -> Option<Vec<String>> {
        let key = word.to_lowercase();

        {
            let entries = self.entries.read().await;
            if let Some(entry) = entries.get(&key) {
                if entry.fetched_at.elapsed() < self.ttl {
                    debug!(word = %key, hit = entry.result.is_some(), "Definition cache hit");
                    return entry.result.clone();
                }
            }
        }

        let result = self.upstream.lookup(&key).await;
        let mut entries = self.entries.write().await;
        entries.insert(
            key,
            CacheEntry {
                result: result.clone(),
                fetched_at: Instant::now(),
            },
        );
        result
    }
}
