use std::collections::HashMap;

use tokio::sync::RwLock;

/// Composite key of a cached lookup: the track name and its joined artist line.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    name: String,
    artists: String,
}

impl CacheKey {
    pub fn new(name: &str, artists: &str) -> Self {
        CacheKey {
            name: name.to_string(),
            artists: artists.to_string(),
        }
    }
}

/// Unbounded, process-lifetime lyrics cache. Entries are never evicted.
///
/// Two concurrent misses for the same key may both reach the lyrics API; the
/// second insert overwrites the first with the same text.
#[derive(Debug, Default)]
pub struct LyricsCache {
    entries: RwLock<HashMap<CacheKey, String>>,
}

impl LyricsCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, key: &CacheKey) -> Option<String> {
        self.entries.read().await.get(key).cloned()
    }

    pub async fn insert(&self, key: CacheKey, lyrics: String) {
        self.entries.write().await.insert(key, lyrics);
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    #[cfg(test)]
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
