//! Lyrics lookup policies
//!
//! A [`LyricsFetcher`] wraps a [`LyricsSource`] with exactly one policy:
//! - a single attempt,
//! - retries when the lyrics API times out,
//! - or a cache consulted before the lyrics API.
//!
//! Whatever happens, a lookup yields a string: the lyrics or one of the sentinels.

/// In-memory lyrics cache
pub mod cache;
/// Generic retry loop
pub mod retry;

use std::sync::Arc;

use log::{debug, warn};

use crate::clients::{LyricsSource, errors::LyricsError};
use crate::settings::{PolicyKind, Settings};

pub use cache::{CacheKey, LyricsCache};
pub use retry::RetryPolicy;

/// Returned when the lyrics API has no lyrics for a track, or the lookup failed.
pub const NOT_FOUND_SENTINEL: &str = "Letra não encontrada";
/// Returned when every allowed attempt timed out.
pub const TIMEOUT_SENTINEL: &str = "Tempo esgotado ao buscar a letra";

/// Strategy applied to each lookup.
#[derive(Debug, Clone)]
pub enum LyricsPolicy {
    /// One attempt; any failure reads as "not found".
    Single,
    /// Retry on timeouts only, up to the policy's attempt limit.
    RetryOnTimeout(RetryPolicy),
    /// Serve repeated lookups from the cache; misses take a single attempt.
    Cached(Arc<LyricsCache>),
}

impl LyricsPolicy {
    pub fn from_settings(settings: &Settings) -> Self {
        match settings.lyrics_policy {
            PolicyKind::Single => LyricsPolicy::Single,
            PolicyKind::Retry => LyricsPolicy::RetryOnTimeout(RetryPolicy::new(
                settings.retry_max_attempts,
                settings.retry_backoff,
            )),
            PolicyKind::Cached => LyricsPolicy::Cached(Arc::new(LyricsCache::new())),
        }
    }
}

pub struct LyricsFetcher {
    source: Arc<dyn LyricsSource>,
    policy: LyricsPolicy,
}

impl LyricsFetcher {
    pub fn new(source: Arc<dyn LyricsSource>, policy: LyricsPolicy) -> Self {
        LyricsFetcher { source, policy }
    }

    pub fn policy(&self) -> &LyricsPolicy {
        &self.policy
    }

    /// Lyrics for one track. Never fails: problems turn into a sentinel.
    pub async fn lyrics_for(&self, name: &str, artists: &str) -> String {
        match &self.policy {
            LyricsPolicy::Single => self.single_attempt(name, artists).await,
            LyricsPolicy::RetryOnTimeout(retry) => self.with_retry(retry, name, artists).await,
            LyricsPolicy::Cached(cache) => self.cached(cache, name, artists).await,
        }
    }

    async fn single_attempt(&self, name: &str, artists: &str) -> String {
        match self.source.search_lyrics(name, artists).await {
            Ok(Some(lyrics)) => lyrics,
            Ok(None) => {
                debug!("No lyrics found for {name} - {artists}");
                NOT_FOUND_SENTINEL.to_string()
            }
            Err(e) => {
                warn!("Lyrics lookup failed for {name} - {artists}: {e}");
                NOT_FOUND_SENTINEL.to_string()
            }
        }
    }

    async fn with_retry(&self, retry: &RetryPolicy, name: &str, artists: &str) -> String {
        let result = retry
            .run(
                |_| self.source.search_lyrics(name, artists),
                LyricsError::is_timeout,
            )
            .await;
        match result {
            Ok(Some(lyrics)) => lyrics,
            Ok(None) => NOT_FOUND_SENTINEL.to_string(),
            Err(LyricsError::Timeout) => {
                warn!(
                    "Lyrics lookup for {name} - {artists} timed out {} times",
                    retry.max_attempts.max(1)
                );
                TIMEOUT_SENTINEL.to_string()
            }
            Err(e) => {
                warn!("Lyrics lookup failed for {name} - {artists}: {e}");
                NOT_FOUND_SENTINEL.to_string()
            }
        }
    }

    async fn cached(&self, cache: &LyricsCache, name: &str, artists: &str) -> String {
        let key = CacheKey::new(name, artists);
        if let Some(lyrics) = cache.get(&key).await {
            debug!("Lyrics cache hit for {name} - {artists}");
            return lyrics;
        }
        let lyrics = self.single_attempt(name, artists).await;
        // Sentinels are cached too
        cache.insert(key, lyrics.clone()).await;
        lyrics
    }
}
