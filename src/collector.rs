//! Batch orchestration: playlist link in, ordered lyrics out.

use futures::future::join_all;
use log::{debug, info, warn};
use std::sync::Arc;

use crate::clients::{
    CatalogSource, GeniusClient, LyricsSource, SpotifyClient,
    entities::{LyricsResult, Track},
    errors::{Error, Result},
};
use crate::lyrics::{LyricsFetcher, LyricsPolicy, NOT_FOUND_SENTINEL, TIMEOUT_SENTINEL};
use crate::playlist_link::parse_playlist_link;
use crate::pool::{TaskError, TaskPool};
use crate::settings::Settings;

/// Configuration for the [`Collector`]
pub struct Config {
    /// Where playlist tracks come from
    pub catalog: Arc<dyn CatalogSource>,
    /// Lyrics lookups with their policy applied
    pub lyrics: Arc<LyricsFetcher>,
    /// Slots shared by every request
    pub pool: TaskPool,
    /// Tracks dispatched together before waiting
    pub page_size: usize,
}

/// Assembles a [`Config`], filling anything not injected from [`Settings`].
#[derive(Default)]
pub struct ConfigBuilder {
    catalog: Option<Arc<dyn CatalogSource>>,
    lyrics_source: Option<Arc<dyn LyricsSource>>,
    policy: Option<LyricsPolicy>,
    pool: Option<TaskPool>,
    page_size: Option<usize>,
}

impl ConfigBuilder {
    /// An empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Use this catalog instead of Spotify
    #[must_use]
    pub fn catalog(mut self, catalog: Arc<dyn CatalogSource>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Use this lyrics source instead of Genius
    #[must_use]
    pub fn lyrics_source(mut self, source: Arc<dyn LyricsSource>) -> Self {
        self.lyrics_source = Some(source);
        self
    }

    /// Override the configured lookup policy
    #[must_use]
    pub fn policy(mut self, policy: LyricsPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Share an existing pool
    #[must_use]
    pub fn pool(mut self, pool: TaskPool) -> Self {
        self.pool = Some(pool);
        self
    }

    /// Override the page size
    #[must_use]
    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// Build the config. A default Spotify client is authorized here, which needs the network.
    pub async fn build(self, settings: &Settings) -> Result<Config> {
        let catalog = match self.catalog {
            Some(c) => c,
            None => {
                let spotify =
                    SpotifyClient::with_credentials(&settings.client_id, &settings.client_secret);
                spotify.authorize_client().await?;
                Arc::new(spotify)
            }
        };
        let lyrics_source = match self.lyrics_source {
            Some(s) => s,
            None => Arc::new(
                GeniusClient::new(settings.genius_access_token.clone(), settings.lyrics_timeout)
                    .map_err(|e| Error::ConfigurationError(e.to_string()))?,
            ),
        };
        let policy = self
            .policy
            .unwrap_or_else(|| LyricsPolicy::from_settings(settings));
        let pool = self
            .pool
            .unwrap_or_else(|| TaskPool::new(settings.worker_pool_size, settings.task_timeout));

        Ok(Config {
            catalog,
            lyrics: Arc::new(LyricsFetcher::new(lyrics_source, policy)),
            pool,
            page_size: self.page_size.unwrap_or(settings.page_size),
        })
    }
}

/// Turns a playlist link into one [`LyricsResult`] per track.
pub struct Collector {
    config: Config,
}

impl Collector {
    /// A collector running on `config`
    pub fn new(config: Config) -> Self {
        Collector { config }
    }

    /// The shared task pool
    pub fn pool(&self) -> &TaskPool {
        &self.config.pool
    }

    /// Parse the link, list the playlist, then look up lyrics for every track.
    ///
    /// Fails only on a bad link or a failed catalog fetch; lyrics problems
    /// become sentinels.
    pub async fn collect(&self, playlist_link: &str) -> Result<Vec<LyricsResult>> {
        let playlist_id = parse_playlist_link(playlist_link)?;
        info!("Fetching tracks of playlist {playlist_id} ...");
        let tracks = self.config.catalog.playlist_tracks(&playlist_id).await?;
        info!("Playlist {playlist_id} has {} tracks", tracks.len());

        let results = self.lyrics_for_tracks(&tracks).await;
        info!("Collected lyrics for {} tracks", results.len());
        Ok(results)
    }

    /// Look up lyrics page by page. Each page runs through the pool and is
    /// awaited in full before the next one starts. Output order matches `tracks`.
    pub async fn lyrics_for_tracks(&self, tracks: &[Track]) -> Vec<LyricsResult> {
        let page_size = self.config.page_size.max(1);
        let mut results = Vec::with_capacity(tracks.len());

        for (page, chunk) in tracks.chunks(page_size).enumerate() {
            debug!("Looking up lyrics for page {} ({} tracks)", page + 1, chunk.len());
            // join_all keeps results in submission order
            let page_results = join_all(chunk.iter().map(|t| self.lyrics_for_track(t))).await;
            results.extend(page_results);
        }
        results
    }

    async fn lyrics_for_track(&self, track: &Track) -> LyricsResult {
        let artists = track.artist_line();
        let lookup = self.config.lyrics.lyrics_for(&track.name, &artists);
        // Retries are bounded by their attempt count, so the pool timeout would cut them short
        let outcome = match self.config.lyrics.policy() {
            LyricsPolicy::RetryOnTimeout(_) => self.config.pool.run_untimed(lookup).await,
            _ => self.config.pool.run(lookup).await,
        };
        let lyrics = match outcome {
            Ok(lyrics) => lyrics,
            Err(e @ TaskError::TimedOut(_)) => {
                warn!("Lyrics lookup for {} - {artists}: {e}", track.name);
                TIMEOUT_SENTINEL.to_string()
            }
            Err(e @ TaskError::Closed) => {
                warn!("Lyrics lookup for {} - {artists}: {e}", track.name);
                NOT_FOUND_SENTINEL.to_string()
            }
        };
        LyricsResult {
            name: track.name.clone(),
            artists,
            lyrics,
        }
    }
}
