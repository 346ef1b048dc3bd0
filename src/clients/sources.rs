use async_trait::async_trait;

use crate::clients::{
    entities::Track,
    errors::{LyricsError, Result},
};

/// Anything that can list the tracks of a playlist.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn playlist_tracks(&self, playlist_id: &str) -> Result<Vec<Track>>;
}

/// Anything that can look up the lyrics of a song. `Ok(None)` means the song was not found.
#[async_trait]
pub trait LyricsSource: Send + Sync {
    async fn search_lyrics(
        &self,
        name: &str,
        artists: &str,
    ) -> std::result::Result<Option<String>, LyricsError>;
}
