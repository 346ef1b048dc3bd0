use async_trait::async_trait;
use log::debug;

use crate::clients::{
    entities::Track,
    errors::{Error, Result},
    sources::CatalogSource,
};
use rspotify::{
    ClientCredsSpotify, Config, Credentials,
    model::{PlayableItem, PlaylistId, PlaylistItem},
    prelude::*,
};

// Episodes and removed tracks have no lyrics to look up
fn track_from_item(item: PlaylistItem) -> Option<Track> {
    match item.track? {
        PlayableItem::Track(track) => Some(Track {
            name: track.name,
            artists: track.artists.into_iter().map(|a| a.name).collect(),
        }),
        _ => None,
    }
}

pub struct SpotifyClient {
    pub spotify: ClientCredsSpotify,
}

impl SpotifyClient {
    pub fn new(spotify: ClientCredsSpotify) -> Self {
        SpotifyClient { spotify }
    }

    // Client credentials flow: no user involved, public playlists only
    pub fn with_credentials(client_id: &str, client_secret: &str) -> Self {
        let creds = Credentials::new(client_id, client_secret);
        let spotify = ClientCredsSpotify::with_config(
            creds,
            Config {
                token_refreshing: true,
                ..Default::default()
            },
        );
        Self { spotify }
    }

    // Request the first access token. Later calls refresh it when it expires.
    pub async fn authorize_client(&self) -> Result<()> {
        debug!("Requesting Spotify client credentials token ...");
        self.spotify.request_token().await?;
        debug!("Spotify token acquired");
        Ok(())
    }

    // Only the first page of items is fetched; longer playlists are truncated
    pub async fn get_playlist_tracks(&self, playlist_id: &str) -> Result<Vec<Track>> {
        let id = PlaylistId::from_id(playlist_id).map_err(|e| Error::CatalogFetchFailed {
            status: None,
            message: format!("malformed playlist id {playlist_id:?}: {e}"),
        })?;
        let page = self
            .spotify
            .playlist_items_manual(id, None, None, None, None)
            .await?;
        debug!(
            "Spotify returned {} of {} items for playlist {playlist_id}",
            page.items.len(),
            page.total
        );
        Ok(page.items.into_iter().filter_map(track_from_item).collect())
    }
}

#[async_trait]
impl CatalogSource for SpotifyClient {
    async fn playlist_tracks(&self, playlist_id: &str) -> Result<Vec<Track>> {
        self.get_playlist_tracks(playlist_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn malformed_id_fails_without_network() {
        let client = SpotifyClient::with_credentials("id", "secret");
        let err = client
            .get_playlist_tracks("not a playlist id!")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::CatalogFetchFailed { status: None, .. }));
    }
}
