#![allow(missing_docs)]

/// Data entities for tracks and lyrics results
pub mod entities;
/// Error types and result aliases
pub mod errors;
/// Genius API client
pub mod genius;
/// Traits the collector uses to reach external services
pub mod sources;
/// Spotify API client
pub mod spotify;

pub use genius::GeniusClient;
pub use sources::{CatalogSource, LyricsSource};
pub use spotify::SpotifyClient;
