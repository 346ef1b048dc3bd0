//! Setlyrics - Lyrics for every track of a Spotify playlist
//!
//! Given a playlist link, this library lists the playlist's tracks through
//! the Spotify Web API and looks up each track's lyrics on Genius, returning
//! one entry per track in playlist order.

/// Client modules for interacting with Spotify and Genius
pub mod clients;
/// Batch orchestration of lyrics lookups
pub mod collector;
/// HTTP API built on axum
pub mod http_api;
/// Lyrics lookup policies, cache and retry
pub mod lyrics;
/// Playlist link parsing
pub mod playlist_link;
/// Bounded task pool
pub mod pool;
/// Settings read from the environment
pub mod settings;
