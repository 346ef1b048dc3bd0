use std::sync::LazyLock;

use regex::Regex;

use crate::clients::errors::{Error, Result};

static PLAYLIST_LINK: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^https://open\.spotify\.com/playlist/([^?]+)\?").ok());

/// Extract the playlist id from `https://open.spotify.com/playlist/<id>?...`.
///
/// The id is everything between `/playlist/` and the first `?`, and may not
/// be empty. The query
/// string is required; short links and `spotify:` URIs are not accepted.
pub fn parse_playlist_link(link: &str) -> Result<String> {
    PLAYLIST_LINK
        .as_ref()
        .and_then(|re| re.captures(link))
        .and_then(|caps| caps.get(1))
        .map(|id| id.as_str().to_string())
        .ok_or_else(|| Error::InvalidLink(link.to_string()))
}
