use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use scraper::{Html, Node, Selector};
use serde::Deserialize;

use crate::clients::{errors::LyricsError, sources::LyricsSource};

const DEFAULT_API_BASE: &str = "https://api.genius.com";
const USER_AGENT: &str = concat!("setlyrics/", env!("CARGO_PKG_VERSION"));
const LYRICS_CONTAINER: &str = r#"div[data-lyrics-container="true"]"#;

#[derive(Deserialize, Debug)]
struct SearchResponse {
    response: SearchPayload,
}

#[derive(Deserialize, Debug)]
struct SearchPayload {
    #[serde(default)]
    hits: Vec<SearchHit>,
}

#[derive(Deserialize, Debug)]
struct SearchHit {
    #[serde(rename = "type")]
    hit_type: String,
    result: SongResult,
}

#[derive(Deserialize, Debug)]
struct SongResult {
    title: String,
    url: String,
}

fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

// Prefer a song whose title matches the one asked for, otherwise Genius' own ranking
fn best_song_hit<'a>(hits: &'a [SearchHit], name: &str) -> Option<&'a SongResult> {
    let songs: Vec<&SongResult> = hits
        .iter()
        .filter(|h| h.hit_type == "song")
        .map(|h| &h.result)
        .collect();
    let wanted = normalize(name);
    songs
        .iter()
        .find(|s| normalize(&s.title) == wanted)
        .or_else(|| songs.first())
        .copied()
}

/// Pull the lyrics text out of a Genius song page. `<br>` becomes a line break.
fn extract_lyrics(html: &str) -> Option<String> {
    let selector = Selector::parse(LYRICS_CONTAINER).ok()?;
    let document = Html::parse_document(html);

    let blocks: Vec<String> = document
        .select(&selector)
        .map(|container| {
            let mut text = String::new();
            for node in container.descendants() {
                match node.value() {
                    Node::Text(t) => text.push_str(t),
                    Node::Element(e) if e.name() == "br" => text.push('\n'),
                    _ => {}
                }
            }
            text.trim().to_string()
        })
        .filter(|block| !block.is_empty())
        .collect();

    if blocks.is_empty() {
        None
    } else {
        Some(blocks.join("\n"))
    }
}

pub struct GeniusClient {
    http: reqwest::Client,
    api_base: String,
    access_token: String,
}

impl GeniusClient {
    pub fn new(access_token: impl Into<String>, timeout: Duration) -> Result<Self, LyricsError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(GeniusClient {
            http,
            api_base: DEFAULT_API_BASE.to_string(),
            access_token: access_token.into(),
        })
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    // Search Genius for "<name> <artists>" and scrape the best hit's page
    pub async fn search_song(&self, name: &str, artists: &str) -> Result<Option<String>, LyricsError> {
        let query = format!("{name} {artists}");
        let response = self
            .http
            .get(format!("{}/search", self.api_base))
            .bearer_auth(&self.access_token)
            .query(&[("q", query.as_str())])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(LyricsError::UnexpectedStatus(response.status().as_u16()));
        }
        let search: SearchResponse = response.json().await?;

        let Some(song) = best_song_hit(&search.response.hits, name) else {
            debug!("No Genius song hit for {query:?}");
            return Ok(None);
        };
        debug!("Fetching Genius page {} for {query:?}", song.url);

        let page = self.http.get(&song.url).send().await?;
        if !page.status().is_success() {
            return Err(LyricsError::UnexpectedStatus(page.status().as_u16()));
        }
        let html = page.text().await?;
        Ok(extract_lyrics(&html))
    }
}

#[async_trait]
impl LyricsSource for GeniusClient {
    async fn search_lyrics(&self, name: &str, artists: &str) -> Result<Option<String>, LyricsError> {
        self.search_song(name, artists).await
    }
}
