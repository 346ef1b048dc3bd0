use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub name: String,
    pub artists: Vec<String>, // in the order the catalog lists them
}

impl Track {
    pub fn new(name: impl Into<String>, artists: Vec<String>) -> Self {
        Track {
            name: name.into(),
            artists,
        }
    }

    /// Artist names joined the way they are sent to Genius and returned to callers.
    pub fn artist_line(&self) -> String {
        self.artists.join(", ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LyricsResult {
    pub name: String,
    pub artists: String,
    pub lyrics: String,
}
