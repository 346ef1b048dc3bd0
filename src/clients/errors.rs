use rspotify::ClientError;
use rspotify::http::HttpError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid playlist link: {0:?}")]
    InvalidLink(String),

    #[error("Spotify request failed{}: {message}", status_suffix(.status))]
    CatalogFetchFailed {
        status: Option<u16>,
        message: String,
    },

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

#[allow(clippy::ref_option)]
fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" with status {s}")).unwrap_or_default()
}

// Every Spotify failure collapses into one variant, keeping the upstream status when there is one
impl From<ClientError> for Error {
    fn from(err: ClientError) -> Self {
        let status = match &err {
            ClientError::Http(http) => match http.as_ref() {
                HttpError::StatusCode(response) => Some(response.status().as_u16()),
                HttpError::Client(inner) => inner.status().map(|s| s.as_u16()),
            },
            _ => None,
        };
        Error::CatalogFetchFailed {
            status,
            message: err.to_string(),
        }
    }
}

/// Failures of a single lyrics lookup. These never leave the lyrics layer.
#[derive(Error, Debug)]
pub enum LyricsError {
    #[error("Genius request timed out")]
    Timeout,

    #[error("Genius request failed: {0}")]
    Http(reqwest::Error),

    #[error("Genius responded with status {0}")]
    UnexpectedStatus(u16),

    #[error("Failed to parse Genius response: {0}")]
    Parse(String),
}

impl LyricsError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, LyricsError::Timeout)
    }
}

impl From<reqwest::Error> for LyricsError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LyricsError::Timeout
        } else if err.is_decode() {
            LyricsError::Parse(err.to_string())
        } else {
            LyricsError::Http(err)
        }
    }
}
