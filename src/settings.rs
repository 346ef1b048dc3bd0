//! Process-wide settings, read once from the environment at startup.

use std::fmt::Display;
use std::net::SocketAddr;
use std::num::NonZeroUsize;
use std::str::FromStr;
use std::time::Duration;

use crate::clients::errors::{Error, Result};

/// Only browser callers from this origin may use the API unless overridden.
pub const DEFAULT_ALLOWED_ORIGIN: &str = "https://front-end-set-list.vercel.app";
const DEFAULT_BIND_ADDR: ([u8; 4], u16) = ([127, 0, 0, 1], 5000);

/// Which lyrics lookup policy to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PolicyKind {
    /// One attempt per lookup.
    Single,
    /// Up to `RETRY_MAX_ATTEMPTS` attempts when Genius times out.
    Retry,
    /// Cache every result for the lifetime of the process.
    #[default]
    Cached,
}

impl FromStr for PolicyKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "single" => Ok(PolicyKind::Single),
            "retry" => Ok(PolicyKind::Retry),
            "cached" => Ok(PolicyKind::Cached),
            other => Err(Error::ConfigurationError(format!(
                "unknown lyrics policy {other:?}, expected single, retry or cached"
            ))),
        }
    }
}

/// Everything the service needs to start.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Spotify client id (`CLIENT_ID`)
    pub client_id: String,
    /// Spotify client secret (`CLIENT_SECRET`)
    pub client_secret: String,
    /// Genius API token (`GENIUS_ACCESS_TOKEN`)
    pub genius_access_token: String,
    /// Address the HTTP API listens on (`BIND_ADDR`)
    pub bind_addr: SocketAddr,
    /// Origin allowed by CORS on `/api/*` (`ALLOWED_ORIGIN`)
    pub allowed_origin: String,
    /// Lookup policy (`LYRICS_POLICY`)
    pub lyrics_policy: PolicyKind,
    /// Per-call timeout of the Genius client (`LYRICS_TIMEOUT_SECS`)
    pub lyrics_timeout: Duration,
    /// Attempts of the retry policy (`RETRY_MAX_ATTEMPTS`)
    pub retry_max_attempts: u32,
    /// Pause between retries (`RETRY_BACKOFF_MS`)
    pub retry_backoff: Duration,
    /// Tracks per batch (`PAGE_SIZE`)
    pub page_size: usize,
    /// Lookups allowed to run at once across all requests (`WORKER_POOL_SIZE`)
    pub worker_pool_size: usize,
    /// Upper bound for one single or cached lookup (`TASK_TIMEOUT_SECS`).
    /// The retry policy is bounded by its attempts instead.
    pub task_timeout: Duration,
}

impl Settings {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`, which maps a variable name to its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let settings = Settings {
            client_id: required(&lookup, "CLIENT_ID")?,
            client_secret: required(&lookup, "CLIENT_SECRET")?,
            genius_access_token: required(&lookup, "GENIUS_ACCESS_TOKEN")?,
            bind_addr: optional(&lookup, "BIND_ADDR", SocketAddr::from(DEFAULT_BIND_ADDR))?,
            allowed_origin: lookup("ALLOWED_ORIGIN")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_ALLOWED_ORIGIN.to_string()),
            lyrics_policy: optional(&lookup, "LYRICS_POLICY", PolicyKind::default())?,
            lyrics_timeout: Duration::from_secs(optional(&lookup, "LYRICS_TIMEOUT_SECS", 15)?),
            retry_max_attempts: optional(&lookup, "RETRY_MAX_ATTEMPTS", 3)?,
            retry_backoff: Duration::from_millis(optional(&lookup, "RETRY_BACKOFF_MS", 0)?),
            page_size: optional(&lookup, "PAGE_SIZE", 5)?,
            worker_pool_size: optional(&lookup, "WORKER_POOL_SIZE", default_pool_size())?,
            task_timeout: Duration::from_secs(optional(&lookup, "TASK_TIMEOUT_SECS", 60)?),
        };
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(Error::ConfigurationError("PAGE_SIZE must be at least 1".into()));
        }
        if self.worker_pool_size == 0 {
            return Err(Error::ConfigurationError(
                "WORKER_POOL_SIZE must be at least 1".into(),
            ));
        }
        if self.retry_max_attempts == 0 {
            return Err(Error::ConfigurationError(
                "RETRY_MAX_ATTEMPTS must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

fn required<F>(lookup: &F, key: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).filter(|v| !v.trim().is_empty()).ok_or_else(|| {
        Error::ConfigurationError(format!(
            "Missing {key} in environment variables. Check README.MD for details."
        ))
    })
}

fn optional<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    match lookup(key).filter(|v| !v.trim().is_empty()) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| Error::ConfigurationError(format!("Invalid {key}={raw:?}: {e}"))),
        None => Ok(default),
    }
}

// Same sizing rule as a thread pool executor: cpus + 4, capped at 32
fn default_pool_size() -> usize {
    std::thread::available_parallelism()
        .map_or(1, NonZeroUsize::get)
        .saturating_add(4)
        .min(32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    const CREDENTIALS: [(&str, &str); 3] = [
        ("CLIENT_ID", "id"),
        ("CLIENT_SECRET", "secret"),
        ("GENIUS_ACCESS_TOKEN", "token"),
    ];

    #[test]
    fn defaults_apply_when_only_credentials_are_set() {
        let settings = Settings::from_lookup(lookup_from(&CREDENTIALS)).unwrap();
        assert_eq!(settings.client_id, "id");
        assert_eq!(settings.client_secret, "secret");
        assert_eq!(settings.genius_access_token, "token");
        assert_eq!(settings.bind_addr, "127.0.0.1:5000".parse::<SocketAddr>().unwrap());
        assert_eq!(settings.allowed_origin, DEFAULT_ALLOWED_ORIGIN);
        assert_eq!(settings.lyrics_policy, PolicyKind::Cached);
        assert_eq!(settings.lyrics_timeout, Duration::from_secs(15));
        assert_eq!(settings.retry_max_attempts, 3);
        assert_eq!(settings.retry_backoff, Duration::ZERO);
        assert_eq!(settings.page_size, 5);
        assert!((5..=32).contains(&settings.worker_pool_size));
        assert_eq!(settings.task_timeout, Duration::from_secs(60));
    }

    #[test]
    fn overrides_are_parsed() {
        let mut vars = CREDENTIALS.to_vec();
        vars.extend([
            ("BIND_ADDR", "0.0.0.0:8080"),
            ("ALLOWED_ORIGIN", "http://localhost:3000"),
            ("LYRICS_POLICY", " Retry "),
            ("LYRICS_TIMEOUT_SECS", "5"),
            ("RETRY_MAX_ATTEMPTS", "4"),
            ("RETRY_BACKOFF_MS", "250"),
            ("PAGE_SIZE", "10"),
            ("WORKER_POOL_SIZE", "1"),
            ("TASK_TIMEOUT_SECS", "90"),
        ]);
        let settings = Settings::from_lookup(lookup_from(&vars)).unwrap();
        assert_eq!(settings.bind_addr, "0.0.0.0:8080".parse::<SocketAddr>().unwrap());
        assert_eq!(settings.allowed_origin, "http://localhost:3000");
        assert_eq!(settings.lyrics_policy, PolicyKind::Retry);
        assert_eq!(settings.lyrics_timeout, Duration::from_secs(5));
        assert_eq!(settings.retry_max_attempts, 4);
        assert_eq!(settings.retry_backoff, Duration::from_millis(250));
        assert_eq!(settings.page_size, 10);
        assert_eq!(settings.worker_pool_size, 1);
        assert_eq!(settings.task_timeout, Duration::from_secs(90));
    }

    #[test]
    fn missing_credentials_are_reported() {
        let err = Settings::from_lookup(lookup_from(&[("CLIENT_ID", "id")])).unwrap_err();
        assert!(err.to_string().contains("CLIENT_SECRET"));

        let err = Settings::from_lookup(lookup_from(&[
            ("CLIENT_ID", "id"),
            ("CLIENT_SECRET", "secret"),
            ("GENIUS_ACCESS_TOKEN", "  "),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("GENIUS_ACCESS_TOKEN"));
    }

    #[test]
    fn bad_values_are_configuration_errors() {
        for (key, value) in [
            ("PAGE_SIZE", "five"),
            ("PAGE_SIZE", "0"),
            ("WORKER_POOL_SIZE", "0"),
            ("LYRICS_POLICY", "sometimes"),
            ("BIND_ADDR", "localhost"),
        ] {
            let mut vars = CREDENTIALS.to_vec();
            vars.push((key, value));
            let err = Settings::from_lookup(lookup_from(&vars)).unwrap_err();
            assert!(
                matches!(err, Error::ConfigurationError(_)),
                "{key}={value} gave {err:?}"
            );
        }
    }
}
