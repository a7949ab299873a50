//! Application configuration loaded from environment variables.
//!
//! Loaded once at process start and handed to the archiver and enricher;
//! nothing below `main` reads the environment.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Default Last.fm REST endpoint.
pub const DEFAULT_API_URL: &str = "http://ws.audioscrobbler.com/2.0/";

/// Default database file name, placed next to the executable.
pub const DEFAULT_DB_FILE: &str = "lastfm_archive.db";

/// Last.fm refuses `limit` values above 200 for recent tracks.
pub const MAX_PAGE_SIZE: u32 = 200;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Required ---
    /// Last.fm API key
    pub lastfm_api_key: String,
    /// Last.fm shared secret. The read-only feed never signs requests,
    /// but the API issues key and secret as a pair.
    pub lastfm_secret: String,
    /// Last.fm user whose scrobbles are archived
    pub lastfm_username: String,

    // --- Optional ---
    /// SQLite archive location
    pub db_path: PathBuf,
    /// Last.fm REST endpoint
    pub api_url: String,
    /// Records requested per page (1..=200)
    pub page_size: u32,
    /// Total attempts per page request, including the first one
    pub max_attempts: u32,
    /// Per-request HTTP timeout
    pub request_timeout: Duration,
    /// Pause between consecutive page requests
    pub page_delay: Duration,
    /// Minimum play count before an artist is enriched with tags
    pub enrich_min_plays: u32,
    /// Log output format
    pub log_format: LogFormat,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            lastfm_api_key: "test_api_key".to_string(),
            lastfm_secret: "test_secret".to_string(),
            lastfm_username: "test_user".to_string(),
            db_path: PathBuf::from(DEFAULT_DB_FILE),
            api_url: DEFAULT_API_URL.to_string(),
            page_size: MAX_PAGE_SIZE,
            max_attempts: 3,
            request_timeout: Duration::from_secs(30),
            page_delay: Duration::from_millis(300),
            enrich_min_plays: 5,
            log_format: LogFormat::Text,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// A `.env` file in the working directory is loaded first if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::Missing(key))
        };
        let defaults = Self::default();

        let db_path = match lookup("LASTFM_ARCHIVE_DB") {
            Some(path) if !path.trim().is_empty() => PathBuf::from(path.trim()),
            _ => default_db_path(),
        };

        let log_format = match lookup("LOG_FORMAT").as_deref().map(str::trim) {
            None | Some("") | Some("text") => LogFormat::Text,
            Some("json") => LogFormat::Json,
            Some(other) => return Err(ConfigError::Invalid("LOG_FORMAT", other.to_string())),
        };

        Ok(Self {
            lastfm_api_key: required("LASTFM_KEY")?,
            lastfm_secret: required("LASTFM_SECRET")?,
            lastfm_username: required("LASTFM_USERNAME")?,
            db_path,
            api_url: match lookup("LASTFM_API_URL") {
                Some(url) if !url.trim().is_empty() => url.trim().to_string(),
                _ => defaults.api_url,
            },
            page_size: parse_or(&lookup, "LASTFM_PAGE_SIZE", defaults.page_size)
                .clamp(1, MAX_PAGE_SIZE),
            max_attempts: parse_or(&lookup, "LASTFM_MAX_ATTEMPTS", defaults.max_attempts).max(1),
            request_timeout: Duration::from_secs(parse_or(
                &lookup,
                "LASTFM_REQUEST_TIMEOUT_SECS",
                defaults.request_timeout.as_secs(),
            )),
            page_delay: Duration::from_millis(parse_or(
                &lookup,
                "LASTFM_PAGE_DELAY_MS",
                defaults.page_delay.as_millis() as u64,
            )),
            enrich_min_plays: parse_or(&lookup, "LASTFM_ENRICH_MIN_PLAYS", defaults.enrich_min_plays),
            log_format,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// `lastfm_archive.db` next to the running executable, or in the working
/// directory if the executable path is unavailable.
fn default_db_path() -> PathBuf {
    env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(DEFAULT_DB_FILE)))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_FILE))
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    const REQUIRED: [(&str, &str); 3] = [
        ("LASTFM_KEY", "key"),
        ("LASTFM_SECRET", " secret \n"),
        ("LASTFM_USERNAME", "listener"),
    ];

    #[test]
    fn test_config_from_lookup_defaults() {
        let config = Config::from_lookup(lookup_from(&REQUIRED)).expect("Config should load");

        assert_eq!(config.lastfm_api_key, "key");
        assert_eq!(config.lastfm_secret, "secret");
        assert_eq!(config.lastfm_username, "listener");
        assert_eq!(config.page_size, 200);
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.page_delay, Duration::from_millis(300));
        assert_eq!(config.log_format, LogFormat::Text);
        assert!(config.db_path.ends_with(DEFAULT_DB_FILE));
    }

    #[test]
    fn test_config_missing_username() {
        let err = Config::from_lookup(lookup_from(&REQUIRED[..2])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("LASTFM_USERNAME")));
    }

    #[test]
    fn test_config_overrides_and_clamps() {
        let mut vars = REQUIRED.to_vec();
        vars.extend([
            ("LASTFM_ARCHIVE_DB", "/tmp/archive.db"),
            ("LASTFM_PAGE_SIZE", "1000"),
            ("LASTFM_MAX_ATTEMPTS", "0"),
            ("LASTFM_PAGE_DELAY_MS", "not-a-number"),
            ("LOG_FORMAT", "json"),
        ]);

        let config = Config::from_lookup(lookup_from(&vars)).expect("Config should load");

        assert_eq!(config.db_path, PathBuf::from("/tmp/archive.db"));
        assert_eq!(config.page_size, MAX_PAGE_SIZE);
        assert_eq!(config.max_attempts, 1);
        assert_eq!(config.page_delay, Duration::from_millis(300));
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_config_rejects_unknown_log_format() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("LOG_FORMAT", "yaml"));

        let err = Config::from_lookup(lookup_from(&vars)).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid("LOG_FORMAT", _)));
    }

    #[test]
    fn test_config_blank_api_url_uses_default() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("LASTFM_API_URL", "  "));

        let config = Config::from_lookup(lookup_from(&vars)).expect("Config should load");
        assert_eq!(config.api_url, DEFAULT_API_URL);

        let mut vars = REQUIRED.to_vec();
        vars.push(("LASTFM_API_URL", " http://localhost:9000/2.0/ \n"));

        let config = Config::from_lookup(lookup_from(&vars)).expect("Config should load");
        assert_eq!(config.api_url, "http://localhost:9000/2.0/");
    }
}
