//! Endpoint and credential configuration for the external API clients.
//!
//! Every value can be supplied through environment variables. Base URLs
//! default to the public services and are only overridden by tests or by
//! deployments that proxy the upstream APIs.
//!
//! | Variable | Purpose |
//! |---|---|
//! | `GLOBEPEEK_REST_COUNTRIES_URL` | REST Countries base (default `https://restcountries.com/v3.1`) |
//! | `GLOBEPEEK_OPENWEATHER_URL` | OpenWeather base (default `https://api.openweathermap.org/data/2.5`) |
//! | `GLOBEPEEK_OPENWEATHER_API_KEY` | OpenWeather `appid` |
//! | `GLOBEPEEK_UNSPLASH_URL` | Unsplash base (default `https://api.unsplash.com`) |
//! | `GLOBEPEEK_UNSPLASH_ACCESS_KEY` | Unsplash client id |
//! | `GLOBEPEEK_YOUTUBE_URL` | YouTube Data API base (default `https://www.googleapis.com/youtube/v3`) |
//! | `GLOBEPEEK_YOUTUBE_API_KEY` | YouTube API key |
//! | `GLOBEPEEK_GEOAPIFY_URL` | Geoapify base (default `https://api.geoapify.com/v2`) |
//! | `GLOBEPEEK_GEOAPIFY_API_KEY` | Geoapify API key |
//! | `GLOBEPEEK_SUPABASE_URL` | Supabase project URL |
//! | `GLOBEPEEK_SUPABASE_ANON_KEY` | Supabase anon (publishable) key |
//! | `GLOBEPEEK_HTTP_TIMEOUT_SECS` | Per-request timeout (default 15) |

use std::env;
use std::time::Duration;

use reqwest::Url;

use crate::error::{Error, Result};

pub const DEFAULT_REST_COUNTRIES_URL: &str = "https://restcountries.com/v3.1";
pub const DEFAULT_OPENWEATHER_URL: &str = "https://api.openweathermap.org/data/2.5";
pub const DEFAULT_UNSPLASH_URL: &str = "https://api.unsplash.com";
pub const DEFAULT_YOUTUBE_URL: &str = "https://www.googleapis.com/youtube/v3";
pub const DEFAULT_GEOAPIFY_URL: &str = "https://api.geoapify.com/v2";
const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Resolved configuration for all external services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub rest_countries_url: String,
    pub openweather_url: String,
    pub openweather_key: Option<String>,
    pub unsplash_url: String,
    pub unsplash_key: Option<String>,
    pub youtube_url: String,
    pub youtube_key: Option<String>,
    pub geoapify_url: String,
    pub geoapify_key: Option<String>,
    pub supabase_url: Option<String>,
    pub supabase_anon_key: Option<String>,
    pub timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            rest_countries_url: DEFAULT_REST_COUNTRIES_URL.to_string(),
            openweather_url: DEFAULT_OPENWEATHER_URL.to_string(),
            openweather_key: None,
            unsplash_url: DEFAULT_UNSPLASH_URL.to_string(),
            unsplash_key: None,
            youtube_url: DEFAULT_YOUTUBE_URL.to_string(),
            youtube_key: None,
            geoapify_url: DEFAULT_GEOAPIFY_URL.to_string(),
            geoapify_key: None,
            supabase_url: None,
            supabase_anon_key: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl ApiConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read configuration through an arbitrary lookup function.
    ///
    /// Tests use this instead of mutating the global environment so they can
    /// run in parallel. Blank values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        let timeout = get("GLOBEPEEK_HTTP_TIMEOUT_SECS")
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(defaults.timeout);

        Self {
            rest_countries_url: get("GLOBEPEEK_REST_COUNTRIES_URL")
                .unwrap_or(defaults.rest_countries_url),
            openweather_url: get("GLOBEPEEK_OPENWEATHER_URL").unwrap_or(defaults.openweather_url),
            openweather_key: get("GLOBEPEEK_OPENWEATHER_API_KEY"),
            unsplash_url: get("GLOBEPEEK_UNSPLASH_URL").unwrap_or(defaults.unsplash_url),
            unsplash_key: get("GLOBEPEEK_UNSPLASH_ACCESS_KEY"),
            youtube_url: get("GLOBEPEEK_YOUTUBE_URL").unwrap_or(defaults.youtube_url),
            youtube_key: get("GLOBEPEEK_YOUTUBE_API_KEY"),
            geoapify_url: get("GLOBEPEEK_GEOAPIFY_URL").unwrap_or(defaults.geoapify_url),
            geoapify_key: get("GLOBEPEEK_GEOAPIFY_API_KEY"),
            supabase_url: get("GLOBEPEEK_SUPABASE_URL"),
            supabase_anon_key: get("GLOBEPEEK_SUPABASE_ANON_KEY"),
            timeout,
        }
    }

    /// Point every upstream at a single base URL.
    ///
    /// Each service keeps its own path prefix below `base`, mirroring the
    /// layout the in-process fake upstream in the tests serves.
    pub fn with_single_upstream(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            rest_countries_url: format!("{base}/v3.1"),
            openweather_url: format!("{base}/data/2.5"),
            openweather_key: Some("test-weather-key".to_string()),
            unsplash_url: base.to_string(),
            unsplash_key: Some("test-unsplash-key".to_string()),
            youtube_url: format!("{base}/youtube/v3"),
            youtube_key: Some("test-youtube-key".to_string()),
            geoapify_url: format!("{base}/v2"),
            geoapify_key: Some("test-geoapify-key".to_string()),
            supabase_url: Some(base.to_string()),
            supabase_anon_key: Some("test-anon-key".to_string()),
            timeout: Duration::from_secs(5),
        }
    }

    /// Validate that every configured base URL parses.
    pub fn validate(&self) -> Result<()> {
        let mut urls = vec![
            ("rest_countries_url", self.rest_countries_url.as_str()),
            ("openweather_url", self.openweather_url.as_str()),
            ("unsplash_url", self.unsplash_url.as_str()),
            ("youtube_url", self.youtube_url.as_str()),
            ("geoapify_url", self.geoapify_url.as_str()),
        ];
        if let Some(url) = self.supabase_url.as_deref() {
            urls.push(("supabase_url", url));
        }
        for (field, url) in urls {
            parse_base_url(url).map_err(|e| Error::Config {
                message: format!("{field}: {e}"),
            })?;
        }
        Ok(())
    }
}

/// Parse a base URL and append `segments` as percent-encoded path segments.
pub(crate) fn endpoint(base: &str, segments: &[&str]) -> Result<Url> {
    let mut url = parse_base_url(base)?;
    {
        let mut path = url.path_segments_mut().map_err(|_| Error::Config {
            message: format!("{base} cannot be used as a base URL"),
        })?;
        path.pop_if_empty();
        path.extend(segments);
    }
    Ok(url)
}

fn parse_base_url(base: &str) -> Result<Url> {
    Url::parse(base).map_err(|e| Error::Config {
        message: format!("invalid base URL {base}: {e}"),
    })
}
