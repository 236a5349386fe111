//! Typed clients for the external services.
//!
//! Each client wraps one upstream API behind methods returning
//! [`crate::Result`]. None of them retry, cache, or rate-limit: a failed call
//! is reported to the caller, which decides how to degrade. The traits in
//! this module are the seams the favorites aggregator and the detail loader
//! are written against, so tests can substitute in-memory fakes.

use std::future::Future;
use std::time::Duration;

use reqwest::{Client, Response};

use crate::country::{Country, CountryCode};
use crate::error::{Error, Result};

pub mod countries;
pub mod images;
pub mod places;
pub mod supabase;
pub mod video;
pub mod weather;

pub use countries::RestCountriesClient;
pub use images::{CountryImage, UnsplashClient};
pub use places::{Destination, GeoapifyClient};
pub use supabase::SupabaseClient;
pub use video::{Video, YouTubeClient};
pub use weather::{OpenWeatherClient, Weather};

/// Read access to country records.
pub trait CountrySource {
    /// Every country.
    fn all_countries(&self) -> impl Future<Output = Result<Vec<Country>>> + Send;

    /// Every record whose name matches `name` upstream (may be several).
    fn countries_by_name(&self, name: &str) -> impl Future<Output = Result<Vec<Country>>> + Send;

    /// The record with alpha code `code`.
    fn country_by_code(&self, code: &CountryCode) -> impl Future<Output = Result<Country>> + Send;
}

/// Everything the detail view fetches besides the country records.
pub trait MediaSource {
    /// Current weather for a city.
    fn weather(&self, city: &str) -> impl Future<Output = Result<Weather>> + Send;

    /// Up to `count` images for a search query.
    fn images(&self, query: &str, count: u32)
        -> impl Future<Output = Result<Vec<CountryImage>>> + Send;

    /// The first matching video, or `None` if the search was empty.
    fn video(&self, query: &str) -> impl Future<Output = Result<Option<Video>>> + Send;

    /// Tourist destinations near a coordinate.
    fn destinations(&self, lat: f64, lon: f64)
        -> impl Future<Output = Result<Vec<Destination>>> + Send;
}

/// Build the shared HTTP client used by every service client.
pub fn build_http_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(user_agent())
        .build()
        .map_err(Error::Http)
}

fn user_agent() -> String {
    format!(
        "globepeek-lib/{version} ({repo})",
        version = env!("CARGO_PKG_VERSION"),
        repo = "https://github.com/globepeek/globepeek-rs"
    )
}

/// Turn a non-success response into [`Error::Upstream`], keeping a short
/// excerpt of the body for diagnostics.
pub(crate) async fn ensure_success(service: &'static str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(Error::Upstream {
        service,
        status: status.as_u16(),
        message: upstream_message(&body),
    })
}

/// Pull a human-readable message out of an error body.
///
/// The services disagree on the field name (`message`, `msg`,
/// `error_description`, `error`), so try them in turn before falling back to
/// the truncated raw body.
pub(crate) fn upstream_message(body: &str) -> String {
    const MAX_LEN: usize = 200;

    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["message", "msg", "error_description", "error"] {
            match value.get(key) {
                Some(serde_json::Value::String(s)) if !s.is_empty() => return s.clone(),
                Some(serde_json::Value::Object(inner)) => {
                    if let Some(serde_json::Value::String(s)) = inner.get("message") {
                        return s.clone();
                    }
                }
                _ => {}
            }
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "no response body".to_string();
    }
    trimmed.chars().take(MAX_LEN).collect()
}

/// Bundle of every client, built once at the composition root.
#[derive(Debug, Clone)]
pub struct ApiClients {
    pub countries: RestCountriesClient,
    pub weather: OpenWeatherClient,
    pub images: UnsplashClient,
    pub video: YouTubeClient,
    pub places: GeoapifyClient,
    pub supabase: SupabaseClient,
}

impl ApiClients {
    /// Build all clients from `config`, sharing one connection pool.
    pub fn new(config: &crate::config::ApiConfig) -> Result<Self> {
        config.validate()?;
        let http = build_http_client(config.timeout)?;
        Ok(Self {
            countries: RestCountriesClient::new(http.clone(), &config.rest_countries_url),
            weather: OpenWeatherClient::new(
                http.clone(),
                &config.openweather_url,
                config.openweather_key.clone(),
            ),
            images: UnsplashClient::new(
                http.clone(),
                &config.unsplash_url,
                config.unsplash_key.clone(),
            ),
            video: YouTubeClient::new(http.clone(), &config.youtube_url, config.youtube_key.clone()),
            places: GeoapifyClient::new(
                http.clone(),
                &config.geoapify_url,
                config.geoapify_key.clone(),
            ),
            supabase: SupabaseClient::new(
                http,
                config.supabase_url.clone(),
                config.supabase_anon_key.clone(),
            ),
        })
    }
}

impl CountrySource for ApiClients {
    async fn all_countries(&self) -> Result<Vec<Country>> {
        self.countries.all().await
    }

    async fn countries_by_name(&self, name: &str) -> Result<Vec<Country>> {
        self.countries.by_name(name).await
    }

    async fn country_by_code(&self, code: &CountryCode) -> Result<Country> {
        self.countries.by_code(code).await
    }
}

impl MediaSource for ApiClients {
    async fn weather(&self, city: &str) -> Result<Weather> {
        self.weather.current(city).await
    }

    async fn images(&self, query: &str, count: u32) -> Result<Vec<CountryImage>> {
        self.images.search(query, count).await
    }

    async fn video(&self, query: &str) -> Result<Option<Video>> {
        self.video.first_video(query).await
    }

    async fn destinations(&self, lat: f64, lon: f64) -> Result<Vec<Destination>> {
        self.places.top_destinations(lat, lon).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_message_prefers_known_fields() {
        assert_eq!(upstream_message(r#"{"message":"city not found"}"#), "city not found");
        assert_eq!(upstream_message(r#"{"msg":"Invalid login"}"#), "Invalid login");
        assert_eq!(
            upstream_message(r#"{"error":{"code":403,"message":"quota exceeded"}}"#),
            "quota exceeded"
        );
        assert_eq!(
            upstream_message(r#"{"error":"invalid_grant","error_description":"bad password"}"#),
            "bad password"
        );
    }

    #[test]
    fn upstream_message_falls_back_to_body() {
        assert_eq!(upstream_message(""), "no response body");
        assert_eq!(upstream_message("  Bad Gateway "), "Bad Gateway");
        assert_eq!(upstream_message(&"x".repeat(500)).len(), 200);
    }

    #[test]
    fn user_agent_mentions_crate() {
        assert!(user_agent().starts_with("globepeek-lib/"));
    }
}
