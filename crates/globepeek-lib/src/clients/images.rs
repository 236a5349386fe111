//! Unsplash photo search client.

use reqwest::header::AUTHORIZATION;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::clients::ensure_success;
use crate::config::endpoint;
use crate::error::{Error, Result};

const SERVICE: &str = "unsplash";

/// Upper bound Unsplash accepts for `per_page`.
pub const MAX_PER_PAGE: u32 = 30;

/// A photo suitable for a gallery: a display-sized and a full-sized URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryImage {
    pub id: String,
    pub regular_url: String,
    pub full_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt_description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SearchPayload {
    results: Vec<PhotoPayload>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PhotoPayload {
    id: String,
    alt_description: Option<String>,
    urls: UrlsPayload,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct UrlsPayload {
    regular: Option<String>,
    full: Option<String>,
}

impl PhotoPayload {
    fn into_image(self) -> Option<CountryImage> {
        let regular = self.urls.regular?;
        let full = self.urls.full.unwrap_or_else(|| regular.clone());
        Some(CountryImage {
            id: self.id,
            regular_url: regular,
            full_url: full,
            alt_description: self.alt_description.filter(|a| !a.is_empty()),
        })
    }
}

/// Client for `GET /search/photos?query=&per_page=`.
#[derive(Debug, Clone)]
pub struct UnsplashClient {
    http: Client,
    base_url: String,
    access_key: Option<String>,
}

impl UnsplashClient {
    pub fn new(http: Client, base_url: &str, access_key: Option<String>) -> Self {
        Self {
            http,
            base_url: base_url.to_string(),
            access_key,
        }
    }

    /// Up to `count` photos for `query`. Results without a display URL are
    /// dropped.
    pub async fn search(&self, query: &str, count: u32) -> Result<Vec<CountryImage>> {
        let key = self
            .access_key
            .as_deref()
            .ok_or(Error::MissingApiKey { service: SERVICE })?;
        if count == 0 {
            return Ok(Vec::new());
        }
        let per_page = count.min(MAX_PER_PAGE).to_string();

        let url = endpoint(&self.base_url, &["search", "photos"])?;
        let response = self
            .http
            .get(url)
            .query(&[("query", query.trim()), ("per_page", per_page.as_str())])
            .header(AUTHORIZATION, format!("Client-ID {key}"))
            .send()
            .await?;
        let response = ensure_success(SERVICE, response).await?;
        let payload: SearchPayload = response.json().await?;

        Ok(payload
            .results
            .into_iter()
            .filter_map(PhotoPayload::into_image)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_results_and_drops_incomplete_photos() {
        let payload: SearchPayload = serde_json::from_str(
            r#"{
                "total": 3,
                "results": [
                    {"id": "a", "alt_description": "Eiffel tower", "urls": {"regular": "r1", "full": "f1"}},
                    {"id": "b", "alt_description": "", "urls": {"regular": "r2"}},
                    {"id": "c", "urls": {}}
                ]
            }"#,
        )
        .unwrap();
        let images: Vec<_> = payload
            .results
            .into_iter()
            .filter_map(PhotoPayload::into_image)
            .collect();

        assert_eq!(images.len(), 2);
        assert_eq!(images[0].full_url, "f1");
        assert_eq!(images[0].alt_description.as_deref(), Some("Eiffel tower"));
        assert_eq!(images[1].full_url, "r2");
        assert!(images[1].alt_description.is_none());
    }
}
