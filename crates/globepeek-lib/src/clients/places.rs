//! Geoapify places client.

use std::collections::HashSet;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::clients::ensure_success;
use crate::config::endpoint;
use crate::error::{Error, Result};

const SERVICE: &str = "geoapify";

/// How many destinations the detail view shows before "show more".
pub const INITIAL_DESTINATIONS: usize = 6;

/// A named tourist destination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Destination {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formatted_address: Option<String>,
    pub categories: Vec<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FeatureCollection {
    features: Vec<Feature>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Feature {
    properties: FeatureProperties,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FeatureProperties {
    /// Kept loose: Geoapify sends `null`, and occasionally non-strings.
    name: serde_json::Value,
    formatted: Option<String>,
    categories: Vec<String>,
    lat: Option<f64>,
    lon: Option<f64>,
}

/// Keep features with a non-empty string name, first occurrence of each name
/// wins.
fn normalise(collection: FeatureCollection) -> Vec<Destination> {
    let mut seen = HashSet::new();
    collection
        .features
        .into_iter()
        .filter_map(|feature| {
            let props = feature.properties;
            let name = match props.name {
                serde_json::Value::String(name) if !name.trim().is_empty() => name,
                _ => return None,
            };
            if !seen.insert(name.clone()) {
                return None;
            }
            Some(Destination {
                name,
                formatted_address: props.formatted,
                categories: props.categories,
                lat: props.lat,
                lon: props.lon,
            })
        })
        .collect()
}

/// Client for `GET /places?categories=tourism&lat=&lon=&apiKey=`.
#[derive(Debug, Clone)]
pub struct GeoapifyClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
}

impl GeoapifyClient {
    pub fn new(http: Client, base_url: &str, api_key: Option<String>) -> Self {
        Self {
            http,
            base_url: base_url.to_string(),
            api_key,
        }
    }

    /// Tourism places near `(lat, lon)`, named and deduplicated.
    pub async fn top_destinations(&self, lat: f64, lon: f64) -> Result<Vec<Destination>> {
        let key = self
            .api_key
            .as_deref()
            .ok_or(Error::MissingApiKey { service: SERVICE })?;
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return Err(Error::invalid_input(format!(
                "coordinates out of range: {lat}, {lon}"
            )));
        }

        let url = endpoint(&self.base_url, &["places"])?;
        let (lat, lon) = (lat.to_string(), lon.to_string());
        let response = self
            .http
            .get(url)
            .query(&[
                ("categories", "tourism"),
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("apiKey", key),
            ])
            .send()
            .await?;
        let response = ensure_success(SERVICE, response).await?;
        let collection: FeatureCollection = response.json().await?;
        Ok(normalise(collection))
    }
}
