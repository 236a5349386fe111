//! REST Countries v3.1 client.

use reqwest::{Client, StatusCode};
use tracing::debug;

use crate::clients::{ensure_success, CountrySource};
use crate::config::endpoint;
use crate::country::{decode_countries, Country, CountryCode};
use crate::error::{Error, Result};

const SERVICE: &str = "rest-countries";

/// Read-only client for `restcountries.com`.
#[derive(Debug, Clone)]
pub struct RestCountriesClient {
    http: Client,
    base_url: String,
}

impl RestCountriesClient {
    pub fn new(http: Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.to_string(),
        }
    }

    /// `GET /all`.
    pub async fn all(&self) -> Result<Vec<Country>> {
        self.fetch(&["all"], "all").await
    }

    /// `GET /name/{name}`: every record whose name contains `name`.
    pub async fn by_name(&self, name: &str) -> Result<Vec<Country>> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::invalid_input("country name must not be empty"));
        }
        self.fetch(&["name", name], name).await
    }

    /// `GET /alpha/{code}`: the single record for an alpha-2 or alpha-3 code.
    pub async fn by_code(&self, code: &CountryCode) -> Result<Country> {
        self.fetch(&["alpha", code.as_str()], code.as_str())
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::CountryNotFound {
                name: code.to_string(),
                suggestions: vec![],
            })
    }

    /// `GET /region/{region}`.
    pub async fn by_region(&self, region: &str) -> Result<Vec<Country>> {
        let region = region.trim();
        if region.is_empty() {
            return Err(Error::invalid_input("region must not be empty"));
        }
        self.fetch(&["region", region], region).await
    }

    async fn fetch(&self, segments: &[&str], subject: &str) -> Result<Vec<Country>> {
        let url = endpoint(&self.base_url, segments)?;
        debug!(url = %url, "requesting countries");

        let response = self.http.get(url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(Error::CountryNotFound {
                name: subject.to_string(),
                suggestions: vec![],
            });
        }
        let response = ensure_success(SERVICE, response).await?;

        // `/alpha/{code}` answers with a bare object on some deployments and
        // a one-element array on others.
        let body: serde_json::Value = response.json().await?;
        let records = match body {
            serde_json::Value::Array(records) => records,
            serde_json::Value::Object(_) => vec![body],
            other => {
                return Err(Error::UnexpectedPayload {
                    service: SERVICE,
                    message: format!("expected an array of countries, got {other}"),
                })
            }
        };
        Ok(decode_countries(records))
    }
}

impl CountrySource for RestCountriesClient {
    async fn all_countries(&self) -> Result<Vec<Country>> {
        self.all().await
    }

    async fn countries_by_name(&self, name: &str) -> Result<Vec<Country>> {
        self.by_name(name).await
    }

    async fn country_by_code(&self, code: &CountryCode) -> Result<Country> {
        self.by_code(code).await
    }
}
