// Test-only fakes for `globepeek-lib` tests
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use crate::clients::{CountryImage, CountrySource, Destination, MediaSource, Video, Weather};
use crate::country::{Country, CountryCode};
use crate::error::{Error, Result};
use crate::favorites::{FavoriteRow, FavoriteRows};
use crate::session::Session;

fn upstream_failure(service: &'static str) -> Error {
    Error::Upstream {
        service,
        status: 500,
        message: "boom".to_string(),
    }
}

/// In-memory country source with REST Countries' substring name matching.
#[derive(Debug, Default)]
pub struct FakeCountries {
    countries: Vec<Country>,
    overrides: HashMap<String, Vec<Country>>,
    failing: HashSet<String>,
}

impl FakeCountries {
    pub fn new(countries: Vec<Country>) -> Self {
        Self {
            countries,
            ..Self::default()
        }
    }

    /// Answer `name` lookups with `matches` instead of searching.
    pub fn with_override(mut self, name: &str, matches: Vec<Country>) -> Self {
        self.overrides.insert(name.to_string(), matches);
        self
    }

    /// Fail lookups for `key` (a name or a code) with an upstream error.
    pub fn failing_for(mut self, key: &str) -> Self {
        self.failing.insert(key.to_string());
        self
    }
}

impl CountrySource for FakeCountries {
    async fn all_countries(&self) -> Result<Vec<Country>> {
        Ok(self.countries.clone())
    }

    async fn countries_by_name(&self, name: &str) -> Result<Vec<Country>> {
        if self.failing.contains(name) {
            return Err(upstream_failure("rest-countries"));
        }
        if let Some(matches) = self.overrides.get(name) {
            return Ok(matches.clone());
        }
        let needle = name.to_lowercase();
        let matches: Vec<_> = self
            .countries
            .iter()
            .filter(|c| c.name.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        if matches.is_empty() {
            return Err(Error::CountryNotFound {
                name: name.to_string(),
                suggestions: vec![],
            });
        }
        Ok(matches)
    }

    async fn country_by_code(&self, code: &CountryCode) -> Result<Country> {
        if self.failing.contains(code.as_str()) {
            return Err(upstream_failure("rest-countries"));
        }
        self.countries
            .iter()
            .find(|c| &c.code == code)
            .cloned()
            .ok_or_else(|| Error::CountryNotFound {
                name: code.to_string(),
                suggestions: vec![],
            })
    }
}

/// Canned media responses; a section listed in `failing` errors instead.
#[derive(Debug, Default)]
pub struct FakeMedia {
    pub weather: Option<Weather>,
    pub images: Vec<CountryImage>,
    pub video: Option<Video>,
    pub destinations: Vec<Destination>,
    pub failing: HashSet<&'static str>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeMedia {
    pub fn failing(mut self, section: &'static str) -> Self {
        self.failing.insert(section);
        self
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

pub fn sample_weather() -> Weather {
    Weather {
        temperature: 18.0,
        description: "light rain".into(),
        icon: "10d".into(),
        humidity: 70.0,
        wind_speed: 4.0,
        feels_like: 17.0,
    }
}

pub fn sample_image(id: &str) -> CountryImage {
    CountryImage {
        id: id.into(),
        regular_url: format!("https://images.test/{id}/regular"),
        full_url: format!("https://images.test/{id}/full"),
        alt_description: None,
    }
}

pub fn sample_video() -> Video {
    Video {
        video_id: "vid1".into(),
        title: "Scenic tour".into(),
        thumbnail: None,
        channel_title: "Travel".into(),
    }
}

pub fn sample_destination(name: &str) -> Destination {
    Destination {
        name: name.into(),
        formatted_address: None,
        categories: vec!["tourism".into()],
        lat: None,
        lon: None,
    }
}

impl MediaSource for FakeMedia {
    async fn weather(&self, city: &str) -> Result<Weather> {
        self.record(format!("weather:{city}"));
        if self.failing.contains("weather") {
            return Err(upstream_failure("openweather"));
        }
        self.weather
            .clone()
            .ok_or(Error::MissingApiKey { service: "openweather" })
    }

    async fn images(&self, query: &str, count: u32) -> Result<Vec<CountryImage>> {
        self.record(format!("images:{query}:{count}"));
        if self.failing.contains("images") {
            return Err(upstream_failure("unsplash"));
        }
        Ok(self.images.iter().take(count as usize).cloned().collect())
    }

    async fn video(&self, query: &str) -> Result<Option<Video>> {
        self.record(format!("video:{query}"));
        if self.failing.contains("video") {
            return Err(upstream_failure("youtube"));
        }
        Ok(self.video.clone())
    }

    async fn destinations(&self, lat: f64, lon: f64) -> Result<Vec<Destination>> {
        self.record(format!("destinations:{lat},{lon}"));
        if self.failing.contains("destinations") {
            return Err(upstream_failure("geoapify"));
        }
        Ok(self.destinations.clone())
    }
}

/// In-memory favorites table.
#[derive(Debug, Default)]
pub struct MemoryFavorites {
    rows: Mutex<Vec<FavoriteRow>>,
}

impl FavoriteRows for MemoryFavorites {
    async fn list(&self, session: &Session) -> Result<Vec<FavoriteRow>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .filter(|r| r.user_id == session.user.id)
            .cloned()
            .collect())
    }

    async fn contains(&self, session: &Session, name: &str) -> Result<bool> {
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .any(|r| r.user_id == session.user.id && r.country_name == name))
    }

    async fn insert(&self, session: &Session, name: &str) -> Result<()> {
        self.rows.lock().unwrap().push(FavoriteRow {
            user_id: session.user.id.clone(),
            country_name: name.to_string(),
        });
        Ok(())
    }

    async fn delete(&self, session: &Session, name: &str) -> Result<()> {
        self.rows
            .lock()
            .unwrap()
            .retain(|r| !(r.user_id == session.user.id && r.country_name == name));
        Ok(())
    }
}
