// Test utilities used across `globepeek-cli` unit tests.
// Kept under `#[cfg(test)]` so it is not part of the public crate API.
use std::collections::BTreeMap;

use globepeek_lib::country::Flags;
use globepeek_lib::{Country, CountryCode};

/// Builder for a [`Country`] with sensible defaults: Europe, population 1000,
/// no capital.
pub struct CountryBuilder {
    country: Country,
}

impl CountryBuilder {
    pub fn new(name: &str, code: &str) -> Self {
        Self {
            country: Country {
                code: CountryCode::new(code).expect("valid test code"),
                name: name.to_string(),
                official_name: format!("Republic of {name}"),
                population: 1000,
                region: "Europe".to_string(),
                subregion: None,
                capital: Vec::new(),
                flags: Flags::default(),
                currencies: BTreeMap::new(),
                languages: BTreeMap::new(),
                area: None,
                timezones: Vec::new(),
                borders: Vec::new(),
                latlng: None,
                tld: Vec::new(),
                driving_side: None,
            },
        }
    }

    pub fn capital(mut self, capital: &str) -> Self {
        self.country.capital.push(capital.to_string());
        self
    }

    pub fn population(mut self, population: u64) -> Self {
        self.country.population = population;
        self
    }

    pub fn region(mut self, region: &str) -> Self {
        self.country.region = region.to_string();
        self
    }

    pub fn language(mut self, code: &str, name: &str) -> Self {
        self.country
            .languages
            .insert(code.to_string(), name.to_string());
        self
    }

    pub fn build(self) -> Country {
        self.country
    }
}
