//! Country records as served by REST Countries.
//!
//! The upstream payload is loosely shaped: apart from the name and the
//! three-letter code every field may be missing. [`CountryRecord`] mirrors the
//! wire format with defaults for every optional field and is converted into
//! the domain [`Country`] at the client boundary.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};

/// ISO 3166-1 alpha-3 country code (`cca3`), stored upper-case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CountryCode(String);

impl CountryCode {
    /// Build a code from user or upstream input.
    ///
    /// Accepts two or three ASCII letters (REST Countries resolves both
    /// alpha-2 and alpha-3 on its `/alpha` endpoint) and normalises to
    /// upper-case.
    pub fn new(code: &str) -> Result<Self> {
        let trimmed = code.trim();
        if !(2..=3).contains(&trimmed.len()) || !trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(Error::invalid_input(format!(
                "'{code}' is not a country code"
            )));
        }
        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Currency entry keyed by ISO 4217 code in [`Country::currencies`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Currency {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
}

/// Flag image URLs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Flags {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub png: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub svg: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
}

/// Geographic centre of a country.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

/// A country as consumed by the directory, detail and favorites views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Country {
    pub code: CountryCode,
    pub name: String,
    pub official_name: String,
    pub population: u64,
    pub region: String,
    pub subregion: Option<String>,
    pub capital: Vec<String>,
    pub flags: Flags,
    pub currencies: BTreeMap<String, Currency>,
    pub languages: BTreeMap<String, String>,
    pub area: Option<f64>,
    pub timezones: Vec<String>,
    pub borders: Vec<CountryCode>,
    pub latlng: Option<LatLng>,
    pub tld: Vec<String>,
    pub driving_side: Option<String>,
}

impl Country {
    /// First listed capital, which is what the weather lookup uses.
    pub fn primary_capital(&self) -> Option<&str> {
        self.capital
            .iter()
            .map(String::as_str)
            .find(|c| !c.trim().is_empty())
    }

    /// Display name of the first currency, if any.
    pub fn primary_currency(&self) -> Option<&str> {
        self.currencies.values().next().map(|c| c.name.as_str())
    }

    /// Whether any of the country's languages equals `language`.
    pub fn speaks(&self, language: &str) -> bool {
        self.languages.values().any(|l| l == language)
    }

    /// Case-insensitive equality against the common or official name.
    pub fn is_named(&self, name: &str) -> bool {
        let name = name.trim().to_lowercase();
        self.name.to_lowercase() == name || self.official_name.to_lowercase() == name
    }
}

/// How to pick among several records returned by a name lookup.
///
/// REST Countries matches names by substring, so `/name/India` also returns
/// British Indian Ocean Territory. Callers must choose explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NameMatch {
    /// Keep every record the upstream returned.
    All,
    /// Prefer an exact (case-insensitive) common or official name match,
    /// otherwise the first record.
    #[default]
    PreferExact,
}

impl NameMatch {
    /// Apply the policy to a lookup result for `name`.
    pub fn select(self, name: &str, mut matches: Vec<Country>) -> Vec<Country> {
        match self {
            NameMatch::All => matches,
            NameMatch::PreferExact => {
                if matches.is_empty() {
                    return matches;
                }
                let index = matches.iter().position(|c| c.is_named(name)).unwrap_or(0);
                vec![matches.swap_remove(index)]
            }
        }
    }
}

/// Wire representation of a REST Countries v3.1 record.
///
/// Collections and nested objects accept `null` as well as a missing key.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct CountryRecord {
    #[serde(deserialize_with = "null_as_default")]
    pub name: RecordName,
    pub cca3: Option<String>,
    pub population: Option<u64>,
    pub region: Option<String>,
    pub subregion: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub capital: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub flags: Flags,
    #[serde(deserialize_with = "null_as_default")]
    pub currencies: BTreeMap<String, Currency>,
    #[serde(deserialize_with = "null_as_default")]
    pub languages: BTreeMap<String, String>,
    pub area: Option<f64>,
    #[serde(deserialize_with = "null_as_default")]
    pub timezones: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub borders: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub latlng: Vec<f64>,
    #[serde(deserialize_with = "null_as_default")]
    pub tld: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub car: RecordCar,
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RecordName {
    pub common: Option<String>,
    pub official: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RecordCar {
    pub side: Option<String>,
}

impl TryFrom<CountryRecord> for Country {
    type Error = Error;

    fn try_from(record: CountryRecord) -> Result<Self> {
        let name = record
            .name
            .common
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| Error::UnexpectedPayload {
                service: "rest-countries",
                message: "country record without a common name".to_string(),
            })?;
        let code = record
            .cca3
            .as_deref()
            .map(CountryCode::new)
            .transpose()?
            .ok_or_else(|| Error::UnexpectedPayload {
                service: "rest-countries",
                message: format!("country record '{name}' without cca3"),
            })?;
        let latlng = match record.latlng.as_slice() {
            [lat, lng, ..] => Some(LatLng {
                lat: *lat,
                lng: *lng,
            }),
            _ => None,
        };
        let borders = record
            .borders
            .iter()
            .filter_map(|b| CountryCode::new(b).ok())
            .collect();

        Ok(Country {
            code,
            official_name: record.name.official.unwrap_or_else(|| name.clone()),
            name,
            population: record.population.unwrap_or(0),
            region: record.region.unwrap_or_default(),
            subregion: record.subregion.filter(|s| !s.is_empty()),
            capital: record.capital,
            flags: record.flags,
            currencies: record.currencies,
            languages: record.languages,
            area: record.area,
            timezones: record.timezones,
            borders,
            latlng,
            tld: record.tld,
            driving_side: record.car.side,
        })
    }
}

/// Decode REST Countries records, skipping the ones that cannot be used.
///
/// Each record is decoded on its own, so a single malformed record does not
/// poison the whole list; it is logged and dropped.
pub(crate) fn decode_countries(records: Vec<serde_json::Value>) -> Vec<Country> {
    records
        .into_iter()
        .filter_map(|value| {
            let decoded = serde_json::from_value::<CountryRecord>(value)
                .map_err(Error::from)
                .and_then(Country::try_from);
            match decoded {
                Ok(country) => Some(country),
                Err(e) => {
                    tracing::warn!(error = %e, "skipping unusable country record");
                    None
                }
            }
        })
        .collect()
}
