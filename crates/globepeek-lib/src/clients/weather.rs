//! OpenWeather current-conditions client.

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::clients::ensure_success;
use crate::config::endpoint;
use crate::error::{Error, Result};

const SERVICE: &str = "openweather";

/// Current weather, in metric units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weather {
    pub temperature: f64,
    pub description: String,
    pub icon: String,
    pub humidity: f64,
    pub wind_speed: f64,
    pub feels_like: f64,
}

impl Weather {
    /// URL of the condition icon at 2x scale.
    pub fn icon_url(&self) -> String {
        format!("https://openweathermap.org/img/wn/{}@2x.png", self.icon)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WeatherPayload {
    main: Option<MainPayload>,
    weather: Vec<ConditionPayload>,
    wind: Option<WindPayload>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MainPayload {
    temp: f64,
    feels_like: f64,
    humidity: f64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConditionPayload {
    description: String,
    icon: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WindPayload {
    speed: f64,
}

impl TryFrom<WeatherPayload> for Weather {
    type Error = Error;

    fn try_from(payload: WeatherPayload) -> Result<Self> {
        let main = payload.main.ok_or_else(|| Error::UnexpectedPayload {
            service: SERVICE,
            message: "response has no 'main' block".to_string(),
        })?;
        let condition = payload.weather.into_iter().next().unwrap_or_default();
        Ok(Weather {
            temperature: main.temp,
            description: condition.description,
            icon: condition.icon,
            humidity: main.humidity,
            wind_speed: payload.wind.map(|w| w.speed).unwrap_or_default(),
            feels_like: main.feels_like,
        })
    }
}

/// Client for `GET /weather?q={city}&appid={key}&units=metric`.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
}

impl OpenWeatherClient {
    pub fn new(http: Client, base_url: &str, api_key: Option<String>) -> Self {
        Self {
            http,
            base_url: base_url.to_string(),
            api_key,
        }
    }

    /// Current conditions for `city`.
    pub async fn current(&self, city: &str) -> Result<Weather> {
        let key = self
            .api_key
            .as_deref()
            .ok_or(Error::MissingApiKey { service: SERVICE })?;
        let city = city.trim();
        if city.is_empty() {
            return Err(Error::invalid_input("city must not be empty"));
        }

        let url = endpoint(&self.base_url, &["weather"])?;
        let response = self
            .http
            .get(url)
            .query(&[("q", city), ("appid", key), ("units", "metric")])
            .send()
            .await?;
        let response = ensure_success(SERVICE, response).await?;
        let payload: WeatherPayload = response.json().await?;
        Weather::try_from(payload)
    }
}
