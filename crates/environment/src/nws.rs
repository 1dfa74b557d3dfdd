//! Read-only client for the National Weather Service API.
//!
//! Two hops: `/points/{lat},{lon}` names the forecast office grid, whose
//! `forecast` URL returns a list of periods. NWS rejects requests without a
//! User-Agent, so the client always sends one.

use std::time::Duration;

use chrono::{DateTime, Utc};
use foundation::GeoPoint;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub const DEFAULT_NWS_URL: &str = "https://api.weather.gov";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WeatherError {
    InvalidLocation(String),
    Request(String),
    Status { status: u16, url: String },
    MissingForecast,
    Decode(String),
}

impl std::fmt::Display for WeatherError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WeatherError::InvalidLocation(msg) => write!(f, "invalid location: {msg}"),
            WeatherError::Request(msg) => write!(f, "weather request failed: {msg}"),
            WeatherError::Status { status, url } => {
                write!(f, "weather service returned HTTP {status} for {url}")
            }
            WeatherError::MissingForecast => write!(f, "no forecast available for this point"),
            WeatherError::Decode(msg) => write!(f, "weather response decode failed: {msg}"),
        }
    }
}

impl std::error::Error for WeatherError {}

/// One forecast period. Only the fields the scene cares about are kept.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ForecastPeriod {
    pub number: u32,
    pub name: String,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub is_daytime: bool,
    pub temperature: Option<f64>,
    pub temperature_unit: Option<String>,
    pub short_forecast: String,
    pub detailed_forecast: String,
}

impl ForecastPeriod {
    pub fn start(&self) -> Option<DateTime<Utc>> {
        let raw = self.start_time.as_deref()?;
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub periods: Vec<ForecastPeriod>,
}

#[derive(Debug, Deserialize)]
struct PointsResponse {
    #[serde(default)]
    properties: Option<PointsProperties>,
}

#[derive(Debug, Deserialize)]
struct PointsProperties {
    #[serde(default)]
    forecast: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    properties: Forecast,
}

#[derive(Clone)]
pub struct WeatherClient {
    http: reqwest::Client,
    base_url: String,
}

impl WeatherClient {
    pub fn new(
        base_url: impl Into<String>,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<Self, WeatherError> {
        let http = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| WeatherError::Request(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolve the gridpoint forecast URL for a location.
    pub async fn forecast_url(&self, point: GeoPoint) -> Result<String, WeatherError> {
        if !point.is_valid() {
            return Err(WeatherError::InvalidLocation(format!(
                "{},{}",
                point.lat, point.lon
            )));
        }
        // NWS redirects anything beyond four decimals.
        let url = format!(
            "{}/points/{:.4},{:.4}",
            self.base_url.trim_end_matches('/'),
            point.lat,
            point.lon
        );
        let points: PointsResponse = self.get_json(&url).await?;
        points
            .properties
            .and_then(|p| p.forecast)
            .ok_or(WeatherError::MissingForecast)
    }

    pub async fn forecast(&self, point: GeoPoint) -> Result<Forecast, WeatherError> {
        let url = self.forecast_url(point).await?;
        let forecast: ForecastResponse = self.get_json(&url).await?;
        debug!(
            "forecast for {},{}: {} periods",
            point.lat,
            point.lon,
            forecast.properties.periods.len()
        );
        Ok(forecast.properties)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, WeatherError> {
        let resp = self
            .http
            .get(url)
            .header(reqwest::header::ACCEPT, "application/geo+json")
            .send()
            .await
            .map_err(|e| {
                warn!("weather GET {url} failed: {e}");
                WeatherError::Request(e.to_string())
            })?;

        if !resp.status().is_success() {
            warn!("weather GET {url} returned {}", resp.status());
            return Err(WeatherError::Status {
                status: resp.status().as_u16(),
                url: url.to_string(),
            });
        }

        resp.json::<T>()
            .await
            .map_err(|e| WeatherError::Decode(e.to_string()))
    }
}
