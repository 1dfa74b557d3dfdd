use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::nws::ForecastPeriod;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeatherKind {
    Sunny,
    Cloudy,
    Rainy,
    Snowy,
}

impl WeatherKind {
    pub fn has_precipitation(self) -> bool {
        matches!(self, WeatherKind::Rainy | WeatherKind::Snowy)
    }
}

/// Weather as the scene environment expects it.
///
/// Serializes as `{ "type": "rainy", "cloudCover": 0.7, "precipitation": 0.7 }`;
/// `precipitation` is left out for dry weather.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherSettings {
    #[serde(rename = "type")]
    pub kind: WeatherKind,
    pub cloud_cover: f64,
    #[serde(default, skip_serializing_if = "is_dry")]
    pub precipitation: f64,
}

fn is_dry(precipitation: &f64) -> bool {
    *precipitation == 0.0
}

impl WeatherSettings {
    pub fn for_kind(kind: WeatherKind) -> Self {
        let (cloud_cover, precipitation) = match kind {
            WeatherKind::Rainy => (0.7, 0.7),
            WeatherKind::Snowy => (0.9, 0.7),
            WeatherKind::Cloudy => (0.6, 0.0),
            WeatherKind::Sunny => (0.1, 0.0),
        };
        Self {
            kind,
            cloud_cover,
            precipitation,
        }
    }
}

// Checked in order; the first family with a matching keyword wins.
const KEYWORDS: &[(WeatherKind, &[&str])] = &[
    (WeatherKind::Rainy, &["rain", "showers", "thunderstorm"]),
    (WeatherKind::Snowy, &["snow", "flurries", "sleet"]),
    (WeatherKind::Cloudy, &["cloudy", "overcast"]),
    (WeatherKind::Sunny, &["clear", "sunny"]),
];

/// Classify a short free-text forecast ("Chance Rain Showers") into scene weather.
/// Unrecognized text is sunny.
pub fn classify_forecast(text: &str) -> WeatherSettings {
    let text = text.to_lowercase();
    let kind = KEYWORDS
        .iter()
        .find(|(_, words)| words.iter().any(|w| text.contains(w)))
        .map(|(kind, _)| *kind)
        .unwrap_or(WeatherKind::Sunny);
    WeatherSettings::for_kind(kind)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Lighting {
    Sun { date: DateTime<Utc> },
}

impl Lighting {
    pub fn date(&self) -> DateTime<Utc> {
        match self {
            Lighting::Sun { date } => *date,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneEnvironment {
    pub weather: WeatherSettings,
    pub lighting: Lighting,
}

impl SceneEnvironment {
    pub fn clear_at(date: DateTime<Utc>) -> Self {
        Self {
            weather: WeatherSettings::for_kind(WeatherKind::Sunny),
            lighting: Lighting::Sun { date },
        }
    }

    /// Environment for a forecast period: classified weather, sun at the
    /// period's start (or `now` when the period has no usable start time).
    pub fn from_period(period: &ForecastPeriod, now: DateTime<Utc>) -> Self {
        let weather = classify_forecast(&period.short_forecast);
        let date = period.start().unwrap_or(now);
        tracing::debug!(
            "applied weather {:?} (cloud cover {}, precipitation {}) for {:?}",
            weather.kind,
            weather.cloud_cover,
            weather.precipitation,
            period.name
        );
        Self {
            weather,
            lighting: Lighting::Sun { date },
        }
    }
}
