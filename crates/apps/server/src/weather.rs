use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use environment::{ForecastPeriod, SceneEnvironment, WeatherError};
use foundation::GeoPoint;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{api_error, ApiError};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct WeatherQuery {
    pub lat: f64,
    pub lon: f64,
    /// Index into the forecast periods; the current period by default.
    #[serde(default)]
    pub period: usize,
}

#[derive(Debug, Serialize)]
pub struct WeatherResponse {
    pub period: ForecastPeriod,
    pub environment: SceneEnvironment,
}

pub async fn get_weather(
    State(state): State<AppState>,
    Query(query): Query<WeatherQuery>,
) -> Result<Json<WeatherResponse>, ApiError> {
    let point = GeoPoint::new(query.lat, query.lon);
    let forecast = state.weather.forecast(point).await.map_err(|e| match e {
        WeatherError::InvalidLocation(msg) => {
            api_error(StatusCode::BAD_REQUEST, format!("Invalid location: {msg}"))
        }
        other => {
            warn!("weather lookup for {},{} failed: {other}", point.lat, point.lon);
            api_error(StatusCode::BAD_GATEWAY, format!("Weather service unavailable: {other}"))
        }
    })?;

    let Some(period) = forecast.periods.into_iter().nth(query.period) else {
        return Err(api_error(
            StatusCode::NOT_FOUND,
            format!("Forecast period {} not available", query.period),
        ));
    };
    let environment = SceneEnvironment::from_period(&period, Utc::now());
    Ok(Json(WeatherResponse {
        period,
        environment,
    }))
}
