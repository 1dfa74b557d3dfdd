use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use catalog::{ModelStore, PRESET_MODELS};
use environment::WeatherClient;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod models;
mod upload;
mod weather;

use config::ServerConfig;

#[derive(Clone)]
pub struct AppState {
    pub store: ModelStore,
    pub weather: WeatherClient,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Prefix for model URLs: `PUBLIC_URL`, else `http://<Host>`, else relative.
    pub fn public_base(&self, headers: &HeaderMap) -> String {
        if let Some(base) = &self.config.public_url {
            return base.trim_end_matches('/').to_string();
        }
        headers
            .get(http::header::HOST)
            .and_then(|h| h.to_str().ok())
            .map(|host| format!("http://{host}"))
            .unwrap_or_default()
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = ServerConfig::from_env();
    let store = ModelStore::open(&config.uploads_dir)
        .await
        .expect("failed to open uploads directory");
    let weather = WeatherClient::new(
        config.weather_url.clone(),
        &config.weather_user_agent,
        config.weather_timeout,
    )
    .expect("failed to build weather client");

    let addr = config.addr;
    info!("uploads directory: {:?}", store.root());
    let state = AppState {
        store,
        weather,
        config: Arc::new(config),
    };

    info!("inlight server listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind listen address");
    axum::serve(listener, app(state))
        .await
        .expect("server error");
}

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_headers(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS]);

    let body_limit = state.config.upload_body_limit();

    Router::new()
        .route("/healthz", get(healthz))
        .route(
            "/upload",
            post(upload::upload_models).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/models", get(models::list_models))
        .route(
            "/models/:filename",
            get(models::get_model).delete(models::delete_model),
        )
        .route("/models/:filename/walls", get(models::get_walls))
        .route("/presets", get(get_presets))
        .route("/weather", get(weather::get_weather))
        .layer(CatchPanicLayer::custom(error::panic_response))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> Response {
    (StatusCode::OK, "ok").into_response()
}

async fn get_presets() -> Response {
    Json(PRESET_MODELS).into_response()
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Request, Response};
    use catalog::ModelStore;
    use environment::WeatherClient;
    use tower::ServiceExt;

    use crate::config::ServerConfig;
    use crate::AppState;

    pub async fn state(dir: &tempfile::TempDir, weather_url: &str) -> AppState {
        let config = ServerConfig {
            uploads_dir: dir.path().join("uploads"),
            weather_url: weather_url.to_string(),
            ..ServerConfig::default()
        };
        let store = ModelStore::open(&config.uploads_dir).await.unwrap();
        let weather = WeatherClient::new(weather_url, "inlight-tests", Duration::from_secs(5)).unwrap();
        AppState {
            store,
            weather,
            config: Arc::new(config),
        }
    }

    pub async fn send(state: &AppState, request: Request<Body>) -> Response<Body> {
        crate::app(state.clone()).oneshot(request).await.unwrap()
    }

    pub async fn json(response: Response<Body>) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    pub fn get(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header(http::header::HOST, "localhost:3001")
            .body(Body::empty())
            .unwrap()
    }
}
