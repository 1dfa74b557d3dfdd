use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use compute::WallAnalysisConfig;
use environment::DEFAULT_NWS_URL;
use tracing::warn;

const MB: u64 = 1024 * 1024;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub uploads_dir: PathBuf,
    /// Base for model URLs in responses. Falls back to the request's Host.
    pub public_url: Option<String>,
    pub max_files: usize,
    pub max_file_size_mb: u64,
    pub weather_url: String,
    pub weather_user_agent: String,
    pub weather_timeout: Duration,
    pub walls: WallAnalysisConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 3001)),
            uploads_dir: PathBuf::from("uploads"),
            public_url: None,
            max_files: 10,
            max_file_size_mb: 50,
            weather_url: DEFAULT_NWS_URL.to_string(),
            weather_user_agent: format!("inlight/{}", env!("CARGO_PKG_VERSION")),
            weather_timeout: Duration::from_secs(10),
            walls: WallAnalysisConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let addr = match (env::var("INLIGHT_ADDR"), env::var("PORT")) {
            (Ok(addr), _) => parse_or_default("INLIGHT_ADDR", &addr, defaults.addr),
            (Err(_), Ok(port)) => {
                parse_or_default("PORT", &format!("0.0.0.0:{port}"), defaults.addr)
            }
            _ => defaults.addr,
        };

        let walls = WallAnalysisConfig {
            bucket_precision: env_var_u32("WALL_BUCKET_PRECISION", defaults.walls.bucket_precision),
            min_faces: env_var_usize("WALL_MIN_FACES", defaults.walls.min_faces),
            min_horizontal: env_var_f64("WALL_MIN_HORIZONTAL", defaults.walls.min_horizontal),
        };

        Self {
            addr,
            uploads_dir: env::var("UPLOADS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.uploads_dir),
            public_url: env::var("PUBLIC_URL").ok().filter(|v| !v.trim().is_empty()),
            max_files: env_var_usize("MAX_UPLOAD_FILES", defaults.max_files),
            max_file_size_mb: env_var_u64("MAX_FILE_SIZE_MB", defaults.max_file_size_mb),
            weather_url: env::var("WEATHER_API_URL").unwrap_or(defaults.weather_url),
            weather_user_agent: env::var("WEATHER_USER_AGENT")
                .unwrap_or(defaults.weather_user_agent),
            weather_timeout: Duration::from_secs(env_var_u64(
                "WEATHER_TIMEOUT_SECS",
                defaults.weather_timeout.as_secs(),
            )),
            walls,
        }
    }

    pub fn max_file_size(&self) -> u64 {
        self.max_file_size_mb * MB
    }

    /// Request body cap for `/upload`: every file at its limit plus form overhead.
    pub fn upload_body_limit(&self) -> usize {
        let files = self.max_files.max(1) as u64;
        usize::try_from(files * self.max_file_size() + MB).unwrap_or(usize::MAX)
    }
}

fn parse_or_default<T: FromStr + Copy + std::fmt::Display>(key: &str, raw: &str, default: T) -> T {
    match raw.trim().parse() {
        Ok(v) => v,
        Err(_) => {
            warn!("ignoring invalid {key}={raw:?}, using {default}");
            default
        }
    }
}

fn env_var_u32(key: &str, default: u32) -> u32 {
    env::var(key)
        .map(|v| parse_or_default(key, &v, default))
        .unwrap_or(default)
}

fn env_var_u64(key: &str, default: u64) -> u64 {
    env::var(key)
        .map(|v| parse_or_default(key, &v, default))
        .unwrap_or(default)
}

fn env_var_usize(key: &str, default: usize) -> usize {
    env::var(key)
        .map(|v| parse_or_default(key, &v, default))
        .unwrap_or(default)
}

fn env_var_f64(key: &str, default: f64) -> f64 {
    env::var(key)
        .map(|v| parse_or_default(key, &v, default))
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_limits() {
        let config = ServerConfig::default();
        assert_eq!(config.addr.to_string(), "0.0.0.0:3001");
        assert_eq!(config.max_file_size(), 50 * 1024 * 1024);
        assert_eq!(config.walls.min_faces, 3);
        assert!(config.weather_user_agent.starts_with("inlight/"));
        assert!(config.upload_body_limit() > 10 * 50 * 1024 * 1024);
    }

    #[test]
    fn bad_values_fall_back() {
        assert_eq!(parse_or_default("X", "12", 3u32), 12);
        assert_eq!(parse_or_default("X", "twelve", 3u32), 3);
        assert_eq!(parse_or_default("X", " 0.25 ", 0.1f64), 0.25);
    }
}
