use std::path::PathBuf;
use std::time::Duration;

use catalog::PRESET_MODELS;
use chrono::{DateTime, FixedOffset, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use compute::{WallAnalysisConfig, analyze_walls};
use environment::{DEFAULT_NWS_URL, SceneEnvironment, WeatherClient, classify_forecast};
use formats::{UpAxis, load_mesh};
use foundation::{
    GeoPoint, local_input_to_utc, local_input_to_utc_local, utc_to_local_input,
    utc_to_local_input_local,
};
use serde::Serialize;
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Offline tools for Inlight scenes")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Detect walls in a .glb, .gltf or .obj model and print them as JSON
    Walls {
        path: PathBuf,

        /// Decimal places kept when grouping face normals
        #[arg(long, default_value_t = 1)]
        precision: u32,

        /// Minimum triangles per wall
        #[arg(long, default_value_t = 3)]
        min_faces: usize,

        /// Minimum horizontal component of a wall normal
        #[arg(long, default_value_t = 0.1)]
        min_horizontal: f64,

        /// Up axis of the source file
        #[arg(long, value_enum, default_value_t = UpArg::Y)]
        up: UpArg,
    },

    /// Classify a short forecast text into scene weather
    Classify {
        #[arg(required = true)]
        text: Vec<String>,
    },

    /// Convert a datetime-local value (YYYY-MM-DDTHH:MM) to UTC
    ToUtc {
        input: String,

        /// Zone offset east of UTC in minutes (host zone when omitted)
        #[arg(long, allow_hyphen_values = true)]
        offset_minutes: Option<i32>,
    },

    /// Convert an RFC 3339 instant to a datetime-local value
    ToInput {
        instant: String,

        /// Zone offset east of UTC in minutes (host zone when omitted)
        #[arg(long, allow_hyphen_values = true)]
        offset_minutes: Option<i32>,
    },

    /// Fetch a forecast and print the scene environment it maps to
    Forecast {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        #[arg(long, allow_hyphen_values = true)]
        lon: f64,

        /// Forecast period index
        #[arg(long, default_value_t = 0)]
        period: usize,

        #[arg(long, default_value = DEFAULT_NWS_URL)]
        api_url: String,

        #[arg(long)]
        user_agent: Option<String>,
    },

    /// List the bundled preset models
    Presets,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum UpArg {
    Y,
    Z,
}

impl From<UpArg> for UpAxis {
    fn from(up: UpArg) -> Self {
        match up {
            UpArg::Y => UpAxis::Y,
            UpArg::Z => UpAxis::Z,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match args.command {
        Command::Walls {
            path,
            precision,
            min_faces,
            min_horizontal,
            up,
        } => {
            let config = WallAnalysisConfig {
                bucket_precision: precision,
                min_faces,
                min_horizontal,
            };
            let mesh = load_mesh(&path, up.into())?;
            info!(
                "{path:?}: {} vertices, {} triangles",
                mesh.vertex_count(),
                mesh.triangle_count()
            );
            print_json(&analyze_walls(&mesh, &config))?;
        }
        Command::Classify { text } => print_json(&classify_forecast(&text.join(" ")))?,
        Command::ToUtc {
            input,
            offset_minutes,
        } => println!("{}", to_utc(&input, offset_minutes)?.to_rfc3339()),
        Command::ToInput {
            instant,
            offset_minutes,
        } => println!("{}", to_input(&instant, offset_minutes)?),
        Command::Forecast {
            lat,
            lon,
            period,
            api_url,
            user_agent,
        } => {
            let user_agent = user_agent
                .unwrap_or_else(|| format!("inlight-cli/{}", env!("CARGO_PKG_VERSION")));
            let client = WeatherClient::new(api_url, &user_agent, Duration::from_secs(10))?;
            let forecast = client.forecast(GeoPoint::new(lat, lon)).await?;
            let selected = forecast
                .periods
                .get(period)
                .ok_or_else(|| format!("forecast period {period} not available"))?;
            let environment = SceneEnvironment::from_period(selected, Utc::now());
            print_json(&json!({ "period": selected, "environment": environment }))?;
        }
        Command::Presets => print_json(&PRESET_MODELS)?,
    }

    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn fixed_offset(minutes: i32) -> Result<FixedOffset, String> {
    minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .ok_or_else(|| format!("offset out of range: {minutes} minutes"))
}

fn to_utc(input: &str, offset_minutes: Option<i32>) -> Result<DateTime<Utc>, String> {
    let result = match offset_minutes {
        Some(minutes) => local_input_to_utc(input, &fixed_offset(minutes)?),
        None => local_input_to_utc_local(input),
    };
    result.map_err(|e| e.to_string())
}

fn to_input(instant: &str, offset_minutes: Option<i32>) -> Result<String, String> {
    let instant = DateTime::parse_from_rfc3339(instant.trim())
        .map_err(|e| format!("invalid instant {instant:?}: {e}"))?
        .with_timezone(&Utc);
    Ok(match offset_minutes {
        Some(minutes) => utc_to_local_input(&instant, &fixed_offset(minutes)?),
        None => utc_to_local_input_local(&instant),
    })
}
