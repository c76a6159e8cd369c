//! Configuration module for the plane spotter service.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Default flight feed endpoint (flights inside a bounding box).
pub const DEFAULT_FEED_URL: &str = "https://data-cloud.flightradar24.com/zones/fcgi/feed.js";

/// Default flight details endpoint.
pub const DEFAULT_DETAILS_URL: &str = "https://data-live.flightradar24.com/clickhandler/";

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

/// Settings for the external flight-tracking API client.
#[derive(Debug, Clone)]
pub struct FlightApiConfig {
    /// Endpoint listing flights within bounds
    pub feed_url: String,
    /// Endpoint returning per-flight detail records
    pub details_url: String,
    /// User agent sent with every request
    pub user_agent: String,
}

impl Default for FlightApiConfig {
    fn default() -> Self {
        Self {
            feed_url: DEFAULT_FEED_URL.to_string(),
            details_url: DEFAULT_DETAILS_URL.to_string(),
            user_agent: format!("plane-spotter/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Credential enrolled at startup for the admin realm.
#[derive(Debug, Clone)]
pub struct SeedCredential {
    pub username: String,
    pub password: String,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Directory served under /static
    pub static_dir: PathBuf,
    /// Directory whose files make up the badge catalog
    pub badge_dir: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Log output format
    pub log_format: LogFormat,
    /// Enables raw record upload and download
    pub local_mode: bool,
    /// External flight API settings
    pub flight_api: FlightApiConfig,
    /// Optional admin credential seeded at startup
    pub admin_seed: Option<SeedCredential>,
    /// bcrypt work factor for new password hashes
    pub bcrypt_cost: u32,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, String> {
        dotenvy::dotenv().ok();

        let db_path = env::var("SPOTTER_DB_PATH")
            .unwrap_or_else(|_| "./data/spotter.sqlite".to_string())
            .into();

        let static_dir: PathBuf = env::var("SPOTTER_STATIC_DIR")
            .unwrap_or_else(|_| "./static".to_string())
            .into();

        let badge_dir = env::var("SPOTTER_BADGE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| static_dir.join("badges"));

        let bind_addr = match env::var("SPOTTER_BIND_ADDR") {
            Ok(addr) => addr,
            Err(_) => {
                let port = env::var("PORT").unwrap_or_else(|_| "8080".to_string());
                format!("0.0.0.0:{}", port)
            }
        };
        let bind_addr = bind_addr
            .parse()
            .map_err(|e| format!("Invalid bind address {:?}: {}", bind_addr, e))?;

        let log_level = env::var("SPOTTER_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let log_format = env::var("SPOTTER_LOG_FORMAT")
            .map(|v| LogFormat::parse(&v))
            .unwrap_or(LogFormat::Pretty);

        let local_mode = env::var("SPOTTER_LOCAL")
            .map(|v| is_truthy(&v))
            .unwrap_or(false);

        let defaults = FlightApiConfig::default();
        let flight_api = FlightApiConfig {
            feed_url: env::var("SPOTTER_FEED_URL").unwrap_or(defaults.feed_url),
            details_url: env::var("SPOTTER_DETAILS_URL").unwrap_or(defaults.details_url),
            user_agent: defaults.user_agent,
        };

        let admin_seed = match (
            env::var("SPOTTER_ADMIN_USER"),
            env::var("SPOTTER_ADMIN_PASSWORD"),
        ) {
            (Ok(username), Ok(password)) if !username.is_empty() && !password.is_empty() => {
                Some(SeedCredential { username, password })
            }
            _ => None,
        };

        let bcrypt_cost = match env::var("SPOTTER_BCRYPT_COST") {
            Ok(cost) => cost
                .parse()
                .map_err(|e| format!("Invalid SPOTTER_BCRYPT_COST {:?}: {}", cost, e))?,
            Err(_) => bcrypt::DEFAULT_COST,
        };

        Ok(Self {
            db_path,
            static_dir,
            badge_dir,
            bind_addr,
            log_level,
            log_format,
            local_mode,
            flight_api,
            admin_seed,
            bcrypt_cost,
        })
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
