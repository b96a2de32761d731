/// Dashboard configuration loader - parses dashboard.toml
///
/// Keeps upstream endpoints, timeouts and cache sizing out of the code so
/// they can be adjusted without recompiling. Every field has a default,
/// so the file itself is optional. Secrets and deployment-specific values
/// come from the environment (after `.env.local` and `.env` are loaded)
/// and override whatever the file says.

use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_CONFIG_PATH: &str = "dashboard.toml";

/// Jakarta, used when a weather request carries no usable coordinate.
pub const DEFAULT_LATITUDE: f64 = -6.2088;
pub const DEFAULT_LONGITUDE: f64 = 106.8456;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to parse {path}: {source}")]
    Parse { path: PathBuf, source: toml::de::Error },

    #[error("invalid value for {name}: {value:?}")]
    InvalidOverride { name: &'static str, value: String },
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub server: ServerConfig,
    pub blynk: BlynkConfig,
    pub open_meteo: OpenMeteoConfig,
    pub regional: RegionalConfig,
    pub geocode: GeocodeConfig,
    pub upstream: UpstreamConfig,
    pub cache: CacheConfig,
    pub history: HistoryConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    /// Directory the dashboard front end is served from.
    pub static_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            static_dir: PathBuf::from("public"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BlynkConfig {
    pub base_url: String,
    pub auth_token: Option<String>,
    /// Read every pin in one request instead of one request per pin.
    pub batch: bool,
}

impl Default for BlynkConfig {
    fn default() -> Self {
        Self {
            base_url: "https://blynk.cloud".to_string(),
            auth_token: None,
            batch: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct OpenMeteoConfig {
    pub forecast_url: String,
    pub air_quality_url: String,
    pub default_latitude: f64,
    pub default_longitude: f64,
    /// Hourly entries kept in a snapshot.
    pub hourly_window: usize,
}

impl Default for OpenMeteoConfig {
    fn default() -> Self {
        Self {
            forecast_url: "https://api.open-meteo.com/v1/forecast".to_string(),
            air_quality_url: "https://air-quality-api.open-meteo.com/v1/air-quality".to_string(),
            default_latitude: DEFAULT_LATITUDE,
            default_longitude: DEFAULT_LONGITUDE,
            hourly_window: 24,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RegionalConfig {
    pub base_url: String,
    /// Administrative level-4 region code.
    pub location_id: String,
}

impl Default for RegionalConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.bmkg.go.id/publik/prakiraan-cuaca".to_string(),
            location_id: "31.71.03.1001".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GeocodeConfig {
    pub base_url: String,
}

impl Default for GeocodeConfig {
    fn default() -> Self {
        Self {
            base_url: "https://nominatim.openstreetmap.org".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Per-call timeout; one slow upstream never delays the others past it.
    pub timeout_ms: u64,
    pub user_agent: String,
    /// Reuse idle upstream connections. When off, every connection is
    /// closed once its reply has been read.
    pub keep_alive: bool,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 10_000,
            user_agent: concat!("envdash/", env!("CARGO_PKG_VERSION")).to_string(),
            keep_alive: true,
        }
    }
}

impl UpstreamConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub ttl_secs: u64,
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 600,
            capacity: 64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub database_url: Option<String>,
    pub retention_days: u32,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            retention_days: 365,
        }
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl DashboardConfig {
    pub fn from_toml_str(contents: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Reads `path`, falling back to defaults when the file does not exist.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        match fs::read_to_string(path) {
            Ok(contents) => Self::from_toml_str(&contents, path),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "no config file, using defaults");
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Applies environment overrides. `lookup` is `std::env::var` in
    /// production; tests pass a map. Blank values count as unset.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(token) = get("BLYNK_AUTH_TOKEN") {
            self.blynk.auth_token = Some(token);
        }
        if let Some(port) = get("PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| ConfigError::InvalidOverride { name: "PORT", value: port })?;
        }
        if let Some(location_id) = get("FORECAST_LOCATION_ID") {
            self.regional.location_id = location_id;
        }
        if let Some(url) = get("DATABASE_URL") {
            self.history.database_url = Some(url);
        }

        // A blank token in the file is the same as no token.
        if self.blynk.auth_token.as_deref().is_some_and(|t| t.trim().is_empty()) {
            self.blynk.auth_token = None;
        }
        Ok(())
    }
}

/// Loads `.env.local` then `.env`, the config file named by
/// `DASHBOARD_CONFIG` (default `dashboard.toml`), then environment
/// overrides.
pub fn load() -> Result<DashboardConfig, ConfigError> {
    // Neither file overrides a variable that is already set, so
    // .env.local takes precedence over .env.
    dotenv::from_filename(".env.local").ok();
    dotenv::dotenv().ok();

    let path = std::env::var("DASHBOARD_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let mut config = DashboardConfig::from_file(Path::new(&path))?;
    config.apply_overrides(|name| std::env::var(name).ok())?;
    Ok(config)
}
