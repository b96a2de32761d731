/// Open-Meteo forecast and air-quality APIs (coordinate-based outdoor weather).
///
///   https://api.open-meteo.com/v1/forecast
///   https://air-quality-api.open-meteo.com/v1/air-quality
///
/// Both endpoints answer with the same envelope: location metadata at the
/// top level and `current` / `hourly` / `daily` blocks. `current` is an
/// object of scalars; `hourly` and `daily` are column-oriented (one array
/// per variable, aligned with a `time` array). Times are local to the
/// requested timezone, with `utc_offset_seconds` giving the offset.

use crate::fetch::FetchSpec;
use serde::Deserialize;
use serde_json::{Map, Value};

/// Fetch result key for the forecast call.
pub const FORECAST_KEY: &str = "forecast";
/// Fetch result key for the air-quality call.
pub const AIR_QUALITY_KEY: &str = "air_quality";

pub const CURRENT_VARIABLES: &[&str] = &[
    "temperature_2m",
    "relative_humidity_2m",
    "apparent_temperature",
    "is_day",
    "precipitation",
    "weather_code",
    "pressure_msl",
    "surface_pressure",
    "wind_speed_10m",
    "wind_direction_10m",
];

pub const HOURLY_VARIABLES: &[&str] = &[
    "temperature_2m",
    "relative_humidity_2m",
    "precipitation_probability",
    "weather_code",
];

pub const DAILY_VARIABLES: &[&str] = &[
    "weather_code",
    "temperature_2m_max",
    "temperature_2m_min",
    "precipitation_sum",
    "precipitation_probability_max",
    "uv_index_max",
    "sunrise",
    "sunset",
];

pub const AIR_QUALITY_VARIABLES: &[&str] = &["european_aqi", "pm10", "pm2_5", "uv_index"];

const FORECAST_DAYS: u8 = 7;

// ---------------------------------------------------------------------------
// URL construction
// ---------------------------------------------------------------------------

/// Builds the forecast URL for a coordinate. Times come back in the
/// coordinate's own timezone (`timezone=auto`).
pub fn build_forecast_url(base_url: &str, latitude: f64, longitude: f64) -> String {
    format!(
        "{}?latitude={}&longitude={}&current={}&hourly={}&daily={}&timezone=auto&forecast_days={}",
        base_url,
        latitude,
        longitude,
        CURRENT_VARIABLES.join(","),
        HOURLY_VARIABLES.join(","),
        DAILY_VARIABLES.join(","),
        FORECAST_DAYS
    )
}

pub fn build_air_quality_url(base_url: &str, latitude: f64, longitude: f64) -> String {
    format!(
        "{}?latitude={}&longitude={}&current={}&timezone=auto",
        base_url,
        latitude,
        longitude,
        AIR_QUALITY_VARIABLES.join(",")
    )
}

/// The two concurrent requests behind one weather snapshot.
pub fn weather_requests(
    forecast_url: &str,
    air_quality_url: &str,
    latitude: f64,
    longitude: f64,
) -> Vec<FetchSpec> {
    vec![
        FetchSpec::json(FORECAST_KEY, build_forecast_url(forecast_url, latitude, longitude)),
        FetchSpec::json(
            AIR_QUALITY_KEY,
            build_air_quality_url(air_quality_url, latitude, longitude),
        ),
    ]
}

// ---------------------------------------------------------------------------
// Boundary payload
// ---------------------------------------------------------------------------

/// Envelope shared by both endpoints.
///
/// Scalars stay as raw `Value`s; they are coerced during normalization.
/// A block that is present but is not an object fails deserialization,
/// which marks the whole source as malformed.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct OpenMeteoPayload {
    #[serde(default)]
    pub latitude: Option<Value>,
    #[serde(default)]
    pub longitude: Option<Value>,
    #[serde(default)]
    pub elevation: Option<Value>,
    #[serde(default)]
    pub timezone: Option<Value>,
    #[serde(default)]
    pub utc_offset_seconds: Option<Value>,
    #[serde(default)]
    pub current: Option<Map<String, Value>>,
    #[serde(default)]
    pub hourly: Option<Map<String, Value>>,
    #[serde(default)]
    pub daily: Option<Map<String, Value>>,
}

impl OpenMeteoPayload {
    pub fn parse(value: &Value) -> Result<Self, serde_json::Error> {
        Self::deserialize(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::fixtures::*;

    #[test]
    fn test_forecast_url_includes_coordinates_and_blocks() {
        let url = build_forecast_url("https://api.open-meteo.com/v1/forecast", -6.2, 106.8);
        assert!(url.starts_with("https://api.open-meteo.com/v1/forecast?latitude=-6.2&longitude=106.8"));
        assert!(url.contains("current=temperature_2m,"), "got {}", url);
        assert!(url.contains("hourly=temperature_2m,"));
        assert!(url.contains("daily=weather_code,"));
        assert!(url.contains("timezone=auto"));
    }

    #[test]
    fn test_air_quality_url_requests_european_aqi() {
        let url = build_air_quality_url("https://air-quality-api.open-meteo.com/v1/air-quality", 1.5, 2.5);
        assert!(url.contains("latitude=1.5&longitude=2.5"));
        assert!(url.contains("current=european_aqi,pm10,pm2_5,uv_index"));
    }

    #[test]
    fn test_weather_requests_are_keyed() {
        let specs = weather_requests("http://f", "http://a", 0.0, 0.0);
        let keys: Vec<_> = specs.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(keys, vec![FORECAST_KEY, AIR_QUALITY_KEY]);
    }

    #[test]
    fn test_parse_forecast_fixture() {
        let value: Value = serde_json::from_str(fixture_open_meteo_forecast_json()).unwrap();
        let payload = OpenMeteoPayload::parse(&value).expect("fixture should parse");
        assert!(payload.current.as_ref().unwrap().contains_key("temperature_2m"));
        assert!(payload.hourly.as_ref().unwrap().contains_key("time"));
        assert_eq!(payload.timezone, Some(Value::String("Asia/Jakarta".into())));
    }

    #[test]
    fn test_parse_rejects_non_object_blocks() {
        let value = serde_json::json!({"current": [1, 2, 3]});
        assert!(OpenMeteoPayload::parse(&value).is_err());
    }

    #[test]
    fn test_parse_tolerates_missing_blocks() {
        let payload = OpenMeteoPayload::parse(&serde_json::json!({})).unwrap();
        assert!(payload.current.is_none());
        assert!(payload.latitude.is_none());
    }
}
