/// Shared output types served by the dashboard API.
///
/// These are the stable shapes the browser UI consumes. Every field is
/// always populated; normalization fills gaps with documented fallbacks
/// before a value of any of these types is constructed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Indoor sensor bridge
// ---------------------------------------------------------------------------

/// Air-quality classification published by the indoor gas sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AirQualityStatus {
    #[serde(rename = "Very Good")]
    VeryGood,
    Good,
    Fair,
    Poor,
    #[serde(rename = "Very Poor")]
    VeryPoor,
    Unknown,
}

impl AirQualityStatus {
    /// Maps the sensor's free-text label onto a status.
    ///
    /// Matching ignores case and word separators, so `"Very Good"`,
    /// `"very_good"` and `"VeryGood"` are the same status.
    pub fn from_label(label: &str) -> Self {
        let folded: String = label
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();

        match folded.as_str() {
            "verygood" | "excellent" => AirQualityStatus::VeryGood,
            "good" => AirQualityStatus::Good,
            "fair" | "moderate" => AirQualityStatus::Fair,
            "poor" => AirQualityStatus::Poor,
            "verypoor" | "critical" => AirQualityStatus::VeryPoor,
            _ => AirQualityStatus::Unknown,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AirQualityStatus::VeryGood => "Very Good",
            AirQualityStatus::Good => "Good",
            AirQualityStatus::Fair => "Fair",
            AirQualityStatus::Poor => "Poor",
            AirQualityStatus::VeryPoor => "Very Poor",
            AirQualityStatus::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for AirQualityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One indoor reading, assembled fresh on every poll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorReading {
    /// Degrees Celsius.
    pub temperature: f64,
    /// Relative humidity, percent.
    pub humidity: f64,
    /// Unscaled gas sensor output.
    pub raw_gas: f64,
    /// Temperature/humidity compensated gas index.
    pub compensated_gas: f64,
    pub air_quality_status: AirQualityStatus,
    /// hPa, within 800–1200.
    pub pressure: f64,
    /// Meters, within −100–9000.
    pub altitude: f64,
}

// ---------------------------------------------------------------------------
// Outdoor weather (coordinate-based forecast + air quality)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub timezone: String,
    /// Meters above sea level.
    pub elevation: f64,
}

/// Current conditions merged from the forecast and air-quality sources.
///
/// Field names follow the upstream variable names so the UI can address
/// them the same way regardless of which source supplied them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub time: String,
    pub temperature_2m: f64,
    pub relative_humidity_2m: f64,
    pub apparent_temperature: f64,
    pub is_day: f64,
    pub precipitation: f64,
    pub weather_code: f64,
    pub pressure_msl: f64,
    pub surface_pressure: f64,
    pub wind_speed_10m: f64,
    pub wind_direction_10m: f64,
    pub uv_index: f64,
    pub european_aqi: f64,
    pub pm10: f64,
    pub pm2_5: f64,
    pub description: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyForecast {
    pub time: String,
    pub temperature_2m: f64,
    pub relative_humidity_2m: f64,
    pub precipitation_probability: f64,
    pub weather_code: f64,
    pub description: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyForecast {
    pub date: String,
    pub temperature_2m_max: f64,
    pub temperature_2m_min: f64,
    pub precipitation_sum: f64,
    pub precipitation_probability_max: f64,
    pub uv_index_max: f64,
    pub weather_code: f64,
    pub sunrise: String,
    pub sunset: String,
    pub description: String,
    pub icon: String,
}

/// Outdoor conditions for one coordinate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub location: Location,
    pub current: CurrentConditions,
    /// Ascending, current hour onward.
    pub hourly: Vec<HourlyForecast>,
    /// Ascending, today onward.
    pub daily: Vec<DailyForecast>,
}

// ---------------------------------------------------------------------------
// Outdoor weather (regional forecast)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionalLocation {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub timezone: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastSlot {
    /// UTC, RFC 3339.
    pub time: String,
    pub temperature: f64,
    pub humidity: f64,
    pub wind_speed: f64,
    pub wind_direction: String,
    pub cloud_cover: f64,
    pub visibility: String,
    pub description: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionalForecast {
    pub location: RegionalLocation,
    pub forecasts: Vec<ForecastSlot>,
}

// ---------------------------------------------------------------------------
// Reverse geocoding
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceName {
    pub name: String,
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

/// A stored indoor reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRow {
    pub id: i64,
    pub recorded_at: DateTime<Utc>,
    #[serde(flatten)]
    pub reading: SensorReading,
}
