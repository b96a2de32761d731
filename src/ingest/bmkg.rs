/// BMKG public forecast API (regional outdoor forecast).
///
///   https://api.bmkg.go.id/publik/prakiraan-cuaca?adm4=31.71.03.1001
///
/// The region is identified by its administrative level-4 code. The
/// response carries the region metadata under `lokasi` and the forecast
/// under `data[].cuaca`, a list of days, each a list of 3-hourly slots:
///
///   { "lokasi": { "desa", "kecamatan", "kotkab", "lat", "lon", "timezone" },
///     "data": [ { "cuaca": [ [ { "datetime", "t", "hu", "ws", "wd",
///                                "tcc", "vs_text", "weather_desc_en",
///                                "image" }, … ], … ] } ] }

use crate::fetch::FetchSpec;
use serde::Deserialize;
use serde_json::{Map, Value};

/// Fetch result key for the regional forecast call.
pub const REGIONAL_KEY: &str = "regional";

/// Hours covered by one forecast slot.
pub const SLOT_HOURS: i64 = 3;

pub fn build_forecast_url(base_url: &str, location_id: &str) -> String {
    format!("{}?adm4={}", base_url, urlencoding::encode(location_id))
}

pub fn forecast_request(base_url: &str, location_id: &str) -> FetchSpec {
    FetchSpec::json(REGIONAL_KEY, build_forecast_url(base_url, location_id))
}

// ---------------------------------------------------------------------------
// Boundary payload
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Clone, Deserialize)]
pub struct RegionalPayload {
    #[serde(default)]
    pub lokasi: Option<Map<String, Value>>,
    #[serde(default)]
    pub data: Vec<RegionalData>,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct RegionalData {
    #[serde(default)]
    pub lokasi: Option<Map<String, Value>>,
    /// Days, each a list of slots.
    #[serde(default)]
    pub cuaca: Vec<Vec<Map<String, Value>>>,
}

impl RegionalPayload {
    pub fn parse(value: &Value) -> Result<Self, serde_json::Error> {
        Self::deserialize(value)
    }

    /// Region metadata, preferring the top-level block.
    pub fn location(&self) -> Option<&Map<String, Value>> {
        self.lokasi
            .as_ref()
            .or_else(|| self.data.iter().find_map(|d| d.lokasi.as_ref()))
    }

    /// Every slot across every day, in payload order.
    pub fn slots(&self) -> impl Iterator<Item = &Map<String, Value>> {
        self.data.iter().flat_map(|d| d.cuaca.iter().flatten())
    }
}
