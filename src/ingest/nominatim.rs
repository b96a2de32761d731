/// Nominatim reverse geocoding (coordinate → human-readable place name).
///
///   https://nominatim.openstreetmap.org/reverse?format=json&lat=-6.2&lon=106.8
///
/// Nominatim's usage policy requires an identifying User-Agent; the shared
/// HTTP client is built with one.

use crate::fetch::FetchSpec;
use serde::Deserialize;
use serde_json::{Map, Value};

/// Fetch result key for the reverse lookup.
pub const GEOCODE_KEY: &str = "geocode";

/// Name used when the response carries nothing usable.
pub const UNKNOWN_PLACE: &str = "Unknown location";

/// Address components tried in order, most specific settlement first.
const ADDRESS_PRECEDENCE: &[&str] = &["city", "town", "village", "suburb", "county", "state"];

pub fn build_reverse_url(base_url: &str, latitude: f64, longitude: f64) -> String {
    format!(
        "{}/reverse?format=json&lat={}&lon={}",
        base_url.trim_end_matches('/'),
        latitude,
        longitude
    )
}

pub fn reverse_request(base_url: &str, latitude: f64, longitude: f64) -> FetchSpec {
    FetchSpec::json(GEOCODE_KEY, build_reverse_url(base_url, latitude, longitude))
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct ReversePayload {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub address: Option<Map<String, Value>>,
}

impl ReversePayload {
    pub fn parse(value: &Value) -> Result<Self, serde_json::Error> {
        Self::deserialize(value)
    }

    /// Best available place name.
    pub fn place_name(&self) -> String {
        let from_address = self.address.as_ref().and_then(|address| {
            ADDRESS_PRECEDENCE
                .iter()
                .filter_map(|key| address.get(*key).and_then(Value::as_str))
                .map(str::trim)
                .find(|name| !name.is_empty())
        });

        from_address
            .or_else(|| self.display_name.as_deref().map(str::trim).filter(|n| !n.is_empty()))
            .unwrap_or(UNKNOWN_PLACE)
            .to_string()
    }
}
