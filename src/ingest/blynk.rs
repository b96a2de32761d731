/// Blynk cloud external API: indoor sensor bridge.
///
/// The bridge publishes each sensor channel on a virtual pin. Values are
/// read through the HTTP "get" endpoint:
///   https://blynk.cloud/external/api/get?token=TOKEN&V0
///
/// Requesting a single pin returns its value as plain text. Requesting
/// several pins in one call returns a JSON object keyed by pin name:
///   {"V0": "23.5", "V1": "61"}
///
/// Either body may hold the sentinel text `null` / `undefined` when the
/// device has not written the pin yet.

use crate::fetch::{BatchSpec, FetchSpec};

// ---------------------------------------------------------------------------
// Pin registry
// ---------------------------------------------------------------------------

/// A virtual pin and the reading field it feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pin {
    pub pin: &'static str,
    pub field: &'static str,
}

pub const PIN_TEMPERATURE: &str = "V0";
pub const PIN_HUMIDITY: &str = "V1";
pub const PIN_RAW_GAS: &str = "V5";
pub const PIN_COMPENSATED_GAS: &str = "V6";
pub const PIN_AIR_QUALITY: &str = "V7";
pub const PIN_PRESSURE: &str = "V8";
pub const PIN_ALTITUDE: &str = "V9";

/// Every pin the indoor reading is assembled from.
pub static PIN_REGISTRY: &[Pin] = &[
    Pin { pin: PIN_TEMPERATURE, field: "temperature" },
    Pin { pin: PIN_HUMIDITY, field: "humidity" },
    Pin { pin: PIN_RAW_GAS, field: "rawGas" },
    Pin { pin: PIN_COMPENSATED_GAS, field: "compensatedGas" },
    Pin { pin: PIN_AIR_QUALITY, field: "airQualityStatus" },
    Pin { pin: PIN_PRESSURE, field: "pressure" },
    Pin { pin: PIN_ALTITUDE, field: "altitude" },
];

pub fn all_pins() -> Vec<&'static str> {
    PIN_REGISTRY.iter().map(|p| p.pin).collect()
}

// ---------------------------------------------------------------------------
// URL construction
// ---------------------------------------------------------------------------

const GET_PATH: &str = "/external/api/get";

/// Builds a "get" URL reading the given pins.
pub fn build_get_url(base_url: &str, token: &str, pins: &[&str]) -> String {
    let mut url = format!(
        "{}{}?token={}",
        base_url.trim_end_matches('/'),
        GET_PATH,
        urlencoding::encode(token)
    );
    for pin in pins {
        url.push('&');
        url.push_str(pin);
    }
    url
}

/// One plain-text request per pin.
pub fn pin_requests(base_url: &str, token: &str) -> Vec<FetchSpec> {
    PIN_REGISTRY
        .iter()
        .map(|p| FetchSpec::text(p.pin, build_get_url(base_url, token, &[p.pin])))
        .collect()
}

/// A single request for every pin, split by pin name.
pub fn batch_request(base_url: &str, token: &str) -> BatchSpec {
    BatchSpec {
        url: build_get_url(base_url, token, &all_pins()),
        fields: PIN_REGISTRY
            .iter()
            .map(|p| (p.pin.to_string(), format!("/{}", p.pin)))
            .collect(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
