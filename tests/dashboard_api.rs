/// End-to-end tests for the dashboard API
///
/// Each test points the endpoint at a local fake upstream and drives it
/// through `Endpoint::handle`, the same entry point the accept loop uses.
/// Hit counts on the fake show which requests reached the network.
///
/// Run with: cargo test --test dashboard_api

mod common;

use chrono::{TimeZone, Utc};
use common::{FakeUpstream, Reply, last_query_segment};
use envdash::cache::ManualClock;
use envdash::config::DashboardConfig;
use envdash::endpoint::Endpoint;
use serde_json::Value;
use std::io::{Read, Write};
use std::net::TcpStream;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tiny_http::{Method, Server};

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

fn endpoint(config: DashboardConfig) -> Endpoint {
    // 14:30 local time in Jakarta (UTC+7).
    let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2025, 3, 10, 7, 30, 0).unwrap()));
    Endpoint::new(config, clock).expect("endpoint should build")
}

fn base_config() -> DashboardConfig {
    let mut config = DashboardConfig::default();
    config.upstream.timeout_ms = 2_000;
    // Idle connections would pin the fake's worker threads.
    config.upstream.keep_alive = false;
    config
}

fn get(endpoint: &mut Endpoint, url: &str) -> (u16, Value) {
    let response = endpoint.handle(&Method::Get, url);
    (response.status, response.json_body())
}

/// Sensor bridge that answers each pin from `value_for`.
fn blynk_upstream(value_for: fn(&str) -> Reply) -> FakeUpstream {
    FakeUpstream::start(move |url| value_for(last_query_segment(url)))
}

fn healthy_pin(pin: &str) -> Reply {
    match pin {
        "V0" => Reply::ok("26.4"),
        "V1" => Reply::ok("58.2"),
        "V5" => Reply::ok("402"),
        "V6" => Reply::ok("118.6"),
        "V7" => Reply::ok("Good"),
        "V8" => Reply::ok("1008.7"),
        "V9" => Reply::ok("35.5"),
        _ => Reply::status(404),
    }
}

fn indoor_config(upstream: &FakeUpstream) -> DashboardConfig {
    let mut config = base_config();
    config.blynk.base_url = upstream.url().to_string();
    config.blynk.auth_token = Some("secret-token".to_string());
    config
}

const FORECAST_JSON: &str = r#"{
    "latitude": -6.25, "longitude": 106.875, "elevation": 8.0,
    "timezone": "Asia/Jakarta", "utc_offset_seconds": 25200,
    "current": {
        "time": "2025-03-10T14:30", "temperature_2m": 30.2, "relative_humidity_2m": 70,
        "apparent_temperature": 34.1, "is_day": 1, "precipitation": 0.0, "weather_code": 2,
        "pressure_msl": 1009.4, "surface_pressure": 1007.9,
        "wind_speed_10m": 9.7, "wind_direction_10m": 250
    },
    "hourly": {
        "time": ["2025-03-10T13:00", "2025-03-10T14:00", "2025-03-10T15:00"],
        "temperature_2m": [30.6, 30.0, 29.1],
        "relative_humidity_2m": [68, 70, 76],
        "precipitation_probability": [10, 15, 60],
        "weather_code": [2, 3, 63]
    },
    "daily": {
        "time": ["2025-03-10", "2025-03-11"],
        "weather_code": [2, 80],
        "temperature_2m_max": [32.4, 31.1], "temperature_2m_min": [25.3, 24.7],
        "precipitation_sum": [0.4, 11.8], "precipitation_probability_max": [35, 85],
        "uv_index_max": [8.3, 6.1],
        "sunrise": ["2025-03-10T06:01", "2025-03-11T06:01"],
        "sunset": ["2025-03-10T18:09", "2025-03-11T18:09"]
    }
}"#;

const AIR_QUALITY_JSON: &str = r#"{
    "latitude": -6.2, "longitude": 106.8, "utc_offset_seconds": 25200,
    "current": { "time": "2025-03-10T14:00", "european_aqi": 42, "pm10": 20.4, "pm2_5": 12.1, "uv_index": 5.3 }
}"#;

fn weather_config(upstream: &FakeUpstream) -> DashboardConfig {
    let mut config = base_config();
    config.open_meteo.forecast_url = upstream.url_for("/v1/forecast");
    config.open_meteo.air_quality_url = upstream.url_for("/v1/air-quality");
    config
}

fn assert_error_envelope(body: &Value) {
    let object = body.as_object().expect("envelope is an object");
    assert!(object["error"].is_string(), "error must be a string: {}", body);
    assert!(object["details"].is_string(), "details must be a string: {}", body);
    let timestamp = object["timestamp"].as_str().expect("timestamp must be a string");
    assert!(chrono::DateTime::parse_from_rfc3339(timestamp).is_ok(), "bad timestamp {}", timestamp);
}

// ---------------------------------------------------------------------------
// Indoor reading
// ---------------------------------------------------------------------------

#[test]
fn test_indoor_reading_all_pins_healthy() {
    let upstream = blynk_upstream(healthy_pin);
    let mut endpoint = endpoint(indoor_config(&upstream));

    let (status, body) = get(&mut endpoint, "/api/blynk");

    assert_eq!(status, 200);
    assert_eq!(body["temperature"], 26.4);
    assert_eq!(body["rawGas"], 402.0);
    assert_eq!(body["airQualityStatus"], "Good");
    assert_eq!(body["pressure"], 1008.7);
    assert_eq!(upstream.hits(), 7, "one request per pin");
    assert!(upstream.requests().iter().all(|u| u.contains("token=secret-token")));
}

#[test]
fn test_out_of_range_pressure_falls_back() {
    let upstream = blynk_upstream(|pin| match pin {
        "V8" => Reply::ok("50000"),
        other => healthy_pin(other),
    });
    let mut endpoint = endpoint(indoor_config(&upstream));

    let (status, body) = get(&mut endpoint, "/api/blynk");

    assert_eq!(status, 200);
    assert_eq!(body["pressure"], 1013.25);
    assert_eq!(body["temperature"], 26.4);
}

#[test]
fn test_one_failed_pin_defaults_only_that_field() {
    let upstream = blynk_upstream(|pin| match pin {
        "V1" => Reply::status(500),
        other => healthy_pin(other),
    });
    let mut endpoint = endpoint(indoor_config(&upstream));

    let (status, body) = get(&mut endpoint, "/api/blynk");

    assert_eq!(status, 200);
    assert_eq!(body["humidity"], 0.0);
    assert_eq!(body["temperature"], 26.4);
    assert_eq!(body["compensatedGas"], 118.6);
    assert_eq!(body["altitude"], 35.5);
}

#[test]
fn test_missing_token_fails_fast_without_upstream_calls() {
    let upstream = blynk_upstream(healthy_pin);
    let mut config = indoor_config(&upstream);
    config.blynk.auth_token = None;
    let mut endpoint = endpoint(config);

    let (status, body) = get(&mut endpoint, "/api/blynk");

    assert_eq!(status, 500);
    assert!(body["error"].as_str().unwrap().contains("BLYNK_AUTH_TOKEN"));
    assert_error_envelope(&body);
    assert_eq!(upstream.hits(), 0, "no upstream call without a token");
}

#[test]
fn test_every_pin_failing_still_serves_defaults() {
    let upstream = blynk_upstream(|_| Reply::status(503));
    let mut endpoint = endpoint(indoor_config(&upstream));

    let (status, body) = get(&mut endpoint, "/api/blynk");

    assert_eq!(status, 200);
    assert_eq!(body["temperature"], 0.0);
    assert_eq!(body["pressure"], 1013.25);
    assert_eq!(body["airQualityStatus"], "Unknown");
}

#[test]
fn test_batch_mode_uses_one_request() {
    let upstream = FakeUpstream::start(|_| {
        Reply::ok(r#"{"V0": "26.4", "V1": "58.2", "V5": "402", "V6": "118.6", "V7": "Fair", "V8": "1008.7"}"#)
    });
    let mut config = indoor_config(&upstream);
    config.blynk.batch = true;
    let mut endpoint = endpoint(config);

    let (status, body) = get(&mut endpoint, "/api/blynk");

    assert_eq!(status, 200);
    assert_eq!(upstream.hits(), 1);
    assert_eq!(body["airQualityStatus"], "Fair");
    assert_eq!(body["altitude"], 0.0, "pin missing from the batch body defaults");
}

// ---------------------------------------------------------------------------
// Coordinate weather
// ---------------------------------------------------------------------------

#[test]
fn test_weather_snapshot_merges_sources() {
    let upstream = FakeUpstream::start(|url| {
        if url.starts_with("/v1/forecast") {
            Reply::ok(FORECAST_JSON)
        } else {
            Reply::ok(AIR_QUALITY_JSON)
        }
    });
    let mut endpoint = endpoint(weather_config(&upstream));

    let (status, body) = get(&mut endpoint, "/api/openmeteo?lat=-6.2&lon=106.8");

    assert_eq!(status, 200);
    assert_eq!(body["location"]["timezone"], "Asia/Jakarta");
    assert_eq!(body["current"]["temperature_2m"], 30.2);
    assert_eq!(body["current"]["european_aqi"], 42.0);
    assert_eq!(body["current"]["description"], "Partly cloudy");
    assert_eq!(body["hourly"].as_array().unwrap().len(), 2);
    assert_eq!(body["daily"][0]["date"], "2025-03-10");
    assert!(upstream.requests().iter().any(|u| u.contains("latitude=-6.2&longitude=106.8")));
}

/// Snapshot `current` block with one of the two sources answering late.
fn current_with_slow_source(slow_prefix: &'static str) -> Value {
    let upstream = FakeUpstream::start(move |url| {
        let body = if url.starts_with("/v1/forecast") { FORECAST_JSON } else { AIR_QUALITY_JSON };
        if url.starts_with(slow_prefix) {
            Reply::ok(body).after(Duration::from_millis(300))
        } else {
            Reply::ok(body)
        }
    });
    let mut endpoint = endpoint(weather_config(&upstream));

    let (status, body) = get(&mut endpoint, "/api/openmeteo?lat=-6.2&lon=106.8");
    assert_eq!(status, 200);
    body["current"].clone()
}

#[test]
fn test_weather_merge_ignores_arrival_order() {
    let forecast_last = current_with_slow_source("/v1/forecast");
    let air_quality_last = current_with_slow_source("/v1/air-quality");

    assert_eq!(forecast_last, air_quality_last);
    // Both sources report `time`; the forecast's value wins either way.
    assert_eq!(forecast_last["time"], "2025-03-10T14:30");
    assert_eq!(forecast_last["european_aqi"], 42.0);
}

#[test]
fn test_weather_without_coordinates_uses_default_location() {
    let upstream = FakeUpstream::start(|url| {
        if url.starts_with("/v1/forecast") {
            Reply::ok(FORECAST_JSON)
        } else {
            Reply::ok(AIR_QUALITY_JSON)
        }
    });
    let mut endpoint = endpoint(weather_config(&upstream));

    let (status, _) = get(&mut endpoint, "/api/openmeteo?lat=abc");

    assert_eq!(status, 200);
    assert!(upstream.requests().iter().all(|u| u.contains("latitude=-6.2088&longitude=106.8456")));
}

#[test]
fn test_weather_partial_failure_serves_defaults_and_is_not_cached() {
    let upstream = FakeUpstream::start(|url| {
        if url.starts_with("/v1/forecast") {
            Reply::ok(FORECAST_JSON)
        } else {
            Reply::status(503)
        }
    });
    let mut endpoint = endpoint(weather_config(&upstream));

    let (status, body) = get(&mut endpoint, "/api/openmeteo?lat=-6.2&lon=106.8");
    assert_eq!(status, 200);
    assert_eq!(body["current"]["temperature_2m"], 30.2);
    assert_eq!(body["current"]["european_aqi"], 0.0);

    get(&mut endpoint, "/api/openmeteo?lat=-6.2&lon=106.8");
    assert_eq!(upstream.hits(), 4, "a partial snapshot must be refetched");
}

#[test]
fn test_weather_full_success_is_cached() {
    let upstream = FakeUpstream::start(|url| {
        if url.starts_with("/v1/forecast") {
            Reply::ok(FORECAST_JSON)
        } else {
            Reply::ok(AIR_QUALITY_JSON)
        }
    });
    let mut endpoint = endpoint(weather_config(&upstream));

    let (_, first) = get(&mut endpoint, "/api/openmeteo?lat=-6.2&lon=106.8");
    let (status, second) = get(&mut endpoint, "/api/openmeteo?lat=-6.2&lon=106.8");

    assert_eq!(status, 200);
    assert_eq!(first, second);
    assert_eq!(upstream.hits(), 2, "second request should be served from cache");
}

#[test]
fn test_weather_total_failure_returns_envelope() {
    let upstream = FakeUpstream::start(|_| Reply::status(502));
    let mut endpoint = endpoint(weather_config(&upstream));

    let (status, body) = get(&mut endpoint, "/api/openmeteo?lat=-6.2&lon=106.8");

    assert_eq!(status, 500);
    assert_error_envelope(&body);
    assert_eq!(body["error"], "Failed to fetch weather data");
    assert!(body.get("current").is_none(), "no partial payload on error");
}

// ---------------------------------------------------------------------------
// Regional forecast
// ---------------------------------------------------------------------------

#[test]
fn test_regional_forecast() {
    let upstream = FakeUpstream::start(|_| {
        Reply::ok(
            r#"{
              "lokasi": { "desa": "Gunung Sahari Selatan", "kecamatan": "Kemayoran",
                          "kotkab": "Kota Adm. Jakarta Pusat", "lat": -6.1647, "lon": 106.8426,
                          "timezone": "Asia/Jakarta" },
              "data": [{ "cuaca": [[
                { "datetime": "2025-03-10T09:00:00Z", "t": 29, "hu": 75, "ws": 8.2, "wd": "W",
                  "tcc": 80, "vs_text": "> 10 km", "weather_desc_en": "Cloudy", "image": "berawan.svg" },
                { "datetime": "2025-03-10T06:00:00Z", "t": 31, "hu": 66, "ws": 9.1, "wd": "NW",
                  "tcc": 60, "vs_text": "> 10 km", "weather_desc_en": "Partly Cloudy", "image": "cerah.svg" },
                { "datetime": "2025-03-10T00:00:00Z", "t": 27, "hu": 83, "ws": 6.4, "wd": "SW",
                  "tcc": 96, "vs_text": "< 9 km", "weather_desc_en": "Mostly Cloudy", "image": "berawan.svg" }
              ]] }]
            }"#,
        )
    });
    let mut config = base_config();
    config.regional.base_url = upstream.url_for("/publik/prakiraan-cuaca");
    config.regional.location_id = "31.71.03.1001".to_string();
    let mut endpoint = endpoint(config);

    let (status, body) = get(&mut endpoint, "/api/weather");

    assert_eq!(status, 200);
    assert_eq!(
        body["location"]["name"],
        "Gunung Sahari Selatan, Kemayoran, Kota Adm. Jakarta Pusat"
    );
    let times: Vec<_> = body["forecasts"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["time"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(times, vec!["2025-03-10T06:00:00Z", "2025-03-10T09:00:00Z"]);
    assert_eq!(body["forecasts"][0]["windSpeed"], 9.1);
    assert_eq!(upstream.requests(), vec!["/publik/prakiraan-cuaca?adm4=31.71.03.1001"]);
}

#[test]
fn test_regional_upstream_failure_returns_envelope() {
    let upstream = FakeUpstream::start(|_| Reply::status(500));
    let mut config = base_config();
    config.regional.base_url = upstream.url().to_string();
    let mut endpoint = endpoint(config);

    let (status, body) = get(&mut endpoint, "/api/weather");

    assert_eq!(status, 500);
    assert_error_envelope(&body);
}

// ---------------------------------------------------------------------------
// Reverse geocoding
// ---------------------------------------------------------------------------

#[test]
fn test_geocode_missing_coordinates_is_400_without_upstream_calls() {
    let upstream = FakeUpstream::start(|_| Reply::ok("{}"));
    let mut config = base_config();
    config.geocode.base_url = upstream.url().to_string();
    let mut endpoint = endpoint(config);

    let (status, body) = get(&mut endpoint, "/api/geocode");

    assert_eq!(status, 400);
    assert_eq!(body["error"], "Latitude and Longitude are required");
    assert_eq!(upstream.hits(), 0);
}

#[test]
fn test_geocode_returns_place_name() {
    let upstream = FakeUpstream::start(|_| {
        Reply::ok(r#"{"display_name": "Menteng, Central Jakarta", "address": {"suburb": "Menteng", "city": "Central Jakarta"}}"#)
    });
    let mut config = base_config();
    config.geocode.base_url = upstream.url().to_string();
    let mut endpoint = endpoint(config);

    let (status, body) = get(&mut endpoint, "/api/geocode?lat=-6.2&lon=106.8");

    assert_eq!(status, 200);
    assert_eq!(body, serde_json::json!({ "name": "Central Jakarta" }));
    assert_eq!(upstream.requests(), vec!["/reverse?format=json&lat=-6.2&lon=106.8"]);
}

#[test]
fn test_geocode_upstream_failure_returns_envelope() {
    let upstream = FakeUpstream::start(|_| Reply::status(429));
    let mut config = base_config();
    config.geocode.base_url = upstream.url().to_string();
    let mut endpoint = endpoint(config);

    let (status, body) = get(&mut endpoint, "/api/geocode?lat=-6.2&lon=106.8");

    assert_eq!(status, 500);
    assert_error_envelope(&body);
    assert_eq!(body["error"], "Failed to get location name");
}

// ---------------------------------------------------------------------------
// Accept loop
// ---------------------------------------------------------------------------

#[test]
fn test_serve_answers_over_http() {
    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();
    let endpoint = endpoint(base_config());
    thread::spawn(move || endpoint.serve(server));

    let mut stream = TcpStream::connect(addr).unwrap();
    stream
        .write_all(b"GET /health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .unwrap();
    let mut response = String::new();
    stream.read_to_string(&mut response).unwrap();

    assert!(response.starts_with("HTTP/1.1 200"), "got: {}", response);
    assert!(response.contains("application/json"));
    assert!(response.contains("\"status\": \"ok\""));
}
