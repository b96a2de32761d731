/// Async request handlers.
///
/// Each handler fans its upstream calls out through the shared aggregator,
/// normalizes the keyed results and returns a typed record. Partial
/// upstream failure is absorbed into fallbacks; only the fail-fast and
/// nothing-to-serve cases come back as `ApiError`.

use super::error::ApiError;
use crate::cache::{SharedClock, TtlCache, coordinate_key};
use crate::config::DashboardConfig;
use crate::fetch::{Aggregator, FetchResult, FetchResults, all_failed, describe_failures};
use crate::ingest::bmkg::{self, REGIONAL_KEY, RegionalPayload};
use crate::ingest::nominatim::{self, GEOCODE_KEY, ReversePayload};
use crate::ingest::{blynk, open_meteo};
use crate::model::{PlaceName, RegionalForecast, SensorReading, WeatherSnapshot};
use crate::normalize::regional::normalize_regional;
use crate::normalize::weather::{SnapshotRequest, normalize_weather};
use chrono::Duration;
use std::sync::Mutex;

/// Shared, read-mostly state behind every handler.
pub struct AppState {
    pub config: DashboardConfig,
    pub aggregator: Aggregator,
    pub clock: SharedClock,
    weather_cache: Mutex<TtlCache<WeatherSnapshot>>,
    regional_cache: Mutex<TtlCache<RegionalForecast>>,
}

impl AppState {
    pub fn new(config: DashboardConfig, clock: SharedClock) -> Result<Self, reqwest::Error> {
        let aggregator = Aggregator::from_config(&config.upstream)?;
        let ttl = Duration::seconds(config.cache.ttl_secs as i64);
        let capacity = config.cache.capacity;

        Ok(Self {
            weather_cache: Mutex::new(TtlCache::new(ttl, capacity, clock.clone())),
            regional_cache: Mutex::new(TtlCache::new(ttl, capacity, clock.clone())),
            config,
            aggregator,
            clock,
        })
    }
}

fn cached<V: Clone>(cache: &Mutex<TtlCache<V>>, key: &str) -> Option<V> {
    cache.lock().ok().and_then(|mut c| c.get(key))
}

fn remember<V: Clone>(cache: &Mutex<TtlCache<V>>, key: &str, value: &V) {
    if let Ok(mut c) = cache.lock() {
        c.insert(key, value.clone());
    }
}

fn fully_successful(results: &FetchResults) -> bool {
    results.values().all(FetchResult::is_ok)
}

// ---------------------------------------------------------------------------
// Indoor
// ---------------------------------------------------------------------------

/// Current indoor reading.
///
/// Without an auth token this fails before any upstream call. If every
/// pin fails the reading is still served, fully defaulted.
pub async fn indoor_reading(state: &AppState) -> Result<SensorReading, ApiError> {
    let blynk_config = &state.config.blynk;
    let token = blynk_config
        .auth_token
        .as_deref()
        .ok_or(ApiError::ConfigurationMissing("BLYNK_AUTH_TOKEN"))?;

    let results = if blynk_config.batch {
        state
            .aggregator
            .fetch_batch(&blynk::batch_request(&blynk_config.base_url, token))
            .await
    } else {
        state
            .aggregator
            .fetch_all(&blynk::pin_requests(&blynk_config.base_url, token))
            .await
    };

    if all_failed(&results) {
        tracing::warn!(details = %describe_failures(&results), "every indoor pin failed, serving defaults");
    }

    Ok(SensorReading::from_results(&results))
}

// ---------------------------------------------------------------------------
// Outdoor
// ---------------------------------------------------------------------------

/// Coordinate-based snapshot (forecast merged with air quality).
///
/// Served if at least one of the two calls succeeded. Only snapshots
/// built from two successful calls are cached.
pub async fn weather_snapshot(state: &AppState, latitude: f64, longitude: f64) -> Result<WeatherSnapshot, ApiError> {
    let key = coordinate_key(latitude, longitude);
    if let Some(hit) = cached(&state.weather_cache, &key) {
        tracing::debug!(key = %key, "weather cache hit");
        return Ok(hit);
    }

    let config = &state.config.open_meteo;
    let specs = open_meteo::weather_requests(&config.forecast_url, &config.air_quality_url, latitude, longitude);
    let results = state.aggregator.fetch_all(&specs).await;

    if all_failed(&results) {
        return Err(ApiError::TotalFailure {
            context: "Failed to fetch weather data",
            details: describe_failures(&results),
        });
    }

    let request = SnapshotRequest {
        latitude,
        longitude,
        now: state.clock.now(),
        hourly_window: config.hourly_window,
    };
    let snapshot = normalize_weather(&results, &request);

    if fully_successful(&results) {
        remember(&state.weather_cache, &key, &snapshot);
    }
    Ok(snapshot)
}

/// Forecast for the configured region.
pub async fn regional_forecast(state: &AppState) -> Result<RegionalForecast, ApiError> {
    let config = &state.config.regional;
    if config.location_id.trim().is_empty() {
        return Err(ApiError::ConfigurationMissing("FORECAST_LOCATION_ID"));
    }

    if let Some(hit) = cached(&state.regional_cache, &config.location_id) {
        tracing::debug!(location_id = %config.location_id, "regional cache hit");
        return Ok(hit);
    }

    let spec = bmkg::forecast_request(&config.base_url, &config.location_id);
    let results = state.aggregator.fetch_all(&[spec]).await;

    let payload = match results.get(REGIONAL_KEY) {
        Some(FetchResult::Ok(value)) => RegionalPayload::parse(value).map_err(|e| ApiError::TotalFailure {
            context: "Failed to fetch weather data",
            details: format!("{}: malformed upstream response: {}", REGIONAL_KEY, e),
        })?,
        _ => {
            return Err(ApiError::TotalFailure {
                context: "Failed to fetch weather data",
                details: describe_failures(&results),
            });
        }
    };

    let forecast = normalize_regional(&payload, state.clock.now());
    remember(&state.regional_cache, &config.location_id, &forecast);
    Ok(forecast)
}

/// Human-readable name for a coordinate.
pub async fn place_name(state: &AppState, latitude: f64, longitude: f64) -> Result<PlaceName, ApiError> {
    let spec = nominatim::reverse_request(&state.config.geocode.base_url, latitude, longitude);
    let results = state.aggregator.fetch_all(&[spec]).await;

    match results.get(GEOCODE_KEY) {
        Some(FetchResult::Ok(value)) => {
            let payload = ReversePayload::parse(value).map_err(|e| ApiError::TotalFailure {
                context: "Failed to get location name",
                details: format!("{}: malformed upstream response: {}", GEOCODE_KEY, e),
            })?;
            Ok(PlaceName { name: payload.place_name() })
        }
        _ => Err(ApiError::TotalFailure {
            context: "Failed to get location name",
            details: describe_failures(&results),
        }),
    }
}
