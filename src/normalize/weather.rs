/// Weather snapshot normalization (forecast + air quality merge).
///
/// The snapshot is built from two independent upstream results looked up
/// by key. `current` blocks are merged with a fixed precedence (forecast
/// first, then air quality): a variable reported by both keeps the
/// forecast's value. Because lookup is by key and precedence is fixed,
/// the output does not depend on which call finished first.

use super::coerce::{PRESSURE_BOUNDS, SEA_LEVEL_PRESSURE_HPA, coerce, coerce_text, validate};
use super::weather_code;
use super::{FieldSchema, NormalizedRecord, normalize_object};
use crate::fetch::{FetchResult, FetchResults};
use crate::ingest::open_meteo::{AIR_QUALITY_KEY, FORECAST_KEY, OpenMeteoPayload};
use crate::model::{CurrentConditions, DailyForecast, HourlyForecast, Location, WeatherSnapshot};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use serde_json::{Map, Value};

/// Widest real-world UTC offset (±18 h), in seconds.
const MAX_UTC_OFFSET_SECONDS: f64 = 18.0 * 3600.0;

const CURRENT_SCHEMA: &[FieldSchema] = &[
    FieldSchema::text("time", "time", "--"),
    FieldSchema::number("temperature_2m", "temperature_2m", 0.0),
    FieldSchema::number("relative_humidity_2m", "relative_humidity_2m", 0.0),
    FieldSchema::number("apparent_temperature", "apparent_temperature", 0.0),
    FieldSchema::number("is_day", "is_day", 1.0),
    FieldSchema::number("precipitation", "precipitation", 0.0),
    FieldSchema::number("weather_code", "weather_code", -1.0),
    FieldSchema::bounded("pressure_msl", "pressure_msl", SEA_LEVEL_PRESSURE_HPA, PRESSURE_BOUNDS),
    FieldSchema::number("surface_pressure", "surface_pressure", SEA_LEVEL_PRESSURE_HPA),
    FieldSchema::number("wind_speed_10m", "wind_speed_10m", 0.0),
    FieldSchema::number("wind_direction_10m", "wind_direction_10m", 0.0),
    FieldSchema::number("uv_index", "uv_index", 0.0),
    FieldSchema::number("european_aqi", "european_aqi", 0.0),
    FieldSchema::number("pm10", "pm10", 0.0),
    FieldSchema::number("pm2_5", "pm2_5", 0.0),
];

const HOURLY_SCHEMA: &[FieldSchema] = &[
    FieldSchema::text("time", "time", "--"),
    FieldSchema::number("temperature_2m", "temperature_2m", 0.0),
    FieldSchema::number("relative_humidity_2m", "relative_humidity_2m", 0.0),
    FieldSchema::number("precipitation_probability", "precipitation_probability", 0.0),
    FieldSchema::number("weather_code", "weather_code", -1.0),
];

const DAILY_SCHEMA: &[FieldSchema] = &[
    FieldSchema::text("time", "time", "--"),
    FieldSchema::number("temperature_2m_max", "temperature_2m_max", 0.0),
    FieldSchema::number("temperature_2m_min", "temperature_2m_min", 0.0),
    FieldSchema::number("precipitation_sum", "precipitation_sum", 0.0),
    FieldSchema::number("precipitation_probability_max", "precipitation_probability_max", 0.0),
    FieldSchema::number("uv_index_max", "uv_index_max", 0.0),
    FieldSchema::number("weather_code", "weather_code", -1.0),
    FieldSchema::text("sunrise", "sunrise", "--"),
    FieldSchema::text("sunset", "sunset", "--"),
];

/// Inputs to a snapshot that do not come from the upstream payloads.
#[derive(Debug, Clone, Copy)]
pub struct SnapshotRequest {
    pub latitude: f64,
    pub longitude: f64,
    /// Fetch time; series entries before it are dropped.
    pub now: DateTime<Utc>,
    /// Maximum number of hourly entries kept.
    pub hourly_window: usize,
}

/// Builds a fully populated snapshot from keyed results.
///
/// A source that failed, or whose body does not have the expected
/// envelope, contributes nothing; every field it would have supplied
/// takes its fallback.
pub fn normalize_weather(results: &FetchResults, request: &SnapshotRequest) -> WeatherSnapshot {
    let forecast = parse_source(results, FORECAST_KEY);
    let air_quality = parse_source(results, AIR_QUALITY_KEY);

    // Precedence order: forecast first, then air quality.
    let sources: Vec<&OpenMeteoPayload> = [forecast.as_ref(), air_quality.as_ref()]
        .into_iter()
        .flatten()
        .collect();

    let offset_seconds = validate(
        coerce(first_present(&sources, |p| p.utc_offset_seconds.as_ref()), 0.0),
        -MAX_UTC_OFFSET_SECONDS,
        MAX_UTC_OFFSET_SECONDS,
        0.0,
    );
    let offset = Duration::seconds(offset_seconds as i64);

    let location = Location {
        latitude: coerce(first_present(&sources, |p| p.latitude.as_ref()), request.latitude),
        longitude: coerce(first_present(&sources, |p| p.longitude.as_ref()), request.longitude),
        timezone: coerce_text(first_present(&sources, |p| p.timezone.as_ref()), "UTC"),
        elevation: coerce(first_present(&sources, |p| p.elevation.as_ref()), 0.0),
    };

    let merged_current = merge_blocks(sources.iter().filter_map(|p| p.current.as_ref()));
    let current = current_conditions(&normalize_object(&merged_current, CURRENT_SCHEMA));

    let hourly = forecast
        .as_ref()
        .and_then(|p| p.hourly.as_ref())
        .map(|block| hourly_series(block, offset, request))
        .unwrap_or_default();

    let daily = forecast
        .as_ref()
        .and_then(|p| p.daily.as_ref())
        .map(|block| daily_series(block, offset, request.now))
        .unwrap_or_default();

    WeatherSnapshot { location, current, hourly, daily }
}

fn parse_source(results: &FetchResults, key: &str) -> Option<OpenMeteoPayload> {
    let value = results.get(key).and_then(FetchResult::value)?;
    match OpenMeteoPayload::parse(value) {
        Ok(payload) => Some(payload),
        Err(e) => {
            tracing::warn!(source = key, error = %e, "unexpected weather payload shape");
            None
        }
    }
}

fn first_present<'a>(
    sources: &[&'a OpenMeteoPayload],
    field: impl Fn(&'a OpenMeteoPayload) -> Option<&'a Value>,
) -> Option<&'a Value> {
    sources.iter().find_map(|p| field(*p).filter(|v| !v.is_null()))
}

/// Merges objects by key; earlier objects win on collisions.
pub fn merge_blocks<'a>(blocks: impl IntoIterator<Item = &'a Map<String, Value>>) -> Map<String, Value> {
    let mut merged = Map::new();
    for block in blocks {
        for (key, value) in block {
            if value.is_null() {
                continue;
            }
            merged.entry(key.clone()).or_insert_with(|| value.clone());
        }
    }
    merged
}

fn current_conditions(record: &NormalizedRecord) -> CurrentConditions {
    let weather_code = record.number("weather_code");
    let (description, icon) = weather_code::describe(weather_code, record.number("is_day") != 0.0);

    CurrentConditions {
        time: record.text("time").to_string(),
        temperature_2m: record.number("temperature_2m"),
        relative_humidity_2m: record.number("relative_humidity_2m"),
        apparent_temperature: record.number("apparent_temperature"),
        is_day: record.number("is_day"),
        precipitation: record.number("precipitation"),
        weather_code,
        pressure_msl: record.number("pressure_msl"),
        surface_pressure: record.number("surface_pressure"),
        wind_speed_10m: record.number("wind_speed_10m"),
        wind_direction_10m: record.number("wind_direction_10m"),
        uv_index: record.number("uv_index"),
        european_aqi: record.number("european_aqi"),
        pm10: record.number("pm10"),
        pm2_5: record.number("pm2_5"),
        description: description.to_string(),
        icon: icon.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Series
// ---------------------------------------------------------------------------

/// Turns column-oriented blocks into one object per `time` entry.
fn rows(block: &Map<String, Value>) -> Vec<Map<String, Value>> {
    let Some(times) = block.get("time").and_then(Value::as_array) else {
        return Vec::new();
    };

    (0..times.len())
        .map(|i| {
            block
                .iter()
                .filter_map(|(key, column)| {
                    column.as_array().and_then(|c| c.get(i)).map(|v| (key.clone(), v.clone()))
                })
                .collect()
        })
        .collect()
}

/// Parses an upstream local timestamp (`2025-03-10T14:00`, with or
/// without seconds, or a full RFC 3339 string).
pub fn parse_local_time(text: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_local());
    }
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S"))
        .ok()
}

fn hourly_series(
    block: &Map<String, Value>,
    offset: Duration,
    request: &SnapshotRequest,
) -> Vec<HourlyForecast> {
    let mut entries: Vec<(NaiveDateTime, HourlyForecast)> = rows(block)
        .iter()
        .filter_map(|row| {
            let record = normalize_object(row, HOURLY_SCHEMA);
            let local = parse_local_time(record.text("time"))?;
            // Times near the calendar limits cannot be shifted; drop the row.
            let slot_end = local
                .checked_sub_signed(offset)?
                .and_utc()
                .checked_add_signed(Duration::hours(1))?;
            (slot_end > request.now).then(|| (local, hourly_entry(&record)))
        })
        .collect();

    entries.sort_by_key(|(t, _)| *t);
    entries
        .into_iter()
        .take(request.hourly_window)
        .map(|(_, entry)| entry)
        .collect()
}

fn hourly_entry(record: &NormalizedRecord) -> HourlyForecast {
    let weather_code = record.number("weather_code");
    let (description, icon) = weather_code::describe(weather_code, true);
    HourlyForecast {
        time: record.text("time").to_string(),
        temperature_2m: record.number("temperature_2m"),
        relative_humidity_2m: record.number("relative_humidity_2m"),
        precipitation_probability: record.number("precipitation_probability"),
        weather_code,
        description: description.to_string(),
        icon: icon.to_string(),
    }
}

fn daily_series(block: &Map<String, Value>, offset: Duration, now: DateTime<Utc>) -> Vec<DailyForecast> {
    let today = now.checked_add_signed(offset).unwrap_or(now).date_naive();

    let mut entries: Vec<(NaiveDate, DailyForecast)> = rows(block)
        .iter()
        .filter_map(|row| {
            let record = normalize_object(row, DAILY_SCHEMA);
            let date = NaiveDate::parse_from_str(record.text("time"), "%Y-%m-%d").ok()?;
            (date >= today).then(|| (date, daily_entry(&record)))
        })
        .collect();

    entries.sort_by_key(|(d, _)| *d);
    entries.into_iter().map(|(_, entry)| entry).collect()
}

fn daily_entry(record: &NormalizedRecord) -> DailyForecast {
    let weather_code = record.number("weather_code");
    let (description, icon) = weather_code::describe(weather_code, true);
    DailyForecast {
        date: record.text("time").to_string(),
        temperature_2m_max: record.number("temperature_2m_max"),
        temperature_2m_min: record.number("temperature_2m_min"),
        precipitation_sum: record.number("precipitation_sum"),
        precipitation_probability_max: record.number("precipitation_probability_max"),
        uv_index_max: record.number("uv_index_max"),
        weather_code,
        sunrise: record.text("sunrise").to_string(),
        sunset: record.text("sunset").to_string(),
        description: description.to_string(),
        icon: icon.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
