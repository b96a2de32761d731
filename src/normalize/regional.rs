/// Regional forecast normalization.

use super::coerce::{coerce, coerce_text};
use super::{FieldSchema, NormalizedRecord, normalize_object};
use crate::ingest::bmkg::{RegionalPayload, SLOT_HOURS};
use crate::model::{ForecastSlot, RegionalForecast, RegionalLocation};
use chrono::{DateTime, Duration, NaiveDateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};

const SLOT_SCHEMA: &[FieldSchema] = &[
    FieldSchema::text("datetime", "datetime", "--"),
    FieldSchema::text("utc_datetime", "utc_datetime", "--"),
    FieldSchema::number("temperature", "t", 0.0),
    FieldSchema::number("humidity", "hu", 0.0),
    FieldSchema::number("wind_speed", "ws", 0.0),
    FieldSchema::text("wind_direction", "wd", "--"),
    FieldSchema::number("cloud_cover", "tcc", 0.0),
    FieldSchema::text("visibility", "vs_text", "--"),
    FieldSchema::text("description_en", "weather_desc_en", "--"),
    FieldSchema::text("description", "weather_desc", "--"),
    FieldSchema::text("icon", "image", "--"),
];

/// Region name parts, most specific first.
const NAME_PARTS: &[&str] = &["desa", "kecamatan", "kotkab", "provinsi"];

/// Builds the regional forecast, dropping slots that ended before `now`.
pub fn normalize_regional(payload: &RegionalPayload, now: DateTime<Utc>) -> RegionalForecast {
    let location = region(payload.location());

    let mut slots: Vec<(DateTime<Utc>, ForecastSlot)> = payload
        .slots()
        .filter_map(|raw| {
            let record = normalize_object(raw, SLOT_SCHEMA);
            let start = slot_start(&record)?;
            let end = start.checked_add_signed(Duration::hours(SLOT_HOURS))?;
            (end > now).then(|| (start, slot(&record, start)))
        })
        .collect();

    slots.sort_by_key(|(start, _)| *start);

    RegionalForecast {
        location,
        forecasts: slots.into_iter().map(|(_, s)| s).collect(),
    }
}

fn region(lokasi: Option<&Map<String, Value>>) -> RegionalLocation {
    let Some(lokasi) = lokasi else {
        return RegionalLocation {
            name: "--".to_string(),
            latitude: 0.0,
            longitude: 0.0,
            timezone: "UTC".to_string(),
        };
    };

    // The first three parts identify the area well enough for a header.
    let name = NAME_PARTS
        .iter()
        .map(|key| coerce_text(lokasi.get(*key), ""))
        .filter(|part| !part.is_empty())
        .take(3)
        .collect::<Vec<_>>()
        .join(", ");

    RegionalLocation {
        name: if name.is_empty() { "--".to_string() } else { name },
        latitude: coerce(lokasi.get("lat"), 0.0),
        longitude: coerce(lokasi.get("lon"), 0.0),
        timezone: coerce_text(lokasi.get("timezone"), "UTC"),
    }
}

fn slot_start(record: &NormalizedRecord) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(record.text("datetime")) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(record.text("utc_datetime"), "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}

fn slot(record: &NormalizedRecord, start: DateTime<Utc>) -> ForecastSlot {
    let description = match record.text("description_en") {
        "--" => record.text("description"),
        english => english,
    };

    ForecastSlot {
        time: start.to_rfc3339_opts(SecondsFormat::Secs, true),
        temperature: record.number("temperature"),
        humidity: record.number("humidity"),
        wind_speed: record.number("wind_speed"),
        wind_direction: record.text("wind_direction").to_string(),
        cloud_cover: record.number("cloud_cover"),
        visibility: record.text("visibility").to_string(),
        description: description.to_string(),
        icon: record.text("icon").to_string(),
    }
}
