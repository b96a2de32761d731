/// Indoor reading history (PostgreSQL).
///
/// A thin pass-through: each log call stores one normalized indoor
/// reading, queries return readings inside a look-back window in time
/// order, and cleanup drops rows past the retention period. Measurements
/// are stored as `NUMERIC` so values round-trip without float noise.
///
/// The store wraps the blocking `postgres` client and must be used
/// outside the async runtime.

use crate::model::{AirQualityStatus, HistoryRow, SensorReading};
use chrono::{DateTime, Duration, Utc};
use postgres::{Client, Row};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

const SCHEMA_SQL: &str = "
    CREATE TABLE IF NOT EXISTS sensor_history (
        id                 BIGSERIAL PRIMARY KEY,
        recorded_at        TIMESTAMPTZ NOT NULL DEFAULT now(),
        temperature        NUMERIC NOT NULL,
        humidity           NUMERIC NOT NULL,
        raw_gas            NUMERIC NOT NULL,
        compensated_gas    NUMERIC NOT NULL,
        air_quality_status TEXT NOT NULL,
        pressure           NUMERIC NOT NULL,
        altitude           NUMERIC NOT NULL
    );
    CREATE INDEX IF NOT EXISTS sensor_history_recorded_at_idx
        ON sensor_history (recorded_at);
";

// ---------------------------------------------------------------------------
// Range
// ---------------------------------------------------------------------------

/// Look-back window accepted by the history query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryRange {
    OneDay,
    ThreeDays,
    OneWeek,
    OneMonth,
    ThreeMonths,
    SixMonths,
    TwelveMonths,
}

impl HistoryRange {
    /// Parses `1d`, `3d`, `1w`, `1m`, `3m`, `6m` or `12m`. Anything else,
    /// including no value at all, is one day.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("3d") => HistoryRange::ThreeDays,
            Some("1w") => HistoryRange::OneWeek,
            Some("1m") => HistoryRange::OneMonth,
            Some("3m") => HistoryRange::ThreeMonths,
            Some("6m") => HistoryRange::SixMonths,
            Some("12m") => HistoryRange::TwelveMonths,
            _ => HistoryRange::OneDay,
        }
    }

    pub fn days(&self) -> i64 {
        match self {
            HistoryRange::OneDay => 1,
            HistoryRange::ThreeDays => 3,
            HistoryRange::OneWeek => 7,
            HistoryRange::OneMonth => 30,
            HistoryRange::ThreeMonths => 90,
            HistoryRange::SixMonths => 180,
            HistoryRange::TwelveMonths => 365,
        }
    }

    pub fn duration(&self) -> Duration {
        Duration::days(self.days())
    }

    /// Oldest timestamp included when querying at `now`.
    pub fn since(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - self.duration()
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

pub struct HistoryStore {
    client: Client,
}

impl HistoryStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn ensure_schema(&mut self) -> Result<(), postgres::Error> {
        self.client.batch_execute(SCHEMA_SQL)
    }

    /// Stores one reading; returns the new row id.
    pub fn record(&mut self, reading: &SensorReading, at: DateTime<Utc>) -> Result<i64, postgres::Error> {
        let row = self.client.query_one(
            "INSERT INTO sensor_history
                (recorded_at, temperature, humidity, raw_gas, compensated_gas,
                 air_quality_status, pressure, altitude)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING id",
            &[
                &at,
                &to_decimal(reading.temperature),
                &to_decimal(reading.humidity),
                &to_decimal(reading.raw_gas),
                &to_decimal(reading.compensated_gas),
                &reading.air_quality_status.label(),
                &to_decimal(reading.pressure),
                &to_decimal(reading.altitude),
            ],
        )?;
        Ok(row.get(0))
    }

    /// Readings recorded inside `range` before `now`, oldest first.
    pub fn query(&mut self, range: HistoryRange, now: DateTime<Utc>) -> Result<Vec<HistoryRow>, postgres::Error> {
        let rows = self.client.query(
            "SELECT id, recorded_at, temperature, humidity, raw_gas, compensated_gas,
                    air_quality_status, pressure, altitude
             FROM sensor_history
             WHERE recorded_at >= $1
             ORDER BY recorded_at ASC, id ASC",
            &[&range.since(now)],
        )?;
        Ok(rows.iter().map(history_row).collect())
    }

    /// Deletes rows older than `retention_days`; returns how many.
    pub fn cleanup(&mut self, retention_days: u32, now: DateTime<Utc>) -> Result<u64, postgres::Error> {
        let cutoff = now - Duration::days(i64::from(retention_days));
        self.client
            .execute("DELETE FROM sensor_history WHERE recorded_at < $1", &[&cutoff])
    }
}

/// Readings are always finite, so conversion only fails for magnitudes
/// `NUMERIC` could not hold anyway; those are stored as zero.
fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64_retain(value).unwrap_or_default().normalize()
}

fn from_decimal(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

fn history_row(row: &Row) -> HistoryRow {
    let status: String = row.get(6);
    HistoryRow {
        id: row.get(0),
        recorded_at: row.get(1),
        reading: SensorReading {
            temperature: from_decimal(row.get(2)),
            humidity: from_decimal(row.get(3)),
            raw_gas: from_decimal(row.get(4)),
            compensated_gas: from_decimal(row.get(5)),
            air_quality_status: AirQualityStatus::from_label(&status),
            pressure: from_decimal(row.get(7)),
            altitude: from_decimal(row.get(8)),
        },
    }
}
