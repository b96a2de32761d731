/// Indoor reading normalization.
///
/// Canonical fallback and bounds table for the sensor bridge pins:
///
/// | field            | pin | fallback | bounds        |
/// |------------------|-----|----------|---------------|
/// | temperature      | V0  | 0        | –             |
/// | humidity         | V1  | 0        | –             |
/// | rawGas           | V5  | 0        | –             |
/// | compensatedGas   | V6  | 0        | –             |
/// | airQualityStatus | V7  | "--"     | –             |
/// | pressure         | V8  | 1013.25  | 800–1200 hPa  |
/// | altitude         | V9  | 0        | −100–9000 m   |

use super::coerce::{ALTITUDE_BOUNDS, PRESSURE_BOUNDS, SEA_LEVEL_PRESSURE_HPA};
use super::{FieldSchema, normalize};
use crate::fetch::FetchResults;
use crate::ingest::blynk::{
    PIN_AIR_QUALITY, PIN_ALTITUDE, PIN_COMPENSATED_GAS, PIN_HUMIDITY, PIN_PRESSURE, PIN_RAW_GAS,
    PIN_TEMPERATURE,
};
use crate::model::{AirQualityStatus, SensorReading};

pub const INDOOR_SCHEMA: &[FieldSchema] = &[
    FieldSchema::number("temperature", PIN_TEMPERATURE, 0.0),
    FieldSchema::number("humidity", PIN_HUMIDITY, 0.0),
    FieldSchema::number("rawGas", PIN_RAW_GAS, 0.0),
    FieldSchema::number("compensatedGas", PIN_COMPENSATED_GAS, 0.0),
    FieldSchema::text("airQualityStatus", PIN_AIR_QUALITY, "--"),
    FieldSchema::bounded("pressure", PIN_PRESSURE, SEA_LEVEL_PRESSURE_HPA, PRESSURE_BOUNDS),
    FieldSchema::bounded("altitude", PIN_ALTITUDE, 0.0, ALTITUDE_BOUNDS),
];

impl SensorReading {
    /// Builds a reading from per-pin fetch results.
    pub fn from_results(results: &FetchResults) -> Self {
        let record = normalize(results, INDOOR_SCHEMA);

        SensorReading {
            temperature: record.number("temperature"),
            humidity: record.number("humidity"),
            raw_gas: record.number("rawGas"),
            compensated_gas: record.number("compensatedGas"),
            air_quality_status: AirQualityStatus::from_label(record.text("airQualityStatus")),
            pressure: record.number("pressure"),
            altitude: record.number("altitude"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::{FetchFailure, FetchResult};
    use crate::ingest::blynk::PIN_REGISTRY;
    use serde_json::json;

    fn healthy_results() -> FetchResults {
        let values = ["26.4", "58.2", "402", "118.6", "Good", "1008.7", "35.5"];
        PIN_REGISTRY
            .iter()
            .zip(values)
            .map(|(p, v)| (p.pin.to_string(), FetchResult::Ok(json!(v))))
            .collect()
    }

    #[test]
    fn test_schema_covers_every_registered_pin() {
        for pin in PIN_REGISTRY {
            let field = INDOOR_SCHEMA
                .iter()
                .find(|f| f.source_key == pin.pin)
                .unwrap_or_else(|| panic!("no schema entry for pin {}", pin.pin));
            assert_eq!(field.name, pin.field);
        }
    }

    #[test]
    fn test_healthy_pins_produce_upstream_values() {
        let reading = SensorReading::from_results(&healthy_results());
        assert_eq!(reading.temperature, 26.4);
        assert_eq!(reading.humidity, 58.2);
        assert_eq!(reading.raw_gas, 402.0);
        assert_eq!(reading.compensated_gas, 118.6);
        assert_eq!(reading.air_quality_status, AirQualityStatus::Good);
        assert_eq!(reading.pressure, 1008.7);
        assert_eq!(reading.altitude, 35.5);
    }

    #[test]
    fn test_implausible_pressure_and_altitude_fall_back() {
        let mut results = healthy_results();
        results.insert(PIN_PRESSURE.into(), FetchResult::Ok(json!("50000")));
        results.insert(PIN_ALTITUDE.into(), FetchResult::Ok(json!("12000")));

        let reading = SensorReading::from_results(&results);
        assert_eq!(reading.pressure, 1013.25);
        assert_eq!(reading.altitude, 0.0);
    }

    #[test]
    fn test_single_failed_pin_defaults_only_that_field() {
        let mut results = healthy_results();
        results.insert(
            PIN_HUMIDITY.into(),
            FetchResult::Failed(FetchFailure::Unavailable("connection reset".into())),
        );

        let reading = SensorReading::from_results(&results);
        assert_eq!(reading.humidity, 0.0);
        assert_eq!(reading.temperature, 26.4);
        assert_eq!(reading.pressure, 1008.7);
    }

    #[test]
    fn test_sentinel_pins_default() {
        let mut results = healthy_results();
        results.insert(PIN_PRESSURE.into(), FetchResult::Ok(json!("undefined")));
        results.insert(PIN_AIR_QUALITY.into(), FetchResult::Ok(json!("null")));

        let reading = SensorReading::from_results(&results);
        assert_eq!(reading.pressure, 1013.25);
        assert_eq!(reading.air_quality_status, AirQualityStatus::Unknown);
    }

    #[test]
    fn test_everything_failed_still_yields_complete_reading() {
        let reading = SensorReading::from_results(&FetchResults::new());
        assert_eq!(reading.temperature, 0.0);
        assert_eq!(reading.pressure, 1013.25);
        assert_eq!(reading.altitude, 0.0);
        assert_eq!(reading.air_quality_status, AirQualityStatus::Unknown);
        assert!(serde_json::to_value(&reading).is_ok());
    }
}
