/// Response normalization.
///
/// Maps keyed upstream results onto fixed output schemas. A declared
/// field is always present in the output: a successful result is coerced
/// (and range-checked where the schema says so); a failed or missing one
/// takes the field's fallback directly.
///
/// Normalization is a pure function of its inputs. Results are looked up
/// by key, so the order in which upstream calls completed has no effect.

pub mod coerce;
pub mod indoor;
pub mod regional;
pub mod weather;
pub mod weather_code;

use crate::fetch::{FetchResult, FetchResults};
use coerce::{Bounds, Coercion, coerce_text};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldKind {
    Number { coercion: Coercion, bounds: Option<Bounds> },
    Text { fallback: &'static str },
}

/// One declared output field and the fetch result it is read from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSchema {
    pub name: &'static str,
    pub source_key: &'static str,
    pub kind: FieldKind,
}

impl FieldSchema {
    pub const fn number(name: &'static str, source_key: &'static str, fallback: f64) -> Self {
        Self {
            name,
            source_key,
            kind: FieldKind::Number {
                coercion: Coercion::new(fallback),
                bounds: None,
            },
        }
    }

    pub const fn bounded(
        name: &'static str,
        source_key: &'static str,
        fallback: f64,
        bounds: Bounds,
    ) -> Self {
        Self {
            name,
            source_key,
            kind: FieldKind::Number {
                coercion: Coercion::new(fallback),
                bounds: Some(bounds),
            },
        }
    }

    pub const fn text(name: &'static str, source_key: &'static str, fallback: &'static str) -> Self {
        Self {
            name,
            source_key,
            kind: FieldKind::Text { fallback },
        }
    }

    /// Resolves this field from a raw value (`None` when the source failed).
    pub fn resolve(&self, raw: Option<&Value>) -> FieldValue {
        match self.kind {
            FieldKind::Number { coercion, bounds } => {
                let value = coercion.apply(raw);
                match bounds {
                    Some(b) => FieldValue::Number(b.check(value, coercion.fallback())),
                    None => FieldValue::Number(value),
                }
            }
            FieldKind::Text { fallback } => FieldValue::Text(coerce_text(raw, fallback)),
        }
    }
}

// ---------------------------------------------------------------------------
// Output record
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

/// A fully populated record keyed by output field name.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NormalizedRecord {
    fields: BTreeMap<&'static str, FieldValue>,
}

impl NormalizedRecord {
    /// Numeric field, `0.0` for names the schema did not declare.
    pub fn number(&self, name: &str) -> f64 {
        match self.fields.get(name) {
            Some(FieldValue::Number(v)) => *v,
            _ => 0.0,
        }
    }

    /// Text field, `"--"` for names the schema did not declare.
    pub fn text(&self, name: &str) -> &str {
        match self.fields.get(name) {
            Some(FieldValue::Text(s)) => s,
            _ => "--",
        }
    }
}

/// Normalizes keyed fetch results against a schema.
pub fn normalize(results: &FetchResults, schema: &[FieldSchema]) -> NormalizedRecord {
    let fields = schema
        .iter()
        .map(|field| {
            let raw = results.get(field.source_key).and_then(FetchResult::value);
            (field.name, field.resolve(raw))
        })
        .collect();

    NormalizedRecord { fields }
}

/// Normalizes the fields of an already-merged JSON object against a schema.
pub fn normalize_object(object: &Map<String, Value>, schema: &[FieldSchema]) -> NormalizedRecord {
    let fields = schema
        .iter()
        .map(|field| (field.name, field.resolve(object.get(field.source_key))))
        .collect();

    NormalizedRecord { fields }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
