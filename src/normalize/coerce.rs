/// Safe numeric coercion and physical range validation.
///
/// Every scalar that arrives from an upstream service passes through
/// `coerce` (or `coerce_text` for labels) before it reaches a model type.
/// Upstreams report "no data" in several ways: the field is absent, it is
/// JSON `null`, or it is the literal text `"null"` / `"undefined"`. All of
/// them collapse to the caller's fallback.

use serde_json::Value;

// ---------------------------------------------------------------------------
// Numeric coercion
// ---------------------------------------------------------------------------

/// Strings upstreams use to mean "no value".
const SENTINELS: &[&str] = &["", "null", "undefined", "nan", "--"];

/// A coercion rule with its fallback fixed at construction time.
///
/// Fields with a physical baseline (sea-level pressure, for instance)
/// build their own `Coercion` rather than special-casing the fallback
/// at every call site.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coercion {
    fallback: f64,
}

impl Coercion {
    pub const fn new(fallback: f64) -> Self {
        Self { fallback }
    }

    pub fn fallback(&self) -> f64 {
        self.fallback
    }

    pub fn apply(&self, raw: Option<&Value>) -> f64 {
        coerce(raw, self.fallback)
    }
}

/// Converts an untrusted upstream value into a finite number.
///
/// Returns `fallback` for absent values, JSON null, sentinel strings,
/// unparsable text and anything that parses to NaN or infinity.
/// Numeric strings are read the way a lenient float parser would:
/// the leading number is taken and trailing units are ignored
/// (`"23.5 C"` → `23.5`).
pub fn coerce(raw: Option<&Value>, fallback: f64) -> f64 {
    let parsed = match raw {
        None | Some(Value::Null) => None,
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => parse_number(s),
        // The sensor bridge sometimes wraps a single value in an array.
        Some(Value::Array(items)) if items.len() == 1 => return coerce(items.first(), fallback),
        Some(_) => None,
    };

    match parsed {
        Some(v) if v.is_finite() => v,
        _ => fallback,
    }
}

fn parse_number(text: &str) -> Option<f64> {
    let trimmed = text.trim().trim_matches('"').trim();
    if is_sentinel(trimmed) {
        return None;
    }
    if let Ok(v) = trimmed.parse::<f64>() {
        return Some(v);
    }
    leading_number(trimmed).and_then(|prefix| prefix.parse::<f64>().ok())
}

fn is_sentinel(text: &str) -> bool {
    SENTINELS.iter().any(|s| text.eq_ignore_ascii_case(s))
}

/// Returns the longest prefix of `text` shaped like a decimal number
/// (optional sign, digits, optional fraction, optional exponent).
fn leading_number(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        if digits > 0 {
            end = frac_end;
        }
    }

    if digits == 0 {
        return None;
    }

    // Exponent only counts when it is followed by at least one digit.
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    Some(&text[..end])
}

// ---------------------------------------------------------------------------
// Text coercion
// ---------------------------------------------------------------------------

/// Converts an untrusted upstream value into a display label.
///
/// Sentinels, blanks and structured values fall back; numbers are
/// rendered as text.
pub fn coerce_text(raw: Option<&Value>, fallback: &str) -> String {
    match raw {
        Some(Value::String(s)) => {
            let trimmed = s.trim().trim_matches('"').trim();
            if is_sentinel(trimmed) {
                fallback.to_string()
            } else {
                trimmed.to_string()
            }
        }
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Array(items)) if items.len() == 1 => coerce_text(items.first(), fallback),
        _ => fallback.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Range validation
// ---------------------------------------------------------------------------

/// Inclusive plausibility bounds for a physical quantity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

impl Bounds {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// `value` if it lies inside these bounds, otherwise `fallback`.
    pub fn check(&self, value: f64, fallback: f64) -> f64 {
        validate(value, self.min, self.max, fallback)
    }
}

/// Barometric pressure, hPa.
pub const PRESSURE_BOUNDS: Bounds = Bounds::new(800.0, 1200.0);
/// Altitude above sea level, m.
pub const ALTITUDE_BOUNDS: Bounds = Bounds::new(-100.0, 9000.0);
/// Standard sea-level pressure, the baseline for missing pressure data.
pub const SEA_LEVEL_PRESSURE_HPA: f64 = 1013.25;

/// Returns `value` when it lies in `[min, max]`, otherwise `fallback`.
///
/// A rejected value is logged at `warn`; it never fails the request.
pub fn validate(value: f64, min: f64, max: f64, fallback: f64) -> f64 {
    if value.is_finite() && value >= min && value <= max {
        value
    } else {
        tracing::warn!(value, min, max, fallback, "value outside plausible range, using fallback");
        fallback
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
