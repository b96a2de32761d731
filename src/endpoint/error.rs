/// Request-level errors and the uniform error envelope.
///
/// Per-field upstream failures never reach this type; they are absorbed
/// during normalization. Only fail-fast conditions and failures that leave
/// nothing to serve become an `ApiError`.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Value, json};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ApiError {
    /// A required credential or setting is absent; no upstream call was made.
    #[error("{0} is not configured")]
    ConfigurationMissing(&'static str),

    /// Request parameters failed validation before any upstream call.
    #[error("{0}")]
    InputInvalid(String),

    /// Every upstream call behind the request failed.
    #[error("{context}")]
    TotalFailure { context: &'static str, details: String },

    /// The history database could not be reached or rejected a statement.
    #[error("{context}")]
    Storage { context: &'static str, details: String },
}

impl ApiError {
    pub fn status(&self) -> u16 {
        match self {
            ApiError::InputInvalid(_) => 400,
            ApiError::ConfigurationMissing(_) | ApiError::TotalFailure { .. } | ApiError::Storage { .. } => 500,
        }
    }

    pub fn details(&self) -> Option<String> {
        match self {
            ApiError::ConfigurationMissing(name) => {
                Some(format!("Set {} in the environment or in .env.local", name))
            }
            ApiError::InputInvalid(_) => None,
            ApiError::TotalFailure { details, .. } | ApiError::Storage { details, .. } => Some(details.clone()),
        }
    }

    /// JSON body sent to the client.
    ///
    /// Input errors carry only `error`; everything else carries
    /// `{error, details, timestamp}` with a millisecond UTC timestamp.
    pub fn envelope(&self, now: DateTime<Utc>) -> Value {
        match self.details() {
            None => json!({ "error": self.to_string() }),
            Some(details) => json!({
                "error": self.to_string(),
                "details": details,
                "timestamp": now.to_rfc3339_opts(SecondsFormat::Millis, true),
            }),
        }
    }
}
