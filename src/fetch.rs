/// Multi-source fetch aggregator.
///
/// Issues every upstream request for a capability at once and waits for
/// all of them to settle. Each request resolves to a `FetchResult`; a
/// failing request never cancels or delays its siblings, and nothing
/// escapes this module as an error.
///
/// Two request shapes are supported and both produce the same
/// `FetchResults` map:
/// - many small requests, one per field (`fetch_all`)
/// - one request whose JSON body carries several named fields (`fetch_batch`)

use futures::future::join_all;
use serde_json::Value;
use crate::config::UpstreamConfig;
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Request descriptions
// ---------------------------------------------------------------------------

/// How an upstream body should be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    /// Plain text, kept verbatim as a JSON string.
    Text,
    /// JSON document.
    Json,
}

/// Which part of a JSON body a request contributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extract {
    Whole,
    /// RFC 6901 JSON pointer, e.g. `/current/temperature_2m`.
    Pointer(String),
}

/// One upstream call contributing one keyed result.
///
/// Keys must be unique within one `fetch_all` call; results are stored by
/// key, so a repeated key would overwrite an earlier result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchSpec {
    pub key: String,
    pub url: String,
    pub kind: ResponseKind,
    pub extract: Extract,
}

impl FetchSpec {
    pub fn text(key: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            url: url.into(),
            kind: ResponseKind::Text,
            extract: Extract::Whole,
        }
    }

    pub fn json(key: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            url: url.into(),
            kind: ResponseKind::Json,
            extract: Extract::Whole,
        }
    }

    pub fn with_pointer(mut self, pointer: impl Into<String>) -> Self {
        self.extract = Extract::Pointer(pointer.into());
        self
    }
}

/// One upstream call contributing several keyed results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSpec {
    pub url: String,
    /// `(key, JSON pointer)` pairs read from the one response body.
    pub fields: Vec<(String, String)>,
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Why a single upstream call produced no usable value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchFailure {
    #[error("upstream unavailable: {0}")]
    Unavailable(String),
    #[error("upstream returned HTTP {0}")]
    Status(u16),
    #[error("upstream timed out after {0} ms")]
    Timeout(u64),
    #[error("malformed upstream response: {0}")]
    Malformed(String),
}

/// Outcome of one upstream call.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchResult {
    Ok(Value),
    Failed(FetchFailure),
}

impl FetchResult {
    pub fn is_ok(&self) -> bool {
        matches!(self, FetchResult::Ok(_))
    }

    pub fn value(&self) -> Option<&Value> {
        match self {
            FetchResult::Ok(v) => Some(v),
            FetchResult::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&FetchFailure> {
        match self {
            FetchResult::Ok(_) => None,
            FetchResult::Failed(f) => Some(f),
        }
    }
}

/// Results keyed by field. Ordered by key, never by arrival.
pub type FetchResults = BTreeMap<String, FetchResult>;

/// Returns true when every result in the map failed (or the map is empty).
pub fn all_failed(results: &FetchResults) -> bool {
    results.values().all(|r| !r.is_ok())
}

/// Summarizes failures as `key: cause` pairs for error details and logs.
pub fn describe_failures(results: &FetchResults) -> String {
    results
        .iter()
        .filter_map(|(key, r)| r.failure().map(|f| format!("{}: {}", key, f)))
        .collect::<Vec<_>>()
        .join("; ")
}

// ---------------------------------------------------------------------------
// Aggregator
// ---------------------------------------------------------------------------

/// Fans requests out over a shared HTTP client.
///
/// The client (connection pool, user agent) is read-only shared
/// configuration; each request gets its own timeout.
#[derive(Debug, Clone)]
pub struct Aggregator {
    client: reqwest::Client,
    timeout: Duration,
}

impl Aggregator {
    pub fn new(client: reqwest::Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// Builds an aggregator with its own client.
    pub fn from_config(config: &UpstreamConfig) -> Result<Self, reqwest::Error> {
        let timeout = config.timeout();
        let mut builder = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .connect_timeout(timeout);
        if !config.keep_alive {
            builder = builder.pool_max_idle_per_host(0);
        }
        Ok(Self::new(builder.build()?, timeout))
    }

    /// Issues all requests concurrently and resolves once every one of
    /// them has settled.
    pub async fn fetch_all(&self, specs: &[FetchSpec]) -> FetchResults {
        debug_assert!(keys_unique(specs), "duplicate fetch key in {:?}", specs);

        let pending = specs.iter().map(|spec| async move {
            let result = match self.fetch_body(&spec.url, spec.kind).await {
                Ok(body) => extract(&body, &spec.extract),
                Err(failure) => FetchResult::Failed(failure),
            };
            (spec.key.clone(), result)
        });

        let results: FetchResults = join_all(pending).await.into_iter().collect();
        log_failures(&results);
        results
    }

    /// Issues one request and splits its JSON body into keyed results.
    ///
    /// If the request itself fails, every field it would have contributed
    /// carries that failure.
    pub async fn fetch_batch(&self, batch: &BatchSpec) -> FetchResults {
        let body = self.fetch_body(&batch.url, ResponseKind::Json).await;

        let results: FetchResults = batch
            .fields
            .iter()
            .map(|(key, pointer)| {
                let result = match &body {
                    Ok(value) => extract(value, &Extract::Pointer(pointer.clone())),
                    Err(failure) => FetchResult::Failed(failure.clone()),
                };
                (key.clone(), result)
            })
            .collect();

        log_failures(&results);
        results
    }

    async fn fetch_body(&self, url: &str, kind: ResponseKind) -> Result<Value, FetchFailure> {
        match tokio::time::timeout(self.timeout, self.request(url, kind)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(FetchFailure::Timeout(self.timeout.as_millis() as u64)),
        }
    }

    async fn request(&self, url: &str, kind: ResponseKind) -> Result<Value, FetchFailure> {
        // URLs carry credentials (the sensor bridge token is a query
        // parameter), so they are stripped from error messages.
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchFailure::Unavailable(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchFailure::Status(status.as_u16()));
        }

        let text = response
            .text()
            .await
            .map_err(|e| FetchFailure::Unavailable(e.without_url().to_string()))?;

        match kind {
            ResponseKind::Text => Ok(Value::String(text)),
            ResponseKind::Json => serde_json::from_str(&text)
                .map_err(|e| FetchFailure::Malformed(format!("JSON deserialization failed: {}", e))),
        }
    }
}

fn keys_unique(specs: &[FetchSpec]) -> bool {
    let mut seen = std::collections::BTreeSet::new();
    specs.iter().all(|spec| seen.insert(spec.key.as_str()))
}

fn extract(body: &Value, extract: &Extract) -> FetchResult {
    match extract {
        Extract::Whole => FetchResult::Ok(body.clone()),
        Extract::Pointer(pointer) => match body.pointer(pointer) {
            Some(value) => FetchResult::Ok(value.clone()),
            None => FetchResult::Failed(FetchFailure::Malformed(format!("missing field {}", pointer))),
        },
    }
}

fn log_failures(results: &FetchResults) {
    for (key, result) in results {
        if let FetchResult::Failed(failure) = result {
            tracing::warn!(key = %key, %failure, "upstream fetch failed");
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
