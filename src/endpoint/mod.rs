/// HTTP endpoint for the environmental dashboard
///
/// Serves normalized indoor and outdoor readings to the browser UI, the
/// reading history, and the UI's static files.
///
/// Endpoints:
/// - GET /api/blynk                  - Current indoor sensor reading
/// - GET /api/weather                - Regional forecast for the configured area
/// - GET /api/openmeteo?lat=&lon=    - Coordinate weather snapshot (defaults to Jakarta)
/// - GET /api/geocode?lat=&lon=      - Place name for a coordinate
/// - GET|POST /api/history/log       - Store the current indoor reading
/// - GET /api/history?range=         - Stored readings (1d, 3d, 1w, 1m, 3m, 6m, 12m)
/// - GET|POST /api/history/cleanup   - Drop readings past the retention period
/// - GET /health                     - Service health check
/// - GET /*                          - Static files
///
/// The accept loop is single threaded. Each async handler is driven to
/// completion on a current-thread runtime, so the upstream calls behind
/// one request run concurrently while requests are served one at a time.
/// History uses the blocking database client and is called outside the
/// runtime.

pub mod error;
pub mod handlers;

use crate::cache::{SharedClock, SystemClock};
use crate::config::DashboardConfig;
use crate::db;
use crate::history::{HistoryRange, HistoryStore};
use error::ApiError;
use handlers::AppState;
use serde::Serialize;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::io::Cursor;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tiny_http::{Header, Method, Response, Server};

const API_ENDPOINTS: &[&str] = &[
    "/api/blynk",
    "/api/weather",
    "/api/openmeteo?lat={lat}&lon={lon}",
    "/api/geocode?lat={lat}&lon={lon}",
    "/api/history?range={1d|3d|1w|1m|3m|6m|12m}",
    "/api/history/log",
    "/api/history/cleanup",
    "/health",
];

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to build async runtime: {0}")]
    Runtime(#[from] std::io::Error),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("failed to bind port {port}: {reason}")]
    Bind { port: u16, reason: String },
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Json(Value),
    Text(String),
    File { bytes: Vec<u8>, content_type: &'static str },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Body,
}

impl ApiResponse {
    pub fn json(status: u16, value: Value) -> Self {
        Self { status, body: Body::Json(value) }
    }

    pub fn text(status: u16, text: impl Into<String>) -> Self {
        Self { status, body: Body::Text(text.into()) }
    }

    fn ok<T: Serialize>(record: &T) -> Self {
        match serde_json::to_value(record) {
            Ok(value) => Self::json(200, value),
            Err(e) => {
                tracing::error!(error = %e, "failed to serialize response");
                Self::json(500, json!({ "error": "Failed to serialize response" }))
            }
        }
    }

    /// Parsed JSON body; `Value::Null` for non-JSON bodies.
    pub fn json_body(&self) -> Value {
        match &self.body {
            Body::Json(value) => value.clone(),
            _ => Value::Null,
        }
    }

    pub fn into_response(self) -> Response<Cursor<Vec<u8>>> {
        let (bytes, content_type) = match self.body {
            Body::Json(value) => (
                serde_json::to_vec_pretty(&value).unwrap_or_default(),
                "application/json",
            ),
            Body::Text(text) => (text.into_bytes(), "text/plain; charset=utf-8"),
            Body::File { bytes, content_type } => (bytes, content_type),
        };

        let response = Response::from_data(bytes).with_status_code(self.status);
        match Header::from_bytes(&b"Content-Type"[..], content_type.as_bytes()) {
            Ok(header) => response.with_header(header),
            Err(()) => response,
        }
    }
}

// ---------------------------------------------------------------------------
// Endpoint
// ---------------------------------------------------------------------------

pub struct Endpoint {
    state: AppState,
    runtime: tokio::runtime::Runtime,
    history: Option<HistoryStore>,
}

impl Endpoint {
    pub fn new(config: DashboardConfig, clock: SharedClock) -> Result<Self, ServerError> {
        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
        let state = AppState::new(config, clock)?;
        Ok(Self {
            state,
            runtime,
            history: None,
        })
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.state.config
    }

    /// Routes one request.
    pub fn handle(&mut self, method: &Method, url: &str) -> ApiResponse {
        let (path, query) = split_url(url);
        let is_read = matches!(method, Method::Get | Method::Head);
        let is_trigger = is_read || matches!(method, Method::Post);

        let outcome = match path {
            "/health" if is_read => Ok(handle_health()),
            "/api/blynk" if is_read => {
                let state = &self.state;
                self.runtime
                    .block_on(handlers::indoor_reading(state))
                    .map(|r| ApiResponse::ok(&r))
            }
            "/api/weather" if is_read => {
                let state = &self.state;
                self.runtime
                    .block_on(handlers::regional_forecast(state))
                    .map(|f| ApiResponse::ok(&f))
            }
            "/api/openmeteo" if is_read => {
                let open_meteo = &self.state.config.open_meteo;
                let latitude = parse_coordinate(query.get("lat"), 90.0).unwrap_or(open_meteo.default_latitude);
                let longitude = parse_coordinate(query.get("lon"), 180.0).unwrap_or(open_meteo.default_longitude);
                let state = &self.state;
                self.runtime
                    .block_on(handlers::weather_snapshot(state, latitude, longitude))
                    .map(|s| ApiResponse::ok(&s))
            }
            "/api/geocode" if is_read => self.handle_geocode(&query),
            "/api/history/log" if is_trigger => self.handle_history_log(),
            "/api/history/cleanup" if is_trigger => self.handle_history_cleanup(),
            "/api/history" if is_read => self.handle_history_query(&query),
            _ if path.starts_with("/api/") || path == "/health" => Ok(not_found(path, is_trigger)),
            _ if is_read => Ok(self.handle_static(path)),
            _ => Ok(ApiResponse::json(405, json!({ "error": "Method not allowed" }))),
        };

        outcome.unwrap_or_else(|e| {
            if e.status() >= 500 {
                tracing::error!(path, error = %e, details = %e.details().unwrap_or_default(), "request failed");
            }
            ApiResponse::json(e.status(), e.envelope(self.state.clock.now()))
        })
    }

    fn handle_geocode(&mut self, query: &HashMap<String, String>) -> Result<ApiResponse, ApiError> {
        let (Some(latitude), Some(longitude)) = (
            parse_coordinate(query.get("lat"), 90.0),
            parse_coordinate(query.get("lon"), 180.0),
        ) else {
            return Err(ApiError::InputInvalid("Latitude and Longitude are required".to_string()));
        };

        let state = &self.state;
        self.runtime
            .block_on(handlers::place_name(state, latitude, longitude))
            .map(|p| ApiResponse::ok(&p))
    }

    fn handle_history_log(&mut self) -> Result<ApiResponse, ApiError> {
        let state = &self.state;
        let reading = self.runtime.block_on(handlers::indoor_reading(state))?;
        let now = self.state.clock.now();

        let id = self
            .with_history(|store| store.record(&reading, now), "Failed to store reading")?;
        tracing::info!(id, "reading logged");
        Ok(ApiResponse::text(200, format!("Reading #{} logged at {}", id, now.to_rfc3339())))
    }

    fn handle_history_query(&mut self, query: &HashMap<String, String>) -> Result<ApiResponse, ApiError> {
        let range = HistoryRange::parse(query.get("range").map(String::as_str));
        let now = self.state.clock.now();
        let rows = self.with_history(|store| store.query(range, now), "Failed to query history")?;
        Ok(ApiResponse::ok(&rows))
    }

    fn handle_history_cleanup(&mut self) -> Result<ApiResponse, ApiError> {
        let retention_days = self.state.config.history.retention_days;
        let now = self.state.clock.now();
        let deleted = self.with_history(
            |store| store.cleanup(retention_days, now),
            "Failed to clean up history",
        )?;
        tracing::info!(deleted, retention_days, "history cleaned up");
        Ok(ApiResponse::text(
            200,
            format!("Deleted {} readings older than {} days", deleted, retention_days),
        ))
    }

    /// Runs `op` against the history store, connecting on first use. A
    /// failed statement drops the connection so the next call reconnects.
    fn with_history<T>(
        &mut self,
        op: impl FnOnce(&mut HistoryStore) -> Result<T, postgres::Error>,
        context: &'static str,
    ) -> Result<T, ApiError> {
        if self.history.is_none() {
            let client = db::connect_with_validation(self.state.config.history.database_url.as_deref())
                .map_err(|e| ApiError::Storage {
                    context: "History database unavailable",
                    details: e.to_string(),
                })?;
            let mut store = HistoryStore::new(client);
            store.ensure_schema().map_err(|e| ApiError::Storage {
                context: "Failed to prepare history table",
                details: e.to_string(),
            })?;
            self.history = Some(store);
        }

        let store = self.history.as_mut().ok_or(ApiError::Storage {
            context: "History database unavailable",
            details: "no connection".to_string(),
        })?;

        op(store).map_err(|e| {
            self.history = None;
            ApiError::Storage { context, details: e.to_string() }
        })
    }

    fn handle_static(&self, path: &str) -> ApiResponse {
        let Some(file) = static_path(&self.state.config.server.static_dir, path) else {
            return ApiResponse::json(404, json!({ "error": "Not found" }));
        };

        match std::fs::read(&file) {
            Ok(bytes) => ApiResponse {
                status: 200,
                body: Body::File { bytes, content_type: content_type(&file) },
            },
            Err(_) => ApiResponse::json(404, json!({ "error": "Not found" })),
        }
    }

    /// Accept loop. Runs until the server is dropped or unblocked.
    pub fn serve(mut self, server: Server) {
        for request in server.incoming_requests() {
            let started = Instant::now();
            let method = request.method().clone();
            let url = request.url().to_string();

            let response = self.handle(&method, &url);
            let status = response.status;

            // Query strings are left out: they carry coordinates only, but
            // the path alone is enough to read the access log.
            tracing::info!(
                method = %method,
                path = split_url(&url).0,
                status,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "request"
            );

            if let Err(e) = request.respond(response.into_response()) {
                tracing::warn!(error = %e, "failed to send response");
            }
        }
    }
}

/// Binds the configured port and serves until the process exits.
pub fn start_endpoint_server(config: DashboardConfig) -> Result<(), ServerError> {
    let port = config.server.port;
    let endpoint = Endpoint::new(config, Arc::new(SystemClock))?;
    let server = Server::http(("0.0.0.0", port)).map_err(|e| ServerError::Bind {
        port,
        reason: e.to_string(),
    })?;

    tracing::info!(port, "endpoint server listening");
    endpoint.serve(server);
    Ok(())
}

fn handle_health() -> ApiResponse {
    ApiResponse::json(
        200,
        json!({
            "status": "ok",
            "service": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
        }),
    )
}

fn not_found(path: &str, known_method: bool) -> ApiResponse {
    if !known_method || API_ENDPOINTS.iter().any(|e| e.split('?').next() == Some(path)) {
        return ApiResponse::json(405, json!({ "error": "Method not allowed" }));
    }
    ApiResponse::json(
        404,
        json!({
            "error": "Not found",
            "available_endpoints": API_ENDPOINTS,
        }),
    )
}

// ---------------------------------------------------------------------------
// Request parsing
// ---------------------------------------------------------------------------

fn split_url(url: &str) -> (&str, HashMap<String, String>) {
    let (path, query) = url.split_once('?').unwrap_or((url, ""));
    (path, parse_query(query))
}

/// Decodes `a=1&b=two` into a map. Later duplicates win.
pub fn parse_query(query: &str) -> HashMap<String, String> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter_map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let key = urlencoding::decode(&key.replace('+', " ")).ok()?.into_owned();
            let value = urlencoding::decode(&value.replace('+', " ")).ok()?.into_owned();
            Some((key, value))
        })
        .collect()
}

/// A finite coordinate within `±limit`, or `None`.
fn parse_coordinate(raw: Option<&String>, limit: f64) -> Option<f64> {
    raw.and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite() && v.abs() <= limit)
}

/// Maps a request path into the static directory, refusing anything that
/// would step outside it.
fn static_path(root: &Path, request_path: &str) -> Option<PathBuf> {
    let decoded = urlencoding::decode(request_path).ok()?;
    let relative = decoded.trim_start_matches('/');
    let relative = if relative.is_empty() || relative.ends_with('/') {
        format!("{}index.html", relative)
    } else {
        relative.to_string()
    };

    let mut path = root.to_path_buf();
    for component in Path::new(&relative).components() {
        match component {
            Component::Normal(part) => path.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }
    Some(path)
}

fn content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("html") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js") => "application/javascript; charset=utf-8",
        Some("json") => "application/json",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("ico") => "image/x-icon",
        Some("txt") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
