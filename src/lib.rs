/// envdash: indoor/outdoor environmental dashboard service.
///
/// # Module structure
///
/// ```text
/// envdash
/// ├── model       — output types (SensorReading, WeatherSnapshot, RegionalForecast, …)
/// ├── config      — dashboard configuration loader (dashboard.toml + environment)
/// ├── fetch       — concurrent multi-source fetch with per-call failure isolation
/// ├── cache       — TTL cache with an injected clock
/// ├── db          — PostgreSQL connection + validation
/// ├── history     — indoor reading history (log, query, cleanup)
/// ├── endpoint    — HTTP API + static files
/// │   ├── handlers — async handlers over the shared application state
/// │   └── error    — ApiError + uniform error envelope
/// ├── ingest
/// │   ├── blynk      — sensor bridge pins: URL construction
/// │   ├── open_meteo — coordinate forecast + air quality: URLs + payload
/// │   ├── bmkg       — regional forecast: URL + payload
/// │   ├── nominatim  — reverse geocoding: URL + payload
/// │   └── fixtures (test only) — representative API response payloads
/// └── normalize
///     ├── coerce       — safe numeric coercion + range validation
///     ├── indoor       — pin results → SensorReading
///     ├── weather      — forecast + air quality → WeatherSnapshot
///     ├── regional     — regional payload → RegionalForecast
///     └── weather_code — WMO code → description + icon
/// ```

/// Public modules
pub mod cache;
pub mod config;
pub mod db;
pub mod endpoint;
pub mod fetch;
pub mod history;
pub mod ingest;
pub mod model;
pub mod normalize;
