//! Environmental dashboard service
//!
//! Serves the dashboard UI and its JSON API:
//! 1. Indoor readings from the sensor bridge (one call per pin, concurrent)
//! 2. Outdoor weather from a regional forecast and a coordinate forecast
//! 3. Reverse geocoding for the coordinate the UI is showing
//! 4. A PostgreSQL history of indoor readings, written by an external scheduler
//!
//! Usage:
//!   cargo run --release                  # Port from config / PORT (default 3000)
//!   cargo run --release -- --port 8080   # Override the port
//!
//! Environment:
//!   BLYNK_AUTH_TOKEN     - sensor bridge token (required for indoor readings)
//!   PORT                 - listening port
//!   FORECAST_LOCATION_ID - regional forecast area code
//!   DATABASE_URL         - PostgreSQL connection string (history)
//!   DASHBOARD_CONFIG     - config file path (default dashboard.toml)
//!   RUST_LOG             - log filter (default info)

use envdash::{config, endpoint};
use std::env;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("🌤  Environmental Dashboard");
    println!("==========================\n");

    let args: Vec<String> = env::args().collect();
    let mut port_override: Option<u16> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--port" => match args.get(i + 1).and_then(|p| p.parse().ok()) {
                Some(port) => {
                    port_override = Some(port);
                    i += 2;
                }
                None => {
                    eprintln!("Error: --port requires a port number");
                    std::process::exit(1);
                }
            },
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                eprintln!("Usage: {} [--port PORT]", args[0]);
                std::process::exit(1);
            }
        }
    }

    let mut config = match config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("\n❌ Configuration error: {}\n", e);
            std::process::exit(1);
        }
    };
    if let Some(port) = port_override {
        config.server.port = port;
    }

    if config.blynk.auth_token.is_none() {
        tracing::warn!("BLYNK_AUTH_TOKEN is not set; indoor readings will fail until it is");
    }
    if config.history.database_url.is_none() {
        tracing::warn!("DATABASE_URL is not set; history endpoints will fail until it is");
    }

    println!("✓ Configuration loaded");
    println!("   Port:            {}", config.server.port);
    println!("   Static files:    {}", config.server.static_dir.display());
    println!("   Forecast region: {}", config.regional.location_id);
    println!("   Upstream timeout: {} ms", config.upstream.timeout_ms);
    println!("   Cache TTL:       {} s\n", config.cache.ttl_secs);

    if let Err(e) = endpoint::start_endpoint_server(config) {
        eprintln!("\n❌ Server error: {}\n", e);
        std::process::exit(1);
    }
}
