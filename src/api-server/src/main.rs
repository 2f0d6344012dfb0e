//! Rolegate API Server
//!
//! Serves the role-gated resource operations.
//!
//! # Usage
//!
//! ```bash
//! # Start with a configuration file
//! rolegate-server --config rolegate.toml
//!
//! # Point at a user store from the command line
//! rolegate-server --store-url https://project.example.co --store-api-key $KEY
//!
//! # Enable debug logging
//! RUST_LOG=debug rolegate-server --config rolegate.toml
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Log filter, takes precedence over `--log-level`
//! - `ROLEGATE_CONFIG`: Configuration file path
//! - `ROLEGATE_HOST` / `ROLEGATE_PORT`: Listen address
//! - `ROLEGATE_STORE_URL` / `ROLEGATE_STORE_API_KEY`: User store endpoint and key
//! - `ROLEGATE_STORE_TIMEOUT_MS`: User store request timeout

use anyhow::Result;
use api_server::{AppState, ConfigOverrides, ServerBuilder, ServiceConfig};
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Rolegate API Server
#[derive(Parser, Debug)]
#[command(
    name = "rolegate-server",
    version,
    about = "Role-gated HTTP operations backed by an external user store",
    long_about = None
)]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short = 'c', long, env = "ROLEGATE_CONFIG")]
    config: Option<PathBuf>,

    /// Host to bind to
    #[arg(short = 'H', long, env = "ROLEGATE_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short = 'p', long, env = "ROLEGATE_PORT")]
    port: Option<u16>,

    /// Base URL of the user store
    #[arg(long, env = "ROLEGATE_STORE_URL")]
    store_url: Option<String>,

    /// API key for the user store
    #[arg(long, env = "ROLEGATE_STORE_API_KEY", hide_env_values = true)]
    store_api_key: Option<String>,

    /// User store request timeout in milliseconds
    #[arg(long, env = "ROLEGATE_STORE_TIMEOUT_MS")]
    store_timeout_ms: Option<u64>,

    /// Enable JSON logging format
    #[arg(long, env = "ROLEGATE_JSON_LOGS")]
    json_logs: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            host: self.host.clone(),
            port: self.port,
            store_url: self.store_url.clone(),
            store_api_key: self.store_api_key.clone(),
            store_timeout_ms: self.store_timeout_ms,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_tracing(&args)?;

    info!("Starting Rolegate API Server");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let mut config = match &args.config {
        Some(path) => {
            info!(path = %path.display(), "Loading configuration");
            ServiceConfig::load(path)?
        }
        None => ServiceConfig::default(),
    };
    config.apply_overrides(args.overrides());
    config.validate()?;

    let state = AppState::from_config(&config)?;
    info!("Application state initialized");

    let server = ServerBuilder::new()
        .host(config.server.host.clone())
        .port(config.server.port)
        .request_timeout(config.request_timeout())
        .cors_origins(config.server.cors_origins.clone())
        .state(state)
        .build()?;

    info!("Press Ctrl+C to shutdown gracefully");

    if let Err(e) = server.run().await {
        error!("Server error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Initialize tracing/logging subsystem
fn init_tracing(args: &Args) -> Result<()> {
    let log_level = args.log_level.parse::<tracing::Level>().unwrap_or_else(|_| {
        eprintln!("Invalid log level '{}', using 'info'", args.log_level);
        tracing::Level::INFO
    });

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter(log_level).into());

    if args.json_logs {
        // JSON structured logging for production
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .try_init()?;
    }

    Ok(())
}

/// Filter used when `RUST_LOG` is unset
///
/// HTTP framework targets follow the requested level down to `debug` and
/// stay at `info` otherwise.
fn default_filter(log_level: tracing::Level) -> String {
    // Level ordering is by verbosity: TRACE > DEBUG > INFO
    let http_level = if log_level >= tracing::Level::DEBUG {
        "debug"
    } else {
        "info"
    };
    format!(
        "rolegate_server={lvl},api_server={lvl},rolegate_authz={lvl},tower_http={http},axum={http}",
        lvl = log_level,
        http = http_level,
    )
}
