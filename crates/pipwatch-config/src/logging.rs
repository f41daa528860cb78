//! Centralized logging initialization with environment variable support

use crate::{AppConfig, LogFormat};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Pick the log level from the CLI flag, `LOG_LEVEL`, and the config file
///
/// `--verbose` wins over `LOG_LEVEL`, which wins over `logging.level`.
pub fn resolve_level(config: &AppConfig, verbose: bool) -> tracing::Level {
    if verbose {
        return tracing::Level::DEBUG;
    }
    std::env::var("LOG_LEVEL")
        .ok()
        .and_then(|level| level.parse().ok())
        .or_else(|| config.logging.level.parse().ok())
        .unwrap_or(tracing::Level::INFO)
}

/// Pick the output format, honoring a `LOG_FORMAT` override
pub fn resolve_format(config: &AppConfig) -> LogFormat {
    std::env::var("LOG_FORMAT")
        .ok()
        .and_then(|f| match f.to_lowercase().as_str() {
            "json" => Some(LogFormat::Json),
            "pretty" | "human" => Some(LogFormat::Pretty),
            _ => None,
        })
        .unwrap_or_else(|| config.logging.format.clone())
}

/// Initialize tracing subscriber with environment variable support
///
/// Environment variables (in priority order):
/// - `RUST_LOG`: Standard Rust log filter (takes precedence over all)
/// - `LOG_LEVEL`: Set log level (trace, debug, info, warn, error)
/// - `LOG_FORMAT`: Override format (json, pretty)
///
/// # Examples
///
/// ```bash
/// # Show every registry decision
/// pipwatch --show-mappings --verbose
///
/// # Machine-readable diagnostics
/// LOG_FORMAT=json pipwatch script.py --dry-run
///
/// # Module-specific filtering
/// RUST_LOG=pipwatch_registry=debug pipwatch --update-mappings
/// ```
pub fn initialize(config: &AppConfig, verbose: bool) {
    let env_filter = match std::env::var("RUST_LOG") {
        Ok(filter) if !filter.is_empty() => EnvFilter::new(filter),
        _ => EnvFilter::new(resolve_level(config, verbose).to_string().to_lowercase()),
    };

    // Diagnostics go to stderr; stdout is reserved for command output
    let result = match resolve_format(config) {
        LogFormat::Json => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .compact()
                    .without_time()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
    };

    if let Err(e) = result {
        tracing::debug!(error = %e, "Tracing subscriber already initialized");
    }
}
