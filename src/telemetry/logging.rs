//! Logging configuration and initialization
//!
//! Structured logging with tracing: compact console output for development,
//! JSON for log aggregation, and an optional non-blocking log file.

use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

/// Environment variable holding the log filter
pub const LOG_FILTER_ENV: &str = "PAGES_LOG";
/// Environment variable selecting the output format (`json`)
pub const LOG_FORMAT_ENV: &str = "PAGES_LOG_FORMAT";

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Enable console output (default: true)
    pub console_enabled: bool,
    /// Also write to this file when set
    pub file_path: Option<PathBuf>,
    /// Use JSON format for console logs (default: false)
    pub json_format: bool,
    /// Default log level filter (default: "info")
    pub default_level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            console_enabled: true,
            file_path: None,
            json_format: false,
            default_level: "info".to_string(),
        }
    }
}

/// Resolve the output format: the environment wins over the configured value
fn use_json(env_value: Option<&str>, configured: bool) -> bool {
    match env_value {
        Some(value) => value.eq_ignore_ascii_case("json"),
        None => configured,
    }
}

/// Initialize the logging system with the given configuration
///
/// Returns a guard that must be kept alive for the duration of the program
/// so file logging is flushed.
///
/// # Environment Variables
///
/// - `PAGES_LOG`: log level filter (e.g. "debug", "info,immersive_pages=debug"),
///   falling back to `RUST_LOG`, then to the configured default
/// - `PAGES_LOG_FORMAT`: set to "json" for JSON output
pub fn init_logging(config: &LogConfig) -> Result<Option<WorkerGuard>, Box<dyn std::error::Error + Send + Sync>> {
    let env_filter = EnvFilter::try_from_env(LOG_FILTER_ENV)
        .or_else(|_| EnvFilter::try_from_env("RUST_LOG"))
        .unwrap_or_else(|_| EnvFilter::new(&config.default_level));

    let format_env = std::env::var(LOG_FORMAT_ENV).ok();
    let json = use_json(format_env.as_deref(), config.json_format);

    let mut file_guard: Option<WorkerGuard> = None;
    let file_layer = match &config.file_path {
        Some(log_path) => {
            let file = std::fs::File::create(log_path)?;
            let (non_blocking, guard) = tracing_appender::non_blocking(file);
            file_guard = Some(guard);
            Some(
                fmt::layer()
                    .with_writer(non_blocking)
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_ansi(false),
            )
        }
        None => None,
    };

    let (json_layer, console_layer) = match (config.console_enabled, json) {
        (false, _) => (None, None),
        (true, true) => (
            Some(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true),
            ),
            None,
        ),
        (true, false) => (
            None,
            Some(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false)
                    .compact(),
            ),
        ),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(json_layer)
        .with(console_layer)
        .try_init()?;

    if let Some(log_path) = &config.file_path {
        eprintln!("Logging to file: {}", log_path.display());
    }

    tracing::info!(
        target: "immersive_pages",
        version = env!("CARGO_PKG_VERSION"),
        json_format = json,
        file_enabled = config.file_path.is_some(),
        "Logging initialized"
    );

    Ok(file_guard)
}

// Re-export WorkerGuard so callers can store it
pub use tracing_appender::non_blocking::WorkerGuard as LogGuard;
