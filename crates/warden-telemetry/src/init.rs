//! Telemetry initialisation primitives and logging configuration.
//!
//! # Design
//! - Centralises logging setup (fmt or JSON) with a single entry point.
//! - Records the build SHA once to avoid inconsistencies across modules.
//! - `RUST_LOG` always wins over the configured level.

use once_cell::sync::OnceCell;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::error::{Result, TelemetryError};

/// Default logging target when neither `RUST_LOG` nor `LOG_LEVEL` is provided.
pub const DEFAULT_LOG_LEVEL: &str = "info";

static BUILD_SHA: OnceCell<String> = OnceCell::new();

/// Install the global tracing subscriber.
///
/// # Errors
///
/// Returns an error if the tracing subscriber cannot be installed (for example,
/// because another subscriber has already been set globally).
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    // First initialisation wins; later calls keep the recorded SHA.
    let _ = BUILD_SHA.set(config.build_sha.clone());

    let filter = build_env_filter(&config.level);
    let installed = match config.format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_target(false)
                    .with_thread_ids(false),
            )
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false).with_thread_ids(false))
            .try_init(),
    };
    installed.map_err(|source| TelemetryError::SubscriberInstall { source })
}

/// Access the build SHA recorded during logging initialisation.
#[must_use]
pub fn build_sha() -> &'static str {
    BUILD_SHA.get().map_or("dev", String::as_str)
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level or filter directive (e.g., `info`, `warden_app=debug`).
    pub level: String,
    /// Output format selection for the tracing subscriber.
    pub format: LogFormat,
    /// Build identifier recorded in structured logs.
    pub build_sha: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            format: LogFormat::infer(),
            build_sha: option_env!("WARDEN_BUILD_SHA").unwrap_or("dev").to_string(),
        }
    }
}

impl LoggingConfig {
    /// Build a configuration from optional `LOG_LEVEL` / `LOG_FORMAT` values.
    ///
    /// Unknown formats fall back to [`LogFormat::infer`].
    #[must_use]
    pub fn from_values(level: Option<&str>, format: Option<&str>) -> Self {
        let defaults = Self::default();
        Self {
            level: level
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map_or(defaults.level, str::to_string),
            format: format.map_or(defaults.format, LogFormat::parse),
            build_sha: defaults.build_sha,
        }
    }
}

/// Available output formats for the logger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Emit logs as structured JSON objects.
    Json,
    /// Emit human-readable logs.
    Pretty,
}

impl LogFormat {
    /// Choose a sensible default for the current build.
    #[must_use]
    pub const fn infer() -> Self {
        if cfg!(debug_assertions) {
            Self::Pretty
        } else {
            Self::Json
        }
    }

    /// Parse a format name, falling back to [`Self::infer`].
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Self::Json,
            "pretty" | "text" => Self::Pretty,
            _ => Self::infer(),
        }
    }
}

fn build_env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_format_parses_variants() {
        assert_eq!(LogFormat::parse("json"), LogFormat::Json);
        assert_eq!(LogFormat::parse(" Pretty "), LogFormat::Pretty);
        assert_eq!(LogFormat::parse("unknown"), LogFormat::infer());
    }

    #[test]
    fn from_values_applies_overrides_and_defaults() {
        let config = LoggingConfig::from_values(Some("debug"), Some("json"));
        assert_eq!(config.level, "debug");
        assert_eq!(config.format, LogFormat::Json);

        let fallback = LoggingConfig::from_values(Some("  "), None);
        assert_eq!(fallback.level, DEFAULT_LOG_LEVEL);
        assert_eq!(fallback.format, LogFormat::infer());
    }

    #[test]
    fn init_logging_installs_subscriber_once() {
        let config = LoggingConfig {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            build_sha: "abc123".to_string(),
        };
        let _ = init_logging(&config);
        let again = LoggingConfig {
            build_sha: "def456".to_string(),
            ..config
        };
        assert!(init_logging(&again).is_err());
        assert_eq!(build_sha(), "abc123");
    }
}
