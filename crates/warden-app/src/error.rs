//! # Design
//!
//! - Centralize supervisor-level errors for bootstrap and launch.
//! - Keep error messages constant while carrying context fields for debugging.
//! - Preserve source errors; the supervisor logs each failure once.

use thiserror::Error;

use crate::launcher::LaunchError;

/// Result alias for supervisor operations.
pub type AppResult<T> = Result<T, AppError>;

/// Supervisor-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration validation or profile loading failed.
    #[error("configuration operation failed")]
    Config {
        /// Operation identifier.
        operation: &'static str,
        /// Source configuration error.
        source: warden_config::ConfigError,
    },
    /// Telemetry initialisation failed.
    #[error("telemetry operation failed")]
    Telemetry {
        /// Operation identifier.
        operation: &'static str,
        /// Source telemetry error.
        source: warden_telemetry::TelemetryError,
    },
    /// Remote asset authentication or retrieval failed.
    #[error("remote asset operation failed")]
    Asset {
        /// Operation identifier.
        operation: &'static str,
        /// Source asset error.
        source: warden_assets::AssetError,
    },
    /// Credential store operation failed.
    #[error("credential store operation failed")]
    Store {
        /// Operation identifier.
        operation: &'static str,
        /// Source store error.
        source: warden_assets::StoreError,
    },
    /// Worker launch or execution failed.
    #[error("worker operation failed")]
    Launch {
        /// Operation identifier.
        operation: &'static str,
        /// Source launch error.
        source: LaunchError,
    },
}

impl AppError {
    pub(crate) const fn config(
        operation: &'static str,
        source: warden_config::ConfigError,
    ) -> Self {
        Self::Config { operation, source }
    }

    pub(crate) const fn telemetry(
        operation: &'static str,
        source: warden_telemetry::TelemetryError,
    ) -> Self {
        Self::Telemetry { operation, source }
    }

    pub(crate) const fn asset(operation: &'static str, source: warden_assets::AssetError) -> Self {
        Self::Asset { operation, source }
    }

    pub(crate) const fn store(operation: &'static str, source: warden_assets::StoreError) -> Self {
        Self::Store { operation, source }
    }

    pub(crate) const fn launch(operation: &'static str, source: LaunchError) -> Self {
        Self::Launch { operation, source }
    }

    /// Operation identifier carried by every variant.
    #[must_use]
    pub const fn operation(&self) -> &'static str {
        match self {
            Self::Config { operation, .. }
            | Self::Telemetry { operation, .. }
            | Self::Asset { operation, .. }
            | Self::Store { operation, .. }
            | Self::Launch { operation, .. } => operation,
        }
    }
}
