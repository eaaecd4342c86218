//! Typed runtime configuration produced by [`crate::validate`].

use std::fmt::{self, Debug, Display, Formatter};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::ConfigError;

/// String value that must never be written to logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    /// Wrap a sensitive value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the underlying value for use on the wire.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl Debug for Secret {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("Secret(***)")
    }
}

/// Worker account identity and secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountCredentials {
    /// Account identity.
    pub username: String,
    /// Account secret.
    pub password: Secret,
}

/// Optional notification targets forwarded to the worker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationTargets {
    /// Webhook endpoint.
    pub webhook: Option<String>,
    /// Chat identifier.
    pub chat_id: Option<String>,
    /// Chat bot token.
    pub telegram_token: Option<Secret>,
}

/// Location of the credential bundle in the remote asset store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteAssetDescriptor {
    /// Repository owner.
    pub owner: String,
    /// Repository name.
    pub repository: String,
    /// Path of the file inside the repository.
    pub path: String,
    /// Bearer token used for the API calls.
    pub token: Secret,
}

impl RemoteAssetDescriptor {
    /// Final path component of the configured file path.
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        Path::new(&self.path)
            .file_name()
            .and_then(|name| name.to_str())
    }
}

/// Bind settings for the health service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthSettings {
    /// Host or address to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
    /// Whether the health service should be started at all.
    pub enabled: bool,
}

/// What the supervisor does when the remote asset stage fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchFailurePolicy {
    /// Stop the supervisor with a failure exit code.
    #[default]
    Halt,
    /// Log a warning and fall back to the local credential store.
    Continue,
}

impl FetchFailurePolicy {
    /// Stable identifier used in the environment and in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Halt => "halt",
            Self::Continue => "continue",
        }
    }
}

impl Display for FetchFailurePolicy {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for FetchFailurePolicy {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "halt" | "exit" => Ok(Self::Halt),
            "continue" | "fallback" => Ok(Self::Continue),
            _ => Err(ConfigError::InvalidValue {
                key: crate::defaults::KEY_ON_FETCH_FAILURE,
                value: value.to_string(),
                reason: "expected_halt_or_continue",
            }),
        }
    }
}

/// Settings that drive the bootstrap sequence and worker launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupervisorSettings {
    /// Directory holding the credential bundle.
    pub credential_dir: PathBuf,
    /// Interpreter used to run the entrypoint.
    pub interpreter: String,
    /// Worker entrypoint script.
    pub entrypoint: PathBuf,
    /// Policy for remote asset failures.
    pub fetch_failure_policy: FetchFailurePolicy,
    /// Optional declarative worker profile.
    pub profile_path: Option<PathBuf>,
    /// Base URL of the remote asset store API.
    pub asset_api_url: String,
}

/// Validated configuration for one supervisor run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Worker account.
    pub account: AccountCredentials,
    /// Optional notification targets.
    pub notifications: NotificationTargets,
    /// Remote asset location; `None` when remote-asset mode is disabled.
    pub remote_asset: Option<RemoteAssetDescriptor>,
    /// Health service settings.
    pub health: HealthSettings,
    /// Bootstrap and launch settings.
    pub supervisor: SupervisorSettings,
    /// Informational hosting provider label.
    pub hosting_provider: Option<String>,
}

impl RuntimeConfig {
    /// Whether the credential bundle should be fetched before launch.
    #[must_use]
    pub const fn remote_asset_enabled(&self) -> bool {
        self.remote_asset.is_some()
    }
}
