//! Error types for configuration operations.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Primary error type for configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required key was absent from the environment.
    #[error("missing required configuration key {key}")]
    MissingRequiredKey {
        /// Name of the missing key.
        key: &'static str,
    },
    /// Only part of an all-or-nothing key group was set.
    #[error("partial {group} configuration, missing: {}", missing.join(", "))]
    PartialGroupConfig {
        /// Label of the key group.
        group: &'static str,
        /// Keys of the group that were not set, in declaration order.
        missing: Vec<&'static str>,
    },
    /// A key was set to a value that could not be interpreted.
    #[error("invalid value for configuration key {key}")]
    InvalidValue {
        /// Name of the offending key.
        key: &'static str,
        /// Offending value.
        value: String,
        /// Machine-readable reason for the failure.
        reason: &'static str,
    },
    /// The worker profile file could not be read.
    #[error("failed to read worker profile")]
    ProfileRead {
        /// Path of the profile.
        path: PathBuf,
        /// Source IO error.
        source: io::Error,
    },
    /// The worker profile file was not valid YAML for the profile schema.
    #[error("failed to parse worker profile")]
    ProfileParse {
        /// Path of the profile.
        path: PathBuf,
        /// Source YAML error.
        source: serde_yaml::Error,
    },
    /// The worker profile parsed but violated a constraint.
    #[error("invalid worker profile field {field}")]
    Profile {
        /// Dotted path of the offending field.
        field: String,
        /// Machine-readable reason for the failure.
        reason: &'static str,
        /// Offending value when available.
        value: Option<String>,
    },
}

/// Convenience alias for configuration results.
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_group_message_lists_missing_keys() {
        let err = ConfigError::PartialGroupConfig {
            group: "remote asset",
            missing: vec!["CJ_REPO", "CJ_FILE"],
        };
        assert_eq!(
            err.to_string(),
            "partial remote asset configuration, missing: CJ_REPO, CJ_FILE"
        );
    }

    #[test]
    fn missing_key_message_names_key() {
        let err = ConfigError::MissingRequiredKey { key: "USER" };
        assert_eq!(err.to_string(), "missing required configuration key USER");
    }
}
