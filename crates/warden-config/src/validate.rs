//! Validation of the process environment into a [`RuntimeConfig`].
//!
//! Rules applied, in order:
//! - required keys must be present (fatal otherwise);
//! - independent optional keys are recorded when present and logged when not;
//! - the remote asset keys are all-or-nothing;
//! - service and supervisor settings fall back to defaults.
//!
//! Nothing here touches the network; secret values are never logged.

use std::path::PathBuf;

use tracing::info;

use crate::defaults::{
    DEFAULT_ASSET_API_URL, DEFAULT_COOKIES_DIR, DEFAULT_HOST, DEFAULT_PORT,
    DEFAULT_WORKER_ENTRYPOINT, DEFAULT_WORKER_INTERPRETER, KEY_ASSET_API_URL, KEY_CHAT_ID,
    KEY_COOKIES_DIR, KEY_HOST, KEY_HOSTING_PROVIDER, KEY_KEEP_ALIVE, KEY_ON_FETCH_FAILURE,
    KEY_PASSWORD, KEY_PORT, KEY_TELEGRAM_TOKEN, KEY_USER, KEY_WEBHOOK, KEY_WORKER_ENTRYPOINT,
    KEY_WORKER_INTERPRETER, KEY_WORKER_PROFILE, OPTIONAL_KEYS, REMOTE_ASSET_KEYS,
};
use crate::env::EnvSource;
use crate::error::{ConfigError, ConfigResult};
use crate::model::{
    AccountCredentials, FetchFailurePolicy, HealthSettings, NotificationTargets,
    RemoteAssetDescriptor, RuntimeConfig, Secret, SupervisorSettings,
};

/// Validate the environment and build the runtime configuration.
///
/// # Errors
///
/// Returns [`ConfigError::MissingRequiredKey`] when `USER` or `PASSWORD` is
/// absent, [`ConfigError::PartialGroupConfig`] when only some remote asset
/// keys are set, and [`ConfigError::InvalidValue`] for unparsable settings.
pub fn validate(env: &impl EnvSource) -> ConfigResult<RuntimeConfig> {
    let account = AccountCredentials {
        username: required(env, KEY_USER)?,
        password: Secret::new(required(env, KEY_PASSWORD)?),
    };

    for key in OPTIONAL_KEYS {
        if env.non_empty(key).is_some() {
            info!(key, "optional configuration key is set");
        } else {
            info!(key, "optional configuration key is not set, skipping");
        }
    }
    let notifications = NotificationTargets {
        webhook: env.non_empty(KEY_WEBHOOK),
        chat_id: env.non_empty(KEY_CHAT_ID),
        telegram_token: env.non_empty(KEY_TELEGRAM_TOKEN).map(Secret::new),
    };

    let remote_asset = remote_asset(env)?;

    let health = HealthSettings {
        host: env
            .non_empty(KEY_HOST)
            .unwrap_or_else(|| DEFAULT_HOST.to_string()),
        port: env
            .non_empty(KEY_PORT)
            .map_or(Ok(DEFAULT_PORT), |value| parse_port(&value))?,
        enabled: env
            .non_empty(KEY_KEEP_ALIVE)
            .map_or(Ok(true), |value| parse_flag(KEY_KEEP_ALIVE, &value))?,
    };

    let supervisor = SupervisorSettings {
        credential_dir: PathBuf::from(
            env.non_empty(KEY_COOKIES_DIR)
                .unwrap_or_else(|| DEFAULT_COOKIES_DIR.to_string()),
        ),
        interpreter: env
            .non_empty(KEY_WORKER_INTERPRETER)
            .unwrap_or_else(|| DEFAULT_WORKER_INTERPRETER.to_string()),
        entrypoint: PathBuf::from(
            env.non_empty(KEY_WORKER_ENTRYPOINT)
                .unwrap_or_else(|| DEFAULT_WORKER_ENTRYPOINT.to_string()),
        ),
        fetch_failure_policy: env
            .non_empty(KEY_ON_FETCH_FAILURE)
            .map_or(Ok(FetchFailurePolicy::default()), |value| value.parse())?,
        profile_path: env.non_empty(KEY_WORKER_PROFILE).map(PathBuf::from),
        asset_api_url: env
            .non_empty(KEY_ASSET_API_URL)
            .unwrap_or_else(|| DEFAULT_ASSET_API_URL.to_string()),
    };

    let hosting_provider = env.non_empty(KEY_HOSTING_PROVIDER);
    if let Some(provider) = hosting_provider.as_deref() {
        info!(provider, "hosting provider reported");
    }

    info!(
        host = %health.host,
        port = health.port,
        keep_alive = health.enabled,
        credential_dir = %supervisor.credential_dir.display(),
        entrypoint = %supervisor.entrypoint.display(),
        on_fetch_failure = %supervisor.fetch_failure_policy,
        "configuration validated"
    );

    Ok(RuntimeConfig {
        account,
        notifications,
        remote_asset,
        health,
        supervisor,
        hosting_provider,
    })
}

fn required(env: &impl EnvSource, key: &'static str) -> ConfigResult<String> {
    let value = env
        .non_empty(key)
        .ok_or(ConfigError::MissingRequiredKey { key })?;
    info!(key, "required configuration key is set");
    Ok(value)
}

fn remote_asset(env: &impl EnvSource) -> ConfigResult<Option<RemoteAssetDescriptor>> {
    let values = REMOTE_ASSET_KEYS.map(|key| (key, env.non_empty(key)));
    let any_set = values.iter().any(|(_, value)| value.is_some());
    let all_set = values.iter().all(|(_, value)| value.is_some());

    if !any_set {
        info!("remote asset storage not configured, using local credentials only");
        return Ok(None);
    }
    if !all_set {
        let missing = values
            .iter()
            .filter(|(_, value)| value.is_none())
            .map(|(key, _)| *key)
            .collect();
        return Err(ConfigError::PartialGroupConfig {
            group: "remote asset",
            missing,
        });
    }

    for key in REMOTE_ASSET_KEYS {
        info!(key, "remote asset configuration key is set");
    }
    // Order follows REMOTE_ASSET_KEYS.
    let [token, owner, repository, path] = values.map(|(_, value)| value.unwrap_or_default());

    Ok(Some(RemoteAssetDescriptor {
        owner,
        repository,
        path,
        token: Secret::new(token),
    }))
}

fn parse_port(value: &str) -> ConfigResult<u16> {
    let invalid = |reason| ConfigError::InvalidValue {
        key: KEY_PORT,
        value: value.to_string(),
        reason,
    };
    let port = value
        .parse::<u16>()
        .map_err(|_| invalid("must_be_between_1_and_65535"))?;
    if port == 0 {
        return Err(invalid("zero"));
    }
    Ok(port)
}

fn parse_flag(key: &'static str, value: &str) -> ConfigResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: value.to_string(),
            reason: "expected_boolean",
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn env(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect()
    }

    #[test]
    fn parse_port_rejects_zero_and_garbage() {
        assert_eq!(parse_port("8080").ok(), Some(8080));
        assert!(matches!(
            parse_port("0"),
            Err(ConfigError::InvalidValue { reason: "zero", .. })
        ));
        assert!(parse_port("70000").is_err());
        assert!(parse_port("http").is_err());
    }

    #[test]
    fn parse_flag_handles_truthy_and_falsey() {
        assert_eq!(parse_flag(KEY_KEEP_ALIVE, "TrUe").ok(), Some(true));
        assert_eq!(parse_flag(KEY_KEEP_ALIVE, "off").ok(), Some(false));
        assert!(parse_flag(KEY_KEEP_ALIVE, "sometimes").is_err());
    }

    #[test]
    fn defaults_apply_when_optional_settings_absent() -> ConfigResult<()> {
        let config = validate(&env(&[("USER", "a"), ("PASSWORD", "b")]))?;
        assert_eq!(config.health.host, DEFAULT_HOST);
        assert_eq!(config.health.port, DEFAULT_PORT);
        assert!(config.health.enabled);
        assert_eq!(
            config.supervisor.credential_dir,
            PathBuf::from(DEFAULT_COOKIES_DIR)
        );
        assert_eq!(config.supervisor.interpreter, DEFAULT_WORKER_INTERPRETER);
        assert_eq!(
            config.supervisor.fetch_failure_policy,
            FetchFailurePolicy::Halt
        );
        assert_eq!(config.notifications, NotificationTargets::default());
        assert!(config.supervisor.profile_path.is_none());
        assert_eq!(config.supervisor.asset_api_url, DEFAULT_ASSET_API_URL);
        Ok(())
    }

    #[test]
    fn grouped_values_map_onto_descriptor_fields() -> ConfigResult<()> {
        let config = validate(&env(&[
            ("USER", "a"),
            ("PASSWORD", "b"),
            ("GITHUB_TOKEN", "ghp_abc"),
            ("CJ_OWNER", "owner"),
            ("CJ_REPO", "vault"),
            ("CJ_FILE", "cookies/session.pkl"),
        ]))?;
        let descriptor = config.remote_asset.ok_or(ConfigError::MissingRequiredKey {
            key: crate::defaults::KEY_GITHUB_TOKEN,
        })?;
        assert_eq!(descriptor.owner, "owner");
        assert_eq!(descriptor.repository, "vault");
        assert_eq!(descriptor.path, "cookies/session.pkl");
        assert_eq!(descriptor.token.expose(), "ghp_abc");
        Ok(())
    }
}
