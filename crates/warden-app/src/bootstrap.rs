use tracing::{error, info, warn};
use warden_config::{EnvSource, ProcessEnv, validate};
use warden_health::{ShutdownSignal, spawn_signal_listener};
use warden_telemetry::{GlobalContextGuard, LoggingConfig};

use crate::error::{AppError, AppResult};
use crate::launcher::ExitOutcome;
use crate::supervisor::Supervisor;

const KEY_LOG_LEVEL: &str = "LOG_LEVEL";
const KEY_LOG_FORMAT: &str = "LOG_FORMAT";

/// Entry point for the supervisor boot sequence.
///
/// Loads `.env` (existing variables win), installs logging, validates the
/// process environment and runs the supervisor until the worker exits.
///
/// # Errors
///
/// Returns an error if logging, validation, any bootstrap stage or the worker fails.
pub async fn run_app() -> AppResult<ExitOutcome> {
    let dotenv = dotenvy::dotenv();

    let env = ProcessEnv;
    let logging = LoggingConfig::from_values(
        env.non_empty(KEY_LOG_LEVEL).as_deref(),
        env.non_empty(KEY_LOG_FORMAT).as_deref(),
    );
    warden_telemetry::init_logging(&logging)
        .map_err(|err| AppError::telemetry("telemetry.init", err))?;
    let _context = GlobalContextGuard::new("supervisor");

    match dotenv {
        Ok(path) => info!(path = %path.display(), "loaded environment file"),
        Err(err) if err.not_found() => {}
        Err(err) => warn!(error = %err, "failed to load environment file"),
    }

    let signal = ShutdownSignal::new();
    let listener = spawn_signal_listener(signal.clone());
    let result = run_with_env(&env, signal).await;
    listener.abort();
    result
}

/// Validate `env` and run one supervised worker, without touching global state.
///
/// # Errors
///
/// Returns an error if validation, any bootstrap stage or the worker fails.
pub async fn run_with_env(
    env: &(impl EnvSource + Sync),
    signal: ShutdownSignal,
) -> AppResult<ExitOutcome> {
    info!("warden bootstrap starting");
    let config = validate(env).map_err(|source| {
        error!(operation = "config.validate", error = %source, "configuration invalid");
        AppError::config("config.validate", source)
    })?;
    Supervisor::new(config, signal).run().await
}
