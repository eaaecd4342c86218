//! Bootstrap sequence around the worker.
//!
//! # Design
//! - Stages run strictly in order and each one gates the next.
//! - The health service runs beside the sequence and is stopped on every path.
//! - Remote stage failures go through the configured [`FetchFailurePolicy`].

use std::path::PathBuf;

use tracing::{debug, error, info, warn};
use warden_assets::{CredentialStore, RemoteAssetClient, TokenCheck};
use warden_config::{FetchFailurePolicy, RemoteAssetDescriptor, RuntimeConfig, WorkerProfile};
use warden_health::{HealthService, ShutdownSignal};

use crate::error::{AppError, AppResult};
use crate::launcher::{ExitOutcome, LaunchError, ProcessLauncher};

/// Owns the validated configuration and drives one worker run.
#[derive(Debug)]
pub struct Supervisor {
    config: RuntimeConfig,
    health: HealthService,
    launcher: ProcessLauncher,
}

impl Supervisor {
    /// Supervisor for `config`, stopping its health service on `signal`.
    #[must_use]
    pub fn new(config: RuntimeConfig, signal: ShutdownSignal) -> Self {
        let health = HealthService::new(config.health.clone(), signal);
        let launcher = ProcessLauncher::new(Some(config.supervisor.interpreter.clone()));
        Self {
            config,
            health,
            launcher,
        }
    }

    /// Run the bootstrap sequence and the worker.
    ///
    /// # Errors
    ///
    /// Returns the first fatal failure; it has already been logged.
    pub async fn run(mut self) -> AppResult<ExitOutcome> {
        self.start_health().await;
        let result = self.bootstrap_and_launch().await;
        self.health.stop().await;

        match &result {
            Ok(outcome) => info!(exit_code = outcome.exit_code, "supervisor finished"),
            Err(err) => report(err),
        }
        result
    }

    async fn start_health(&mut self) {
        if !self.config.health.enabled {
            info!("keep-alive service disabled");
            return;
        }
        match self.health.start().await {
            Ok(address) => info!(%address, "keep-alive service listening"),
            Err(err) => error!(
                error = %err,
                host = %self.config.health.host,
                port = self.config.health.port,
                "keep-alive service failed to start; continuing without it"
            ),
        }
    }

    async fn bootstrap_and_launch(&self) -> AppResult<ExitOutcome> {
        let settings = &self.config.supervisor;
        let mut store = CredentialStore::new(settings.credential_dir.clone()).expecting(
            self.config
                .remote_asset
                .as_ref()
                .and_then(RemoteAssetDescriptor::file_name)
                .map(str::to_string),
        );

        if let Some(descriptor) = &self.config.remote_asset {
            match self.fetch_remote(descriptor, &mut store).await {
                Ok(path) => info!(path = %path.display(), "credential bundle refreshed"),
                Err(err) => match settings.fetch_failure_policy {
                    FetchFailurePolicy::Halt => return Err(err),
                    FetchFailurePolicy::Continue => {
                        report(&err);
                        warn!(
                            policy = %settings.fetch_failure_policy,
                            "remote credential fetch failed; falling back to local credentials"
                        );
                    }
                },
            }
        }

        store
            .verify()
            .map_err(|err| AppError::store("store.verify", err))?;

        if let Some(path) = &settings.profile_path {
            let profile =
                WorkerProfile::load(path).map_err(|err| AppError::config("profile.load", err))?;
            info!(
                username = %profile.username,
                streamers = profile.streamers.len(),
                "worker profile validated"
            );
            for entry in &profile.streamers {
                let settings = entry.effective_settings(&profile.streamer_defaults);
                debug!(
                    streamer = entry.name(),
                    predictions = settings.make_predictions.unwrap_or_default(),
                    claim_drops = settings.claim_drops.unwrap_or_default(),
                    watch_streak = settings.watch_streak.unwrap_or_default(),
                    chat = ?settings.chat.unwrap_or_default(),
                    bet_percentage = settings.bet.as_ref().map(|bet| bet.percentage),
                    "streamer settings resolved"
                );
            }
        }

        self.launcher
            .launch(&settings.entrypoint)
            .await
            .map_err(|err| AppError::launch("worker.launch", err))
    }

    async fn fetch_remote(
        &self,
        descriptor: &RemoteAssetDescriptor,
        store: &mut CredentialStore,
    ) -> AppResult<PathBuf> {
        let client = RemoteAssetClient::new(&self.config.supervisor.asset_api_url)
            .map_err(|err| AppError::asset("assets.client", err))?;

        match client
            .validate_token(&descriptor.token)
            .await
            .map_err(|err| AppError::asset("assets.validate_token", err))?
        {
            TokenCheck::Verified { login } => debug!(%login, "proceeding with verified token"),
            TokenCheck::Unverified { reason } => {
                warn!(%reason, "access token could not be verified; attempting fetch anyway");
            }
        }

        let asset = client
            .fetch(descriptor)
            .await
            .map_err(|err| AppError::asset("assets.fetch", err))?;
        store
            .persist(asset)
            .map_err(|err| AppError::store("store.persist", err))
    }
}

fn report(err: &AppError) {
    let operation = err.operation();
    match err {
        AppError::Asset { source, .. } => {
            if let Some(failure) = source.remote_failure() {
                error!(
                    operation,
                    status = failure.status,
                    kind = ?failure.kind,
                    "{failure}"
                );
                if let Some(hint) = failure.hint() {
                    for line in hint.lines() {
                        debug!(operation, "{line}");
                    }
                }
            } else {
                error!(operation, error = %source, detail = ?source, "{err}");
            }
        }
        AppError::Launch {
            source:
                LaunchError::WorkerFailure {
                    exit_code,
                    stderr_tail,
                },
            ..
        } => {
            error!(
                operation,
                exit_code = ?exit_code,
                stderr_tail = %stderr_tail.join("\n"),
                "worker exited unsuccessfully"
            );
        }
        AppError::Config { source, .. } => error!(operation, error = %source, "{err}"),
        AppError::Store { source, .. } => {
            error!(operation, error = %source, detail = ?source, "{err}");
        }
        AppError::Launch { source, .. } => {
            error!(operation, error = %source, detail = ?source, "{err}");
        }
        AppError::Telemetry { source, .. } => error!(operation, error = %source, "{err}"),
    }
}
