//! Health service lifecycle.
//!
//! # Design
//! - `start` binds before spawning so bind failures surface to the caller.
//! - `stop` raises the shared signal and joins the serving task, aborting it
//!   after [`STOP_TIMEOUT`].

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use warden_config::HealthSettings;

use crate::error::{HealthError, HealthResult};
use crate::routes::{HealthState, router};
use crate::shutdown::ShutdownSignal;

/// How long `stop` waits for the serving task before aborting it.
pub const STOP_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug)]
struct Running {
    task: JoinHandle<()>,
    alive: Arc<AtomicBool>,
    local_addr: SocketAddr,
}

/// Keep-alive HTTP service owned by the supervisor.
#[derive(Debug)]
pub struct HealthService {
    settings: HealthSettings,
    signal: ShutdownSignal,
    running: Option<Running>,
}

impl HealthService {
    /// Stopped service that will bind `settings` and observe `signal`.
    #[must_use]
    pub const fn new(settings: HealthSettings, signal: ShutdownSignal) -> Self {
        Self {
            settings,
            signal,
            running: None,
        }
    }

    /// Shared stop signal.
    #[must_use]
    pub const fn signal(&self) -> &ShutdownSignal {
        &self.signal
    }

    /// Bind the listener and spawn the serving task.
    ///
    /// Calling `start` while running logs a warning and returns the bound address.
    ///
    /// # Errors
    ///
    /// Returns [`HealthError::Bind`] if the address cannot be bound and
    /// [`HealthError::ShutdownRequested`] once the stop signal has been raised.
    pub async fn start(&mut self) -> HealthResult<SocketAddr> {
        if let Some(running) = self.running.as_ref().filter(|running| is_alive(running)) {
            warn!(address = %running.local_addr, "health service is already running");
            return Ok(running.local_addr);
        }
        if self.signal.is_requested() {
            return Err(HealthError::ShutdownRequested);
        }

        let address = format!("{}:{}", self.settings.host, self.settings.port);
        let listener = TcpListener::bind((self.settings.host.as_str(), self.settings.port))
            .await
            .map_err(|source| HealthError::Bind {
                address: address.clone(),
                source,
            })?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| HealthError::Bind { address, source })?;

        let alive = Arc::new(AtomicBool::new(true));
        let state = Arc::new(HealthState::new(
            self.settings.host.clone(),
            local_addr.port(),
            self.signal.clone(),
            Arc::clone(&alive),
        ));
        let app = router(state);
        let signal = self.signal.clone();
        let task_alive = Arc::clone(&alive);

        let task = tokio::spawn(async move {
            let shutdown = async move { signal.wait().await };
            if let Err(err) = axum::serve(listener, app.into_make_service())
                .with_graceful_shutdown(shutdown)
                .await
            {
                error!(error = %err, "health service terminated unexpectedly");
            }
            task_alive.store(false, Ordering::SeqCst);
        });

        info!(address = %local_addr, "health service started");
        self.running = Some(Running {
            task,
            alive,
            local_addr,
        });
        Ok(local_addr)
    }

    /// Raise the stop signal and join the serving task.
    pub async fn stop(&mut self) {
        self.signal.request();
        let Some(running) = self.running.take() else {
            return;
        };

        info!(address = %running.local_addr, "stopping health service");
        let abort = running.task.abort_handle();
        match tokio::time::timeout(STOP_TIMEOUT, running.task).await {
            Ok(Ok(())) => info!("health service stopped"),
            Ok(Err(err)) => warn!(error = %err, "health service task failed"),
            Err(_) => {
                warn!(
                    timeout_secs = STOP_TIMEOUT.as_secs(),
                    "health service did not stop gracefully; aborting"
                );
                abort.abort();
            }
        }
    }

    /// Whether the serving task is alive.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.as_ref().is_some_and(is_alive)
    }

    /// Address the listener is bound to, while running.
    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.running
            .as_ref()
            .filter(|running| is_alive(running))
            .map(|running| running.local_addr)
    }
}

fn is_alive(running: &Running) -> bool {
    running.alive.load(Ordering::SeqCst) && !running.task.is_finished()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loopback() -> HealthSettings {
        HealthSettings {
            host: "127.0.0.1".to_string(),
            port: 0,
            enabled: true,
        }
    }

    #[tokio::test]
    async fn start_and_stop_round_trip() -> anyhow::Result<()> {
        let mut service = HealthService::new(loopback(), ShutdownSignal::new());
        assert!(!service.is_running());

        let addr = service.start().await?;
        assert!(service.is_running());
        assert_eq!(service.start().await?, addr);
        assert_eq!(service.local_addr(), Some(addr));

        service.stop().await;
        assert!(!service.is_running());
        assert!(service.signal().is_requested());
        service.stop().await;
        Ok(())
    }

    #[tokio::test]
    async fn start_after_shutdown_is_refused() {
        let signal = ShutdownSignal::new();
        signal.request();
        let mut service = HealthService::new(loopback(), signal);
        assert!(matches!(
            service.start().await,
            Err(HealthError::ShutdownRequested)
        ));
    }

    #[tokio::test]
    async fn bind_conflict_is_reported() -> anyhow::Result<()> {
        let holder = std::net::TcpListener::bind("127.0.0.1:0")?;
        let port = holder.local_addr()?.port();
        let mut service = HealthService::new(
            HealthSettings {
                port,
                ..loopback()
            },
            ShutdownSignal::new(),
        );
        assert!(matches!(
            service.start().await,
            Err(HealthError::Bind { .. })
        ));
        assert!(!service.is_running());
        Ok(())
    }
}
