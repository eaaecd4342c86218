//! Process-wide stop signal.
//!
//! # Design
//! - One flag plus a `Notify`; raising it is idempotent.
//! - The OS listener task only raises the flag. Cleanup belongs to the
//!   service's graceful-shutdown path and [`crate::HealthService::stop`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{error, info};

#[derive(Debug, Default)]
struct Inner {
    requested: AtomicBool,
    notify: Notify,
}

/// Cloneable handle to the shared stop signal.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    inner: Arc<Inner>,
}

impl ShutdownSignal {
    /// New, unraised signal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the signal and wake every waiter.
    pub fn request(&self) {
        if !self.inner.requested.swap(true, Ordering::SeqCst) {
            info!("shutdown requested");
        }
        self.inner.notify.notify_waiters();
    }

    /// Whether the signal has been raised.
    #[must_use]
    pub fn is_requested(&self) -> bool {
        self.inner.requested.load(Ordering::SeqCst)
    }

    /// Resolve once the signal is raised.
    pub async fn wait(&self) {
        loop {
            let notified = self.inner.notify.notified();
            if self.is_requested() {
                return;
            }
            notified.await;
        }
    }
}

/// Raise `signal` on SIGINT or SIGTERM.
#[must_use]
pub fn spawn_signal_listener(signal: ShutdownSignal) -> JoinHandle<()> {
    tokio::spawn(async move {
        let ctrl_c = async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                error!(error = %err, "failed to listen for interrupt signal");
                std::future::pending::<()>().await;
            }
        };

        #[cfg(unix)]
        let terminate = async {
            use tokio::signal::unix::{SignalKind, signal as unix_signal};
            match unix_signal(SignalKind::terminate()) {
                Ok(mut stream) => {
                    stream.recv().await;
                }
                Err(err) => {
                    error!(error = %err, "failed to listen for terminate signal");
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            () = ctrl_c => info!(signal = "SIGINT", "received termination signal"),
            () = terminate => info!(signal = "SIGTERM", "received termination signal"),
            () = signal.wait() => return,
        }
        signal.request();
    })
}
