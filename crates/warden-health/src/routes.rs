//! Liveness endpoints.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use axum::extract::State;
use axum::http::header::{HOST, USER_AGENT};
use axum::http::{HeaderMap, HeaderName, Request};
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::Span;
use warden_telemetry::build_sha;

use crate::shutdown::ShutdownSignal;
use crate::uptime::{format_uptime, rounded_seconds};

/// Plain-text body served on `/`.
pub const BANNER: &str = "🎮 Twitch Channel Points Miner is running and healthy!";
/// Service name reported by `/health`.
pub const SERVICE_NAME: &str = "Twitch Channel Points Miner";
/// Service name reported by `/status`.
pub const STATUS_SERVICE_NAME: &str = "Twitch Channel Points Miner Keep-Alive Server";
/// Version reported by `/health`.
pub const SERVICE_VERSION: &str = "2.0";
/// Routes served by the health service.
pub const ENDPOINTS: [&str; 4] = ["/", "/health", "/status", "/ping"];

const UNKNOWN: &str = "Unknown";

/// State shared by every handler.
#[derive(Debug)]
pub struct HealthState {
    started: Instant,
    bind_host: String,
    bind_port: u16,
    signal: ShutdownSignal,
    task_alive: Arc<AtomicBool>,
}

impl HealthState {
    /// Capture the start instant for a service bound to `bind_host:bind_port`.
    #[must_use]
    pub fn new(
        bind_host: impl Into<String>,
        bind_port: u16,
        signal: ShutdownSignal,
        task_alive: Arc<AtomicBool>,
    ) -> Self {
        Self {
            started: Instant::now(),
            bind_host: bind_host.into(),
            bind_port,
            signal,
            task_alive,
        }
    }

    fn uptime(&self) -> Duration {
        self.started.elapsed()
    }
}

/// `/health` response body.
#[derive(Debug, Serialize)]
pub struct HealthReport {
    /// Always `healthy`.
    pub status: &'static str,
    /// Service name.
    pub service: &'static str,
    /// RFC 3339 timestamp of the response.
    pub timestamp: String,
    /// Human-readable uptime.
    pub uptime: String,
    /// Uptime in seconds, two decimals.
    pub uptime_seconds: f64,
    /// Service version.
    pub version: &'static str,
    /// `Host` header of the request.
    pub host: String,
    /// `User-Agent` header of the request.
    pub user_agent: String,
    /// Bind settings.
    pub environment: BindReport,
}

/// Bind settings echoed by `/health`.
#[derive(Debug, Serialize)]
pub struct BindReport {
    /// Bound port.
    pub port: String,
    /// Bound host.
    pub host: String,
}

/// `/status` response body.
#[derive(Debug, Serialize)]
pub struct StatusReport {
    /// Service name.
    pub service: &'static str,
    /// Always `running` while the handler answers.
    pub status: &'static str,
    /// Uptime in seconds, two decimals.
    pub uptime_seconds: f64,
    /// Whether the serving task is alive.
    pub task_active: bool,
    /// Whether the stop signal has been raised.
    pub shutdown_requested: bool,
    /// Served routes.
    pub endpoints: [&'static str; 4],
    /// RFC 3339 timestamp of the response.
    pub timestamp: String,
}

/// Build the router with request tracing.
#[must_use]
pub fn router(state: Arc<HealthState>) -> Router {
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<_>| {
            tracing::debug_span!(
                "http.request",
                method = %request.method(),
                route = %request.uri().path(),
                build_sha = %build_sha(),
                status_code = tracing::field::Empty,
                latency_ms = tracing::field::Empty
            )
        })
        .on_request(|_request: &Request<_>, _span: &Span| {})
        .on_response(
            |response: &axum::response::Response, latency: Duration, span: &Span| {
                span.record("status_code", response.status().as_u16());
                let latency_ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
                span.record("latency_ms", latency_ms);
            },
        );

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/status", get(status))
        .route("/ping", get(ping))
        .layer(ServiceBuilder::new().layer(trace_layer))
        .with_state(state)
}

/// `/`: liveness banner.
async fn root() -> &'static str {
    BANNER
}

/// `/ping`: `pong`.
async fn ping() -> &'static str {
    "pong"
}

/// `/health`: detailed liveness report.
async fn health(
    State(state): State<Arc<HealthState>>,
    headers: HeaderMap,
) -> Json<HealthReport> {
    let header = |name: HeaderName| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .unwrap_or(UNKNOWN)
            .to_string()
    };
    let uptime = state.uptime();

    Json(HealthReport {
        status: "healthy",
        service: SERVICE_NAME,
        timestamp: Utc::now().to_rfc3339(),
        uptime: format_uptime(uptime),
        uptime_seconds: rounded_seconds(uptime),
        version: SERVICE_VERSION,
        host: header(HOST),
        user_agent: header(USER_AGENT),
        environment: BindReport {
            port: state.bind_port.to_string(),
            host: state.bind_host.clone(),
        },
    })
}

/// `/status`: serving task and stop signal state.
async fn status(State(state): State<Arc<HealthState>>) -> Json<StatusReport> {
    Json(StatusReport {
        service: STATUS_SERVICE_NAME,
        status: "running",
        uptime_seconds: rounded_seconds(state.uptime()),
        task_active: state.task_alive.load(Ordering::SeqCst),
        shutdown_requested: state.signal.is_requested(),
        endpoints: ENDPOINTS,
        timestamp: Utc::now().to_rfc3339(),
    })
}
