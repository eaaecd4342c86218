#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! Keep-alive HTTP service that answers liveness probes while the worker runs.
//!
//! Layout: `service.rs` (lifecycle), `routes.rs` (handlers), `shutdown.rs`
//! (shared stop signal and OS signal listener), `uptime.rs` (formatting),
//! `error.rs` (error types).

pub mod error;
pub mod routes;
pub mod service;
pub mod shutdown;
pub mod uptime;

pub use error::{HealthError, HealthResult};
pub use service::{HealthService, STOP_TIMEOUT};
pub use shutdown::{ShutdownSignal, spawn_signal_listener};
pub use uptime::format_uptime;
