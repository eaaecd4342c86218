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

//! Warden supervisor wiring.
//!
//! Layout: `bootstrap.rs` (environment, logging and signal wiring),
//! `supervisor.rs` (bootstrap stages), `launcher.rs` (worker process).

/// Process bootstrap and environment loading.
pub mod bootstrap;
/// Supervisor-level errors.
pub mod error;
/// Worker child process.
pub mod launcher;
/// Bootstrap stages around the worker.
pub mod supervisor;

pub use bootstrap::{run_app, run_with_env};
pub use error::{AppError, AppResult};
pub use launcher::{
    ExitOutcome, LaunchError, LaunchResult, ProcessLauncher, STDERR_LINE_BYTES, STDERR_TAIL_LINES,
};
pub use supervisor::Supervisor;
