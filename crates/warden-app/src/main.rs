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

//! Binary entrypoint: bootstrap, supervise the worker, exit with its outcome.

use std::process::ExitCode;

use warden_app::{AppError, run_app};

/// Runs the supervisor and maps its outcome onto the process exit code.
#[tokio::main]
async fn main() -> ExitCode {
    match run_app().await {
        Ok(_) => ExitCode::SUCCESS,
        Err(AppError::Telemetry { source, .. }) => {
            eprintln!("warden: failed to initialise logging: {source}");
            ExitCode::FAILURE
        }
        Err(_) => ExitCode::FAILURE,
    }
}
