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

//! Environment-driven runtime configuration for the Warden supervisor.
//!
//! Layout: `env.rs` (environment sources), `model.rs` (typed configuration),
//! `validate.rs` (required/optional/grouped key rules), `profile.rs`
//! (declarative worker profile), `defaults.rs` (key names and defaults).

pub mod defaults;
pub mod env;
pub mod error;
pub mod model;
pub mod profile;
pub mod validate;

pub use env::{EnvSource, ProcessEnv};
pub use error::{ConfigError, ConfigResult};
pub use model::{
    AccountCredentials, FetchFailurePolicy, HealthSettings, NotificationTargets,
    RemoteAssetDescriptor, RuntimeConfig, Secret, SupervisorSettings,
};
pub use profile::WorkerProfile;
pub use validate::validate;
