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

//! Remote credential bundle retrieval and the local credential store.
//!
//! Layout: `client.rs` (remote asset API client), `store.rs` (on-disk
//! credential directory), `model.rs` (fetched asset), `error.rs` (error types
//! and the remote failure taxonomy).

pub mod client;
pub mod error;
pub mod model;
pub mod store;

pub use client::{
    AUTH_TIMEOUT, FETCH_TIMEOUT, RemoteAssetClient, TOKEN_PREFIXES, TokenCheck, check_token_format,
};
pub use error::{
    AssetError, AssetResult, RemoteFailure, RemoteFailureKind, StoreError, StoreResult,
    check_status,
};
pub use model::FetchedAsset;
pub use store::CredentialStore;
