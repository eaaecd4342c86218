//! # Design
//!
//! - Remote status failures are one value (`RemoteFailure`) tagged with a kind
//!   and carrying the numeric status, comparable by equality.
//! - Transport and decoding failures keep their `reqwest` source and the URL.
//! - Local store failures live in their own enum because they are always fatal.

use std::fmt::{self, Display, Formatter};
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Classification of a remote status failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteFailureKind {
    /// The token does not carry a recognised prefix; no request was made.
    InvalidTokenFormat,
    /// The remote service rejected the token.
    AuthInvalid,
    /// The requested file does not exist (or is not visible to the token).
    AssetNotFound,
    /// Any other non-success status.
    UnexpectedStatus,
}

/// Remote failure tagged with its kind and HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RemoteFailure {
    /// Failure classification.
    pub kind: RemoteFailureKind,
    /// HTTP status code; `401` for token format failures.
    pub status: u16,
}

const AUTH_HINT: &str = "Ensure that GITHUB_TOKEN was set correctly.\n\
Verify that the token has not expired.\n\
Check that the token has the required permissions (repo access).\n\
Ensure the token format is valid (should start with ghp_, github_pat_, etc.).";

const NOT_FOUND_HINT: &str =
    "Ensure that CJ_OWNER and CJ_REPO were set and point to the private repository.\n\
Ensure that CJ_FILE was set and points to a file that exists in the repository.";

impl RemoteFailure {
    /// Failure raised before any request when the token prefix is unknown.
    #[must_use]
    pub const fn invalid_token_format() -> Self {
        Self {
            kind: RemoteFailureKind::InvalidTokenFormat,
            status: 401,
        }
    }

    /// Classify a non-success HTTP status.
    #[must_use]
    pub const fn from_status(status: u16) -> Self {
        let kind = match status {
            401 => RemoteFailureKind::AuthInvalid,
            404 => RemoteFailureKind::AssetNotFound,
            _ => RemoteFailureKind::UnexpectedStatus,
        };
        Self { kind, status }
    }

    /// Short human-readable description.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self.kind {
            RemoteFailureKind::InvalidTokenFormat => "access token format is invalid",
            RemoteFailureKind::AuthInvalid => "access token is invalid or expired",
            RemoteFailureKind::AssetNotFound => "requested file could not be found",
            RemoteFailureKind::UnexpectedStatus => "unexpected response from remote asset store",
        }
    }

    /// Troubleshooting steps, one per line, when any are known.
    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        match self.kind {
            RemoteFailureKind::InvalidTokenFormat | RemoteFailureKind::AuthInvalid => {
                Some(AUTH_HINT)
            }
            RemoteFailureKind::AssetNotFound => Some(NOT_FOUND_HINT),
            RemoteFailureKind::UnexpectedStatus => None,
        }
    }
}

impl Display for RemoteFailure {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        write!(formatter, "{} (status {})", self.message(), self.status)
    }
}

impl std::error::Error for RemoteFailure {}

/// Map an HTTP status onto success or a [`RemoteFailure`].
///
/// # Errors
///
/// Every status other than `200` yields a failure.
pub const fn check_status(status: u16) -> Result<(), RemoteFailure> {
    if status == 200 {
        Ok(())
    } else {
        Err(RemoteFailure::from_status(status))
    }
}

/// Errors raised by the remote asset client.
#[derive(Debug, Error)]
pub enum AssetError {
    /// The remote service answered with a failure status (or the token was malformed).
    #[error(transparent)]
    Remote(#[from] RemoteFailure),
    /// The request could not be completed.
    #[error("remote asset request failed")]
    Transport {
        /// Operation identifier.
        operation: &'static str,
        /// URL used for the request.
        url: String,
        /// Source HTTP client error.
        source: reqwest::Error,
    },
    /// The response body could not be decoded.
    #[error("remote asset response could not be decoded")]
    Decode {
        /// Operation identifier.
        operation: &'static str,
        /// URL used for the request.
        url: String,
        /// Source HTTP client error.
        source: reqwest::Error,
    },
    /// The metadata response lacked a usable field.
    #[error("remote asset metadata is malformed")]
    MalformedMetadata {
        /// URL used for the request.
        url: String,
        /// Missing or invalid field.
        field: &'static str,
    },
    /// The configured API base URL cannot carry path segments.
    #[error("invalid remote asset api base url")]
    InvalidBaseUrl {
        /// Offending URL.
        url: String,
    },
    /// The HTTP client could not be constructed.
    #[error("failed to build http client")]
    Client {
        /// Source HTTP client error.
        source: reqwest::Error,
    },
}

impl AssetError {
    /// The status-tagged failure, when this error carries one.
    #[must_use]
    pub const fn remote_failure(&self) -> Option<RemoteFailure> {
        match self {
            Self::Remote(failure) => Some(*failure),
            _ => None,
        }
    }
}

/// Result alias for remote asset operations.
pub type AssetResult<T> = Result<T, AssetError>;

/// Errors raised by the local credential store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The credential directory does not exist.
    #[error("credential directory not found")]
    DirectoryNotFound {
        /// Directory that was checked.
        path: PathBuf,
    },
    /// The expected credential file does not exist.
    #[error("credential file not found")]
    FileNotFound {
        /// File that was checked.
        path: PathBuf,
    },
    /// A remote file name would escape the credential directory.
    #[error("credential file name rejected")]
    InvalidFileName {
        /// Offending name.
        name: String,
    },
    /// Filesystem operation failed.
    #[error("credential store io operation failed")]
    Io {
        /// Operation identifier.
        operation: &'static str,
        /// Path involved in the failure.
        path: PathBuf,
        /// Source IO error.
        source: io::Error,
    },
}

/// Result alias for credential store operations.
pub type StoreResult<T> = Result<T, StoreError>;
