//! HTTP client for the remote asset store.
//!
//! # Design
//! - Requests are awaited one at a time with explicit per-request timeouts.
//! - Token format is checked locally before any request leaves the process.
//! - The identity check is advisory: only a `401` is an error, everything else
//!   degrades to [`TokenCheck::Unverified`].

use std::time::Duration;

use reqwest::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Deserialize;
use tracing::{info, warn};
use url::Url;
use warden_config::{RemoteAssetDescriptor, Secret};

use crate::error::{AssetError, AssetResult, RemoteFailure, RemoteFailureKind, check_status};
use crate::model::FetchedAsset;

/// Token prefixes accepted by the remote asset store.
pub const TOKEN_PREFIXES: [&str; 6] = ["ghp_", "github_pat_", "gho_", "ghu_", "ghs_", "ghr_"];
/// Timeout applied to the identity check.
pub const AUTH_TIMEOUT: Duration = Duration::from_secs(30);
/// Timeout applied to metadata and content downloads.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(60);

const API_ACCEPT: &str = "application/vnd.github.v3+json";
const USER_AGENT: &str = concat!("warden/", env!("CARGO_PKG_VERSION"));
const UNKNOWN_LOGIN: &str = "Unknown";

/// Outcome of the identity check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenCheck {
    /// The remote store confirmed the token.
    Verified {
        /// Account the token belongs to.
        login: String,
    },
    /// The token could not be confirmed but was not rejected either.
    Unverified {
        /// Why verification did not complete.
        reason: String,
    },
}

/// Reject tokens that do not carry a known prefix.
///
/// # Errors
///
/// Returns [`RemoteFailureKind::InvalidTokenFormat`] for unknown prefixes.
pub fn check_token_format(token: &Secret) -> Result<(), RemoteFailure> {
    let value = token.expose();
    if TOKEN_PREFIXES.iter().any(|prefix| value.starts_with(prefix)) {
        Ok(())
    } else {
        Err(RemoteFailure::invalid_token_format())
    }
}

#[derive(Debug, Deserialize)]
struct UserProfile {
    login: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContentMetadata {
    name: Option<String>,
    download_url: Option<String>,
}

/// Client for the remote asset store API.
#[derive(Debug, Clone)]
pub struct RemoteAssetClient {
    http: Client,
    api_base: Url,
}

impl RemoteAssetClient {
    /// Build a client against the given API base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the HTTP client cannot be built.
    pub fn new(api_base: &str) -> AssetResult<Self> {
        let api_base = Url::parse(api_base).map_err(|_| AssetError::InvalidBaseUrl {
            url: api_base.to_string(),
        })?;
        if api_base.cannot_be_a_base() {
            return Err(AssetError::InvalidBaseUrl {
                url: api_base.into(),
            });
        }

        let http = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|source| AssetError::Client { source })?;

        Ok(Self { http, api_base })
    }

    /// Base URL requests are resolved against.
    #[must_use]
    pub const fn api_base(&self) -> &Url {
        &self.api_base
    }

    /// Check the token format, then confirm it against the identity endpoint.
    ///
    /// # Errors
    ///
    /// Fails for malformed tokens (no request sent) and for a `401` response.
    /// Other statuses and transport errors are logged and reported as
    /// [`TokenCheck::Unverified`].
    pub async fn validate_token(&self, token: &Secret) -> AssetResult<TokenCheck> {
        check_token_format(token)?;

        let url = self.endpoint(&["user"])?;
        let response = match self
            .http
            .get(url.clone())
            .headers(api_headers(token)?)
            .timeout(AUTH_TIMEOUT)
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                warn!(url = %url, error = %err, "identity check request failed");
                return Ok(TokenCheck::Unverified {
                    reason: err.to_string(),
                });
            }
        };

        let status = response.status().as_u16();
        match check_status(status) {
            Ok(()) => {
                let login = response
                    .json::<UserProfile>()
                    .await
                    .ok()
                    .and_then(|profile| profile.login)
                    .unwrap_or_else(|| UNKNOWN_LOGIN.to_string());
                info!(login = %login, "access token verified");
                Ok(TokenCheck::Verified { login })
            }
            Err(failure) if failure.kind == RemoteFailureKind::AuthInvalid => Err(failure.into()),
            Err(failure) => {
                warn!(status, "identity check returned unexpected status");
                Ok(TokenCheck::Unverified {
                    reason: failure.to_string(),
                })
            }
        }
    }

    /// Resolve the file metadata and download its content.
    ///
    /// # Errors
    ///
    /// Returns a [`RemoteFailure`] for non-success statuses, and transport or
    /// decoding errors otherwise. Nothing is retried.
    pub async fn fetch(&self, descriptor: &RemoteAssetDescriptor) -> AssetResult<FetchedAsset> {
        let mut segments = vec![
            "repos",
            descriptor.owner.as_str(),
            descriptor.repository.as_str(),
            "contents",
        ];
        segments.extend(descriptor.path.split('/').filter(|part| !part.is_empty()));
        let url = self.endpoint(&segments)?;

        let response = self
            .http
            .get(url.clone())
            .headers(api_headers(&descriptor.token)?)
            .timeout(FETCH_TIMEOUT)
            .send()
            .await
            .map_err(|source| AssetError::Transport {
                operation: "assets.fetch_metadata",
                url: url.to_string(),
                source,
            })?;
        check_status(response.status().as_u16())?;

        let metadata = response
            .json::<ContentMetadata>()
            .await
            .map_err(|source| AssetError::Decode {
                operation: "assets.fetch_metadata",
                url: url.to_string(),
                source,
            })?;
        let name = metadata
            .name
            .filter(|name| !name.is_empty())
            .ok_or_else(|| AssetError::MalformedMetadata {
                url: url.to_string(),
                field: "name",
            })?;
        let download_url = metadata
            .download_url
            .filter(|locator| !locator.is_empty())
            .ok_or_else(|| AssetError::MalformedMetadata {
                url: url.to_string(),
                field: "download_url",
            })?;

        let content = self.download(&download_url).await?;
        info!(file = %name, bytes = content.len(), "remote asset downloaded");

        Ok(FetchedAsset {
            name,
            download_url,
            content,
        })
    }

    async fn download(&self, download_url: &str) -> AssetResult<Vec<u8>> {
        let response = self
            .http
            .get(download_url)
            .timeout(FETCH_TIMEOUT)
            .send()
            .await
            .map_err(|source| AssetError::Transport {
                operation: "assets.download",
                url: download_url.to_string(),
                source,
            })?;

        let status = response.status().as_u16();
        if status != 200 {
            return Err(RemoteFailure {
                kind: RemoteFailureKind::UnexpectedStatus,
                status,
            }
            .into());
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|source| AssetError::Decode {
                operation: "assets.download",
                url: download_url.to_string(),
                source,
            })?;
        Ok(bytes.to_vec())
    }

    fn endpoint(&self, segments: &[&str]) -> AssetResult<Url> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|()| AssetError::InvalidBaseUrl {
                url: self.api_base.to_string(),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

fn api_headers(token: &Secret) -> AssetResult<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(API_ACCEPT));
    let mut bearer = HeaderValue::from_str(&format!("Bearer {}", token.expose()))
        .map_err(|_| RemoteFailure::invalid_token_format())?;
    bearer.set_sensitive(true);
    headers.insert(AUTHORIZATION, bearer);
    Ok(headers)
}
