//! Fetched asset payload.

use std::fmt::{self, Debug, Formatter};

/// Credential bundle downloaded from the remote asset store.
///
/// Consumed by [`crate::CredentialStore::persist`]; nothing keeps the bytes in
/// memory afterwards.
#[derive(Clone, PartialEq, Eq)]
pub struct FetchedAsset {
    /// File name reported by the remote store.
    pub name: String,
    /// Locator the bytes were downloaded from.
    pub download_url: String,
    /// Raw file content.
    pub content: Vec<u8>,
}

impl Debug for FetchedAsset {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("FetchedAsset")
            .field("name", &self.name)
            .field("download_url", &self.download_url)
            .field("content_len", &self.content.len())
            .finish()
    }
}
