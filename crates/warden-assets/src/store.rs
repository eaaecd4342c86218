//! On-disk credential directory.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};
use crate::model::FetchedAsset;

/// Directory holding the worker's credential bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialStore {
    directory: PathBuf,
    expected_file: Option<String>,
}

impl CredentialStore {
    /// Store rooted at `directory` with no expected file.
    #[must_use]
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            expected_file: None,
        }
    }

    /// Require `name` to be present when verifying.
    #[must_use]
    pub fn expecting(mut self, name: Option<String>) -> Self {
        self.expected_file = name;
        self
    }

    /// Credential directory.
    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// File name that [`Self::verify`] requires, if any.
    #[must_use]
    pub fn expected_file(&self) -> Option<&str> {
        self.expected_file.as_deref()
    }

    /// Create the directory and its parents. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn ensure_directory(&self) -> StoreResult<()> {
        fs::create_dir_all(&self.directory).map_err(|source| StoreError::Io {
            operation: "store.ensure_directory",
            path: self.directory.clone(),
            source,
        })
    }

    /// Write the asset into the directory, replacing any previous copy.
    ///
    /// The asset's name becomes the expected file.
    ///
    /// # Errors
    ///
    /// Rejects names that would leave the directory, and propagates IO errors.
    pub fn persist(&mut self, asset: FetchedAsset) -> StoreResult<PathBuf> {
        let FetchedAsset { name, content, .. } = asset;
        if !is_plain_file_name(&name) {
            return Err(StoreError::InvalidFileName { name });
        }

        self.ensure_directory()?;
        let path = self.directory.join(&name);
        fs::write(&path, &content).map_err(|source| StoreError::Io {
            operation: "store.persist",
            path: path.clone(),
            source,
        })?;

        info!(path = %path.display(), bytes = content.len(), "credential file saved");
        self.expected_file = Some(name);
        Ok(path)
    }

    /// Confirm the directory exists, and the expected file if one is set.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DirectoryNotFound`] or [`StoreError::FileNotFound`].
    pub fn verify(&self) -> StoreResult<()> {
        if !self.directory.is_dir() {
            return Err(StoreError::DirectoryNotFound {
                path: self.directory.clone(),
            });
        }
        debug!(path = %self.directory.display(), "credential directory present");

        if let Some(name) = &self.expected_file {
            let path = self.directory.join(name);
            if !path.is_file() {
                return Err(StoreError::FileNotFound { path });
            }
            info!(path = %path.display(), "credential file present");
        }
        Ok(())
    }
}

fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
}
