//! JSON-file token storage
//!
//! The whole [`TokenRecord`] is rewritten on every store: it goes to a
//! sibling temp file, created with mode `0600` on Unix, which is then renamed
//! over the token file.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use tokio::io::AsyncWriteExt;

use crate::auth::token::{AccessToken, RequestToken};
use crate::error::{MmfError, Result};
use crate::storage::{TokenRecord, TokenStorage};

/// File name used inside the platform data directory.
pub const DEFAULT_TOKEN_FILE: &str = "tokens.json";

/// Persists tokens as a JSON document on disk.
#[derive(Debug, Clone)]
pub struct FileTokenStorage {
    path: PathBuf,
}

impl FileTokenStorage {
    /// Storage at the default location, `<data dir>/mmf/tokens.json`.
    ///
    /// # Errors
    ///
    /// Returns [`MmfError::Storage`] if the platform data directory cannot be
    /// determined.
    pub fn new() -> Result<Self> {
        Ok(Self::new_with_path(Self::default_path()?))
    }

    /// Storage at an explicit path. The file is created lazily on first store.
    ///
    /// # Examples
    ///
    /// ```
    /// use mapmyfitness::storage::FileTokenStorage;
    ///
    /// let storage = FileTokenStorage::new_with_path("/tmp/mmf-tokens.json");
    /// assert!(storage.path().ends_with("mmf-tokens.json"));
    /// ```
    pub fn new_with_path<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    /// The default token file path for this platform.
    pub fn default_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("com", "mapmyfitness", "mmf")
            .ok_or_else(|| MmfError::Storage("could not determine data directory".into()))?;
        Ok(proj_dirs.data_dir().join(DEFAULT_TOKEN_FILE))
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File contents, `None` when the file does not exist.
    async fn read(&self) -> Result<Option<String>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(MmfError::Storage(format!(
                "failed to read token file {}: {e}",
                self.path.display()
            ))),
        }
    }

    fn parse(&self, contents: &str) -> Result<TokenRecord> {
        if contents.trim().is_empty() {
            return Ok(TokenRecord::default());
        }
        serde_json::from_str(contents).map_err(|e| {
            MmfError::Storage(format!(
                "token file {} is corrupt: {e}",
                self.path.display()
            ))
        })
    }

    async fn load(&self) -> Result<TokenRecord> {
        match self.read().await? {
            Some(contents) => self.parse(&contents),
            None => Ok(TokenRecord::default()),
        }
    }

    /// The record a store starts from. A corrupt record is replaced; a file
    /// that cannot be read at all is an error.
    async fn load_for_update(&self) -> Result<TokenRecord> {
        let Some(contents) = self.read().await? else {
            return Ok(TokenRecord::default());
        };
        match self.parse(&contents) {
            Ok(record) => Ok(record),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "overwriting token file: {e}");
                Ok(TokenRecord::default())
            }
        }
    }

    /// Sibling file the record is written to before it replaces `path`.
    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    async fn save(&self, record: &TokenRecord) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    MmfError::Storage(format!(
                        "failed to create directory {}: {e}",
                        parent.display()
                    ))
                })?;
            }
        }

        let json = serde_json::to_string_pretty(record)?;
        let temp = self.temp_path();
        let write_failed = |e: std::io::Error| {
            MmfError::Storage(format!(
                "failed to write token file {}: {e}",
                temp.display()
            ))
        };

        // A leftover from an interrupted store may carry other permissions.
        match tokio::fs::remove_file(&temp).await {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => return Err(write_failed(e)),
            _ => {}
        }

        let mut options = tokio::fs::OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        options.mode(0o600);

        let mut file = options.open(&temp).await.map_err(write_failed)?;
        file.write_all(json.as_bytes()).await.map_err(write_failed)?;
        file.sync_all().await.map_err(write_failed)?;
        drop(file);

        tokio::fs::rename(&temp, &self.path).await.map_err(|e| {
            MmfError::Storage(format!(
                "failed to replace token file {}: {e}",
                self.path.display()
            ))
        })
    }
}

#[async_trait::async_trait]
impl TokenStorage for FileTokenStorage {
    async fn has_access_token(&self) -> bool {
        match self.load().await {
            Ok(record) => record.access_token.is_some(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "cannot read token file: {e}");
                false
            }
        }
    }

    async fn retrieve_access_token(&self) -> Result<AccessToken> {
        self.load()
            .await?
            .access_token
            .ok_or_else(|| MmfError::TokenNotFound("access token".to_string()))
    }

    async fn store_access_token(&self, token: &AccessToken) -> Result<()> {
        let mut record = self.load_for_update().await?;
        record.access_token = Some(token.clone());
        record.request_token = None;
        self.save(&record).await
    }

    async fn retrieve_request_token(&self) -> Result<RequestToken> {
        self.load()
            .await?
            .request_token
            .ok_or_else(|| MmfError::TokenNotFound("request token".to_string()))
    }

    async fn store_request_token(&self, token: &RequestToken) -> Result<()> {
        let mut record = self.load_for_update().await?;
        record.request_token = Some(token.clone());
        self.save(&record).await
    }

    async fn clear_token(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(MmfError::Storage(format!(
                "failed to remove token file {}: {e}",
                self.path.display()
            ))),
        }
    }
}
