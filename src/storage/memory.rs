//! In-memory token storage

use tokio::sync::Mutex;

use crate::auth::token::{AccessToken, RequestToken};
use crate::error::{MmfError, Result};
use crate::storage::{TokenRecord, TokenStorage};

/// Keeps tokens in process memory for the lifetime of the instance.
///
/// # Examples
///
/// ```
/// use mapmyfitness::auth::token::AccessToken;
/// use mapmyfitness::storage::{MemoryTokenStorage, TokenStorage};
///
/// # #[tokio::main]
/// # async fn main() -> mapmyfitness::error::Result<()> {
/// let storage = MemoryTokenStorage::new();
/// assert!(!storage.has_access_token().await);
///
/// storage.store_access_token(&AccessToken::new("tok", "secret")).await?;
/// assert!(storage.has_access_token().await);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct MemoryTokenStorage {
    record: Mutex<TokenRecord>,
}

impl MemoryTokenStorage {
    /// Creates empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates storage pre-loaded with an access token.
    pub fn with_access_token(token: AccessToken) -> Self {
        Self {
            record: Mutex::new(TokenRecord {
                request_token: None,
                access_token: Some(token),
            }),
        }
    }
}

#[async_trait::async_trait]
impl TokenStorage for MemoryTokenStorage {
    async fn has_access_token(&self) -> bool {
        self.record.lock().await.access_token.is_some()
    }

    async fn retrieve_access_token(&self) -> Result<AccessToken> {
        self.record
            .lock()
            .await
            .access_token
            .clone()
            .ok_or_else(|| MmfError::TokenNotFound("access token".to_string()))
    }

    async fn store_access_token(&self, token: &AccessToken) -> Result<()> {
        let mut record = self.record.lock().await;
        record.access_token = Some(token.clone());
        record.request_token = None;
        Ok(())
    }

    async fn retrieve_request_token(&self) -> Result<RequestToken> {
        self.record
            .lock()
            .await
            .request_token
            .clone()
            .ok_or_else(|| MmfError::TokenNotFound("request token".to_string()))
    }

    async fn store_request_token(&self, token: &RequestToken) -> Result<()> {
        self.record.lock().await.request_token = Some(token.clone());
        Ok(())
    }

    async fn clear_token(&self) -> Result<()> {
        *self.record.lock().await = TokenRecord::default();
        Ok(())
    }
}
