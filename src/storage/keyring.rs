//! OS keyring token storage
//!
//! Stores the serialized [`TokenRecord`] in the operating system's native
//! credential store (Keychain on macOS, Secret Service on Linux, Windows
//! Credential Manager on Windows). One keyring entry per account name, so
//! several MapMyFitness accounts can coexist on one machine.

use crate::auth::token::{AccessToken, RequestToken};
use crate::error::{MmfError, Result};
use crate::storage::{TokenRecord, TokenStorage};

/// Account name used when none is configured.
pub const DEFAULT_ACCOUNT: &str = "default";

/// Token storage backed by the OS keyring.
///
/// # Examples
///
/// ```no_run
/// use mapmyfitness::storage::{KeyringTokenStorage, TokenStorage};
///
/// # #[tokio::main]
/// # async fn main() {
/// let storage = KeyringTokenStorage::new("alice");
/// println!("authorized: {}", storage.has_access_token().await);
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct KeyringTokenStorage {
    account: String,
}

impl KeyringTokenStorage {
    /// Storage for the named account.
    pub fn new(account: impl Into<String>) -> Self {
        Self {
            account: account.into(),
        }
    }

    /// Keyring service name for an account, prefixed to avoid collisions with
    /// other applications.
    fn service_name(account: &str) -> String {
        format!("mapmyfitness-{}", account)
    }

    fn entry(&self) -> Result<::keyring::Entry> {
        let service = Self::service_name(&self.account);
        Ok(::keyring::Entry::new(&service, &self.account)?)
    }

    fn load(&self) -> Result<TokenRecord> {
        match self.entry()?.get_password() {
            Ok(json_str) => Ok(serde_json::from_str(&json_str)?),
            Err(::keyring::Error::NoEntry) => Ok(TokenRecord::default()),
            Err(e) => Err(MmfError::Keyring(e)),
        }
    }

    fn save(&self, record: &TokenRecord) -> Result<()> {
        let json_str = serde_json::to_string(record)?;
        self.entry()?.set_password(&json_str)?;
        Ok(())
    }
}

impl Default for KeyringTokenStorage {
    fn default() -> Self {
        Self::new(DEFAULT_ACCOUNT)
    }
}

#[async_trait::async_trait]
impl TokenStorage for KeyringTokenStorage {
    async fn has_access_token(&self) -> bool {
        match self.load() {
            Ok(record) => record.access_token.is_some(),
            Err(e) => {
                tracing::warn!(account = %self.account, "cannot read keyring entry: {e}");
                false
            }
        }
    }

    async fn retrieve_access_token(&self) -> Result<AccessToken> {
        self.load()?
            .access_token
            .ok_or_else(|| MmfError::TokenNotFound("access token".to_string()))
    }

    async fn store_access_token(&self, token: &AccessToken) -> Result<()> {
        let record = TokenRecord {
            request_token: None,
            access_token: Some(token.clone()),
        };
        self.save(&record)
    }

    async fn retrieve_request_token(&self) -> Result<RequestToken> {
        self.load()?
            .request_token
            .ok_or_else(|| MmfError::TokenNotFound("request token".to_string()))
    }

    async fn store_request_token(&self, token: &RequestToken) -> Result<()> {
        let mut record = self.load()?;
        record.request_token = Some(token.clone());
        self.save(&record)
    }

    async fn clear_token(&self) -> Result<()> {
        match self.entry()?.delete_password() {
            Ok(()) => Ok(()),
            Err(::keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(MmfError::Keyring(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_name_has_correct_prefix() {
        assert_eq!(
            KeyringTokenStorage::service_name("alice"),
            "mapmyfitness-alice"
        );
    }

    #[test]
    fn test_default_account() {
        assert_eq!(KeyringTokenStorage::default().account, DEFAULT_ACCOUNT);
    }

    // Keyring integration tests (require system keyring; skipped in CI)

    #[tokio::test]
    #[ignore = "requires system keyring"]
    async fn test_store_and_retrieve_via_keyring() {
        let storage = KeyringTokenStorage::new("mmf_keyring_roundtrip_test");
        storage
            .store_request_token(&RequestToken::new("req", "rs"))
            .await
            .expect("store request");
        storage
            .store_access_token(&AccessToken::new("acc", "as"))
            .await
            .expect("store access");

        assert!(storage.has_access_token().await);
        assert!(storage.retrieve_request_token().await.is_err());

        storage.clear_token().await.expect("clear");
        assert!(!storage.has_access_token().await);
    }

    #[tokio::test]
    #[ignore = "requires system keyring"]
    async fn test_clear_token_is_idempotent_via_keyring() {
        let storage = KeyringTokenStorage::new("mmf_keyring_idempotent_test");
        storage.clear_token().await.expect("first clear");
        storage.clear_token().await.expect("second clear is no-op");
    }
}
