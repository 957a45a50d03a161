//! Token storage backends
//!
//! The OAuth handshake spans two HTTP round trips (the user leaves for the
//! provider's authorize page and comes back), so the request token has to
//! survive between them, and the access token has to survive for every signed
//! call afterwards. [`TokenStorage`] is the contract the session controller
//! and the request executor use for that; any backend satisfying it can be
//! plugged into the client.
//!
//! Backends:
//!
//! - [`MemoryTokenStorage`] -- process memory, one logical session per
//!   instance. The default for library users.
//! - [`FileTokenStorage`] -- JSON record on disk, used by the `mmf` CLI.
//! - [`KeyringTokenStorage`] -- JSON record in the OS credential store.
//!
//! If several users share one process, give each of them their own storage
//! instance (or key a backend per user); the session controller itself does
//! not partition tokens.

use crate::auth::token::{AccessToken, RequestToken};
use crate::error::Result;

pub mod file;
pub mod keyring;
pub mod memory;

pub use file::FileTokenStorage;
pub use keyring::KeyringTokenStorage;
pub use memory::MemoryTokenStorage;

/// Persistence contract for OAuth 1.0a tokens.
///
/// At most one access token is current per storage. Storing an access token
/// supersedes the pending request token, which is never reused afterwards.
#[async_trait::async_trait]
pub trait TokenStorage: Send + Sync + std::fmt::Debug {
    /// `true` iff an access token is currently stored.
    ///
    /// Never fails: a backend error is logged and reported as `false`.
    async fn has_access_token(&self) -> bool;

    /// Returns the current access token.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::MmfError::TokenNotFound`] when none is stored,
    /// or a backend error if the record cannot be read.
    async fn retrieve_access_token(&self) -> Result<AccessToken>;

    /// Stores `token` as the current access token, replacing any previous one
    /// and discarding the pending request token.
    async fn store_access_token(&self, token: &AccessToken) -> Result<()>;

    /// Returns the pending request token.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::MmfError::TokenNotFound`] when none is stored.
    async fn retrieve_request_token(&self) -> Result<RequestToken>;

    /// Stores `token` as the pending request token.
    async fn store_request_token(&self, token: &RequestToken) -> Result<()>;

    /// Removes every stored token. Succeeds when nothing was stored.
    async fn clear_token(&self) -> Result<()>;
}

/// Serialized shape shared by the file and keyring backends.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TokenRecord {
    /// Request token awaiting the provider callback.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_token: Option<RequestToken>,
    /// Current access token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<AccessToken>,
}

impl TokenRecord {
    /// `true` when the record holds no token at all.
    pub fn is_empty(&self) -> bool {
        self.request_token.is_none() && self.access_token.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_record_serializes_to_empty_object() {
        let json = serde_json::to_string(&TokenRecord::default()).unwrap();
        assert_eq!(json, "{}");
    }

    #[test]
    fn test_record_tolerates_missing_fields() {
        let record: TokenRecord =
            serde_json::from_str(r#"{"access_token":{"token":"t","token_secret":"s"}}"#).unwrap();
        assert!(record.request_token.is_none());
        assert_eq!(record.access_token, Some(AccessToken::new("t", "s")));
        assert!(!record.is_empty());
    }
}
