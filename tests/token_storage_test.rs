//! Token storage integration tests
//!
//! The same contract is checked against every backend that can run in CI.
//! The keyring backend needs a desktop secret service and is covered by an
//! ignored test.

use tempfile::TempDir;

use mapmyfitness::auth::{AccessToken, RequestToken};
use mapmyfitness::storage::{FileTokenStorage, KeyringTokenStorage, MemoryTokenStorage};
use mapmyfitness::{MmfError, TokenStorage};

async fn check_contract(storage: &dyn TokenStorage) {
    assert!(!storage.has_access_token().await);
    assert!(matches!(
        storage.retrieve_access_token().await,
        Err(MmfError::TokenNotFound(_))
    ));
    assert!(matches!(
        storage.retrieve_request_token().await,
        Err(MmfError::TokenNotFound(_))
    ));

    storage
        .store_request_token(&RequestToken::new("T", "TS"))
        .await
        .unwrap();
    assert_eq!(storage.retrieve_request_token().await.unwrap().token_secret, "TS");
    assert!(!storage.has_access_token().await);

    storage
        .store_access_token(&AccessToken::new("A", "AS"))
        .await
        .unwrap();
    assert!(storage.has_access_token().await);
    assert_eq!(storage.retrieve_access_token().await.unwrap().token, "A");
    assert!(storage.retrieve_request_token().await.is_err());

    storage
        .store_access_token(&AccessToken::new("B", "BS"))
        .await
        .unwrap();
    assert_eq!(storage.retrieve_access_token().await.unwrap().token, "B");

    storage.clear_token().await.unwrap();
    assert!(!storage.has_access_token().await);
    storage.clear_token().await.unwrap();
}

#[tokio::test]
async fn test_memory_storage_contract() {
    check_contract(&MemoryTokenStorage::new()).await;
}

#[tokio::test]
async fn test_file_storage_contract() {
    let dir = TempDir::new().unwrap();
    let storage = FileTokenStorage::new_with_path(dir.path().join("tokens.json"));
    check_contract(&storage).await;
}

#[tokio::test]
async fn test_file_storage_survives_new_instance() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("tokens.json");

    FileTokenStorage::new_with_path(&path)
        .store_access_token(&AccessToken::new("A", "AS"))
        .await
        .unwrap();

    let reopened = FileTokenStorage::new_with_path(&path);
    assert!(reopened.has_access_token().await);
    assert_eq!(reopened.retrieve_access_token().await.unwrap().token_secret, "AS");
}

#[tokio::test]
async fn test_corrupt_token_file_is_storage_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("tokens.json");
    std::fs::write(&path, "{not json").unwrap();

    let storage = FileTokenStorage::new_with_path(&path);
    assert!(!storage.has_access_token().await);
    assert!(matches!(
        storage.retrieve_access_token().await,
        Err(MmfError::Storage(_))
    ));
}

#[tokio::test]
#[ignore = "requires an OS keyring service"]
async fn test_keyring_storage_contract() {
    let storage = KeyringTokenStorage::new("mapmyfitness-integration-test");
    storage.clear_token().await.unwrap();
    check_contract(&storage).await;
}
