//! Configuration management for the MapMyFitness client
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides,
//! applied in that order.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::auth::provider::{
    ProviderEndpoints, DEFAULT_ACCESS_TOKEN_URL, DEFAULT_API_BASE, DEFAULT_AUTHORIZE_URL,
    DEFAULT_REQUEST_TOKEN_URL,
};
use crate::client::ClientOptions;
use crate::error::{MmfError, Result};
use crate::response::ResponseFormat;
use crate::storage::keyring::DEFAULT_ACCOUNT;
use crate::storage::{FileTokenStorage, KeyringTokenStorage, MemoryTokenStorage, TokenStorage};

/// Upper bound for `timeout_seconds`.
const MAX_TIMEOUT_SECONDS: u64 = 600;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application credentials issued by MapMyFitness
    #[serde(default)]
    pub credentials: CredentialsConfig,

    /// Response format wire name: json, xml, php or txt
    #[serde(default = "default_response_format")]
    pub response_format: String,

    /// Allow the `php` response format
    #[serde(default)]
    pub allow_native_serialized: bool,

    /// Provider and API URLs
    #[serde(default)]
    pub endpoints: EndpointsConfig,

    /// Where tokens are kept between runs
    #[serde(default)]
    pub storage: StorageConfig,

    /// HTTP timeout for every request (seconds)
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// User-Agent header override
    #[serde(default)]
    pub user_agent: Option<String>,

    /// User that catalog calls act on by default
    #[serde(default)]
    pub user_id: Option<String>,
}

fn default_response_format() -> String {
    ResponseFormat::default().wire_name().to_string()
}

fn default_timeout() -> u64 {
    30
}

/// Consumer credentials
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CredentialsConfig {
    /// Consumer key
    #[serde(default)]
    pub consumer_key: String,

    /// Consumer secret
    #[serde(default)]
    pub consumer_secret: String,

    /// OAuth callback URL; out-of-band verification when unset
    #[serde(default)]
    pub callback_url: Option<String>,
}

/// OAuth provider and REST API URLs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointsConfig {
    #[serde(default = "default_request_token_url")]
    pub request_token_url: String,

    #[serde(default = "default_authorize_url")]
    pub authorize_url: String,

    #[serde(default = "default_access_token_url")]
    pub access_token_url: String,

    /// Base URL every API path is resolved against
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

fn default_request_token_url() -> String {
    DEFAULT_REQUEST_TOKEN_URL.to_string()
}

fn default_authorize_url() -> String {
    DEFAULT_AUTHORIZE_URL.to_string()
}

fn default_access_token_url() -> String {
    DEFAULT_ACCESS_TOKEN_URL.to_string()
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            request_token_url: default_request_token_url(),
            authorize_url: default_authorize_url(),
            access_token_url: default_access_token_url(),
            api_base: default_api_base(),
        }
    }
}

impl EndpointsConfig {
    /// Every endpoint under one root, see [`ProviderEndpoints::rooted_at`].
    pub fn rooted_at(root: &str) -> Result<Self> {
        Ok(Self::from(&ProviderEndpoints::rooted_at(root)?))
    }

    /// Parses the URLs.
    pub fn to_endpoints(&self) -> Result<ProviderEndpoints> {
        ProviderEndpoints::new(
            &self.request_token_url,
            &self.authorize_url,
            &self.access_token_url,
            &self.api_base,
        )
    }
}

impl From<&ProviderEndpoints> for EndpointsConfig {
    fn from(endpoints: &ProviderEndpoints) -> Self {
        Self {
            request_token_url: endpoints.request_token_url.to_string(),
            authorize_url: endpoints.authorize_url.to_string(),
            access_token_url: endpoints.access_token_url.to_string(),
            api_base: endpoints.api_base.to_string(),
        }
    }
}

/// Token storage backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process memory; tokens are lost on exit
    Memory,
    /// JSON file on disk
    #[default]
    File,
    /// OS keyring
    Keyring,
}

impl std::str::FromStr for StorageBackend {
    type Err = MmfError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(StorageBackend::Memory),
            "file" => Ok(StorageBackend::File),
            "keyring" => Ok(StorageBackend::Keyring),
            other => Err(MmfError::Configuration(format!(
                "Invalid storage backend: {other}. Must be one of: memory, file, keyring"
            ))),
        }
    }
}

/// Token storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Backend kind
    #[serde(default)]
    pub backend: StorageBackend,

    /// Token file for the `file` backend; platform data dir when unset
    #[serde(default)]
    pub path: Option<String>,

    /// Account name for the `keyring` backend
    #[serde(default = "default_account")]
    pub account: String,
}

fn default_account() -> String {
    DEFAULT_ACCOUNT.to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            path: None,
            account: default_account(),
        }
    }
}

impl StorageConfig {
    /// Creates the configured storage backend.
    ///
    /// # Errors
    ///
    /// Returns [`MmfError::Storage`] when the default token file location
    /// cannot be determined.
    pub fn build(&self) -> Result<Arc<dyn TokenStorage>> {
        let storage: Arc<dyn TokenStorage> = match self.backend {
            StorageBackend::Memory => Arc::new(MemoryTokenStorage::new()),
            StorageBackend::File => match &self.path {
                Some(path) => Arc::new(FileTokenStorage::new_with_path(path)),
                None => Arc::new(FileTokenStorage::new()?),
            },
            StorageBackend::Keyring => Arc::new(KeyringTokenStorage::new(self.account.clone())),
        };
        tracing::debug!(backend = ?self.backend, "token storage ready");
        Ok(storage)
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// A missing file is not an error: defaults are used and a warning is
    /// logged.
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    /// Parse a YAML configuration file
    pub fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| MmfError::Configuration(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| MmfError::Configuration(format!("Failed to parse config: {}", e)))
    }

    fn apply_env_vars(&mut self) {
        if let Ok(key) = std::env::var("MMF_CONSUMER_KEY") {
            self.credentials.consumer_key = key;
        }

        if let Ok(secret) = std::env::var("MMF_CONSUMER_SECRET") {
            self.credentials.consumer_secret = secret;
        }

        if let Ok(callback) = std::env::var("MMF_CALLBACK_URL") {
            self.credentials.callback_url = Some(callback).filter(|c| !c.is_empty());
        }

        if let Ok(format) = std::env::var("MMF_RESPONSE_FORMAT") {
            self.response_format = format;
        }

        if let Ok(allow) = std::env::var("MMF_ALLOW_NATIVE_SERIALIZED") {
            match allow.to_lowercase().as_str() {
                "1" | "true" | "yes" => self.allow_native_serialized = true,
                "0" | "false" | "no" => self.allow_native_serialized = false,
                _ => tracing::warn!("Invalid MMF_ALLOW_NATIVE_SERIALIZED: {}", allow),
            }
        }

        // A provider root replaces all four URLs; MMF_API_BASE may still
        // move the REST base afterwards.
        if let Ok(root) = std::env::var("MMF_PROVIDER_ROOT") {
            match EndpointsConfig::rooted_at(&root) {
                Ok(endpoints) => self.endpoints = endpoints,
                Err(e) => tracing::warn!("Invalid MMF_PROVIDER_ROOT: {}", e),
            }
        }

        if let Ok(api_base) = std::env::var("MMF_API_BASE") {
            self.endpoints.api_base = api_base;
        }

        if let Ok(backend) = std::env::var("MMF_STORAGE_BACKEND") {
            match backend.parse() {
                Ok(value) => self.storage.backend = value,
                Err(_) => tracing::warn!(
                    "Invalid MMF_STORAGE_BACKEND: {}, using {:?}",
                    backend,
                    self.storage.backend
                ),
            }
        }

        if let Ok(path) = std::env::var("MMF_STORAGE_PATH") {
            self.storage.path = Some(path);
        }

        if let Ok(timeout) = std::env::var("MMF_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse() {
                self.timeout_seconds = value;
            } else {
                tracing::warn!("Invalid MMF_TIMEOUT_SECONDS: {}", timeout);
            }
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if cli.verbose {
            tracing::debug!("Verbose mode enabled");
        }

        if let Some(format) = &cli.format {
            self.response_format = format.clone();
        }

        if let Some(path) = &cli.storage_path {
            self.storage.backend = StorageBackend::File;
            self.storage.path = Some(path.clone());
        }

        if let Some(user) = &cli.user {
            self.user_id = Some(user.clone());
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns [`MmfError::Configuration`] naming the first invalid field
    pub fn validate(&self) -> Result<()> {
        if self.credentials.consumer_key.trim().is_empty() {
            return Err(MmfError::Configuration(
                "credentials.consumer_key cannot be empty (set MMF_CONSUMER_KEY)".to_string(),
            ));
        }

        if self.credentials.consumer_secret.trim().is_empty() {
            return Err(MmfError::Configuration(
                "credentials.consumer_secret cannot be empty (set MMF_CONSUMER_SECRET)".to_string(),
            ));
        }

        if let Some(callback) = &self.credentials.callback_url {
            url::Url::parse(callback).map_err(|e| {
                MmfError::Configuration(format!("Invalid callback_url '{}': {}", callback, e))
            })?;
        }

        ResponseFormat::select(&self.response_format, self.allow_native_serialized)?;

        self.endpoints.to_endpoints()?;

        if self.timeout_seconds == 0 {
            return Err(MmfError::Configuration(
                "timeout_seconds must be greater than 0".to_string(),
            ));
        }

        if self.timeout_seconds > MAX_TIMEOUT_SECONDS {
            return Err(MmfError::Configuration(format!(
                "timeout_seconds must be less than or equal to {}",
                MAX_TIMEOUT_SECONDS
            )));
        }

        if self.storage.backend == StorageBackend::Keyring && self.storage.account.trim().is_empty()
        {
            return Err(MmfError::Configuration(
                "storage.account cannot be empty for the keyring backend".to_string(),
            ));
        }

        Ok(())
    }

    /// Client construction parameters from this configuration.
    ///
    /// # Errors
    ///
    /// Returns [`MmfError::Configuration`] when an endpoint URL is invalid
    pub fn client_options(&self) -> Result<ClientOptions> {
        let mut options = ClientOptions::new(
            self.credentials.consumer_key.clone(),
            self.credentials.consumer_secret.clone(),
        )
        .with_response_format(self.response_format.clone())
        .allow_native_serialized(self.allow_native_serialized)
        .with_endpoints(self.endpoints.to_endpoints()?);

        if let Some(callback) = &self.credentials.callback_url {
            options = options.with_callback_url(callback.clone());
        }
        Ok(options)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            credentials: CredentialsConfig::default(),
            response_format: default_response_format(),
            allow_native_serialized: false,
            endpoints: EndpointsConfig::default(),
            storage: StorageConfig::default(),
            timeout_seconds: default_timeout(),
            user_agent: None,
            user_id: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use serial_test::serial;

    fn valid() -> Config {
        let mut config = Config::default();
        config.credentials.consumer_key = "ck".to_string();
        config.credentials.consumer_secret = "cs".to_string();
        config
    }

    #[test]
    #[serial]
    fn test_load_nonexistent_file_uses_defaults() {
        let config = Config::load("nonexistent.yaml", &Cli::default()).unwrap();
        assert_eq!(config.response_format, "json");
        assert_eq!(config.endpoints.api_base, DEFAULT_API_BASE);
        assert_eq!(config.timeout_seconds, 30);
    }

    #[test]
    fn test_parse_full_yaml() {
        let yaml = r#"
credentials:
  consumer_key: ck
  consumer_secret: cs
  callback_url: http://127.0.0.1:8765/callback
response_format: xml
endpoints:
  api_base: http://localhost:9000/3.1/
storage:
  backend: keyring
  account: work
timeout_seconds: 10
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.credentials.consumer_key, "ck");
        assert_eq!(config.response_format, "xml");
        assert_eq!(config.endpoints.api_base, "http://localhost:9000/3.1/");
        assert_eq!(config.endpoints.authorize_url, DEFAULT_AUTHORIZE_URL);
        assert_eq!(config.storage.backend, StorageBackend::Keyring);
        assert_eq!(config.storage.account, "work");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_example_config_parses() {
        let config = Config::from_file("config/config.yaml")
            .expect("Failed to parse config/config.yaml");
        assert_eq!(config.response_format, "json");
        assert_eq!(config.storage.backend, StorageBackend::File);
    }

    #[test]
    fn test_validate_requires_credentials() {
        let config = Config::default();
        assert!(matches!(
            config.validate(),
            Err(MmfError::Configuration(_))
        ));
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_unknown_format() {
        let mut config = valid();
        config.response_format = "yaml".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_gates_native_serialized() {
        let mut config = valid();
        config.response_format = "php".to_string();
        assert!(config.validate().is_err());

        config.allow_native_serialized = true;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_urls_and_timeouts() {
        let mut config = valid();
        config.endpoints.api_base = "not a url".to_string();
        assert!(config.validate().is_err());

        let mut config = valid();
        config.credentials.callback_url = Some("/relative".to_string());
        assert!(config.validate().is_err());

        let mut config = valid();
        config.timeout_seconds = 0;
        assert!(config.validate().is_err());

        config.timeout_seconds = MAX_TIMEOUT_SECONDS + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_cli_overrides_take_precedence() {
        let mut config = valid();
        let cli = Cli {
            format: Some("txt".to_string()),
            storage_path: Some("/tmp/mmf-test-tokens.json".to_string()),
            user: Some("42".to_string()),
            ..Cli::default()
        };
        config.storage.backend = StorageBackend::Memory;
        config.apply_cli_overrides(&cli);

        assert_eq!(config.response_format, "txt");
        assert_eq!(config.storage.backend, StorageBackend::File);
        assert_eq!(
            config.storage.path.as_deref(),
            Some("/tmp/mmf-test-tokens.json")
        );
        assert_eq!(config.user_id.as_deref(), Some("42"));
    }

    #[test]
    fn test_client_options_carry_endpoints() {
        let mut config = valid();
        config.endpoints = EndpointsConfig::rooted_at("http://127.0.0.1:1/3.1").unwrap();
        let options = config.client_options().unwrap();
        assert_eq!(
            options.endpoints.access_token_url.as_str(),
            "http://127.0.0.1:1/3.1/oauth/access_token"
        );
        assert_eq!(options.callback_url, None);
    }

    #[test]
    fn test_storage_backend_from_str() {
        assert_eq!("Keyring".parse::<StorageBackend>().unwrap(), StorageBackend::Keyring);
        assert!("sqlite".parse::<StorageBackend>().is_err());
    }

    #[test]
    #[serial]
    fn test_apply_env_vars_overrides_fields() {
        std::env::set_var("MMF_CONSUMER_KEY", "env-key");
        std::env::set_var("MMF_RESPONSE_FORMAT", "xml");
        std::env::set_var("MMF_STORAGE_BACKEND", "memory");
        std::env::set_var("MMF_TIMEOUT_SECONDS", "not-a-number");

        let mut config = Config::default();
        config.apply_env_vars();

        assert_eq!(config.credentials.consumer_key, "env-key");
        assert_eq!(config.response_format, "xml");
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.timeout_seconds, 30);

        std::env::remove_var("MMF_CONSUMER_KEY");
        std::env::remove_var("MMF_RESPONSE_FORMAT");
        std::env::remove_var("MMF_STORAGE_BACKEND");
        std::env::remove_var("MMF_TIMEOUT_SECONDS");
    }

    #[test]
    #[serial]
    fn test_apply_env_vars_provider_root() {
        std::env::set_var("MMF_PROVIDER_ROOT", "http://127.0.0.1:9000/3.1");

        let mut config = Config::default();
        config.apply_env_vars();

        assert_eq!(
            config.endpoints.request_token_url,
            "http://127.0.0.1:9000/3.1/oauth/request_token"
        );
        assert_eq!(config.endpoints.api_base, "http://127.0.0.1:9000/3.1/");

        std::env::remove_var("MMF_PROVIDER_ROOT");
    }
}
