//! mapmyfitness - MapMyFitness API client library
//!
//! This library provides an OAuth 1.0a client for the MapMyFitness 3.1 API:
//! the three-legged handshake, pluggable token storage, signed requests and
//! response decoding, plus a typed catalog of the API routes.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `auth`: OAuth 1.0a signing, provider endpoints and the session state machine
//! - `storage`: Token storage trait with memory, file and keyring backends
//! - `transport`: HTTP abstraction used for every outgoing request
//! - `response`: Decoding of json, xml, php and raw bodies
//! - `client`: The signed request executor
//! - `catalog`: Route table and typed wrappers per resource group
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`, `commands`: The `mmf` command-line tool
//!
//! # Example
//!
//! ```no_run
//! use mapmyfitness::{ApiClient, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config/config.yaml", &Default::default())?;
//!     let client = ApiClient::from_config(&config)?;
//!
//!     if client.is_authorized().await {
//!         let workouts = client.get_workouts(None, Default::default()).await?;
//!         println!("{}", workouts.to_json());
//!     }
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod catalog;
pub mod cli;
pub mod client;
pub mod commands;
pub mod config;
pub mod error;
pub mod response;
pub mod storage;
pub mod transport;

// Re-export commonly used types
pub use auth::{CallbackParams, SessionOutcome, SessionState};
pub use catalog::{Endpoint, Params};
pub use client::{ApiClient, ClientOptions, CustomResponse};
pub use config::Config;
pub use error::{MmfError, Result};
pub use response::{Decoded, ResponseFormat};
pub use storage::TokenStorage;
