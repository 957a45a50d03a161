//! OAuth 1.0a authorization for the MapMyFitness API
//!
//! - [`token`] -- consumer credentials and token pairs.
//! - [`oauth1`] -- HMAC-SHA1 request signing.
//! - [`provider`] -- provider endpoints and the two token requests.
//! - [`session`] -- the three-state handshake controller.

pub mod oauth1;
pub mod provider;
pub mod session;
pub mod token;

pub use provider::ProviderEndpoints;
pub use session::{CallbackParams, SessionController, SessionOutcome, SessionState};
pub use token::{AccessToken, Credentials, RequestToken};
