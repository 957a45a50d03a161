//! OAuth session controller
//!
//! Drives the three-legged OAuth 1.0a handshake:
//!
//! ```text
//!   Unauthenticated --init_session()--> AwaitingCallback      (Redirect { url })
//!   AwaitingCallback --init_session(callback)--> Authorized   (AccessGranted)
//!   Authorized --init_session()--> Authorized                 (AlreadyAuthorized)
//!   any --reset_session()--> Unauthenticated
//! ```
//!
//! The transition itself is decided by the pure [`plan`] function; the
//! controller only executes the side effect the plan asks for and commits the
//! new state once that side effect has succeeded. A failed step leaves the
//! state untouched.
//!
//! The controller never performs the redirect itself. A web host turns
//! [`SessionOutcome::Redirect`] into a `302`, and the CLI prints the URL.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::auth::provider::{OAuthProvider, ProviderEndpoints};
use crate::auth::token::{AccessToken, Credentials};
use crate::error::{MmfError, Result};
use crate::storage::TokenStorage;
use crate::transport::Transport;

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// Handshake progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No handshake in progress (initial state).
    #[default]
    Unauthenticated,
    /// Request token issued, waiting for the provider to redirect back.
    AwaitingCallback,
    /// Access token stored.
    Authorized,
}

impl SessionState {
    /// Legacy numeric flag (`0`, `1`, `2`) for hosts that keep the state in
    /// their own session store.
    pub fn as_flag(&self) -> u8 {
        match self {
            SessionState::Unauthenticated => 0,
            SessionState::AwaitingCallback => 1,
            SessionState::Authorized => 2,
        }
    }

    /// Inverse of [`as_flag`](Self::as_flag). Unknown values read as
    /// `Unauthenticated`, like an unset flag.
    pub fn from_flag(flag: u8) -> Self {
        match flag {
            1 => SessionState::AwaitingCallback,
            2 => SessionState::Authorized,
            _ => SessionState::Unauthenticated,
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SessionState::Unauthenticated => "unauthenticated",
            SessionState::AwaitingCallback => "awaiting_callback",
            SessionState::Authorized => "authorized",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// CallbackParams
// ---------------------------------------------------------------------------

/// Query parameters the provider appends when redirecting back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackParams {
    /// Echo of the request token.
    pub oauth_token: String,
    /// One-time verifier proving user consent. Empty if the provider sent none.
    pub oauth_verifier: String,
}

impl CallbackParams {
    /// Creates callback parameters directly.
    pub fn new(oauth_token: impl Into<String>, oauth_verifier: impl Into<String>) -> Self {
        Self {
            oauth_token: oauth_token.into(),
            oauth_verifier: oauth_verifier.into(),
        }
    }

    /// Extracts the callback from a raw query string (leading `?` allowed).
    ///
    /// Returns `None` unless `oauth_token` is present, which is how a plain
    /// visit is told apart from a provider callback.
    ///
    /// # Examples
    ///
    /// ```
    /// use mapmyfitness::auth::session::CallbackParams;
    ///
    /// let cb = CallbackParams::from_query("?oauth_token=T&oauth_verifier=V123").unwrap();
    /// assert_eq!(cb.oauth_token, "T");
    /// assert_eq!(cb.oauth_verifier, "V123");
    ///
    /// assert!(CallbackParams::from_query("page=2").is_none());
    /// ```
    pub fn from_query(query: &str) -> Option<Self> {
        let mut token = None;
        let mut verifier = String::new();
        for (key, value) in url::form_urlencoded::parse(query.trim_start_matches('?').as_bytes()) {
            match key.as_ref() {
                "oauth_token" => token = Some(value.into_owned()),
                "oauth_verifier" => verifier = value.into_owned(),
                _ => {}
            }
        }
        token.map(|oauth_token| Self {
            oauth_token,
            oauth_verifier: verifier,
        })
    }

    /// Extracts the callback from the full redirect URL.
    pub fn from_url(url: &Url) -> Option<Self> {
        url.query().and_then(Self::from_query)
    }
}

// ---------------------------------------------------------------------------
// Transition planning
// ---------------------------------------------------------------------------

/// Side effect requested by a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Obtain a request token and send the user to the authorize page.
    StartHandshake,
    /// Exchange the callback's token and verifier for an access token.
    CompleteHandshake(CallbackParams),
    /// Nothing to do.
    None,
}

/// Result of [`plan`]: where the session goes and what must happen first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// State the plan was made from.
    pub from: SessionState,
    /// State to commit once `action` succeeds.
    pub to: SessionState,
    /// Side effect to run.
    pub action: Action,
}

/// Decides the next transition for `init_session`.
///
/// A session left in `AwaitingCallback` without callback data (the user
/// abandoned the authorize page, or the host lost its state) falls back to
/// `Unauthenticated` and starts a fresh handshake.
///
/// # Examples
///
/// ```
/// use mapmyfitness::auth::session::{plan, Action, CallbackParams, SessionState};
///
/// let t = plan(SessionState::Unauthenticated, None);
/// assert_eq!(t.to, SessionState::AwaitingCallback);
/// assert_eq!(t.action, Action::StartHandshake);
///
/// let cb = CallbackParams::new("T", "V");
/// let t = plan(SessionState::AwaitingCallback, Some(&cb));
/// assert_eq!(t.to, SessionState::Authorized);
/// ```
pub fn plan(state: SessionState, callback: Option<&CallbackParams>) -> Transition {
    let (to, action) = match (state, callback) {
        (SessionState::Authorized, _) => (SessionState::Authorized, Action::None),
        (SessionState::AwaitingCallback, Some(params)) => (
            SessionState::Authorized,
            Action::CompleteHandshake(params.clone()),
        ),
        // A stale AwaitingCallback is treated as Unauthenticated.
        (SessionState::Unauthenticated, _) | (SessionState::AwaitingCallback, None) => {
            (SessionState::AwaitingCallback, Action::StartHandshake)
        }
    };

    Transition {
        from: state,
        to,
        action,
    }
}

// ---------------------------------------------------------------------------
// SessionOutcome
// ---------------------------------------------------------------------------

/// What the caller must do after [`SessionController::init_session`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Send the user agent to `url` (HTTP 302 for a web host).
    Redirect {
        /// Authorize URL carrying the fresh request token.
        url: Url,
    },
    /// The handshake just completed and an access token is stored.
    AccessGranted,
    /// The session was already authorized; nothing happened.
    AlreadyAuthorized,
}

impl SessionOutcome {
    /// `true` when the session is authorized after the call.
    pub fn is_granted(&self) -> bool {
        matches!(
            self,
            SessionOutcome::AccessGranted | SessionOutcome::AlreadyAuthorized
        )
    }

    /// The redirect target, if any.
    pub fn redirect_url(&self) -> Option<&Url> {
        match self {
            SessionOutcome::Redirect { url } => Some(url),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// SessionController
// ---------------------------------------------------------------------------

/// Owns the handshake state and drives it through token storage and the
/// provider.
///
/// Tokens are never cached here: every read and write goes through the
/// [`TokenStorage`] handed in at construction.
#[derive(Debug)]
pub struct SessionController {
    credentials: Credentials,
    endpoints: ProviderEndpoints,
    storage: Arc<dyn TokenStorage>,
    transport: Arc<dyn Transport>,
    state: SessionState,
}

impl SessionController {
    /// Creates a controller in the `Unauthenticated` state.
    pub fn new(
        credentials: Credentials,
        endpoints: ProviderEndpoints,
        storage: Arc<dyn TokenStorage>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            credentials,
            endpoints,
            storage,
            transport,
            state: SessionState::Unauthenticated,
        }
    }

    /// Current handshake state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Restores a state previously persisted by the host, e.g. from
    /// [`SessionState::from_flag`] on the callback request.
    pub fn restore_state(&mut self, state: SessionState) {
        self.state = state;
    }

    /// The consumer credentials.
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// The provider endpoints.
    pub fn endpoints(&self) -> &ProviderEndpoints {
        &self.endpoints
    }

    /// Advances the handshake by one step.
    ///
    /// Pass `None` on a plain visit and the provider's callback parameters
    /// when handling the redirect back.
    ///
    /// # Errors
    ///
    /// - Step 1: [`MmfError::Transport`] or [`MmfError::AuthFailure`] from the
    ///   request-token call, or a storage error.
    /// - Step 2: [`MmfError::AuthFailure`] when no request token is pending,
    ///   the callback token does not match it, the verifier is missing, or the
    ///   provider rejects the exchange.
    ///
    /// The state is only advanced when the step succeeds.
    pub async fn init_session(
        &mut self,
        callback: Option<&CallbackParams>,
    ) -> Result<SessionOutcome> {
        let current = self.effective_state().await;
        let transition = plan(current, callback);

        let outcome = match &transition.action {
            Action::StartHandshake => {
                let url = self.start_handshake().await?;
                SessionOutcome::Redirect { url }
            }
            Action::CompleteHandshake(params) => {
                self.complete_handshake(params).await?;
                SessionOutcome::AccessGranted
            }
            Action::None => SessionOutcome::AlreadyAuthorized,
        };

        if transition.from != transition.to {
            tracing::info!(from = %transition.from, to = %transition.to, "OAuth session transition");
        }
        self.state = transition.to;

        Ok(outcome)
    }

    /// Clears stored tokens and returns to `Unauthenticated`.
    ///
    /// Never fails; a storage error is logged and otherwise ignored.
    pub async fn reset_session(&mut self) {
        if let Err(e) = self.storage.clear_token().await {
            tracing::warn!("failed to clear stored tokens: {e}");
        }
        if self.state != SessionState::Unauthenticated {
            tracing::info!(from = %self.state, "OAuth session reset");
        }
        self.state = SessionState::Unauthenticated;
    }

    /// `true` iff storage currently holds an access token. Never fails.
    pub async fn is_authorized(&self) -> bool {
        self.storage.has_access_token().await
    }

    /// An `Authorized` flag without a stored access token (cleared
    /// elsewhere) means the session has to start over.
    async fn effective_state(&self) -> SessionState {
        if self.state == SessionState::Authorized && !self.storage.has_access_token().await {
            tracing::warn!("session marked authorized but no access token is stored");
            return SessionState::Unauthenticated;
        }
        self.state
    }

    async fn start_handshake(&self) -> Result<Url> {
        let provider = self.provider();
        let request_token = provider.request_request_token().await?;
        self.storage.store_request_token(&request_token).await?;
        Ok(provider.authorization_url(&request_token))
    }

    async fn complete_handshake(&self, params: &CallbackParams) -> Result<AccessToken> {
        let pending = match self.storage.retrieve_request_token().await {
            Ok(token) => token,
            Err(MmfError::TokenNotFound(_)) => {
                return Err(MmfError::AuthFailure(
                    "no pending request token; start the handshake again".to_string(),
                ))
            }
            Err(e) => return Err(e),
        };

        if params.oauth_token != pending.token {
            return Err(MmfError::AuthFailure(
                "callback oauth_token does not match the pending request token".to_string(),
            ));
        }
        if params.oauth_verifier.is_empty() {
            return Err(MmfError::AuthFailure(
                "callback is missing oauth_verifier".to_string(),
            ));
        }

        let access_token = self
            .provider()
            .request_access_token(&pending, &params.oauth_verifier)
            .await?;
        self.storage.store_access_token(&access_token).await?;
        Ok(access_token)
    }

    fn provider(&self) -> OAuthProvider<'_> {
        OAuthProvider::new(&self.credentials, &self.endpoints, self.transport.as_ref())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
