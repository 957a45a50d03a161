//! `mmf auth login|status|logout`
//!
//! Login drives the three-legged handshake from a terminal. When the
//! configured callback URL points at this machine a one-shot listener
//! receives the provider redirect; otherwise the user pastes the redirect
//! URL (or just the verifier) on stdin.

use std::io::{BufRead, BufReader, Write};
use std::net::SocketAddr;

use tokio::net::TcpListener;
use url::Url;

use crate::auth::{CallbackParams, SessionOutcome};
use crate::client::ApiClient;
use crate::config::Config;
use crate::error::{MmfError, Result};

const CALLBACK_REPLY: &str = "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nConnection: close\r\n\r\nAuthorization successful. You may close this tab.";

/// Runs the OAuth handshake and stores the access token.
///
/// # Errors
///
/// Returns [`MmfError::AuthFailure`] when the provider rejects the
/// verifier or the callback cannot be received, and any configuration or
/// transport error from the first leg.
pub async fn login(config: &Config) -> Result<()> {
    let mut client = ApiClient::from_config(config)?;

    let Some(authorize_url) = begin_login(&mut client).await? else {
        println!("Already authorized.");
        return Ok(());
    };

    // Bind before redirecting so the callback cannot arrive first.
    let listener = match loopback_addr(config.credentials.callback_url.as_deref()) {
        Some(addr) => Some(TcpListener::bind(addr).await.map_err(|e| {
            MmfError::AuthFailure(format!("failed to bind callback listener on {addr}: {e}"))
        })?),
        None => None,
    };

    eprintln!(
        "Open the following URL in your browser to authorize mmf:\n{}",
        authorize_url
    );
    try_open_browser(authorize_url.as_str());

    let callback = match listener {
        Some(listener) => accept_callback(listener).await?,
        None => prompt_for_callback(&authorize_url)?,
    };

    let outcome = client.init_session(Some(&callback)).await?;
    if outcome.is_granted() {
        println!("Authorization complete; access token stored.");
    }
    Ok(())
}

/// Starts the handshake unless an access token is already stored, and
/// returns the authorize URL to send the user to.
///
/// A fresh client is always `Unauthenticated`, so the stored token is
/// checked before the first leg is requested.
pub(crate) async fn begin_login(client: &mut ApiClient) -> Result<Option<Url>> {
    if client.is_authorized().await {
        return Ok(None);
    }
    match client.init_session(None).await? {
        SessionOutcome::Redirect { url } => Ok(Some(url)),
        _ => Ok(None),
    }
}

/// Reports whether an access token is stored.
pub async fn status(config: &Config) -> Result<()> {
    let client = ApiClient::from_config(config)?;
    if client.is_authorized().await {
        println!("Authorized ({:?} storage)", config.storage.backend);
    } else {
        println!("Not authorized. Run `mmf auth login`.");
    }
    Ok(())
}

/// Forgets every stored token.
pub async fn logout(config: &Config) -> Result<()> {
    let mut client = ApiClient::from_config(config)?;
    client.reset_session().await;
    println!("Stored tokens removed.");
    Ok(())
}

/// Socket address to listen on when `callback_url` is a loopback URL with
/// an explicit port.
pub(crate) fn loopback_addr(callback_url: Option<&str>) -> Option<SocketAddr> {
    let url = Url::parse(callback_url?).ok()?;
    if url.scheme() != "http" {
        return None;
    }
    let host = match url.host_str()? {
        "localhost" | "127.0.0.1" => "127.0.0.1",
        _ => return None,
    };
    let port = url.port()?;
    format!("{host}:{port}").parse().ok()
}

fn try_open_browser(url: &str) {
    #[cfg(target_os = "macos")]
    {
        let _ = std::process::Command::new("open").arg(url).spawn();
    }
    #[cfg(target_os = "linux")]
    {
        let _ = std::process::Command::new("xdg-open").arg(url).spawn();
    }
    #[cfg(not(any(target_os = "macos", target_os = "linux")))]
    {
        let _ = url;
    }
}

/// Accepts one connection on `listener`, answers it, and extracts the
/// callback parameters from the request line.
pub(crate) async fn accept_callback(listener: TcpListener) -> Result<CallbackParams> {
    let (stream, peer) = listener.accept().await.map_err(|e| {
        MmfError::AuthFailure(format!("failed to accept OAuth callback connection: {e}"))
    })?;
    tracing::debug!(%peer, "callback connection accepted");

    let request_line = tokio::task::spawn_blocking(move || -> Result<String> {
        let std_stream = stream.into_std()?;
        std_stream.set_nonblocking(false)?;
        let mut write_stream = std_stream.try_clone()?;

        let reader = BufReader::new(std_stream);
        let mut request_line = String::new();
        for line in reader.lines() {
            let line = line?;
            if line.is_empty() {
                break;
            }
            if request_line.is_empty() {
                request_line = line;
            }
        }

        let _ = write_stream.write_all(CALLBACK_REPLY.as_bytes());
        Ok(request_line)
    })
    .await
    .map_err(|e| MmfError::AuthFailure(format!("callback task panicked: {e}")))??;

    // "GET /callback?oauth_token=...&oauth_verifier=... HTTP/1.1"
    let target = request_line.split_whitespace().nth(1).unwrap_or("/");
    let query = target.split_once('?').map(|(_, q)| q).unwrap_or("");
    CallbackParams::from_query(query).ok_or_else(|| {
        MmfError::AuthFailure("oauth_token missing from callback request".to_string())
    })
}

fn prompt_for_callback(authorize_url: &Url) -> Result<CallbackParams> {
    eprint!("Paste the redirect URL or the verifier code: ");
    std::io::stderr().flush()?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    parse_pasted_callback(&input, authorize_url)
}

/// Accepts a full redirect URL, a bare query string, or just the verifier.
/// A bare verifier is paired with the request token in `authorize_url`.
pub(crate) fn parse_pasted_callback(input: &str, authorize_url: &Url) -> Result<CallbackParams> {
    let input = input.trim();
    if input.is_empty() {
        return Err(MmfError::AuthFailure("no verifier entered".to_string()));
    }

    if let Ok(url) = Url::parse(input) {
        return CallbackParams::from_url(&url).ok_or_else(|| {
            MmfError::AuthFailure("oauth_token missing from pasted URL".to_string())
        });
    }

    if let Some(params) = CallbackParams::from_query(input) {
        return Ok(params);
    }

    let token = CallbackParams::from_url(authorize_url)
        .map(|pending| pending.oauth_token)
        .ok_or_else(|| {
            MmfError::AuthFailure("authorize URL carries no request token".to_string())
        })?;
    Ok(CallbackParams::new(token, input))
}
