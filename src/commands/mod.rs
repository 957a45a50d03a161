/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint:

- `auth`      OAuth handshake, status and logout
- `call`      Signed request to any API path
- `endpoint`  Call a catalogued route
- `endpoints` List the route catalog

Handlers print to stdout and leave logging to `tracing`.
*/

use crate::catalog::{Endpoint, Params};
use crate::client::ApiClient;
use crate::config::Config;
use crate::error::{MmfError, Result};

pub mod auth;

fn api_client(config: &Config) -> Result<ApiClient> {
    let mut client = ApiClient::from_config(config)?;
    if let Some(user) = &config.user_id {
        client.set_user(user.clone());
    }
    Ok(client)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// `mmf call`
pub mod call {
    use super::*;
    use crate::transport::HttpMethod;

    /// Sends a signed request to `path` and prints status and decoded body.
    ///
    /// Non-2xx responses are printed, not treated as errors.
    pub async fn run_call(
        config: &Config,
        path: &str,
        params: Vec<(String, String)>,
        method: &str,
        headers: &[(String, String)],
    ) -> Result<()> {
        let method: HttpMethod = method.parse()?;
        let client = api_client(config)?;
        let params: Params = params.into_iter().collect();

        tracing::info!("Calling {} {}", method.as_str(), path);
        let response = client.custom_call(path, &params, method, headers).await?;
        print_json(&response)
    }
}

/// `mmf endpoint`
pub mod endpoint {
    use super::*;

    /// Calls a catalogued route with `params` and prints the decoded body.
    pub async fn run_endpoint(
        config: &Config,
        route: &str,
        params: Vec<(String, String)>,
    ) -> Result<()> {
        let endpoint: Endpoint = route.parse()?;
        let client = api_client(config)?;
        let params: Params = params.into_iter().collect();

        tracing::info!("Calling endpoint {}", endpoint);
        let decoded = client.call_endpoint(endpoint, params).await?;
        print_json(&decoded)
    }
}

/// `mmf endpoints`
pub mod endpoints {
    use super::*;

    /// Catalogued routes, optionally limited to one group.
    ///
    /// # Errors
    ///
    /// Returns [`MmfError::InvalidParameters`] for an unknown group.
    pub fn list_endpoints(group: Option<&str>) -> Result<Vec<Endpoint>> {
        let selected: Vec<Endpoint> = Endpoint::ALL
            .iter()
            .copied()
            .filter(|e| group.map_or(true, |g| e.group() == g))
            .collect();

        match group {
            Some(g) if selected.is_empty() => {
                Err(MmfError::InvalidParameters(format!("unknown endpoint group '{g}'")))
            }
            _ => Ok(selected),
        }
    }

    /// Prints one route path per line.
    pub fn run_endpoints(group: Option<&str>) -> Result<()> {
        for endpoint in list_endpoints(group)? {
            println!("{}", endpoint);
        }
        Ok(())
    }

}
