//! Command-line interface definition for `mmf`
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for the OAuth handshake and for calling the API.

use clap::{Parser, Subcommand};

/// mmf - MapMyFitness API client
///
/// Authorize once with `mmf auth login`, then call any API route.
#[derive(Parser, Debug, Clone)]
#[command(name = "mmf")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Response format override (json, xml, php, txt)
    #[arg(short, long)]
    pub format: Option<String>,

    /// Token file override; implies the file storage backend
    #[arg(long)]
    pub storage_path: Option<String>,

    /// Act on this user instead of the authorized one
    #[arg(short, long)]
    pub user: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for mmf
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Manage the OAuth authorization
    Auth {
        /// Authorization subcommand
        #[command(subcommand)]
        command: AuthCommand,
    },

    /// Call an arbitrary API path
    Call {
        /// Path relative to the API base, e.g. users/get_user
        path: String,

        /// Request parameter as key=value (repeatable)
        #[arg(short = 'p', long = "param", value_parser = parse_key_value)]
        params: Vec<(String, String)>,

        /// HTTP method
        #[arg(short = 'X', long, default_value = "GET")]
        method: String,

        /// Extra header as name:value (repeatable)
        #[arg(short = 'H', long = "header", value_parser = parse_header)]
        headers: Vec<(String, String)>,
    },

    /// Call a catalogued route, adding the response format parameter
    Endpoint {
        /// Route, e.g. routes/get_route
        route: String,

        /// Request parameter as key=value (repeatable)
        #[arg(short = 'p', long = "param", value_parser = parse_key_value)]
        params: Vec<(String, String)>,
    },

    /// List every catalogued route
    Endpoints {
        /// Only routes in this group (users, routes, workouts, ...)
        #[arg(short, long)]
        group: Option<String>,
    },
}

/// OAuth subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum AuthCommand {
    /// Run the OAuth 1.0a handshake and store the access token
    Login,

    /// Show whether an access token is stored
    Status,

    /// Forget all stored tokens
    Logout,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/config.yaml".to_string()),
            verbose: false,
            format: None,
            storage_path: None,
            user: None,
            command: Commands::Auth {
                command: AuthCommand::Status,
            },
        }
    }
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    split_pair(raw, '=').ok_or_else(|| format!("expected key=value, got '{raw}'"))
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    split_pair(raw, ':').ok_or_else(|| format!("expected name:value, got '{raw}'"))
}

fn split_pair(raw: &str, separator: char) -> Option<(String, String)> {
    let (key, value) = raw.split_once(separator)?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some((key.to_string(), value.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default() {
        let cli = Cli::default();
        assert_eq!(cli.config, Some("config/config.yaml".to_string()));
        assert!(!cli.verbose);
        assert!(matches!(
            cli.command,
            Commands::Auth {
                command: AuthCommand::Status
            }
        ));
    }

    #[test]
    fn test_cli_parse_auth_login() {
        let cli = Cli::try_parse_from(["mmf", "auth", "login"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Auth {
                command: AuthCommand::Login
            }
        ));
    }

    #[test]
    fn test_cli_parse_auth_requires_subcommand() {
        assert!(Cli::try_parse_from(["mmf", "auth"]).is_err());
    }

    #[test]
    fn test_cli_parse_call_with_params_and_headers() {
        let cli = Cli::try_parse_from([
            "mmf",
            "call",
            "users/get_user",
            "-p",
            "user_id=7",
            "--param",
            "o=xml",
            "-X",
            "post",
            "-H",
            "X-Trace: abc",
        ])
        .unwrap();

        if let Commands::Call {
            path,
            params,
            method,
            headers,
        } = cli.command
        {
            assert_eq!(path, "users/get_user");
            assert_eq!(
                params,
                vec![
                    ("user_id".to_string(), "7".to_string()),
                    ("o".to_string(), "xml".to_string()),
                ]
            );
            assert_eq!(method, "post");
            assert_eq!(headers, vec![("X-Trace".to_string(), "abc".to_string())]);
        } else {
            panic!("Expected Call command");
        }
    }

    #[test]
    fn test_cli_parse_param_value_may_contain_equals() {
        let cli =
            Cli::try_parse_from(["mmf", "endpoint", "routes/get_route", "-p", "q=a=b"]).unwrap();
        if let Commands::Endpoint { params, .. } = cli.command {
            assert_eq!(params, vec![("q".to_string(), "a=b".to_string())]);
        } else {
            panic!("Expected Endpoint command");
        }
    }

    #[test]
    fn test_cli_parse_rejects_malformed_param() {
        assert!(Cli::try_parse_from(["mmf", "call", "users/get_user", "-p", "novalue"]).is_err());
        assert!(Cli::try_parse_from(["mmf", "call", "users/get_user", "-p", "=x"]).is_err());
    }

    #[test]
    fn test_cli_parse_global_flags() {
        let cli = Cli::try_parse_from([
            "mmf",
            "-v",
            "--format",
            "xml",
            "--user",
            "42",
            "--storage-path",
            "/tmp/tokens.json",
            "endpoints",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.format.as_deref(), Some("xml"));
        assert_eq!(cli.user.as_deref(), Some("42"));
        assert_eq!(cli.storage_path.as_deref(), Some("/tmp/tokens.json"));
    }

    #[test]
    fn test_cli_parse_missing_command() {
        assert!(Cli::try_parse_from(["mmf"]).is_err());
    }

    #[test]
    fn test_cli_parse_invalid_command() {
        assert!(Cli::try_parse_from(["mmf", "invalid"]).is_err());
    }
}
