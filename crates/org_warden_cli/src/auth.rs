//! GitHub credentials and client construction.
//!
//! A token is read from `--github-token-path` or from the `GITHUB_TOKEN` environment
//! variable. Alternatively a GitHub App (`--github-app-id` with
//! `--github-app-private-key-path`) mints an installation token per organization.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;
use github_client::{create_app_client, create_token_client, GitHubClient};
use tracing::{debug, info, instrument};

use crate::errors::Error;

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;

/// Environment variable holding a GitHub token.
pub const GITHUB_TOKEN_ENV: &str = "GITHUB_TOKEN";

/// Command-line options selecting how to authenticate with GitHub.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct GitHubArgs {
    /// File containing a GitHub token. Falls back to the GITHUB_TOKEN environment variable.
    #[arg(long)]
    pub github_token_path: Option<PathBuf>,

    /// API endpoint of a GitHub Enterprise server.
    #[arg(long)]
    pub github_endpoint: Option<String>,

    /// ID of a GitHub App to authenticate as, instead of a token.
    #[arg(long, requires = "github_app_private_key_path")]
    pub github_app_id: Option<u64>,

    /// PEM private key of the GitHub App.
    #[arg(long, requires = "github_app_id")]
    pub github_app_private_key_path: Option<PathBuf>,
}

/// Resolved credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    Token(String),
    App { app_id: u64, private_key: String },
}

fn read_file(path: &Path) -> Result<String, Error> {
    fs::read_to_string(path).map_err(|source| Error::LoadFile {
        path: path.display().to_string(),
        source,
    })
}

impl GitHubArgs {
    /// Picks the credentials to use. `env_token` is the value of `GITHUB_TOKEN`, if set.
    pub fn credentials(&self, env_token: Option<String>) -> Result<Credentials, Error> {
        if let (Some(app_id), Some(key_path)) = (self.github_app_id, &self.github_app_private_key_path) {
            debug!(app_id = app_id, "Using GitHub App credentials");
            return Ok(Credentials::App {
                app_id,
                private_key: read_file(key_path)?,
            });
        }

        let token = match &self.github_token_path {
            Some(path) => read_file(path)?,
            None => env_token.ok_or_else(|| {
                Error::Auth(format!(
                    "no GitHub token: pass --github-token-path or set {}",
                    GITHUB_TOKEN_ENV
                ))
            })?,
        };
        let token = token.trim();
        if token.is_empty() {
            return Err(Error::Auth("the GitHub token is empty".to_string()));
        }
        Ok(Credentials::Token(token.to_string()))
    }
}

/// Builds a client, acting on `org` when App credentials are used.
///
/// With App credentials the installation token for `org` is requested first.
#[instrument(skip(credentials))]
pub async fn build_client(
    credentials: &Credentials,
    endpoint: Option<&str>,
    org: Option<&str>,
    dry_run: bool,
) -> Result<GitHubClient, Error> {
    let token = match credentials {
        Credentials::Token(token) => token.clone(),
        Credentials::App {
            app_id,
            private_key,
        } => {
            let org = org.ok_or_else(|| {
                Error::Auth("GitHub App credentials need an organization".to_string())
            })?;
            let app = create_app_client(*app_id, private_key)
                .await
                .map_err(|e| Error::Auth(e.to_string()))?;
            GitHubClient::new(app)
                .get_installation_token_for_org(org)
                .await
                .map_err(|e| Error::Auth(e.to_string()))?
        }
    };

    let octocrab = create_token_client(&token, endpoint).map_err(|e| Error::Auth(e.to_string()))?;
    if dry_run {
        info!("Dry run: mutations are logged, not applied");
    }
    Ok(GitHubClient::new(octocrab).with_dry_run(dry_run))
}
