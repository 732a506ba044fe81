//! The `dump` command: prints the live organization as a configuration document.
//!
//! ```bash
//! org-warden dump --org myorg --full > orgs.yaml
//! ```

use clap::Args;
use config_manager::{FullConfig, OrgConfig};
use org_warden_core::dump_org_config;
use tracing::instrument;

use crate::auth::{build_client, GitHubArgs, GITHUB_TOKEN_ENV};
use crate::errors::Error;

#[cfg(test)]
#[path = "dump_cmd_tests.rs"]
mod tests;

/// Arguments of `org-warden dump`.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct DumpArgs {
    /// Organization to read.
    #[arg(long)]
    pub org: String,

    /// Wrap the output in `orgs: {<org>: ...}` so it can be applied as is.
    #[arg(long)]
    pub full: bool,

    /// Leave secret teams out of the output.
    #[arg(long)]
    pub ignore_secret_teams: bool,

    #[command(flatten)]
    pub github: GitHubArgs,
}

/// Renders a dumped organization as YAML.
pub fn render(org: &str, config: OrgConfig, full: bool) -> Result<String, Error> {
    let yaml = if full {
        serde_yaml::to_string(&FullConfig::single(org, config))?
    } else {
        serde_yaml::to_string(&config)?
    };
    Ok(yaml)
}

/// Reads the organization and returns it as YAML.
#[instrument(skip(args), fields(org = %args.org))]
pub async fn execute(args: &DumpArgs) -> Result<String, Error> {
    let credentials = args.github.credentials(std::env::var(GITHUB_TOKEN_ENV).ok())?;
    // Dumping only reads; a dry-run client guarantees nothing is changed.
    let client = build_client(
        &credentials,
        args.github.github_endpoint.as_deref(),
        Some(args.org.as_str()),
        true,
    )
    .await?;
    let config = dump_org_config(&client, &args.org, args.ignore_secret_teams).await?;
    render(&args.org, config, args.full)
}
