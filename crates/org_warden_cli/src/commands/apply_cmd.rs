//! The `apply` command.
//!
//! ```bash
//! # Show what would change
//! org-warden apply --config-path orgs.yaml --fix-org-members --fix-teams
//!
//! # Apply it
//! org-warden apply --config-path orgs.yaml --fix-org-members --fix-teams --confirm
//! ```

use std::path::PathBuf;

use clap::Args;
use config_manager::load_config;
use org_warden_core::{
    apply_config, configure_org, ReconcileOptions, DEFAULT_MAXIMUM_REMOVAL_DELTA,
    DEFAULT_MIN_ADMINS,
};
use tracing::{info, instrument};

use crate::auth::{build_client, Credentials, GitHubArgs, GITHUB_TOKEN_ENV};
use crate::errors::Error;

#[cfg(test)]
#[path = "apply_cmd_tests.rs"]
mod tests;

/// Arguments of `org-warden apply`.
#[derive(Args, Debug, Clone, PartialEq)]
pub struct ApplyArgs {
    /// Configuration document (YAML, JSON or TOML).
    #[arg(long)]
    pub config_path: PathBuf,

    /// Apply the changes. Without it every mutation is only logged.
    #[arg(long)]
    pub confirm: bool,

    /// Reconcile organization metadata.
    #[arg(long)]
    pub fix_org: bool,

    /// Reconcile organization admins and members.
    #[arg(long)]
    pub fix_org_members: bool,

    /// Create, rename and delete teams.
    #[arg(long)]
    pub fix_teams: bool,

    /// Reconcile team maintainers and members. Requires --fix-teams.
    #[arg(long)]
    pub fix_team_members: bool,

    /// Reconcile team repository permissions. Requires --fix-teams.
    #[arg(long)]
    pub fix_team_repos: bool,

    /// Create and update repositories.
    #[arg(long)]
    pub fix_repos: bool,

    /// Create forks. Defaults to the value of --fix-repos.
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub fix_forks: Option<bool>,

    /// Reconcile direct repository collaborators.
    #[arg(long)]
    pub fix_collaborators: bool,

    /// Minimum number of declared org admins.
    #[arg(long, default_value_t = DEFAULT_MIN_ADMINS)]
    pub min_admins: usize,

    /// Largest fraction of members or teams a run may remove.
    #[arg(long, default_value_t = DEFAULT_MAXIMUM_REMOVAL_DELTA)]
    pub maximum_removal_delta: f64,

    /// Logins that must be declared as org admins.
    #[arg(long, value_delimiter = ',')]
    pub required_admins: Vec<String>,

    /// Require the authenticated user to be a declared org admin.
    #[arg(long)]
    pub require_self: bool,

    /// Treat users with pending invitations as absent.
    #[arg(long)]
    pub ignore_invitees: bool,

    /// Leave secret teams alone.
    #[arg(long)]
    pub ignore_secret_teams: bool,

    /// Allow archiving repositories.
    #[arg(long)]
    pub allow_repo_archival: bool,

    /// Allow making private repositories public.
    #[arg(long)]
    pub allow_repo_publish: bool,

    #[command(flatten)]
    pub github: GitHubArgs,
}

impl ApplyArgs {
    /// Builds and validates the reconciliation options.
    pub fn options(&self) -> Result<ReconcileOptions, Error> {
        let options = ReconcileOptions {
            confirm: self.confirm,
            fix_org: self.fix_org,
            fix_org_members: self.fix_org_members,
            fix_teams: self.fix_teams,
            fix_team_members: self.fix_team_members,
            fix_team_repos: self.fix_team_repos,
            fix_repos: self.fix_repos,
            fix_forks: self.fix_forks.unwrap_or(self.fix_repos),
            fix_collaborators: self.fix_collaborators,
            min_admins: self.min_admins,
            maximum_removal_delta: self.maximum_removal_delta,
            required_admins: self.required_admins.clone(),
            require_self: self.require_self,
            ignore_invitees: self.ignore_invitees,
            ignore_secret_teams: self.ignore_secret_teams,
            allow_repo_archival: self.allow_repo_archival,
            allow_repo_publish: self.allow_repo_publish,
            ..Default::default()
        };
        options
            .validate()
            .map_err(|e| Error::InvalidArguments(e.to_string()))?;
        Ok(options)
    }
}

/// Loads the configuration and reconciles every organization in it.
#[instrument(skip(args), fields(config = %args.config_path.display(), confirm = args.confirm))]
pub async fn execute(args: &ApplyArgs) -> Result<(), Error> {
    let options = args.options()?;
    let config = load_config(&args.config_path)?;
    let credentials = args.github.credentials(std::env::var(GITHUB_TOKEN_ENV).ok())?;
    let endpoint = args.github.github_endpoint.as_deref();

    info!(orgs = config.orgs.len(), "Applying configuration");
    match &credentials {
        Credentials::Token(_) => {
            let client = build_client(&credentials, endpoint, None, !options.confirm).await?;
            apply_config(&client, &config, &options).await?;
        }
        Credentials::App { .. } => {
            for (org, org_config) in &config.orgs {
                let client = build_client(&credentials, endpoint, Some(org.as_str()), !options.confirm).await?;
                configure_org(&client, org, org_config, &options)
                    .await
                    .map_err(|e| e.context(format!("org {}", org)))?;
            }
        }
    }
    info!("Configuration applied");
    Ok(())
}
