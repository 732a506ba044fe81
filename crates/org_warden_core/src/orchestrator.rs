//! Sequencing of the reconciliation phases.
//!
//! Phases run one after the other for each organization:
//! metadata, members, forks, repositories, collaborators, teams and team repositories.
//! Later phases depend on the effects of earlier ones (fork names, team slugs), so a
//! failed phase ends the run for that organization. Fork failures are the exception:
//! they concern single repositories and are reported once the other phases ran.

use config_manager::{FullConfig, OrgConfig};
use tracing::{info, instrument, warn};

use crate::collaborators::configure_collaborators;
use crate::errors::{ReconcileError, ReconcileResult};
use crate::forks::{configure_forks, ForkOutcome};
use crate::identity::normalize;
use crate::options::ReconcileOptions;
use crate::org::{configure_org_members, configure_org_meta};
use crate::preflight::validate_org;
use crate::repos::configure_repos;
use crate::team_members::configure_all_team_members;
use crate::team_repos::configure_all_team_repos;
use crate::teams::configure_teams;
use crate::GitHubApi;

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;

/// Reconciles every organization of the document, in declaration order.
///
/// The first failing organization stops the run.
pub async fn apply_config<C>(
    client: &C,
    config: &FullConfig,
    options: &ReconcileOptions,
) -> ReconcileResult<()>
where
    C: GitHubApi + ?Sized,
{
    options.validate()?;
    for (org, org_config) in &config.orgs {
        configure_org(client, org, org_config, options)
            .await
            .map_err(|e| e.context(format!("org {}", org)))?;
    }
    Ok(())
}

/// Checks that the authenticated user is one of the declared admins.
async fn check_self_admin<C>(client: &C, org: &str, config: &OrgConfig) -> ReconcileResult<()>
where
    C: GitHubApi + ?Sized,
{
    let me = client
        .authenticated_user()
        .await
        .map_err(|e| ReconcileError::github("get authenticated user", e))?;
    let login = normalize(&me.login);
    if config.admins.iter().any(|admin| normalize(admin) == login) {
        return Ok(());
    }
    Err(ReconcileError::Configuration(format!(
        "org {}: authenticated user {} is not a declared admin",
        org, me.login
    )))
}

/// Reconciles one organization with the phases enabled in `options`.
#[instrument(skip(client, config, options), fields(confirm = options.confirm))]
pub async fn configure_org<C>(
    client: &C,
    org: &str,
    config: &OrgConfig,
    options: &ReconcileOptions,
) -> ReconcileResult<()>
where
    C: GitHubApi + ?Sized,
{
    validate_org(org, config, options)?;
    if options.fix_org_members && options.require_self {
        check_self_admin(client, org, config).await?;
    }

    if options.fix_org {
        configure_org_meta(client, org, &config.metadata).await?;
    }

    if options.fix_org_members {
        configure_org_members(client, org, config, options).await?;
    }

    // Fork failures are per repository; later phases still run on the resolved forks.
    let ForkOutcome {
        names: fork_names,
        errors: fork_errors,
    } = if options.fix_forks {
        configure_forks(client, org, &config.repos, &options.fork_poll).await?
    } else {
        ForkOutcome::default()
    };

    if options.fix_repos {
        configure_repos(client, org, &config.repos, &fork_names, options).await?;
    }

    if options.fix_collaborators {
        configure_collaborators(client, org, &config.repos, &fork_names).await?;
    }

    if options.fix_teams {
        let mut teams = configure_teams(client, org, config, options).await?;
        configure_all_team_members(client, org, &config.teams, &mut teams, options).await?;
        if options.fix_team_repos {
            configure_all_team_repos(client, org, &config.teams, &teams).await?;
        }
    }

    if !fork_errors.is_empty() {
        warn!(org = org, failed = fork_errors.len(), "Some forks could not be reconciled");
    }
    ReconcileError::from_errors(fork_errors)?;

    info!(org = org, "Organization reconciled");
    Ok(())
}
