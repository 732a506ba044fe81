//! Team repository grants.

use config_manager::{PermissionLevel, TeamConfig};
use github_client::TeamRepositoryClient;
use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use tracing::{debug, error, info, instrument};

use crate::errors::{ReconcileError, ReconcileResult};
use crate::identity::normalize;
use crate::teams::ResolvedTeams;

#[cfg(test)]
#[path = "team_repos_tests.rs"]
mod tests;

/// Grant changes for one team: repository name to the level it should end up with.
///
/// `PermissionLevel::None` means the grant is removed.
pub fn plan_team_repos(
    have: &BTreeMap<String, PermissionLevel>,
    want: &BTreeMap<String, PermissionLevel>,
) -> Vec<(String, PermissionLevel)> {
    let have: BTreeMap<String, (&str, PermissionLevel)> = have
        .iter()
        .map(|(name, level)| (normalize(name), (name.as_str(), *level)))
        .collect();
    let want: BTreeMap<String, (&str, PermissionLevel)> = want
        .iter()
        .map(|(name, level)| (normalize(name), (name.as_str(), *level)))
        .collect();

    let mut actions = Vec::new();
    for (key, (name, level)) in &want {
        let current = have.get(key).map(|(_, l)| *l).unwrap_or_default();
        if current != *level {
            actions.push((name.to_string(), *level));
        }
    }
    for (key, (name, _)) in &have {
        if !want.contains_key(key) {
            actions.push((name.to_string(), PermissionLevel::None));
        }
    }
    actions
}

/// Reconciles the grants of `name` and, recursively, of its children.
///
/// A failure on one repository or child team does not stop the others; everything is
/// reported together.
pub fn configure_team_repos<'a, C>(
    client: &'a C,
    org: &'a str,
    name: &'a str,
    config: &'a TeamConfig,
    teams: &'a ResolvedTeams,
) -> Pin<Box<dyn Future<Output = ReconcileResult<()>> + Send + 'a>>
where
    C: TeamRepositoryClient + ?Sized,
{
    Box::pin(async move {
        let team = teams.get(name).ok_or_else(|| {
            ReconcileError::Configuration(format!("team {} was not resolved to a live team", name))
        })?;

        let have: BTreeMap<String, PermissionLevel> = client
            .list_team_repositories(org, &team.slug)
            .await
            .map_err(|e| ReconcileError::github(format!("list repos of team {}", name), e))?
            .into_iter()
            .map(|repo| {
                let level = PermissionLevel::from(repo.permission());
                (repo.name, level)
            })
            .collect();

        let mut errors = Vec::new();
        let actions = plan_team_repos(&have, &config.repos);
        if actions.is_empty() {
            debug!(org = org, team = name, "Team repository grants already up to date");
        }
        for (repo, level) in actions {
            let result = match level.as_repository_permission() {
                None => {
                    info!(org = org, team = name, repo = %repo, "Removing team repository grant");
                    client.remove_team_repository(org, &team.slug, &repo).await
                }
                Some(permission) => {
                    info!(org = org, team = name, repo = %repo, permission = %permission, "Setting team repository grant");
                    client
                        .update_team_repository(org, &team.slug, &repo, permission)
                        .await
                }
            };
            if let Err(e) = result {
                error!(org = org, team = name, repo = %repo, error = %e, "Failed to update team repository grant");
                errors.push(ReconcileError::github(
                    format!("set {} on {} for team {}", level, repo, name),
                    e,
                ));
            }
        }

        for (child_name, child) in &config.children {
            if let Err(e) = configure_team_repos(client, org, child_name, child, teams).await {
                errors.push(e.context(format!("child team {} of {}", child_name, name)));
            }
        }

        ReconcileError::from_errors(errors)
    })
}

/// Reconciles the grants of every declared team.
#[instrument(skip(client, declared, teams))]
pub async fn configure_all_team_repos<C>(
    client: &C,
    org: &str,
    declared: &BTreeMap<String, TeamConfig>,
    teams: &ResolvedTeams,
) -> ReconcileResult<()>
where
    C: TeamRepositoryClient + ?Sized,
{
    let mut errors = Vec::new();
    for (name, config) in declared {
        if let Err(e) = configure_team_repos(client, org, name, config, teams).await {
            errors.push(e);
        }
    }
    ReconcileError::from_errors(errors)
}
