//! Reads the live state of an organization into the declarative format.

use config_manager::{OrgConfig, OrgMetadata, PermissionLevel, RepoConfig, TeamConfig};
use github_client::{Organization, OrgRole, Repository, Team, TeamPrivacy, TeamRole};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, info, instrument, warn};

use crate::errors::{ReconcileError, ReconcileResult};
use crate::GitHubApi;

#[cfg(test)]
#[path = "dump_tests.rs"]
mod tests;

fn non_empty(value: &Option<String>) -> Option<String> {
    value.clone().filter(|v| !v.is_empty())
}

/// Converts the live organization settings to declared metadata.
pub fn org_metadata(live: &Organization) -> OrgMetadata {
    OrgMetadata {
        billing_email: non_empty(&live.billing_email),
        company: non_empty(&live.company),
        email: non_empty(&live.email),
        name: non_empty(&live.name),
        description: non_empty(&live.description),
        location: non_empty(&live.location),
        has_organization_projects: live.has_organization_projects,
        has_repository_projects: live.has_repository_projects,
        default_repository_permission: live
            .default_repository_permission
            .as_deref()
            .and_then(PermissionLevel::from_org_default_str),
        members_can_create_repositories: live.members_can_create_repositories,
    }
}

/// Converts a live repository's settings to a declared repository.
pub fn repo_config(live: &Repository) -> RepoConfig {
    RepoConfig {
        description: non_empty(&live.description),
        homepage: non_empty(&live.homepage),
        private: Some(live.private),
        has_issues: Some(live.has_issues),
        has_projects: Some(live.has_projects),
        has_wiki: Some(live.has_wiki),
        allow_squash_merge: live.allow_squash_merge,
        allow_merge_commit: live.allow_merge_commit,
        allow_rebase_merge: live.allow_rebase_merge,
        squash_merge_commit_title: live.squash_merge_commit_title.clone(),
        squash_merge_commit_message: live.squash_merge_commit_message.clone(),
        default_branch: live.default_branch.clone(),
        archived: live.archived.then_some(true),
        fork_from: live.parent_full_name().map(str::to_string),
        ..Default::default()
    }
}

async fn logins<C>(client: &C, org: &str, role: OrgRole) -> ReconcileResult<Vec<String>>
where
    C: GitHubApi + ?Sized,
{
    let users = client
        .list_organization_members(org, role)
        .await
        .map_err(|e| ReconcileError::github(format!("list {}s of org {}", role.as_str(), org), e))?;
    let mut logins: Vec<String> = users.into_iter().map(|u| u.login).collect();
    logins.sort_by_key(|l| l.to_lowercase());
    Ok(logins)
}

async fn team_config<C>(client: &C, org: &str, team: &Team) -> ReconcileResult<TeamConfig>
where
    C: GitHubApi + ?Sized,
{
    let members = |role: TeamRole| async move {
        client
            .list_team_members(org, &team.slug, role)
            .await
            .map(|users| users.into_iter().map(|u| u.login).collect::<Vec<_>>())
            .map_err(|e| {
                ReconcileError::github(format!("list {}s of team {}", role.as_str(), team.name), e)
            })
    };
    let repos = client
        .list_team_repositories(org, &team.slug)
        .await
        .map_err(|e| ReconcileError::github(format!("list repos of team {}", team.name), e))?
        .into_iter()
        .map(|repo| {
            let level = PermissionLevel::from(repo.permission());
            (repo.name, level)
        })
        .collect();

    Ok(TeamConfig {
        description: non_empty(&team.description),
        privacy: team.privacy,
        maintainers: members(TeamRole::Maintainer).await?,
        members: members(TeamRole::Member).await?,
        repos,
        ..Default::default()
    })
}

/// Nests the flat team list under their parents.
///
/// Teams whose parent was not dumped end up at the top level.
fn nest_teams(teams: &[Team], mut configs: HashMap<u64, TeamConfig>) -> BTreeMap<String, TeamConfig> {
    let dumped: HashSet<u64> = configs.keys().copied().collect();
    let mut children: HashMap<u64, Vec<&Team>> = HashMap::new();
    let mut roots = Vec::new();
    for team in teams.iter().filter(|t| dumped.contains(&t.id)) {
        match team.parent_id().filter(|p| dumped.contains(p)) {
            Some(parent) => children.entry(parent).or_default().push(team),
            None => roots.push(team),
        }
    }

    fn build(
        team: &Team,
        configs: &mut HashMap<u64, TeamConfig>,
        children: &HashMap<u64, Vec<&Team>>,
    ) -> TeamConfig {
        let mut config = configs.remove(&team.id).unwrap_or_default();
        for child in children.get(&team.id).into_iter().flatten() {
            let nested = build(child, configs, children);
            config.children.insert(child.name.clone(), nested);
        }
        config
    }

    roots
        .into_iter()
        .map(|team| (team.name.clone(), build(team, &mut configs, &children)))
        .collect()
}

/// Reads the organization's metadata, members, team tree and repositories.
#[instrument(skip(client))]
pub async fn dump_org_config<C>(
    client: &C,
    org: &str,
    ignore_secret_teams: bool,
) -> ReconcileResult<OrgConfig>
where
    C: GitHubApi + ?Sized,
{
    let organization = client
        .get_organization(org)
        .await
        .map_err(|e| ReconcileError::github(format!("get org {}", org), e))?;
    let admins = logins(client, org, OrgRole::Admin).await?;
    let members = logins(client, org, OrgRole::Member).await?;

    let live_teams = client
        .list_teams(org)
        .await
        .map_err(|e| ReconcileError::github(format!("list teams of org {}", org), e))?;
    let mut configs = HashMap::new();
    for team in &live_teams {
        if ignore_secret_teams && team.privacy == Some(TeamPrivacy::Secret) {
            debug!(org = org, team = %team.name, "Skipping secret team");
            continue;
        }
        configs.insert(team.id, team_config(client, org, team).await?);
    }
    let teams = nest_teams(&live_teams, configs);

    let live_repos = client
        .list_org_repositories(org)
        .await
        .map_err(|e| ReconcileError::github(format!("list repos of org {}", org), e))?;
    let mut repos = BTreeMap::new();
    for live in &live_repos {
        // Listings omit the fork parent.
        let full = if live.fork && live.parent.is_none() {
            client
                .get_repository(org, &live.name)
                .await
                .map_err(|e| ReconcileError::github(format!("get repo {}/{}", org, live.name), e))?
        } else {
            live.clone()
        };
        let mut config = repo_config(&full);
        config.collaborators = match client.list_direct_collaborators(org, &live.name).await {
            Ok(collaborators) => Some(
                collaborators
                    .into_iter()
                    .map(|c| (c.login, PermissionLevel::from(c.permission)))
                    .collect(),
            ),
            Err(e) if e.is_not_found() => {
                warn!(org = org, repo = %live.name, "Could not read collaborators");
                None
            }
            Err(e) => {
                return Err(ReconcileError::github(
                    format!("list collaborators of {}/{}", org, live.name),
                    e,
                ))
            }
        };
        repos.insert(live.name.clone(), config);
    }

    info!(
        org = org,
        admins = admins.len(),
        members = members.len(),
        teams = teams.len(),
        repos = repos.len(),
        "Dumped organization"
    );
    Ok(OrgConfig {
        metadata: org_metadata(&organization),
        admins,
        members,
        teams,
        repos,
    })
}
