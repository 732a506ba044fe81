//! Team resolution: matching declared teams to live ones, creating the missing teams
//! and deleting the teams nobody declares anymore.

use config_manager::{flatten_teams, OrgConfig};
use github_client::{Team, TeamClient, TeamCreatePayload, TeamPrivacy};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, error, info, instrument, warn};

use crate::errors::{ReconcileError, ReconcileResult};
use crate::org::check_removal_delta;
use crate::options::ReconcileOptions;

#[cfg(test)]
#[path = "teams_tests.rs"]
mod tests;

/// Declared team name to the live team that now carries it.
pub type ResolvedTeams = BTreeMap<String, Team>;

/// Live teams indexed by name, with the teams that lost a name collision.
#[derive(Debug, Default)]
struct LiveTeams {
    by_name: HashMap<String, Team>,
    older: Vec<Team>,
}

impl LiveTeams {
    /// Keeps the lowest ID for each team name.
    fn index(teams: &[Team]) -> Self {
        let mut live = LiveTeams::default();
        for team in teams {
            match live.by_name.get(&team.name) {
                None => {
                    live.by_name.insert(team.name.clone(), team.clone());
                }
                Some(current) if team.id < current.id => {
                    debug!(id = team.id, name = %team.name, replaced = current.id, "Lower ID replaces team with same name");
                    let replaced = current.clone();
                    live.by_name.insert(team.name.clone(), team.clone());
                    live.older.push(replaced);
                }
                Some(current) => {
                    debug!(id = team.id, name = %team.name, kept = current.id, "Team shares name with lower ID");
                    live.older.push(team.clone());
                }
            }
        }
        live
    }

    /// First live team found under `name`, then under each previous name in order.
    fn find<'a>(&self, name: &str, previously: impl Iterator<Item = &'a String>) -> Option<&Team> {
        self.by_name
            .get(name)
            .or_else(|| previously.filter_map(|p| self.by_name.get(p)).next())
    }
}

/// Resolves every declared team to a live team, creating and deleting as needed.
///
/// # Errors
///
/// - `ReconcileError::RemovalDeltaExceeded` when too many live teams would be deleted;
///   nothing is created or deleted in that case
/// - the collected creation failures, before any deletion happens
/// - the collected deletion failures
#[instrument(skip(client, config, options))]
pub async fn configure_teams<C>(
    client: &C,
    org: &str,
    config: &OrgConfig,
    options: &ReconcileOptions,
) -> ReconcileResult<ResolvedTeams>
where
    C: TeamClient + ?Sized,
{
    let mut teams = client
        .list_teams(org)
        .await
        .map_err(|e| ReconcileError::github(format!("list teams of org {}", org), e))?;
    if options.ignore_secret_teams {
        teams.retain(|t| t.privacy != Some(TeamPrivacy::Secret));
    }
    info!(org = org, live = teams.len(), "Resolving teams");

    let live = LiveTeams::index(&teams);
    let mut resolved = ResolvedTeams::new();
    let mut missing = Vec::new();
    let mut used: BTreeSet<u64> = BTreeSet::new();

    for (name, team, _) in flatten_teams(&config.teams) {
        match live.find(name, team.previously.iter()) {
            Some(found) => {
                debug!(team = name, id = found.id, live_name = %found.name, "Found team");
                used.insert(found.id);
                resolved.insert(name.to_string(), found.clone());
            }
            None => {
                info!(team = name, "Team does not exist yet");
                missing.push((name, team));
            }
        }
    }

    let mut unused: Vec<&Team> = teams.iter().filter(|t| !used.contains(&t.id)).collect();
    check_removal_delta(
        &format!("teams of org {}", org),
        unused.len(),
        teams.len(),
        options.maximum_removal_delta,
    )?;
    if !live.older.is_empty() {
        debug!(org = org, count = live.older.len(), "Teams shadowed by a same-named team");
    }

    let mut errors = Vec::new();
    for (name, team) in missing {
        let payload = TeamCreatePayload {
            name: name.to_string(),
            description: team.description.clone(),
            privacy: team.privacy,
            parent_team_id: None,
        };
        info!(org = org, team = name, "Creating team");
        match client.create_team(org, &payload).await {
            Ok(created) => {
                resolved.insert(name.to_string(), created);
            }
            Err(e) => {
                error!(org = org, team = name, error = %e, "Failed to create team");
                errors.push(ReconcileError::github(format!("create team {}", name), e));
            }
        }
    }
    ReconcileError::from_errors(errors)?;

    // GitHub may hand out an ID or slug that was unused a moment ago.
    let reused_ids: BTreeSet<u64> = resolved.values().map(|t| t.id).collect();
    let reused_slugs: BTreeSet<&str> = resolved.values().map(|t| t.slug.as_str()).collect();
    let (reused, remaining): (Vec<&Team>, Vec<&Team>) = unused
        .into_iter()
        .partition(|t| reused_ids.contains(&t.id) || reused_slugs.contains(t.slug.as_str()));
    if !reused.is_empty() {
        let slugs: Vec<&str> = reused.iter().map(|t| t.slug.as_str()).collect();
        warn!(org = org, ?slugs, "Will not delete teams reused by GitHub");
    }
    unused = remaining;

    let mut errors = Vec::new();
    for team in unused {
        info!(org = org, team = %team.slug, id = team.id, "Deleting team");
        if let Err(e) = client.delete_team(org, &team.slug).await {
            error!(org = org, team = %team.slug, error = %e, "Failed to delete team");
            errors.push(ReconcileError::github(format!("delete team {}", team.slug), e));
        }
    }
    ReconcileError::from_errors(errors)?;

    Ok(resolved)
}
