//! Team metadata and membership, walked parent before children.

use async_trait::async_trait;
use config_manager::TeamConfig;
use github_client::{MembershipState, Team, TeamClient, TeamPrivacy, TeamRole, TeamUpdatePayload};
use std::future::Future;
use std::pin::Pin;
use tracing::{debug, info, instrument, warn};

use crate::errors::{ReconcileError, ReconcileResult};
use crate::identity::LoginSet;
use crate::membership::{configure_members, MemberSnapshot, MembershipTarget};
use crate::options::ReconcileOptions;
use crate::teams::ResolvedTeams;

#[cfg(test)]
#[path = "team_members_tests.rs"]
mod tests;

/// Builds the edit for one team; empty when the live team already matches.
///
/// `parent` is the ID of the declared parent team, `None` for top-level teams. Teams
/// that are part of a hierarchy must be closed, so an undeclared privacy is forced to
/// `closed` for them.
pub fn team_patch(
    name: &str,
    config: &TeamConfig,
    live: &Team,
    parent: Option<u64>,
) -> TeamUpdatePayload {
    let mut patch = TeamUpdatePayload::default();

    if live.name != name {
        patch.name = Some(name.to_string());
    }
    if let Some(description) = &config.description {
        if live.description_or_empty() != description {
            patch.description = Some(description.clone());
        }
    }
    if live.parent_id() != parent {
        patch.parent_team_id = Some(parent);
    }
    match config.privacy {
        Some(privacy) if live.privacy != Some(privacy) => patch.privacy = Some(privacy),
        Some(_) => {}
        None => {
            let nested = parent.is_some() || config.has_children();
            if nested && live.privacy != Some(TeamPrivacy::Closed) {
                patch.privacy = Some(TeamPrivacy::Closed);
            }
        }
    }
    patch
}

struct TeamMembership<'a, C: ?Sized> {
    client: &'a C,
    org: &'a str,
    slug: &'a str,
}

#[async_trait]
impl<C> MembershipTarget for TeamMembership<'_, C>
where
    C: TeamClient + ?Sized,
{
    async fn add(&self, user: &str, admin: bool) -> ReconcileResult<()> {
        let role = if admin {
            TeamRole::Maintainer
        } else {
            TeamRole::Member
        };
        info!(team = self.slug, user = user, role = role.as_str(), "Setting team membership");
        let membership = self
            .client
            .update_team_membership(self.org, self.slug, user, role)
            .await
            .map_err(|e| {
                ReconcileError::github(
                    format!("set {} as {} of team {}", user, role.as_str(), self.slug),
                    e,
                )
            })?;
        if membership.state == MembershipState::Pending {
            info!(team = self.slug, user = user, "Invited user to team");
        }
        Ok(())
    }

    async fn remove(&self, user: &str) -> ReconcileResult<()> {
        info!(team = self.slug, user = user, "Removing team membership");
        match self
            .client
            .remove_team_membership(self.org, self.slug, user)
            .await
        {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => {
                warn!(team = self.slug, user = user, "User is already gone from team");
                Ok(())
            }
            Err(e) => Err(ReconcileError::github(
                format!("remove {} from team {}", user, self.slug),
                e,
            )),
        }
    }

    fn role_names(&self) -> (&'static str, &'static str) {
        ("maintainers", "members")
    }
}

/// Reconciles the members and maintainers of one team.
pub async fn configure_team_members<C>(
    client: &C,
    org: &str,
    slug: &str,
    config: &TeamConfig,
    ignore_invitees: bool,
) -> ReconcileResult<()>
where
    C: TeamClient + ?Sized,
{
    let list = |role: TeamRole| async move {
        client
            .list_team_members(org, slug, role)
            .await
            .map(|users| users.into_iter().map(|u| u.login).collect::<LoginSet>())
            .map_err(|e| {
                ReconcileError::github(format!("list {}s of team {}", role.as_str(), slug), e)
            })
    };
    let have = MemberSnapshot {
        admins: list(TeamRole::Maintainer).await?,
        members: list(TeamRole::Member).await?,
    };
    let want = MemberSnapshot::new(&config.members, &config.maintainers);

    let invitees = if ignore_invitees {
        LoginSet::new()
    } else {
        client
            .list_team_invitations(org, slug)
            .await
            .map_err(|e| ReconcileError::github(format!("list invitations of team {}", slug), e))?
            .iter()
            .filter_map(|invitation| invitation.login.as_deref())
            .collect()
    };

    let target = TeamMembership { client, org, slug };
    configure_members(&format!("team {}", slug), &have, &want, &invitees, &target).await?;
    Ok(())
}

/// Applies metadata and membership to `name` and, recursively, to its children.
///
/// `teams` is updated with the edited teams so later phases address them by their
/// current slug. A failed metadata edit stops the walk. Membership failures stop it
/// only when `options.confirm` is set.
pub fn configure_team_and_members<'a, C>(
    client: &'a C,
    org: &'a str,
    name: &'a str,
    config: &'a TeamConfig,
    teams: &'a mut ResolvedTeams,
    parent: Option<u64>,
    options: &'a ReconcileOptions,
) -> Pin<Box<dyn Future<Output = ReconcileResult<()>> + Send + 'a>>
where
    C: TeamClient + ?Sized,
{
    Box::pin(async move {
        let live = teams.get(name).cloned().ok_or_else(|| {
            ReconcileError::Configuration(format!("team {} was not resolved to a live team", name))
        })?;

        let patch = team_patch(name, config, &live, parent);
        let current = if patch.is_empty() {
            debug!(org = org, team = name, "Team metadata already up to date");
            live
        } else {
            info!(org = org, team = name, ?patch, "Updating team metadata");
            let edited = client
                .edit_team(org, &live.slug, &patch)
                .await
                .map_err(|e| ReconcileError::github(format!("edit team {}", name), e))?;
            let current = Team {
                name: name.to_string(),
                slug: if edited.slug.is_empty() {
                    live.slug.clone()
                } else {
                    edited.slug
                },
                ..live
            };
            teams.insert(name.to_string(), current.clone());
            current
        };

        if options.fix_team_members {
            if let Err(e) =
                configure_team_members(client, org, &current.slug, config, options.ignore_invitees)
                    .await
            {
                if options.confirm {
                    return Err(e.context(format!("team {}", name)));
                }
                warn!(org = org, team = name, error = %e, "Failed to update team members");
            }
        }

        for (child_name, child) in &config.children {
            configure_team_and_members(
                client,
                org,
                child_name,
                child,
                teams,
                Some(current.id),
                options,
            )
            .await
            .map_err(|e| e.context(format!("child teams of {}", name)))?;
        }
        Ok(())
    })
}

/// Walks every top-level declared team.
#[instrument(skip(client, declared, teams, options))]
pub async fn configure_all_team_members<C>(
    client: &C,
    org: &str,
    declared: &std::collections::BTreeMap<String, TeamConfig>,
    teams: &mut ResolvedTeams,
    options: &ReconcileOptions,
) -> ReconcileResult<()>
where
    C: TeamClient + ?Sized,
{
    for (name, config) in declared {
        configure_team_and_members(client, org, name, config, teams, None, options).await?;
    }
    Ok(())
}
