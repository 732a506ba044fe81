//! Direct repository collaborators and their pending invitations.
//!
//! Only collaborators granted directly on the repository are managed; access inherited
//! through organization membership or teams is never touched. A pending invitation
//! counts as the user being present, so the phase does not re-invite users who have not
//! accepted yet, and removals of invitees cancel the invitation instead.

use config_manager::{PermissionLevel, RepoConfig};
use github_client::{Collaborator, CollaboratorClient, RepositoryInvitation, RepositoryPermission};
use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, error, info, instrument, warn};

use crate::errors::{ReconcileError, ReconcileResult};
use crate::forks::ForkNames;
use crate::identity::normalize;

#[cfg(test)]
#[path = "collaborators_tests.rs"]
mod tests;

/// One change to a repository's collaborators.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CollaboratorAction {
    /// Grants `permission` to a direct collaborator, or invites a new one.
    Add {
        user: String,
        permission: RepositoryPermission,
    },
    /// Changes the permission offered by a pending invitation.
    UpdateInvitation {
        user: String,
        id: u64,
        permission: RepositoryPermission,
    },
    /// Removes a direct collaborator.
    Remove { user: String },
    /// Cancels a pending invitation.
    DeleteInvitation { user: String, id: u64 },
}

#[derive(Debug)]
struct Current<'a> {
    login: &'a str,
    permission: Option<RepositoryPermission>,
    invitation: Option<u64>,
    /// Permission of a pending invitation shadowed by the direct entry.
    invited: Option<RepositoryPermission>,
}

impl Current<'_> {
    fn grants(&self, permission: RepositoryPermission) -> bool {
        self.permission == Some(permission) || self.invited == Some(permission)
    }
}

/// Computes the actions turning the live collaborators into the declared ones.
///
/// Users declared with `none` are treated like undeclared users.
pub fn plan_collaborators(
    want: &BTreeMap<String, PermissionLevel>,
    direct: &[Collaborator],
    invitations: &[RepositoryInvitation],
) -> Vec<CollaboratorAction> {
    let mut current: HashMap<String, Current<'_>> = HashMap::new();
    for collaborator in direct {
        current.insert(
            normalize(&collaborator.login),
            Current {
                login: &collaborator.login,
                permission: Some(collaborator.permission),
                invitation: None,
                invited: None,
            },
        );
    }
    for invitation in invitations {
        let Some(login) = invitation.invitee_login() else {
            continue;
        };
        match current.entry(normalize(login)) {
            Entry::Occupied(mut entry) => entry.get_mut().invited = invitation.permission(),
            Entry::Vacant(entry) => {
                entry.insert(Current {
                    login,
                    permission: invitation.permission(),
                    invitation: Some(invitation.id),
                    invited: None,
                });
            }
        }
    }

    let want: BTreeMap<String, (&str, RepositoryPermission)> = want
        .iter()
        .filter_map(|(user, level)| {
            level
                .as_repository_permission()
                .map(|permission| (normalize(user), (user.as_str(), permission)))
        })
        .collect();

    let mut actions = Vec::new();
    for (key, (user, permission)) in &want {
        match current.get(key) {
            Some(live) if live.grants(*permission) => {}
            Some(Current {
                invitation: Some(id),
                ..
            }) => actions.push(CollaboratorAction::UpdateInvitation {
                user: user.to_string(),
                id: *id,
                permission: *permission,
            }),
            _ => actions.push(CollaboratorAction::Add {
                user: user.to_string(),
                permission: *permission,
            }),
        }
    }

    let mut stale: Vec<(&String, &Current<'_>)> = current
        .iter()
        .filter(|(key, _)| !want.contains_key(*key))
        .collect();
    stale.sort_by(|a, b| a.0.cmp(b.0));
    for (_, live) in stale {
        actions.push(match live.invitation {
            Some(id) => CollaboratorAction::DeleteInvitation {
                user: live.login.to_string(),
                id,
            },
            None => CollaboratorAction::Remove {
                user: live.login.to_string(),
            },
        });
    }
    actions
}

async fn apply_action<C>(
    client: &C,
    org: &str,
    repo: &str,
    action: &CollaboratorAction,
) -> ReconcileResult<()>
where
    C: CollaboratorClient + ?Sized,
{
    match action {
        CollaboratorAction::Add { user, permission } => {
            info!(org = org, repo = repo, user = %user, permission = %permission, "Setting collaborator permission");
            client
                .add_collaborator(org, repo, user, *permission)
                .await
                .map_err(|e| ReconcileError::github(format!("set {} on {} for {}", permission, repo, user), e))
        }
        CollaboratorAction::UpdateInvitation {
            user,
            id,
            permission,
        } => {
            info!(org = org, repo = repo, user = %user, permission = %permission, invitation = id, "Updating collaborator invitation");
            client
                .update_repository_invitation(org, repo, *id, *permission)
                .await
                .map_err(|e| {
                    ReconcileError::github(format!("update invitation of {} to {}", user, repo), e)
                })
        }
        CollaboratorAction::Remove { user } => {
            info!(org = org, repo = repo, user = %user, "Removing collaborator");
            match client.remove_collaborator(org, repo, user).await {
                Err(e) if e.is_not_found() => {
                    warn!(org = org, repo = repo, user = %user, "Collaborator is already gone");
                    Ok(())
                }
                result => result.map_err(|e| {
                    ReconcileError::github(format!("remove {} from {}", user, repo), e)
                }),
            }
        }
        CollaboratorAction::DeleteInvitation { user, id } => {
            info!(org = org, repo = repo, user = %user, invitation = id, "Deleting collaborator invitation");
            client
                .delete_repository_invitation(org, repo, *id)
                .await
                .map_err(|e| {
                    ReconcileError::github(format!("delete invitation of {} to {}", user, repo), e)
                })
        }
    }
}

/// Reconciles the collaborators of one repository.
pub async fn configure_repo_collaborators<C>(
    client: &C,
    org: &str,
    repo: &str,
    want: &BTreeMap<String, PermissionLevel>,
) -> ReconcileResult<()>
where
    C: CollaboratorClient + ?Sized,
{
    let direct = match client.list_direct_collaborators(org, repo).await {
        Ok(direct) => direct,
        Err(e) if e.is_not_found() => {
            warn!(org = org, repo = repo, "Repository not found, skipping collaborators");
            return Ok(());
        }
        Err(e) => {
            return Err(ReconcileError::github(
                format!("list collaborators of {}/{}", org, repo),
                e,
            ))
        }
    };
    let invitations = client
        .list_repository_invitations(org, repo)
        .await
        .map_err(|e| ReconcileError::github(format!("list invitations of {}/{}", org, repo), e))?;

    let actions = plan_collaborators(want, &direct, &invitations);
    if actions.is_empty() {
        debug!(org = org, repo = repo, "Collaborators already up to date");
        return Ok(());
    }

    let mut errors = Vec::new();
    for action in &actions {
        if let Err(e) = apply_action(client, org, repo, action).await {
            error!(org = org, repo = repo, error = %e, "Failed to update collaborator");
            errors.push(e);
        }
    }
    ReconcileError::from_errors(errors)
}

/// Reconciles the collaborators of every repository that declares them.
#[instrument(skip(client, repos, fork_names))]
pub async fn configure_collaborators<C>(
    client: &C,
    org: &str,
    repos: &BTreeMap<String, RepoConfig>,
    fork_names: &ForkNames,
) -> ReconcileResult<()>
where
    C: CollaboratorClient + ?Sized,
{
    let mut errors = Vec::new();
    for (name, config) in repos {
        let Some(want) = &config.collaborators else {
            continue;
        };
        let live_name = fork_names.get(name).map(String::as_str).unwrap_or(name);
        if let Err(e) = configure_repo_collaborators(client, org, live_name, want).await {
            errors.push(e.context(format!("repo {}", name)));
        }
    }
    ReconcileError::from_errors(errors)
}
