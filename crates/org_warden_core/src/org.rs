//! Organization metadata and organization membership phases.

use async_trait::async_trait;
use config_manager::{OrgConfig, OrgMetadata};
use github_client::{
    MembershipState, OrgRole, Organization, OrganizationClient, OrganizationUpdatePayload,
};
use tracing::{debug, info, instrument, warn};

use crate::errors::{ReconcileError, ReconcileResult};
use crate::identity::{apply_if_set, LoginSet};
use crate::membership::{configure_members, MemberSnapshot, MembershipChanges, MembershipTarget};
use crate::options::ReconcileOptions;

#[cfg(test)]
#[path = "org_tests.rs"]
mod tests;

/// Builds the metadata patch for the organization; empty when nothing differs.
pub fn org_metadata_patch(
    org: &str,
    live: &Organization,
    want: &OrgMetadata,
) -> ReconcileResult<OrganizationUpdatePayload> {
    let default_repository_permission = match want.default_repository_permission {
        Some(level) => {
            let wanted = level.as_org_default_str().ok_or_else(|| {
                ReconcileError::Configuration(format!(
                    "org {}: default_repository_permission '{}' is not one of none, read, write, admin",
                    org, level
                ))
            })?;
            let live_value = live
                .default_repository_permission
                .as_deref()
                .map(str::to_ascii_lowercase);
            apply_if_set(live_value.as_ref(), Some(&wanted.to_string()))
        }
        None => None,
    };

    Ok(OrganizationUpdatePayload {
        billing_email: apply_if_set(live.billing_email.as_ref(), want.billing_email.as_ref()),
        company: apply_if_set(live.company.as_ref(), want.company.as_ref()),
        email: apply_if_set(live.email.as_ref(), want.email.as_ref()),
        name: apply_if_set(live.name.as_ref(), want.name.as_ref()),
        description: apply_if_set(live.description.as_ref(), want.description.as_ref()),
        location: apply_if_set(live.location.as_ref(), want.location.as_ref()),
        has_organization_projects: apply_if_set(
            live.has_organization_projects.as_ref(),
            want.has_organization_projects.as_ref(),
        ),
        has_repository_projects: apply_if_set(
            live.has_repository_projects.as_ref(),
            want.has_repository_projects.as_ref(),
        ),
        default_repository_permission,
        members_can_create_repositories: apply_if_set(
            live.members_can_create_repositories.as_ref(),
            want.members_can_create_repositories.as_ref(),
        ),
    })
}

/// Applies the declared organization metadata. Returns `true` when a patch was sent.
#[instrument(skip(client, want))]
pub async fn configure_org_meta<C>(client: &C, org: &str, want: &OrgMetadata) -> ReconcileResult<bool>
where
    C: OrganizationClient + ?Sized,
{
    let live = client
        .get_organization(org)
        .await
        .map_err(|e| ReconcileError::github(format!("get org {}", org), e))?;

    let patch = org_metadata_patch(org, &live, want)?;
    if patch.is_empty() {
        debug!(org = org, "Organization metadata already up to date");
        return Ok(false);
    }

    info!(org = org, ?patch, "Updating organization metadata");
    client
        .edit_organization(org, &patch)
        .await
        .map_err(|e| ReconcileError::github(format!("edit org {}", org), e))?;
    Ok(true)
}

/// Logins with a pending invitation to the organization.
pub async fn org_invitees<C>(client: &C, org: &str) -> ReconcileResult<LoginSet>
where
    C: OrganizationClient + ?Sized,
{
    let invitations = client
        .list_organization_invitations(org)
        .await
        .map_err(|e| ReconcileError::github(format!("list invitations of org {}", org), e))?;
    Ok(invitations
        .iter()
        .filter_map(|invitation| invitation.login.as_deref())
        .collect())
}

/// Fails when removing `removals` of `total` entities would exceed `maximum`.
///
/// Removing exactly the maximum fraction is allowed.
pub fn check_removal_delta(
    scope: &str,
    removals: usize,
    total: usize,
    maximum: f64,
) -> ReconcileResult<()> {
    if total == 0 || removals as f64 / total as f64 <= maximum {
        return Ok(());
    }
    Err(ReconcileError::RemovalDeltaExceeded {
        scope: scope.to_string(),
        removals,
        total,
        maximum,
    })
}

struct OrgMembership<'a, C: ?Sized> {
    client: &'a C,
    org: &'a str,
}

#[async_trait]
impl<C> MembershipTarget for OrgMembership<'_, C>
where
    C: OrganizationClient + ?Sized,
{
    async fn add(&self, user: &str, admin: bool) -> ReconcileResult<()> {
        let role = if admin { OrgRole::Admin } else { OrgRole::Member };
        info!(org = self.org, user = user, role = role.as_str(), "Setting org membership");
        let membership = self
            .client
            .update_organization_membership(self.org, user, role)
            .await
            .map_err(|e| {
                ReconcileError::github(format!("set {} as {} of org {}", user, role.as_str(), self.org), e)
            })?;
        if membership.state == MembershipState::Pending {
            info!(org = self.org, user = user, "Invited user to org");
        }
        Ok(())
    }

    async fn remove(&self, user: &str) -> ReconcileResult<()> {
        info!(org = self.org, user = user, "Removing org membership");
        match self.client.remove_organization_membership(self.org, user).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => {
                warn!(org = self.org, user = user, "User is already gone from org");
                Ok(())
            }
            Err(e) => Err(ReconcileError::github(
                format!("remove {} from org {}", user, self.org),
                e,
            )),
        }
    }
}

/// Reconciles the organization's admins and members.
///
/// The declared admin guards and the removal delta are checked before any mutation.
#[instrument(skip(client, config, options))]
pub async fn configure_org_members<C>(
    client: &C,
    org: &str,
    config: &OrgConfig,
    options: &ReconcileOptions,
) -> ReconcileResult<MembershipChanges>
where
    C: OrganizationClient + ?Sized,
{
    let want = MemberSnapshot::new(&config.members, &config.admins);
    options.check_admins(org, &want.admins)?;

    let list = |role: OrgRole| async move {
        client
            .list_organization_members(org, role)
            .await
            .map(|users| users.into_iter().map(|u| u.login).collect::<LoginSet>())
            .map_err(|e| {
                ReconcileError::github(format!("list {}s of org {}", role.as_str(), org), e)
            })
    };
    let have = MemberSnapshot {
        admins: list(OrgRole::Admin).await?,
        members: list(OrgRole::Member).await?,
    };

    let invitees = if options.ignore_invitees {
        LoginSet::new()
    } else {
        org_invitees(client, org).await?
    };

    let scope = format!("org {}", org);
    let removals = have.all().difference(&want.all()).len();
    check_removal_delta(&scope, removals, have.all().len(), options.maximum_removal_delta)?;

    let target = OrgMembership { client, org };
    let changes = configure_members(&scope, &have, &want, &invitees, &target).await?;
    info!(
        org = org,
        added_members = changes.added_members.len(),
        added_admins = changes.added_admins.len(),
        removed = changes.removed.len(),
        "Org membership reconciled"
    );
    Ok(changes)
}
