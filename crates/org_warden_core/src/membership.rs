//! Membership diffing shared by organizations and teams.
//!
//! A scope (org or team) has two roles: plain members and a privileged role (org
//! admins, team maintainers). [`configure_members`] compares the live snapshot with the
//! declared one and drives a [`MembershipTarget`] that knows how to add and remove
//! users in that scope.

use async_trait::async_trait;
use tracing::{debug, error, info};

use crate::errors::{ReconcileError, ReconcileResult};
use crate::identity::LoginSet;

#[cfg(test)]
#[path = "membership_tests.rs"]
mod tests;

/// Members and privileged members of one scope.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemberSnapshot {
    pub members: LoginSet,
    /// Org admins or team maintainers.
    pub admins: LoginSet,
}

impl MemberSnapshot {
    pub fn new<I, J, S, T>(members: I, admins: J) -> Self
    where
        I: IntoIterator<Item = S>,
        J: IntoIterator<Item = T>,
        S: AsRef<str>,
        T: AsRef<str>,
    {
        Self {
            members: members.into_iter().collect(),
            admins: admins.into_iter().collect(),
        }
    }

    /// Everyone in the scope regardless of role.
    pub fn all(&self) -> LoginSet {
        self.members.union(&self.admins)
    }
}

/// Adds and removes users in one membership scope.
#[async_trait]
pub trait MembershipTarget: Send + Sync {
    /// Adds `user`, or changes their role, with the privileged role when `admin` is set.
    async fn add(&self, user: &str, admin: bool) -> ReconcileResult<()>;

    async fn remove(&self, user: &str) -> ReconcileResult<()>;

    /// Names of the privileged and plain roles, for messages.
    fn role_names(&self) -> (&'static str, &'static str) {
        ("admins", "members")
    }
}

/// The changes computed for one scope.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MembershipChanges {
    pub added_members: Vec<String>,
    pub added_admins: Vec<String>,
    pub removed: Vec<String>,
    /// Declared users left alone because an invitation is already pending.
    pub skipped_invitees: Vec<String>,
}

impl MembershipChanges {
    pub fn is_empty(&self) -> bool {
        self.added_members.is_empty() && self.added_admins.is_empty() && self.removed.is_empty()
    }
}

/// Fails when a user is declared with both roles.
pub fn check_role_conflict(
    scope: &str,
    want: &MemberSnapshot,
    first: &'static str,
    second: &'static str,
) -> ReconcileResult<()> {
    let both = want.admins.intersection(&want.members);
    if both.is_empty() {
        return Ok(());
    }
    Err(ReconcileError::RoleConflict {
        scope: scope.to_string(),
        first,
        second,
        users: both.to_vec(),
    })
}

/// Computes the diff between `have` and `want` without applying it.
pub fn plan_members(
    have: &MemberSnapshot,
    want: &MemberSnapshot,
    invitees: &LoginSet,
) -> MembershipChanges {
    let want_all = want.all();
    let mut changes = MembershipChanges {
        removed: have.all().union(invitees).difference(&want_all).to_vec(),
        ..Default::default()
    };

    for user in want.members.difference(&have.members).iter() {
        if invitees.contains(user) {
            changes.skipped_invitees.push(user.to_string());
        } else {
            changes.added_members.push(user.to_string());
        }
    }
    for user in want.admins.difference(&have.admins).iter() {
        if invitees.contains(user) {
            changes.skipped_invitees.push(user.to_string());
        } else {
            changes.added_admins.push(user.to_string());
        }
    }
    changes
}

/// Reconciles one scope.
///
/// Members are added first, then admins, then unwanted users and stale invitations
/// are removed. Every operation is attempted; failures are returned together.
pub async fn configure_members(
    scope: &str,
    have: &MemberSnapshot,
    want: &MemberSnapshot,
    invitees: &LoginSet,
    target: &dyn MembershipTarget,
) -> ReconcileResult<MembershipChanges> {
    let (admin_role, member_role) = target.role_names();
    check_role_conflict(scope, want, admin_role, member_role)?;

    let changes = plan_members(have, want, invitees);

    for user in &changes.skipped_invitees {
        info!(scope = scope, user = %user, "Waiting for pending invitation");
    }
    if changes.is_empty() {
        debug!(scope = scope, "Membership already up to date");
        return Ok(changes);
    }

    let mut errors = Vec::new();
    let adds = changes
        .added_members
        .iter()
        .map(|user| (user, false))
        .chain(changes.added_admins.iter().map(|user| (user, true)));
    for (user, admin) in adds {
        if let Err(e) = target.add(user, admin).await {
            error!(scope = scope, user = %user, admin = admin, error = %e, "Failed to add user");
            errors.push(e);
        }
    }
    for user in &changes.removed {
        if let Err(e) = target.remove(user).await {
            error!(scope = scope, user = %user, error = %e, "Failed to remove user");
            errors.push(e);
        }
    }

    ReconcileError::from_errors(errors)?;
    Ok(changes)
}
