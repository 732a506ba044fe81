//! Runtime options controlling which phases run and how cautious they are.

use std::time::Duration;

use crate::errors::{ReconcileError, ReconcileResult};

#[cfg(test)]
#[path = "options_tests.rs"]
mod tests;

pub const DEFAULT_MIN_ADMINS: usize = 5;
pub const DEFAULT_MAXIMUM_REMOVAL_DELTA: f64 = 0.25;

/// How long to wait for an asynchronously created fork to appear.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ForkPollSettings {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for ForkPollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            timeout: Duration::from_secs(5 * 60),
        }
    }
}

/// Options for one reconciliation run.
///
/// Every phase is disabled by default. `confirm` only records whether the client was
/// built to mutate; the reconciler itself never branches on dry run except to decide
/// whether team membership failures abort the run.
#[derive(Clone, Debug, PartialEq)]
pub struct ReconcileOptions {
    pub confirm: bool,

    pub fix_org: bool,
    pub fix_org_members: bool,
    pub fix_teams: bool,
    pub fix_team_members: bool,
    pub fix_team_repos: bool,
    pub fix_repos: bool,
    pub fix_forks: bool,
    pub fix_collaborators: bool,

    /// Minimum number of declared org admins.
    pub min_admins: usize,
    /// Largest fraction of live members or teams a run may remove.
    pub maximum_removal_delta: f64,
    /// Logins that must be declared as org admins.
    pub required_admins: Vec<String>,
    /// Require the authenticated user to be a declared org admin.
    pub require_self: bool,

    pub ignore_invitees: bool,
    pub ignore_secret_teams: bool,
    pub allow_repo_archival: bool,
    pub allow_repo_publish: bool,

    pub fork_poll: ForkPollSettings,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            confirm: false,
            fix_org: false,
            fix_org_members: false,
            fix_teams: false,
            fix_team_members: false,
            fix_team_repos: false,
            fix_repos: false,
            fix_forks: false,
            fix_collaborators: false,
            min_admins: DEFAULT_MIN_ADMINS,
            maximum_removal_delta: DEFAULT_MAXIMUM_REMOVAL_DELTA,
            required_admins: Vec::new(),
            require_self: false,
            ignore_invitees: false,
            ignore_secret_teams: false,
            allow_repo_archival: false,
            allow_repo_publish: false,
            fork_poll: ForkPollSettings::default(),
        }
    }
}

impl ReconcileOptions {
    /// Checks option combinations that can never produce a valid run.
    pub fn validate(&self) -> ReconcileResult<()> {
        if self.min_admins < 2 {
            return Err(ReconcileError::Configuration(format!(
                "--min-admins={} must be at least 2",
                self.min_admins
            )));
        }
        if !(0.0..=1.0).contains(&self.maximum_removal_delta) {
            return Err(ReconcileError::Configuration(format!(
                "--maximum-removal-delta={} must be a non-negative number less than or equal to 1.0",
                self.maximum_removal_delta
            )));
        }
        if self.fix_team_members && !self.fix_teams {
            return Err(ReconcileError::Configuration(
                "--fix-team-members requires --fix-teams".to_string(),
            ));
        }
        if self.fix_team_repos && !self.fix_teams {
            return Err(ReconcileError::Configuration(
                "--fix-team-repos requires --fix-teams".to_string(),
            ));
        }
        Ok(())
    }

    /// Enforces `min_admins`, `required_admins` against the declared admins.
    pub(crate) fn check_admins(&self, org: &str, admins: &crate::identity::LoginSet) -> ReconcileResult<()> {
        let missing: Vec<&str> = self
            .required_admins
            .iter()
            .map(String::as_str)
            .filter(|required| !admins.contains(required))
            .collect();
        if !missing.is_empty() {
            return Err(ReconcileError::Configuration(format!(
                "org {}: required admins are not declared as admins: {}",
                org,
                missing.join(", ")
            )));
        }
        if admins.len() < self.min_admins {
            return Err(ReconcileError::Configuration(format!(
                "org {}: {} admins declared, at least {} required",
                org,
                admins.len(),
                self.min_admins
            )));
        }
        Ok(())
    }
}
