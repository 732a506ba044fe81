//! Checks run on the declared configuration before any mutation.

use config_manager::{flatten_teams, OrgConfig};
use std::collections::BTreeMap;
use tracing::debug;

use crate::errors::{ReconcileError, ReconcileResult};
use crate::identity::{normalize, LoginSet};
use crate::membership::{check_role_conflict, MemberSnapshot};
use crate::options::ReconcileOptions;

#[cfg(test)]
#[path = "preflight_tests.rs"]
mod tests;

/// Validates one organization's configuration against the enabled phases.
///
/// Every problem found is reported, not only the first one.
pub fn validate_org(
    org: &str,
    config: &OrgConfig,
    options: &ReconcileOptions,
) -> ReconcileResult<()> {
    let mut errors = Vec::new();

    let org_members = MemberSnapshot::new(&config.members, &config.admins);
    if let Err(e) = check_role_conflict(&format!("org {}", org), &org_members, "admins", "members")
    {
        errors.push(e);
    }
    if options.fix_org_members {
        if let Err(e) = options.check_admins(org, &org_members.admins) {
            errors.push(e);
        }
    }
    if options.fix_org {
        if let Some(level) = config.metadata.default_repository_permission {
            if level.as_org_default_str().is_none() {
                errors.push(ReconcileError::Configuration(format!(
                    "org {}: default_repository_permission '{}' is not one of none, read, write, admin",
                    org, level
                )));
            }
        }
    }

    errors.extend(validate_teams(org, config, &org_members.all(), options.fix_team_members));
    errors.extend(validate_repos(org, config));

    debug!(org = org, problems = errors.len(), "Validated configuration");
    ReconcileError::from_errors(errors)
}

fn validate_teams(
    org: &str,
    config: &OrgConfig,
    org_members: &LoginSet,
    check_membership: bool,
) -> Vec<ReconcileError> {
    let mut errors = Vec::new();
    let mut seen: BTreeMap<&str, &str> = BTreeMap::new();

    for (name, team, _) in flatten_teams(&config.teams) {
        for alias in std::iter::once(name).chain(team.previously.iter().map(String::as_str)) {
            if let Some(owner) = seen.insert(alias, name) {
                errors.push(ReconcileError::Configuration(format!(
                    "org {}: team name '{}' is used by both '{}' and '{}'",
                    org, alias, owner, name
                )));
            }
        }

        let scope = format!("team {}", name);
        let members = MemberSnapshot::new(&team.members, &team.maintainers);
        if let Err(e) = check_role_conflict(&scope, &members, "maintainers", "members") {
            errors.push(e);
        }

        if check_membership {
            let outsiders = members.all().difference(org_members);
            if !outsiders.is_empty() {
                errors.push(ReconcileError::Configuration(format!(
                    "org {}: team {} has members that are not org members: {}",
                    org,
                    name,
                    outsiders.to_vec().join(", ")
                )));
            }
        }
    }
    errors
}

fn validate_repos(org: &str, config: &OrgConfig) -> Vec<ReconcileError> {
    let mut errors = Vec::new();
    let mut seen: BTreeMap<String, &str> = BTreeMap::new();

    for (name, repo) in &config.repos {
        for alias in repo.names(name) {
            if let Some(owner) = seen.insert(normalize(alias), name) {
                errors.push(ReconcileError::Configuration(format!(
                    "org {}: repo name '{}' is used by both '{}' and '{}'",
                    org, alias, owner, name
                )));
            }
        }

        if let Some(collaborators) = &repo.collaborators {
            let mut logins = LoginSet::new();
            for login in collaborators.keys() {
                if !logins.insert(login) {
                    errors.push(ReconcileError::Configuration(format!(
                        "org {}: repo {} declares collaborator '{}' more than once",
                        org, name, login
                    )));
                }
            }
        }
    }
    errors
}
