//! Reconciliation engine for GitHub organizations.
//!
//! Given a declared [`OrgConfig`](config_manager::OrgConfig), the engine reads the live
//! organization through the `github_client` traits and applies the smallest set of
//! changes that makes it match: organization metadata and members, teams and their
//! members, team repository grants, repositories, forks and direct collaborators.
//! Running it twice against a converged organization makes no mutating calls.
//!
//! The engine never checks whether it runs in dry-run mode. A client built with
//! `GitHubClient::with_dry_run` logs the mutations instead of sending them.
//!
//! [`dump_org_config`] performs the inverse operation and reads a live organization
//! into the declarative format.

use github_client::{
    CollaboratorClient, OrganizationClient, RepositoryClient, TeamClient, TeamRepositoryClient,
};

pub mod collaborators;
pub mod dump;
pub mod errors;
pub mod forks;
pub mod identity;
pub mod membership;
pub mod options;
pub mod orchestrator;
pub mod org;
pub mod preflight;
pub mod repos;
pub mod team_members;
pub mod team_repos;
pub mod teams;

#[cfg(test)]
mod test_support;

pub use collaborators::{configure_collaborators, plan_collaborators, CollaboratorAction};
pub use dump::dump_org_config;
pub use errors::{ReconcileError, ReconcileResult};
pub use forks::{configure_forks, ForkNames, ForkOutcome};
pub use identity::{apply_if_set, normalize, LoginSet};
pub use membership::{plan_members, MemberSnapshot, MembershipChanges};
pub use options::{
    ForkPollSettings, ReconcileOptions, DEFAULT_MAXIMUM_REMOVAL_DELTA, DEFAULT_MIN_ADMINS,
};
pub use orchestrator::{apply_config, configure_org};
pub use org::{configure_org_members, configure_org_meta};
pub use preflight::validate_org;
pub use repos::configure_repos;
pub use team_members::configure_all_team_members;
pub use team_repos::{configure_all_team_repos, plan_team_repos};
pub use teams::{configure_teams, ResolvedTeams};

/// Everything the reconciler needs from GitHub.
///
/// Implemented for every type providing all phase traits, including
/// `github_client::GitHubClient` and trait objects built from it.
pub trait GitHubApi:
    OrganizationClient + TeamClient + TeamRepositoryClient + RepositoryClient + CollaboratorClient
{
}

impl<T> GitHubApi for T where
    T: OrganizationClient
        + TeamClient
        + TeamRepositoryClient
        + RepositoryClient
        + CollaboratorClient
        + ?Sized
{
}
