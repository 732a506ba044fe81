//! # Models
//!
//! This module contains the data models read back from the GitHub API: organizations,
//! their members and invitations, teams, repositories and collaborators.
//!
//! The structs deserialize directly from the REST payloads and only carry the fields
//! the reconciler needs. Unknown fields are ignored.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

#[cfg(test)]
#[path = "models_tests.rs"]
mod tests;

/// Represents a GitHub account (user or organization).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Account {
    /// The unique ID of the account
    pub id: u64,
    /// The login name of the account
    pub login: String,
    /// The type of account (User or Organization)
    #[serde(rename = "type")]
    pub account_type: String,
    /// The node ID for GraphQL operations
    pub node_id: String,
}

/// Represents a GitHub App installation.
///
/// Used to locate the installation for an organization when authenticating as an app.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Installation {
    /// The unique ID of the installation
    pub id: u64,
    /// The account (user or organization) where the app is installed
    pub account: Account,
    /// Optional repository selection details
    pub repository_selection: Option<String>,
    /// The node ID for GraphQL operations
    pub node_id: String,
}

impl From<octocrab::models::Installation> for Installation {
    fn from(value: octocrab::models::Installation) -> Self {
        let account_node_id = value.account.node_id.clone();
        Self {
            id: *value.id,
            account: Account {
                id: *value.account.id,
                login: value.account.login,
                account_type: value.account.r#type,
                node_id: value.account.node_id,
            },
            repository_selection: value.repository_selection,
            node_id: account_node_id, // Use account's node_id since installation doesn't have one
        }
    }
}

/// Represents a GitHub user account.
///
/// # Examples
///
/// ```rust
/// use github_client::models::User;
///
/// let user = User {
///     id: 12345,
///     login: "octocat".to_string(),
/// };
///
/// println!("User: {} (ID: {})", user.login, user.id);
/// ```
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct User {
    /// The unique numeric ID of the user
    pub id: u64,
    /// The login name of the user
    pub login: String,
}

/// Organization metadata as returned by `GET /orgs/{org}`.
///
/// Every field is optional because GitHub omits several of them for callers that are
/// not organization owners.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct Organization {
    pub login: String,
    pub name: Option<String>,
    pub billing_email: Option<String>,
    pub company: Option<String>,
    pub email: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub has_organization_projects: Option<bool>,
    pub has_repository_projects: Option<bool>,
    pub default_repository_permission: Option<String>,
    pub members_can_create_repositories: Option<bool>,
}

/// Role filter and target role for organization memberships.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OrgRole {
    Admin,
    Member,
}

impl OrgRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrgRole::Admin => "admin",
            OrgRole::Member => "member",
        }
    }
}

/// Role filter and target role for team memberships.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TeamRole {
    Maintainer,
    Member,
}

impl TeamRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            TeamRole::Maintainer => "maintainer",
            TeamRole::Member => "member",
        }
    }
}

/// State of an organization or team membership.
///
/// A `Pending` membership means GitHub sent an invitation that the user has not yet
/// accepted.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MembershipState {
    Active,
    Pending,
}

/// Membership record returned when adding or updating an org or team member.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct Membership {
    pub state: MembershipState,
    pub role: String,
}

/// A pending organization or team invitation.
///
/// Invitations sent to an email address have no login.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Invitation {
    pub id: u64,
    pub login: Option<String>,
    pub email: Option<String>,
}

/// Team visibility inside the organization.
///
/// Nested teams (teams with a parent or with children) must be `Closed`.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TeamPrivacy {
    Closed,
    Secret,
}

impl fmt::Display for TeamPrivacy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TeamPrivacy::Closed => write!(f, "closed"),
            TeamPrivacy::Secret => write!(f, "secret"),
        }
    }
}

/// Reference to a parent team, as embedded in a team payload.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct TeamParent {
    pub id: u64,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub name: String,
}

/// A team of an organization.
///
/// The numeric `id` is the stable identity; `slug` and `name` change on rename.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Team {
    pub id: u64,
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub privacy: Option<TeamPrivacy>,
    #[serde(default)]
    pub parent: Option<TeamParent>,
}

impl Team {
    /// Returns the live description, treating a missing description as empty.
    pub fn description_or_empty(&self) -> &str {
        self.description.as_deref().unwrap_or_default()
    }

    pub fn parent_id(&self) -> Option<u64> {
        self.parent.as_ref().map(|p| p.id)
    }
}

/// Repository access level that can be granted to a team or collaborator.
///
/// The variants are ordered from least to most privileged. Each level maps to the
/// REST name used for team and collaborator grants (`pull`, `push`, ...) and to the
/// name used by repository invitations (`read`, `write`, ...).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepositoryPermission {
    Read,
    Triage,
    Write,
    Maintain,
    Admin,
}

impl RepositoryPermission {
    /// Name used by the team-repository and collaborator endpoints.
    pub fn as_api_str(&self) -> &'static str {
        match self {
            RepositoryPermission::Read => "pull",
            RepositoryPermission::Triage => "triage",
            RepositoryPermission::Write => "push",
            RepositoryPermission::Maintain => "maintain",
            RepositoryPermission::Admin => "admin",
        }
    }

    /// Name used by the repository invitation endpoints.
    pub fn as_invitation_str(&self) -> &'static str {
        match self {
            RepositoryPermission::Read => "read",
            RepositoryPermission::Triage => "triage",
            RepositoryPermission::Write => "write",
            RepositoryPermission::Maintain => "maintain",
            RepositoryPermission::Admin => "admin",
        }
    }

    /// Picks the highest level set in a REST `permissions` object.
    pub fn from_permissions(permissions: &RepositoryPermissions) -> Option<Self> {
        if permissions.admin {
            Some(RepositoryPermission::Admin)
        } else if permissions.maintain {
            Some(RepositoryPermission::Maintain)
        } else if permissions.push {
            Some(RepositoryPermission::Write)
        } else if permissions.triage {
            Some(RepositoryPermission::Triage)
        } else if permissions.pull {
            Some(RepositoryPermission::Read)
        } else {
            None
        }
    }
}

impl fmt::Display for RepositoryPermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_invitation_str())
    }
}

impl FromStr for RepositoryPermission {
    type Err = Error;

    /// Accepts the REST, invitation and GraphQL spellings, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "read" | "pull" => Ok(RepositoryPermission::Read),
            "triage" => Ok(RepositoryPermission::Triage),
            "write" | "push" => Ok(RepositoryPermission::Write),
            "maintain" => Ok(RepositoryPermission::Maintain),
            "admin" => Ok(RepositoryPermission::Admin),
            _ => Err(Error::InvalidResponse),
        }
    }
}

/// The REST `permissions` object attached to repositories listed for a team.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct RepositoryPermissions {
    pub admin: bool,
    pub maintain: bool,
    pub push: bool,
    pub triage: bool,
    pub pull: bool,
}

/// A repository as seen through a team's repository listing.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct TeamRepository {
    pub name: String,
    #[serde(default)]
    pub permissions: RepositoryPermissions,
}

impl TeamRepository {
    pub fn permission(&self) -> Option<RepositoryPermission> {
        RepositoryPermission::from_permissions(&self.permissions)
    }
}

/// Upstream repository of a fork.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct RepositoryParent {
    pub name: String,
    pub full_name: String,
}

/// A GitHub repository.
///
/// The list endpoint omits `parent`; callers that need the upstream of a fork must
/// fetch the single repository.
///
/// # Examples
///
/// ```rust
/// use github_client::models::Repository;
///
/// let repo = Repository {
///     name: "my-repo".to_string(),
///     full_name: "my-org/my-repo".to_string(),
///     private: true,
///     ..Default::default()
/// };
///
/// assert!(repo.private);
/// assert_eq!(repo.parent_full_name(), None);
/// ```
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct Repository {
    pub id: u64,
    pub name: String,
    pub full_name: String,
    pub description: Option<String>,
    pub homepage: Option<String>,
    pub private: bool,
    pub archived: bool,
    pub fork: bool,
    pub parent: Option<RepositoryParent>,
    pub default_branch: Option<String>,
    pub has_issues: bool,
    pub has_projects: bool,
    pub has_wiki: bool,
    pub allow_squash_merge: Option<bool>,
    pub allow_merge_commit: Option<bool>,
    pub allow_rebase_merge: Option<bool>,
    pub squash_merge_commit_title: Option<String>,
    pub squash_merge_commit_message: Option<String>,
}

impl Repository {
    pub fn parent_full_name(&self) -> Option<&str> {
        self.parent.as_ref().map(|p| p.full_name.as_str())
    }
}

/// A user explicitly granted access to a repository.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct Collaborator {
    pub login: String,
    pub permission: RepositoryPermission,
}

/// A pending invitation to collaborate on a repository.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct RepositoryInvitation {
    pub id: u64,
    #[serde(default)]
    pub invitee: Option<User>,
    #[serde(default)]
    pub permissions: String,
}

impl RepositoryInvitation {
    pub fn invitee_login(&self) -> Option<&str> {
        self.invitee.as_ref().map(|u| u.login.as_str())
    }

    /// Parses the invitation permission; unknown values yield `None`.
    pub fn permission(&self) -> Option<RepositoryPermission> {
        self.permissions.parse().ok()
    }
}
