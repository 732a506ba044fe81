//! Request payloads for the mutating endpoints.
//!
//! All optional fields are skipped when `None` so that a payload only carries the
//! values that should change.

use serde::Serialize;

use crate::models::TeamPrivacy;

#[cfg(test)]
#[path = "payloads_tests.rs"]
mod tests;

/// Represents the payload for creating a new repository via the REST API.
/// Use `Default::default()` and modify fields as needed.
#[derive(Serialize, Default, Debug, Clone, PartialEq, Eq)]
pub struct RepositoryCreatePayload {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub private: Option<bool>, // Defaults to false if None

    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_issues: Option<bool>, // Defaults to true if None

    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_projects: Option<bool>, // Defaults to true if None

    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_wiki: Option<bool>, // Defaults to true if None

    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_squash_merge: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_merge_commit: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_rebase_merge: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub squash_merge_commit_title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub squash_merge_commit_message: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_init: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub gitignore_template: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_template: Option<String>,
}

/// Represents the settings that can be updated for a repository.
///
/// Setting `name` renames the repository.
#[derive(Serialize, Default, Debug, Clone, PartialEq, Eq)]
pub struct RepositoryUpdatePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub private: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_issues: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_projects: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_wiki: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_squash_merge: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_merge_commit: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_rebase_merge: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub squash_merge_commit_title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub squash_merge_commit_message: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_branch: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub archived: Option<bool>,
}

impl RepositoryUpdatePayload {
    /// Returns `true` when no field is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Payload for `POST /repos/{owner}/{repo}/forks`.
#[derive(Serialize, Default, Debug, Clone, PartialEq, Eq)]
pub struct ForkCreatePayload {
    /// Organization that will own the fork.
    pub organization: String,

    /// Requested name; GitHub may pick a different one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_branch_only: Option<bool>,
}

/// Payload for `POST /orgs/{org}/teams`.
#[derive(Serialize, Default, Debug, Clone, PartialEq, Eq)]
pub struct TeamCreatePayload {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub privacy: Option<TeamPrivacy>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_team_id: Option<u64>,
}

/// Payload for `PATCH /orgs/{org}/teams/{slug}`.
///
/// `parent_team_id` is doubly optional: `Some(None)` serializes as `null`, which
/// detaches the team from its parent.
#[derive(Serialize, Default, Debug, Clone, PartialEq, Eq)]
pub struct TeamUpdatePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub privacy: Option<TeamPrivacy>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_team_id: Option<Option<u64>>,
}

impl TeamUpdatePayload {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Payload for `PATCH /orgs/{org}`.
#[derive(Serialize, Default, Debug, Clone, PartialEq, Eq)]
pub struct OrganizationUpdatePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub billing_email: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_organization_projects: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_repository_projects: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_repository_permission: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub members_can_create_repositories: Option<bool>,
}

impl OrganizationUpdatePayload {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
