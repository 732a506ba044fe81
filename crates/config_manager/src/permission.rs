//! Declared repository permission levels.

use github_client::RepositoryPermission;
use serde::{Deserialize, Serialize};
use std::fmt;

#[cfg(test)]
#[path = "permission_tests.rs"]
mod tests;

/// Permission a team or collaborator should hold on a repository.
///
/// The levels are ordered from no access to full administration. `None` is only
/// meaningful as a declared value: it means "no grant" and removes any existing one.
///
/// The GitHub REST spellings `pull` and `push` are accepted as aliases for `read` and
/// `write`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionLevel {
    #[default]
    None,
    #[serde(alias = "pull")]
    Read,
    Triage,
    #[serde(alias = "push")]
    Write,
    Maintain,
    Admin,
}

impl PermissionLevel {
    /// Returns the grant this level corresponds to, or `None` for [`PermissionLevel::None`].
    pub fn as_repository_permission(&self) -> Option<RepositoryPermission> {
        match self {
            PermissionLevel::None => None,
            PermissionLevel::Read => Some(RepositoryPermission::Read),
            PermissionLevel::Triage => Some(RepositoryPermission::Triage),
            PermissionLevel::Write => Some(RepositoryPermission::Write),
            PermissionLevel::Maintain => Some(RepositoryPermission::Maintain),
            PermissionLevel::Admin => Some(RepositoryPermission::Admin),
        }
    }

    /// Name accepted by the organization `default_repository_permission` setting.
    ///
    /// Organizations only support `none`, `read`, `write` and `admin` as a base
    /// permission; the other levels return `None`.
    pub fn as_org_default_str(&self) -> Option<&'static str> {
        match self {
            PermissionLevel::None => Some("none"),
            PermissionLevel::Read => Some("read"),
            PermissionLevel::Write => Some("write"),
            PermissionLevel::Admin => Some("admin"),
            PermissionLevel::Triage | PermissionLevel::Maintain => None,
        }
    }

    /// Parses the organization base permission as reported by `GET /orgs/{org}`.
    pub fn from_org_default_str(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "none" => Some(PermissionLevel::None),
            "read" => Some(PermissionLevel::Read),
            "write" => Some(PermissionLevel::Write),
            "admin" => Some(PermissionLevel::Admin),
            _ => None,
        }
    }
}

impl From<RepositoryPermission> for PermissionLevel {
    fn from(value: RepositoryPermission) -> Self {
        match value {
            RepositoryPermission::Read => PermissionLevel::Read,
            RepositoryPermission::Triage => PermissionLevel::Triage,
            RepositoryPermission::Write => PermissionLevel::Write,
            RepositoryPermission::Maintain => PermissionLevel::Maintain,
            RepositoryPermission::Admin => PermissionLevel::Admin,
        }
    }
}

impl From<Option<RepositoryPermission>> for PermissionLevel {
    fn from(value: Option<RepositoryPermission>) -> Self {
        value.map(PermissionLevel::from).unwrap_or_default()
    }
}

impl fmt::Display for PermissionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PermissionLevel::None => "none",
            PermissionLevel::Read => "read",
            PermissionLevel::Triage => "triage",
            PermissionLevel::Write => "write",
            PermissionLevel::Maintain => "maintain",
            PermissionLevel::Admin => "admin",
        };
        f.write_str(name)
    }
}
