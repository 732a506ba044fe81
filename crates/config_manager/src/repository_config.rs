//! Declared repository configuration.
//!
//! Every metadata field is optional: an absent field leaves the live value untouched.
//! `on_create` options are only used when the repository does not exist yet, and
//! `fork_from` turns the entry into a fork of an upstream repository.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::errors::ConfigurationError;
use crate::permission::PermissionLevel;

#[cfg(test)]
#[path = "repository_config_tests.rs"]
mod tests;

/// Options applied only when the repository is created.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RepoCreateOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_init: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gitignore_template: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_template: Option<String>,
}

/// Desired state of one repository.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RepoConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_issues: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_projects: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_wiki: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_squash_merge: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_merge_commit: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_rebase_merge: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub squash_merge_commit_title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub squash_merge_commit_message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_branch: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archived: Option<bool>,

    /// Former names of the repository, matched case-insensitively.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub previously: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_create: Option<RepoCreateOptions>,

    /// Upstream to fork from, as `owner/repo`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fork_from: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_branch_only: Option<bool>,

    /// Direct collaborators keyed by login. `None` leaves collaborators unmanaged.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collaborators: Option<BTreeMap<String, PermissionLevel>>,
}

impl RepoConfig {
    /// Parses `fork_from`, if set.
    pub fn fork_source(&self) -> Option<Result<ForkSource, ConfigurationError>> {
        self.fork_from.as_deref().map(str::parse)
    }

    /// All names this repository may currently carry on GitHub, current name first.
    pub fn names<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        std::iter::once(name).chain(self.previously.iter().map(String::as_str))
    }
}

/// Upstream repository of a fork.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ForkSource {
    pub owner: String,
    pub repo: String,
}

impl ForkSource {
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

impl fmt::Display for ForkSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

impl FromStr for ForkSource {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(owner), Some(repo), None) if !owner.is_empty() && !repo.is_empty() => {
                Ok(ForkSource {
                    owner: owner.to_string(),
                    repo: repo.to_string(),
                })
            }
            _ => Err(ConfigurationError::InvalidForkSource {
                value: s.to_string(),
            }),
        }
    }
}
