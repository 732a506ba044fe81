//! Declared team configuration.
//!
//! Teams form a tree: each team may declare child teams under `teams`, which are
//! created with the parent's ID as their parent. Team names are unique across the
//! whole organization, nested teams and `previously` aliases included.
//!
//! ```yaml
//! teams:
//!   platform:
//!     description: Platform engineering
//!     maintainers: [alice]
//!     members: [bob]
//!     previously: [infra]
//!     repos:
//!       deploy-tools: admin
//!     teams:
//!       sre:
//!         members: [carol]
//! ```

use github_client::TeamPrivacy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::permission::PermissionLevel;

#[cfg(test)]
#[path = "team_config_tests.rs"]
mod tests;

/// Desired state of one team and, recursively, its child teams.
///
/// `description` and `privacy` are tri-state: absent leaves the live value alone.
/// An empty description clears a non-empty live one.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TeamConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub privacy: Option<TeamPrivacy>,

    /// Former names of the team, tried in order when no live team has the current name.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub previously: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub maintainers: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<String>,

    #[serde(
        default,
        rename = "teams",
        alias = "children",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub children: BTreeMap<String, TeamConfig>,

    /// Repository grants for the team, keyed by repository name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub repos: BTreeMap<String, PermissionLevel>,
}

impl TeamConfig {
    /// Visits this team's subtree depth first, parents before children.
    ///
    /// The callback receives the team name, its configuration and the name of the
    /// declared parent (`None` for the top-level team passed in).
    pub fn walk<'a, F>(name: &'a str, config: &'a TeamConfig, visit: &mut F)
    where
        F: FnMut(&'a str, &'a TeamConfig, Option<&'a str>),
    {
        Self::walk_inner(name, config, None, visit);
    }

    fn walk_inner<'a, F>(
        name: &'a str,
        config: &'a TeamConfig,
        parent: Option<&'a str>,
        visit: &mut F,
    ) where
        F: FnMut(&'a str, &'a TeamConfig, Option<&'a str>),
    {
        visit(name, config, parent);
        for (child_name, child) in &config.children {
            Self::walk_inner(child_name, child, Some(name), visit);
        }
    }

    /// Returns `true` when the team has declared child teams.
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
}

/// Flattens a team forest into `(name, config, parent name)` triples, parents first.
pub fn flatten_teams(teams: &BTreeMap<String, TeamConfig>) -> Vec<(&str, &TeamConfig, Option<&str>)> {
    let mut flat = Vec::new();
    for (name, config) in teams {
        TeamConfig::walk(name, config, &mut |n, c, p| flat.push((n, c, p)));
    }
    flat
}
