//! Organization-level configuration and the top-level document.
//!
//! The document lists organizations under `orgs`. Their order in the file is the order
//! in which they are reconciled, so [`FullConfig`] keeps them in a vector rather than
//! a map.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

use crate::permission::PermissionLevel;
use crate::repository_config::RepoConfig;
use crate::team_config::TeamConfig;

#[cfg(test)]
#[path = "organization_tests.rs"]
mod tests;

/// Organization settings managed by the metadata phase.
///
/// Each field is left untouched when absent.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct OrgMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billing_email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_organization_projects: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_repository_projects: Option<bool>,

    /// Base permission of org members; only `none`, `read`, `write` and `admin` are valid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_repository_permission: Option<PermissionLevel>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub members_can_create_repositories: Option<bool>,
}

/// Desired state of one organization.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct OrgConfig {
    #[serde(flatten)]
    pub metadata: OrgMetadata,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub admins: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub teams: BTreeMap<String, TeamConfig>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub repos: BTreeMap<String, RepoConfig>,
}

/// The whole configuration document.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct FullConfig {
    /// Organizations in declaration order.
    #[serde(
        default,
        deserialize_with = "deserialize_ordered",
        serialize_with = "serialize_ordered"
    )]
    pub orgs: Vec<(String, OrgConfig)>,
}

impl FullConfig {
    /// Wraps a single organization, as printed by `dump --full`.
    pub fn single(org: impl Into<String>, config: OrgConfig) -> Self {
        FullConfig {
            orgs: vec![(org.into(), config)],
        }
    }

    pub fn org(&self, name: &str) -> Option<&OrgConfig> {
        self.orgs
            .iter()
            .find(|(org, _)| org == name)
            .map(|(_, config)| config)
    }
}

fn deserialize_ordered<'de, D>(deserializer: D) -> Result<Vec<(String, OrgConfig)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct OrderedVisitor;

    impl<'de> Visitor<'de> for OrderedVisitor {
        type Value = Vec<(String, OrgConfig)>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a map of organization names to organization configs")
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut orgs: Vec<(String, OrgConfig)> = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((name, config)) = map.next_entry::<String, OrgConfig>()? {
                if orgs.iter().any(|(existing, _)| *existing == name) {
                    return Err(serde::de::Error::custom(format!(
                        "organization '{}' is declared more than once",
                        name
                    )));
                }
                orgs.push((name, config));
            }
            Ok(orgs)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Vec::new())
        }
    }

    deserializer.deserialize_map(OrderedVisitor)
}

fn serialize_ordered<S>(orgs: &[(String, OrgConfig)], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let mut map = serializer.serialize_map(Some(orgs.len()))?;
    for (name, config) in orgs {
        map.serialize_entry(name, config)?;
    }
    map.end()
}
