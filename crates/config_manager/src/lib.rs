//! Declarative configuration for org_warden.
//!
//! The configuration document describes the desired state of one or more GitHub
//! organizations: admins and members, the team tree, repositories and their direct
//! collaborators. It is loaded once per run and never mutated.
//!
//! ```yaml
//! orgs:
//!   acme:
//!     description: Acme Corp
//!     admins: [alice, bob]
//!     members: [carol]
//!     teams:
//!       platform:
//!         maintainers: [alice]
//!         members: [carol]
//!     repos:
//!       website:
//!         private: false
//!         collaborators:
//!           outside-designer: write
//! ```

pub mod errors;
pub mod loader;
pub mod organization;
pub mod permission;
pub mod repository_config;
pub mod team_config;

pub use errors::{ConfigurationError, ConfigurationResult};
pub use github_client::TeamPrivacy;
pub use loader::{load_config, parse_config, ConfigFormat};
pub use organization::{FullConfig, OrgConfig, OrgMetadata};
pub use permission::PermissionLevel;
pub use repository_config::{ForkSource, RepoConfig, RepoCreateOptions};
pub use team_config::{flatten_teams, TeamConfig};
