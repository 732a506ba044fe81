//! Fork creation.
//!
//! GitHub creates forks asynchronously and may give the fork a different name than the
//! one requested. The phase therefore recognizes existing forks by their upstream, not
//! by their name, and reports which live name each declared repository ended up with.

use config_manager::{ForkSource, RepoConfig};
use github_client::{ForkCreatePayload, Repository, RepositoryClient};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, error, info, instrument, warn};

use crate::errors::{ReconcileError, ReconcileResult};
use crate::identity::normalize;
use crate::options::ForkPollSettings;

#[cfg(test)]
#[path = "forks_tests.rs"]
mod tests;

/// Declared repository name to the name GitHub actually gave its fork.
pub type ForkNames = BTreeMap<String, String>;

/// Maps each upstream (lowercased `owner/repo`) to the live fork of it in `org`.
async fn existing_forks<C>(
    client: &C,
    org: &str,
    repos: &[Repository],
) -> HashMap<String, String>
where
    C: RepositoryClient + ?Sized,
{
    let mut upstreams = HashMap::new();
    for repo in repos.iter().filter(|r| r.fork) {
        let parent = match repo.parent_full_name() {
            Some(parent) => Some(parent.to_string()),
            // Repository listings omit the parent; only the single repo carries it.
            None => match client.get_repository(org, &repo.name).await {
                Ok(full) => full.parent_full_name().map(str::to_string),
                Err(e) => {
                    warn!(org = org, repo = %repo.name, error = %e, "Could not look up fork parent");
                    None
                }
            },
        };
        if let Some(parent) = parent {
            debug!(org = org, repo = %repo.name, upstream = %parent, "Found existing fork");
            upstreams.insert(normalize(&parent), repo.name.clone());
        }
    }
    upstreams
}

/// Polls until `repo` can be read, within `settings.timeout`.
pub async fn wait_for_fork<C>(
    client: &C,
    org: &str,
    repo: &str,
    settings: &ForkPollSettings,
) -> ReconcileResult<Repository>
where
    C: RepositoryClient + ?Sized,
{
    let poll = async {
        loop {
            match client.get_repository(org, repo).await {
                Ok(found) => return found,
                Err(e) => {
                    debug!(org = org, repo = repo, error = %e, "Fork not available yet");
                    tokio::time::sleep(settings.interval).await;
                }
            }
        }
    };
    tokio::time::timeout(settings.timeout, poll)
        .await
        .map_err(|_| ReconcileError::ForkTimeout {
            repo: format!("{}/{}", org, repo),
            waited: settings.timeout,
        })
}

/// Result of the fork phase: the forks that resolved and the per-repo failures.
///
/// Failures do not invalidate `names`, so later phases can still use them.
#[derive(Debug, Default)]
pub struct ForkOutcome {
    pub names: ForkNames,
    pub errors: Vec<ReconcileError>,
}

impl ForkOutcome {
    /// Collapses the outcome into the resolved names, or the collected failures.
    pub fn into_result(self) -> ReconcileResult<ForkNames> {
        ReconcileError::from_errors(self.errors)?;
        Ok(self.names)
    }
}

/// Creates the declared forks that do not exist yet.
///
/// Returns the live name of every declared fork, existing or created. Each repository
/// is handled independently and its failure is recorded in the outcome. Only a failure
/// to list the organization's repositories is returned as an error.
#[instrument(skip(client, repos, settings))]
pub async fn configure_forks<C>(
    client: &C,
    org: &str,
    repos: &BTreeMap<String, RepoConfig>,
    settings: &ForkPollSettings,
) -> ReconcileResult<ForkOutcome>
where
    C: RepositoryClient + ?Sized,
{
    let declared: Vec<(&String, &RepoConfig)> =
        repos.iter().filter(|(_, r)| r.fork_from.is_some()).collect();
    let mut names = ForkNames::new();
    if declared.is_empty() {
        return Ok(ForkOutcome::default());
    }

    let live = client
        .list_org_repositories(org)
        .await
        .map_err(|e| ReconcileError::github(format!("list repos of org {}", org), e))?;
    let mut upstreams = existing_forks(client, org, &live).await;

    let mut errors = Vec::new();
    for (name, repo) in declared {
        let source: ForkSource = match repo.fork_source() {
            Some(Ok(source)) => source,
            Some(Err(e)) => {
                errors.push(ReconcileError::Configuration(format!("repo {}: {}", name, e)));
                continue;
            }
            None => continue,
        };
        let upstream = source.full_name();

        if let Some(existing) = upstreams.get(&normalize(&upstream)) {
            if existing != name {
                info!(org = org, repo = %name, live = %existing, upstream = %upstream, "Upstream already forked under another name");
            } else {
                debug!(org = org, repo = %name, upstream = %upstream, "Fork already exists");
            }
            names.insert(name.clone(), existing.clone());
            continue;
        }

        if let Some(clash) = live.iter().find(|r| normalize(&r.name) == normalize(name)) {
            error!(org = org, repo = %name, upstream = %upstream, "Repository exists but is not a fork of the upstream");
            errors.push(ReconcileError::Conflict(format!(
                "repo {}/{} exists but is not a fork of {}",
                org, clash.name, upstream
            )));
            continue;
        }

        match create_fork(client, org, name, repo, &source, settings).await {
            Ok(actual) => {
                upstreams.insert(normalize(&upstream), actual.clone());
                names.insert(name.clone(), actual);
            }
            Err(e) => {
                error!(org = org, repo = %name, error = %e, "Failed to create fork");
                errors.push(e);
            }
        }
    }

    Ok(ForkOutcome { names, errors })
}

async fn create_fork<C>(
    client: &C,
    org: &str,
    name: &str,
    repo: &RepoConfig,
    source: &ForkSource,
    settings: &ForkPollSettings,
) -> ReconcileResult<String>
where
    C: RepositoryClient + ?Sized,
{
    let payload = ForkCreatePayload {
        organization: org.to_string(),
        name: Some(name.to_string()),
        default_branch_only: repo.default_branch_only,
    };
    info!(org = org, repo = name, upstream = %source, "Creating fork");
    let created = client
        .create_fork(&source.owner, &source.repo, &payload)
        .await
        .map_err(|e| ReconcileError::github(format!("fork {} into {}", source, org), e))?;

    let ready = wait_for_fork(client, org, &created.name, settings).await?;
    if ready.name != name {
        warn!(org = org, requested = name, actual = %ready.name, "GitHub created the fork under another name");
    }
    Ok(ready.name)
}
