//! Repository phase: creation, renames and metadata updates.

use config_manager::RepoConfig;
use github_client::{Repository, RepositoryClient, RepositoryCreatePayload, RepositoryUpdatePayload};
use std::collections::BTreeMap;
use tracing::{debug, error, info, instrument, warn};

use crate::errors::{ReconcileError, ReconcileResult};
use crate::forks::ForkNames;
use crate::identity::{apply_if_set, normalize};
use crate::options::ReconcileOptions;

#[cfg(test)]
#[path = "repos_tests.rs"]
mod tests;

/// Finds the single live repository carrying one of `names`.
///
/// Two different live repositories matching two different names is a conflict.
pub fn find_live_repo<'a, 'n>(
    live: &'a [Repository],
    names: impl IntoIterator<Item = &'n str>,
) -> ReconcileResult<Option<&'a Repository>> {
    let mut found: Option<&Repository> = None;
    for name in names {
        let Some(repo) = live.iter().find(|r| normalize(&r.name) == normalize(name)) else {
            continue;
        };
        match found {
            Some(previous) if normalize(&previous.name) != normalize(&repo.name) => {
                return Err(ReconcileError::Conflict(format!(
                    "repos {} and {} both match the declared names",
                    previous.name, repo.name
                )));
            }
            _ => found = Some(repo),
        }
    }
    Ok(found)
}

/// Builds the update for `live` so it matches `want`; empty when nothing differs.
///
/// `name` is the name the repository should carry; `None` leaves the live name alone.
pub fn repo_patch(name: Option<&str>, want: &RepoConfig, live: &Repository) -> RepositoryUpdatePayload {
    // GitHub reports cleared text fields as null.
    let live_description = live.description.clone().unwrap_or_default();
    let live_homepage = live.homepage.clone().unwrap_or_default();

    RepositoryUpdatePayload {
        name: name.filter(|n| *n != live.name).map(str::to_string),
        description: apply_if_set(Some(&live_description), want.description.as_ref()),
        homepage: apply_if_set(Some(&live_homepage), want.homepage.as_ref()),
        private: apply_if_set(Some(&live.private), want.private.as_ref()),
        has_issues: apply_if_set(Some(&live.has_issues), want.has_issues.as_ref()),
        has_projects: apply_if_set(Some(&live.has_projects), want.has_projects.as_ref()),
        has_wiki: apply_if_set(Some(&live.has_wiki), want.has_wiki.as_ref()),
        allow_squash_merge: apply_if_set(
            live.allow_squash_merge.as_ref(),
            want.allow_squash_merge.as_ref(),
        ),
        allow_merge_commit: apply_if_set(
            live.allow_merge_commit.as_ref(),
            want.allow_merge_commit.as_ref(),
        ),
        allow_rebase_merge: apply_if_set(
            live.allow_rebase_merge.as_ref(),
            want.allow_rebase_merge.as_ref(),
        ),
        squash_merge_commit_title: apply_if_set(
            live.squash_merge_commit_title.as_ref(),
            want.squash_merge_commit_title.as_ref(),
        ),
        squash_merge_commit_message: apply_if_set(
            live.squash_merge_commit_message.as_ref(),
            want.squash_merge_commit_message.as_ref(),
        ),
        default_branch: apply_if_set(live.default_branch.as_ref(), want.default_branch.as_ref()),
        archived: apply_if_set(Some(&live.archived), want.archived.as_ref()),
    }
}

/// Strips the changes the run is not allowed to make and reports each of them.
pub fn sanitize_patch(
    repo: &str,
    patch: &mut RepositoryUpdatePayload,
    options: &ReconcileOptions,
) -> Vec<ReconcileError> {
    let mut rejected = Vec::new();
    match patch.archived {
        Some(false) => {
            patch.archived = None;
            rejected.push(ReconcileError::rejected(
                repo,
                "asked to unarchive an archived repo, unsupported by GH API",
            ));
        }
        Some(true) if !options.allow_repo_archival => {
            patch.archived = None;
            rejected.push(ReconcileError::rejected(
                repo,
                "archiving requires --allow-repo-archival",
            ));
        }
        _ => {}
    }
    if patch.private == Some(false) && !options.allow_repo_publish {
        patch.private = None;
        rejected.push(ReconcileError::rejected(
            repo,
            "making a private repo public requires --allow-repo-publish",
        ));
    }
    rejected
}

fn create_payload(name: &str, want: &RepoConfig) -> RepositoryCreatePayload {
    let on_create = want.on_create.clone().unwrap_or_default();
    RepositoryCreatePayload {
        name: name.to_string(),
        description: want.description.clone(),
        homepage: want.homepage.clone(),
        private: want.private,
        has_issues: want.has_issues,
        has_projects: want.has_projects,
        has_wiki: want.has_wiki,
        allow_squash_merge: want.allow_squash_merge,
        allow_merge_commit: want.allow_merge_commit,
        allow_rebase_merge: want.allow_rebase_merge,
        squash_merge_commit_title: want.squash_merge_commit_title.clone(),
        squash_merge_commit_message: want.squash_merge_commit_message.clone(),
        auto_init: on_create.auto_init,
        gitignore_template: on_create.gitignore_template,
        license_template: on_create.license_template,
    }
}

/// Reconciles every declared repository.
///
/// `fork_names` maps declared forks to the name GitHub gave them; those repositories
/// are looked up under that name and never renamed.
#[instrument(skip(client, repos, fork_names, options))]
pub async fn configure_repos<C>(
    client: &C,
    org: &str,
    repos: &BTreeMap<String, RepoConfig>,
    fork_names: &ForkNames,
    options: &ReconcileOptions,
) -> ReconcileResult<()>
where
    C: RepositoryClient + ?Sized,
{
    let live = client
        .list_org_repositories(org)
        .await
        .map_err(|e| ReconcileError::github(format!("list repos of org {}", org), e))?;

    let mut errors = Vec::new();
    for (name, want) in repos {
        errors.extend(configure_repo(client, org, name, want, &live, fork_names, options).await);
    }
    ReconcileError::from_errors(errors)
}

async fn configure_repo<C>(
    client: &C,
    org: &str,
    name: &str,
    want: &RepoConfig,
    live: &[Repository],
    fork_names: &ForkNames,
    options: &ReconcileOptions,
) -> Vec<ReconcileError>
where
    C: RepositoryClient + ?Sized,
{
    let fork_name = fork_names.get(name).map(String::as_str);
    let found = match fork_name {
        Some(actual) => find_live_repo(live, [actual]),
        None => find_live_repo(live, want.names(name)),
    };
    let found = match found {
        Ok(found) => found,
        Err(e) => return vec![e.context(format!("repo {}", name))],
    };

    let Some(current) = found else {
        if want.fork_from.is_some() {
            debug!(org = org, repo = name, "Fork not created yet, skipping");
            return Vec::new();
        }
        if want.archived == Some(true) {
            return vec![ReconcileError::rejected(
                name,
                "nonexistent repo configured as archived",
            )];
        }
        info!(org = org, repo = name, "Creating repository");
        return match client.create_org_repository(org, &create_payload(name, want)).await {
            Ok(_) => Vec::new(),
            Err(e) => {
                error!(org = org, repo = name, error = %e, "Failed to create repository");
                vec![ReconcileError::github(format!("create repo {}/{}", org, name), e)]
            }
        };
    };

    if current.archived && want.archived == Some(true) {
        debug!(org = org, repo = %current.name, "Repository is archived as declared, skipping");
        return Vec::new();
    }

    let rename_to = if fork_name.is_some() { None } else { Some(name) };
    let mut patch = repo_patch(rename_to, want, current);
    let mut errors = sanitize_patch(name, &mut patch, options);
    for rejected in &errors {
        warn!(org = org, repo = name, reason = %rejected, "Rejected repository change");
    }

    if patch.is_empty() {
        debug!(org = org, repo = %current.name, "Repository already up to date");
        return errors;
    }

    if current.archived {
        warn!(org = org, repo = %current.name, "Updating an archived repository, GitHub may refuse");
    }
    if let Some(new_name) = &patch.name {
        info!(org = org, repo = %current.name, new_name = %new_name, "Renaming repository");
    }
    info!(org = org, repo = %current.name, ?patch, "Updating repository");
    if let Err(e) = client.update_repository(org, &current.name, &patch).await {
        error!(org = org, repo = %current.name, error = %e, "Failed to update repository");
        errors.push(ReconcileError::github(
            format!("update repo {}/{}", org, current.name),
            e,
        ));
    }
    errors
}
