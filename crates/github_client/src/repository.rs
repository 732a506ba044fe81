//! [`RepositoryClient`] implementation for [`GitHubClient`].

use async_trait::async_trait;
use tracing::{info, instrument};

use crate::{
    map_octocrab_error, Error, ForkCreatePayload, GitHubClient, Repository, RepositoryClient,
    RepositoryCreatePayload, RepositoryUpdatePayload,
};

#[async_trait]
impl RepositoryClient for GitHubClient {
    /// Fetches details for a specific repository.
    ///
    /// A dry-run client answers with the repositories and forks it pretended to create.
    #[instrument(skip(self), fields(owner = %owner, repo = %repo))]
    async fn get_repository(&self, owner: &str, repo: &str) -> Result<Repository, Error> {
        if let Some(shadowed) = self.dry_run_repository(repo) {
            return Ok(shadowed);
        }

        let path = format!("/repos/{}/{}", owner, repo);
        self.client
            .get(path, None::<&()>)
            .await
            .map_err(|e| map_octocrab_error("Failed to get repository", e))
    }

    #[instrument(skip(self))]
    async fn list_org_repositories(&self, org: &str) -> Result<Vec<Repository>, Error> {
        let path = format!("/orgs/{}/repos", org);
        self.get_all_pages(&path, &[("type", "all")])
            .await
            .map_err(|e| map_octocrab_error("Failed to list organization repositories", e))
    }

    /// Creates a new repository within a specified organization.
    #[instrument(skip(self, payload), fields(repo = %payload.name))]
    async fn create_org_repository(
        &self,
        org: &str,
        payload: &RepositoryCreatePayload,
    ) -> Result<Repository, Error> {
        if self.dry_run {
            info!(org = org, ?payload, "dry run: would create repository");
            let repository = Repository {
                name: payload.name.clone(),
                full_name: format!("{}/{}", org, payload.name),
                description: payload.description.clone(),
                homepage: payload.homepage.clone(),
                private: payload.private.unwrap_or(false),
                ..Default::default()
            };
            self.remember_dry_run_repository(&repository);
            return Ok(repository);
        }

        let path = format!("/orgs/{}/repos", org);
        self.client
            .post(path, Some(payload))
            .await
            .map_err(|e| map_octocrab_error("Failed to create repository for organisation", e))
    }

    #[instrument(skip(self, payload), fields(owner = %owner, repo = %repo))]
    async fn update_repository(
        &self,
        owner: &str,
        repo: &str,
        payload: &RepositoryUpdatePayload,
    ) -> Result<Repository, Error> {
        if self.dry_run {
            info!(owner = owner, repo = repo, ?payload, "dry run: would update repository");
            return Ok(Repository {
                name: payload.name.clone().unwrap_or_else(|| repo.to_string()),
                full_name: format!("{}/{}", owner, repo),
                ..Default::default()
            });
        }

        let path = format!("/repos/{}/{}", owner, repo);
        self.client
            .patch(path, Some(payload))
            .await
            .map_err(|e| map_octocrab_error("Failed to update repository", e))
    }

    #[instrument(skip(self, payload), fields(owner = %owner, repo = %repo))]
    async fn create_fork(
        &self,
        owner: &str,
        repo: &str,
        payload: &ForkCreatePayload,
    ) -> Result<Repository, Error> {
        if self.dry_run {
            info!(
                upstream = %format!("{}/{}", owner, repo),
                ?payload,
                "dry run: would fork repository"
            );
            let name = payload.name.clone().unwrap_or_else(|| repo.to_string());
            let fork = Repository {
                full_name: format!("{}/{}", payload.organization, name),
                name,
                fork: true,
                parent: Some(crate::models::RepositoryParent {
                    name: repo.to_string(),
                    full_name: format!("{}/{}", owner, repo),
                }),
                ..Default::default()
            };
            self.remember_dry_run_repository(&fork);
            return Ok(fork);
        }

        let path = format!("/repos/{}/{}/forks", owner, repo);
        self.client
            .post(path, Some(payload))
            .await
            .map_err(|e| map_octocrab_error("Failed to create fork", e))
    }
}
