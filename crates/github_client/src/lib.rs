//! Crate for interacting with the GitHub REST and GraphQL APIs.
//!
//! The reconciliation engine never talks to the full API surface. Instead every phase
//! depends on one narrowly scoped trait:
//!
//! - [`OrganizationClient`] for org metadata, members and invitations
//! - [`TeamClient`] for teams, team members and team invitations
//! - [`TeamRepositoryClient`] for team repository grants
//! - [`RepositoryClient`] for repositories and forks
//! - [`CollaboratorClient`] for direct collaborators and repository invitations
//!
//! [`GitHubClient`] implements all of them on top of `octocrab`. Built with
//! [`GitHubClient::with_dry_run`] it performs every read but only logs mutations,
//! answering them with synthesized responses.

use async_trait::async_trait;
use jsonwebtoken::EncodingKey;
use octocrab::{Octocrab, Result as OctocrabResult};
use secrecy::ExposeSecret;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use tracing::{debug, error, info, instrument};

pub mod errors;
pub use errors::Error;

pub mod models;
pub use models::{
    Collaborator, Invitation, Membership, MembershipState, OrgRole, Organization, Repository,
    RepositoryInvitation, RepositoryPermission, Team, TeamPrivacy, TeamRepository, TeamRole, User,
};

pub mod payloads;
pub use payloads::{
    ForkCreatePayload, OrganizationUpdatePayload, RepositoryCreatePayload,
    RepositoryUpdatePayload, TeamCreatePayload, TeamUpdatePayload,
};

mod collaborator;
mod organization;
mod repository;
mod team;

// Reference the tests module in the separate file
#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;

/// Number of items requested per page on list endpoints.
const PAGE_SIZE: usize = 100;

/// A client for interacting with the GitHub API.
///
/// The client is authenticated through the supplied `Octocrab` instance, either with a
/// personal access token ([`create_token_client`]) or as a GitHub App installation
/// ([`create_app_client`] followed by [`GitHubClient::get_installation_token_for_org`]).
#[derive(Debug)]
pub struct GitHubClient {
    client: Octocrab,
    dry_run: bool,
    shadow: Mutex<DryRunShadow>,
}

/// Resources "created" by a dry-run client, so later reads observe them.
#[derive(Debug, Default)]
struct DryRunShadow {
    team_slugs: HashSet<String>,
    repositories: HashMap<String, Repository>,
}

impl GitHubClient {
    /// Creates a new `GitHubClient` that applies mutations.
    pub fn new(client: Octocrab) -> Self {
        Self {
            client,
            dry_run: false,
            shadow: Mutex::new(DryRunShadow::default()),
        }
    }

    /// Switches the client to dry-run mode when `dry_run` is `true`.
    ///
    /// A dry-run client performs all reads, logs every mutation it would have issued and
    /// returns a synthesized response instead.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Gets an installation access token for a specific organization.
    ///
    /// This method finds the installation for the given organization and returns
    /// an access token that can be used for API calls on behalf of that installation.
    ///
    /// # Errors
    ///
    /// Returns an `Error::AuthError` if:
    /// - The API call fails
    /// - No installation is found for the organization
    /// - The token cannot be retrieved
    #[instrument(skip(self), fields(org_name = %org_name))]
    pub async fn get_installation_token_for_org(&self, org_name: &str) -> Result<String, Error> {
        let installations = self.list_installations().await?;

        debug!(
            org_name = org_name,
            installation_count = installations.len(),
            "Retrieved installations, searching for organization"
        );

        let installation = installations
            .into_iter()
            .find(|inst| inst.account.login.eq_ignore_ascii_case(org_name))
            .ok_or_else(|| {
                error!(
                    org_name = org_name,
                    "No installation found for organization - this means the GitHub App is not installed on this organization"
                );
                Error::AuthError(format!("the GitHub App is not installed on {org_name}"))
            })?;

        let (_, token) = self
            .client
            .installation_and_token(installation.id.into())
            .await
            .map_err(|e| {
                log_octocrab_error("Failed to get installation token", &e);
                Error::AuthError(format!(
                    "failed to create an installation token for {org_name}"
                ))
            })?;

        info!(
            org_name = org_name,
            installation_id = installation.id,
            "Successfully retrieved installation token"
        );
        Ok(token.expose_secret().to_string())
    }

    /// Lists all installations for the authenticated GitHub App.
    ///
    /// # Errors
    ///
    /// Returns an error if the API call fails or the response cannot be parsed.
    #[instrument(skip(self))]
    pub async fn list_installations(&self) -> Result<Vec<models::Installation>, Error> {
        let result: OctocrabResult<Vec<octocrab::models::Installation>> =
            self.client.get("/app/installations", None::<&()>).await;

        match result {
            Ok(installations) => Ok(installations
                .into_iter()
                .map(models::Installation::from)
                .collect()),
            Err(e) => {
                error!(
                    "Failed to list installations - this likely means JWT authentication failed"
                );
                Err(map_octocrab_error("Failed to list installations", e))
            }
        }
    }

    /// Fetches every page of a REST list endpoint.
    async fn get_all_pages<T>(
        &self,
        path: &str,
        extra_parameters: &[(&str, &str)],
    ) -> OctocrabResult<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let mut items = Vec::new();
        let mut page = 1usize;
        loop {
            let mut parameters: Vec<(&str, String)> = extra_parameters
                .iter()
                .map(|(k, v)| (*k, v.to_string()))
                .collect();
            parameters.push(("per_page", PAGE_SIZE.to_string()));
            parameters.push(("page", page.to_string()));

            let batch: Vec<T> = self.client.get(path, Some(&parameters)).await?;
            let count = batch.len();
            items.extend(batch);
            if count < PAGE_SIZE {
                break;
            }
            page += 1;
        }

        Ok(items)
    }

    /// Issues a `PUT` whose response body is irrelevant (often `204 No Content`).
    async fn put_no_content<B>(&self, path: &str, body: &B) -> OctocrabResult<()>
    where
        B: Serialize + ?Sized,
    {
        let response = self.client._put(path, Some(body)).await?;
        octocrab::map_github_error(response).await?;
        Ok(())
    }

    /// Issues a `DELETE` and discards the (empty) response body.
    async fn delete_no_content(&self, path: &str) -> OctocrabResult<()> {
        let response = self.client._delete(path, None::<&()>).await?;
        octocrab::map_github_error(response).await?;
        Ok(())
    }

    fn remember_dry_run_team(&self, slug: &str) {
        if let Ok(mut shadow) = self.shadow.lock() {
            shadow.team_slugs.insert(slug.to_ascii_lowercase());
        }
    }

    fn is_dry_run_team(&self, slug: &str) -> bool {
        self.dry_run
            && self
                .shadow
                .lock()
                .map(|shadow| shadow.team_slugs.contains(&slug.to_ascii_lowercase()))
                .unwrap_or(false)
    }

    fn remember_dry_run_repository(&self, repository: &Repository) {
        if let Ok(mut shadow) = self.shadow.lock() {
            shadow
                .repositories
                .insert(repository.name.to_ascii_lowercase(), repository.clone());
        }
    }

    fn dry_run_repository(&self, name: &str) -> Option<Repository> {
        if !self.dry_run {
            return None;
        }
        self.shadow
            .lock()
            .ok()
            .and_then(|shadow| shadow.repositories.get(&name.to_ascii_lowercase()).cloned())
    }
}

/// Organization metadata, membership and invitation operations.
#[async_trait]
pub trait OrganizationClient: Send + Sync {
    /// Fetches the organization metadata.
    async fn get_organization(&self, org: &str) -> Result<Organization, Error>;

    /// Applies a metadata patch to the organization.
    async fn edit_organization(
        &self,
        org: &str,
        payload: &OrganizationUpdatePayload,
    ) -> Result<Organization, Error>;

    /// Lists the organization members holding `role`.
    async fn list_organization_members(
        &self,
        org: &str,
        role: OrgRole,
    ) -> Result<Vec<User>, Error>;

    /// Adds `user` to the organization with `role`, or changes their role.
    ///
    /// For users that are not yet members GitHub sends an invitation and answers with a
    /// `pending` membership.
    async fn update_organization_membership(
        &self,
        org: &str,
        user: &str,
        role: OrgRole,
    ) -> Result<Membership, Error>;

    /// Removes `user` from the organization, cancelling a pending invitation if any.
    async fn remove_organization_membership(&self, org: &str, user: &str) -> Result<(), Error>;

    /// Lists pending organization invitations.
    async fn list_organization_invitations(&self, org: &str) -> Result<Vec<Invitation>, Error>;

    /// Returns the user the client is authenticated as.
    async fn authenticated_user(&self) -> Result<User, Error>;
}

/// Team and team membership operations. Teams are addressed by slug.
#[async_trait]
pub trait TeamClient: Send + Sync {
    async fn list_teams(&self, org: &str) -> Result<Vec<Team>, Error>;

    async fn create_team(&self, org: &str, payload: &TeamCreatePayload) -> Result<Team, Error>;

    async fn edit_team(
        &self,
        org: &str,
        team_slug: &str,
        payload: &TeamUpdatePayload,
    ) -> Result<Team, Error>;

    async fn delete_team(&self, org: &str, team_slug: &str) -> Result<(), Error>;

    async fn list_team_members(
        &self,
        org: &str,
        team_slug: &str,
        role: TeamRole,
    ) -> Result<Vec<User>, Error>;

    async fn update_team_membership(
        &self,
        org: &str,
        team_slug: &str,
        user: &str,
        role: TeamRole,
    ) -> Result<Membership, Error>;

    async fn remove_team_membership(
        &self,
        org: &str,
        team_slug: &str,
        user: &str,
    ) -> Result<(), Error>;

    async fn list_team_invitations(
        &self,
        org: &str,
        team_slug: &str,
    ) -> Result<Vec<Invitation>, Error>;
}

/// Team repository permission grants.
#[async_trait]
pub trait TeamRepositoryClient: Send + Sync {
    async fn list_team_repositories(
        &self,
        org: &str,
        team_slug: &str,
    ) -> Result<Vec<TeamRepository>, Error>;

    /// Grants `permission` on `repo` to the team, replacing any previous grant.
    async fn update_team_repository(
        &self,
        org: &str,
        team_slug: &str,
        repo: &str,
        permission: RepositoryPermission,
    ) -> Result<(), Error>;

    /// Removes the team's grant on `repo` entirely.
    async fn remove_team_repository(
        &self,
        org: &str,
        team_slug: &str,
        repo: &str,
    ) -> Result<(), Error>;
}

/// Repository and fork operations.
#[async_trait]
pub trait RepositoryClient: Send + Sync {
    /// Fetches a single repository, including the `parent` of forks.
    async fn get_repository(&self, owner: &str, repo: &str) -> Result<Repository, Error>;

    /// Lists every repository of the organization.
    async fn list_org_repositories(&self, org: &str) -> Result<Vec<Repository>, Error>;

    async fn create_org_repository(
        &self,
        org: &str,
        payload: &RepositoryCreatePayload,
    ) -> Result<Repository, Error>;

    /// Updates settings for a specific repository.
    ///
    /// Only the fields provided in `payload` are changed.
    async fn update_repository(
        &self,
        owner: &str,
        repo: &str,
        payload: &RepositoryUpdatePayload,
    ) -> Result<Repository, Error>;

    /// Requests a fork of `owner/repo`.
    ///
    /// GitHub answers `202 Accepted` and creates the fork asynchronously; the returned
    /// repository name is the one GitHub picked, which may differ from the request.
    async fn create_fork(
        &self,
        owner: &str,
        repo: &str,
        payload: &ForkCreatePayload,
    ) -> Result<Repository, Error>;
}

/// Direct collaborator and repository invitation operations.
#[async_trait]
pub trait CollaboratorClient: Send + Sync {
    /// Lists collaborators explicitly granted access to the repository.
    ///
    /// Access inherited from organization membership or team grants is excluded.
    async fn list_direct_collaborators(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<Vec<Collaborator>, Error>;

    /// Adds a collaborator or changes an existing collaborator's permission.
    async fn add_collaborator(
        &self,
        owner: &str,
        repo: &str,
        user: &str,
        permission: RepositoryPermission,
    ) -> Result<(), Error>;

    async fn remove_collaborator(&self, owner: &str, repo: &str, user: &str)
        -> Result<(), Error>;

    async fn list_repository_invitations(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<Vec<RepositoryInvitation>, Error>;

    async fn update_repository_invitation(
        &self,
        owner: &str,
        repo: &str,
        invitation_id: u64,
        permission: RepositoryPermission,
    ) -> Result<(), Error>;

    async fn delete_repository_invitation(
        &self,
        owner: &str,
        repo: &str,
        invitation_id: u64,
    ) -> Result<(), Error>;
}

/// Creates an `Octocrab` client authenticated as a GitHub App using a JWT token.
///
/// The resulting client can list installations; use
/// [`GitHubClient::get_installation_token_for_org`] and [`create_token_client`] to obtain
/// a client acting on behalf of one organization.
///
/// # Errors
///
/// This function returns an `Error::AuthError` in the following cases:
/// - If the private key cannot be parsed.
/// - If the `Octocrab` client cannot be built.
#[instrument(skip(private_key))]
pub async fn create_app_client(app_id: u64, private_key: &str) -> Result<Octocrab, Error> {
    let key = EncodingKey::from_rsa_pem(private_key.as_bytes()).map_err(|e| {
        error!(
            app_id = app_id,
            error = %e,
            "Failed to parse RSA private key - key format is invalid"
        );
        Error::AuthError(format!(
            "Failed to translate the private key. Error was: {}",
            e
        ))
    })?;

    let octocrab = Octocrab::builder()
        .app(app_id.into(), key)
        .build()
        .map_err(|e| {
            error!(
                app_id = app_id,
                error = ?e,
                "Failed to build Octocrab client with GitHub App credentials"
            );
            Error::AuthError("Failed to build the GitHub App client.".to_string())
        })?;

    info!(app_id = app_id, "Successfully created GitHub App client");

    Ok(octocrab)
}

/// Creates an `Octocrab` client authenticated with a personal or installation token.
///
/// `base_uri` points the client at a GitHub Enterprise API endpoint when given.
#[instrument(skip(token))]
pub fn create_token_client(token: &str, base_uri: Option<&str>) -> Result<Octocrab, Error> {
    let mut builder = Octocrab::builder().personal_token(token.to_string());
    if let Some(uri) = base_uri {
        builder = builder
            .base_uri(uri)
            .map_err(|e| Error::AuthError(format!("invalid GitHub endpoint {uri}: {e}")))?;
    }

    builder
        .build()
        .map_err(|e| Error::AuthError(format!("failed to build the GitHub client: {e}")))
}

/// Logs an octocrab error and converts it into the crate error.
///
/// HTTP 404 becomes [`Error::NotFound`]; rate-limit rejections become
/// [`Error::RateLimitExceeded`]; everything else keeps GitHub's message.
fn map_octocrab_error(message: &str, e: octocrab::Error) -> Error {
    log_octocrab_error(message, &e);
    match e {
        octocrab::Error::GitHub { source, .. } => {
            let status = source.status_code.as_u16();
            if status == 404 {
                Error::NotFound
            } else if status == 429
                || (status == 403 && source.message.to_ascii_lowercase().contains("rate limit"))
            {
                Error::RateLimitExceeded
            } else {
                Error::ApiError(format!("{}: {} ({})", message, source.message, status))
            }
        }
        octocrab::Error::Serde { source, .. } => Error::Deserialization(source),
        other => Error::ApiError(format!("{}: {}", message, other)),
    }
}

fn log_octocrab_error(message: &str, e: &octocrab::Error) {
    match e {
        octocrab::Error::GitHub { source, .. } => {
            if source.status_code.as_u16() == 404 {
                debug!(
                    error_message = source.message,
                    "{}. Resource not found on GitHub", message
                )
            } else {
                error!(
                    error_message = source.message,
                    status = source.status_code.as_u16(),
                    "{}. Received an error from GitHub",
                    message
                )
            }
        }
        octocrab::Error::UriParse { source, .. } => error!(
            error_message = source.to_string(),
            "{}. Failed to parse URI.", message
        ),
        octocrab::Error::Uri { source, .. } => error!(
            error_message = source.to_string(),
            "{}, Failed to parse URI.", message
        ),
        octocrab::Error::InvalidHeaderValue { source, .. } => error!(
            error_message = source.to_string(),
            "{}. One of the header values was invalid.", message
        ),
        octocrab::Error::InvalidUtf8 { source, .. } => error!(
            error_message = source.to_string(),
            "{}. The message wasn't valid UTF-8.", message,
        ),
        _ => error!(error_message = e.to_string(), message),
    };
}
