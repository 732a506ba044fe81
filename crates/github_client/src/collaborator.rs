//! [`CollaboratorClient`] implementation for [`GitHubClient`].
//!
//! The REST collaborators listing mixes direct grants with access inherited from
//! organization membership, so direct collaborators are read through GraphQL with
//! `affiliation: DIRECT`.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{info, instrument, warn};

use crate::{
    map_octocrab_error, Collaborator, CollaboratorClient, Error, GitHubClient,
    RepositoryInvitation, RepositoryPermission,
};

#[cfg(test)]
#[path = "collaborator_tests.rs"]
mod tests;

const DIRECT_COLLABORATORS_QUERY: &str = r#"
query($owner: String!, $name: String!, $cursor: String) {
  repository(owner: $owner, name: $name) {
    collaborators(affiliation: DIRECT, first: 100, after: $cursor) {
      edges {
        permission
        node { login }
      }
      pageInfo { hasNextPage endCursor }
    }
  }
}
"#;

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
    #[serde(default, rename = "type")]
    error_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RepositoryData {
    repository: Option<CollaboratorsData>,
}

#[derive(Debug, Deserialize)]
struct CollaboratorsData {
    collaborators: Option<CollaboratorConnection>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CollaboratorConnection {
    #[serde(default)]
    edges: Vec<CollaboratorEdge>,
    page_info: PageInfo,
}

#[derive(Debug, Deserialize)]
struct CollaboratorEdge {
    permission: String,
    node: CollaboratorNode,
}

#[derive(Debug, Deserialize)]
struct CollaboratorNode {
    login: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    has_next_page: bool,
    end_cursor: Option<String>,
}

/// Turns one page of the GraphQL answer into collaborators and the next cursor.
fn parse_collaborator_page(
    response: GraphQlResponse<RepositoryData>,
) -> Result<(Vec<Collaborator>, Option<String>), Error> {
    if let Some(first) = response.errors.first() {
        if first.error_type.as_deref() == Some("NOT_FOUND") {
            return Err(Error::NotFound);
        }
        return Err(Error::ApiError(format!(
            "Failed to list direct collaborators: {}",
            first.message
        )));
    }

    let connection = response
        .data
        .ok_or(Error::InvalidResponse)?
        .repository
        .ok_or(Error::NotFound)?
        .collaborators
        .ok_or(Error::InvalidResponse)?;

    let mut collaborators = Vec::with_capacity(connection.edges.len());
    for edge in connection.edges {
        match edge.permission.parse::<RepositoryPermission>() {
            Ok(permission) => collaborators.push(Collaborator {
                login: edge.node.login,
                permission,
            }),
            Err(_) => warn!(
                user = edge.node.login,
                permission = edge.permission,
                "Ignoring collaborator with an unknown permission"
            ),
        }
    }

    let next = if connection.page_info.has_next_page {
        connection.page_info.end_cursor
    } else {
        None
    };
    Ok((collaborators, next))
}

#[async_trait]
impl CollaboratorClient for GitHubClient {
    #[instrument(skip(self))]
    async fn list_direct_collaborators(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<Vec<Collaborator>, Error> {
        if self.dry_run_repository(repo).is_some() {
            return Ok(Vec::new());
        }

        let mut collaborators = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let payload = serde_json::json!({
                "query": DIRECT_COLLABORATORS_QUERY,
                "variables": { "owner": owner, "name": repo, "cursor": cursor },
            });
            let response: GraphQlResponse<RepositoryData> = self
                .client
                .graphql(&payload)
                .await
                .map_err(|e| map_octocrab_error("Failed to list direct collaborators", e))?;

            let (page, next) = parse_collaborator_page(response)?;
            collaborators.extend(page);
            match next {
                Some(next_cursor) => cursor = Some(next_cursor),
                None => break,
            }
        }

        Ok(collaborators)
    }

    #[instrument(skip(self))]
    async fn add_collaborator(
        &self,
        owner: &str,
        repo: &str,
        user: &str,
        permission: RepositoryPermission,
    ) -> Result<(), Error> {
        if self.dry_run {
            info!(
                repo = repo,
                user = user,
                permission = permission.as_api_str(),
                "dry run: would add collaborator"
            );
            return Ok(());
        }

        let path = format!("/repos/{}/{}/collaborators/{}", owner, repo, user);
        let body = serde_json::json!({ "permission": permission.as_api_str() });
        self.put_no_content(&path, &body)
            .await
            .map_err(|e| map_octocrab_error("Failed to add collaborator", e))
    }

    #[instrument(skip(self))]
    async fn remove_collaborator(
        &self,
        owner: &str,
        repo: &str,
        user: &str,
    ) -> Result<(), Error> {
        if self.dry_run {
            info!(repo = repo, user = user, "dry run: would remove collaborator");
            return Ok(());
        }

        let path = format!("/repos/{}/{}/collaborators/{}", owner, repo, user);
        self.delete_no_content(&path)
            .await
            .map_err(|e| map_octocrab_error("Failed to remove collaborator", e))
    }

    #[instrument(skip(self))]
    async fn list_repository_invitations(
        &self,
        owner: &str,
        repo: &str,
    ) -> Result<Vec<RepositoryInvitation>, Error> {
        if self.dry_run_repository(repo).is_some() {
            return Ok(Vec::new());
        }

        let path = format!("/repos/{}/{}/invitations", owner, repo);
        self.get_all_pages(&path, &[])
            .await
            .map_err(|e| map_octocrab_error("Failed to list repository invitations", e))
    }

    #[instrument(skip(self))]
    async fn update_repository_invitation(
        &self,
        owner: &str,
        repo: &str,
        invitation_id: u64,
        permission: RepositoryPermission,
    ) -> Result<(), Error> {
        if self.dry_run {
            info!(
                repo = repo,
                invitation_id = invitation_id,
                permission = permission.as_invitation_str(),
                "dry run: would update repository invitation"
            );
            return Ok(());
        }

        let path = format!("/repos/{}/{}/invitations/{}", owner, repo, invitation_id);
        let body = serde_json::json!({ "permissions": permission.as_invitation_str() });
        let _: RepositoryInvitation = self
            .client
            .patch(path, Some(&body))
            .await
            .map_err(|e| map_octocrab_error("Failed to update repository invitation", e))?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_repository_invitation(
        &self,
        owner: &str,
        repo: &str,
        invitation_id: u64,
    ) -> Result<(), Error> {
        if self.dry_run {
            info!(
                repo = repo,
                invitation_id = invitation_id,
                "dry run: would delete repository invitation"
            );
            return Ok(());
        }

        let path = format!("/repos/{}/{}/invitations/{}", owner, repo, invitation_id);
        self.delete_no_content(&path)
            .await
            .map_err(|e| map_octocrab_error("Failed to delete repository invitation", e))
    }
}
