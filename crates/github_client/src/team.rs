//! [`TeamClient`] and [`TeamRepositoryClient`] implementations for [`GitHubClient`].

use async_trait::async_trait;
use tracing::{info, instrument};

use crate::{
    map_octocrab_error, Error, GitHubClient, Invitation, Membership, MembershipState,
    RepositoryPermission, Team, TeamClient, TeamCreatePayload, TeamRepository,
    TeamRepositoryClient, TeamRole, TeamUpdatePayload, User,
};

/// Approximates the slug GitHub derives from a team name.
fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_matches('-').to_string()
}

#[async_trait]
impl TeamClient for GitHubClient {
    #[instrument(skip(self))]
    async fn list_teams(&self, org: &str) -> Result<Vec<Team>, Error> {
        let path = format!("/orgs/{}/teams", org);
        self.get_all_pages(&path, &[])
            .await
            .map_err(|e| map_octocrab_error("Failed to list teams", e))
    }

    #[instrument(skip(self, payload), fields(team = %payload.name))]
    async fn create_team(&self, org: &str, payload: &TeamCreatePayload) -> Result<Team, Error> {
        if self.dry_run {
            info!(org = org, ?payload, "dry run: would create team");
            let team = Team {
                id: 0,
                slug: slugify(&payload.name),
                name: payload.name.clone(),
                description: payload.description.clone(),
                privacy: payload.privacy,
                parent: None,
            };
            self.remember_dry_run_team(&team.slug);
            return Ok(team);
        }

        let path = format!("/orgs/{}/teams", org);
        self.client
            .post(path, Some(payload))
            .await
            .map_err(|e| map_octocrab_error("Failed to create team", e))
    }

    #[instrument(skip(self, payload))]
    async fn edit_team(
        &self,
        org: &str,
        team_slug: &str,
        payload: &TeamUpdatePayload,
    ) -> Result<Team, Error> {
        if self.dry_run {
            info!(org = org, team = team_slug, ?payload, "dry run: would edit team");
            return Ok(Team {
                slug: team_slug.to_string(),
                name: payload.name.clone().unwrap_or_default(),
                description: payload.description.clone(),
                privacy: payload.privacy,
                ..Default::default()
            });
        }

        let path = format!("/orgs/{}/teams/{}", org, team_slug);
        self.client
            .patch(path, Some(payload))
            .await
            .map_err(|e| map_octocrab_error("Failed to edit team", e))
    }

    #[instrument(skip(self))]
    async fn delete_team(&self, org: &str, team_slug: &str) -> Result<(), Error> {
        if self.dry_run {
            info!(org = org, team = team_slug, "dry run: would delete team");
            return Ok(());
        }

        let path = format!("/orgs/{}/teams/{}", org, team_slug);
        self.delete_no_content(&path)
            .await
            .map_err(|e| map_octocrab_error("Failed to delete team", e))
    }

    #[instrument(skip(self))]
    async fn list_team_members(
        &self,
        org: &str,
        team_slug: &str,
        role: TeamRole,
    ) -> Result<Vec<User>, Error> {
        if self.is_dry_run_team(team_slug) {
            return Ok(Vec::new());
        }

        let path = format!("/orgs/{}/teams/{}/members", org, team_slug);
        self.get_all_pages(&path, &[("role", role.as_str())])
            .await
            .map_err(|e| map_octocrab_error("Failed to list team members", e))
    }

    #[instrument(skip(self))]
    async fn update_team_membership(
        &self,
        org: &str,
        team_slug: &str,
        user: &str,
        role: TeamRole,
    ) -> Result<Membership, Error> {
        if self.dry_run {
            info!(
                org = org,
                team = team_slug,
                user = user,
                role = role.as_str(),
                "dry run: would update team membership"
            );
            return Ok(Membership {
                state: MembershipState::Active,
                role: role.as_str().to_string(),
            });
        }

        let path = format!("/orgs/{}/teams/{}/memberships/{}", org, team_slug, user);
        let body = serde_json::json!({ "role": role.as_str() });
        self.client
            .put(path, Some(&body))
            .await
            .map_err(|e| map_octocrab_error("Failed to update team membership", e))
    }

    #[instrument(skip(self))]
    async fn remove_team_membership(
        &self,
        org: &str,
        team_slug: &str,
        user: &str,
    ) -> Result<(), Error> {
        if self.dry_run {
            info!(
                org = org,
                team = team_slug,
                user = user,
                "dry run: would remove team membership"
            );
            return Ok(());
        }

        let path = format!("/orgs/{}/teams/{}/memberships/{}", org, team_slug, user);
        self.delete_no_content(&path)
            .await
            .map_err(|e| map_octocrab_error("Failed to remove team membership", e))
    }

    #[instrument(skip(self))]
    async fn list_team_invitations(
        &self,
        org: &str,
        team_slug: &str,
    ) -> Result<Vec<Invitation>, Error> {
        if self.is_dry_run_team(team_slug) {
            return Ok(Vec::new());
        }

        let path = format!("/orgs/{}/teams/{}/invitations", org, team_slug);
        self.get_all_pages(&path, &[])
            .await
            .map_err(|e| map_octocrab_error("Failed to list team invitations", e))
    }
}

#[async_trait]
impl TeamRepositoryClient for GitHubClient {
    #[instrument(skip(self))]
    async fn list_team_repositories(
        &self,
        org: &str,
        team_slug: &str,
    ) -> Result<Vec<TeamRepository>, Error> {
        if self.is_dry_run_team(team_slug) {
            return Ok(Vec::new());
        }

        let path = format!("/orgs/{}/teams/{}/repos", org, team_slug);
        self.get_all_pages(&path, &[])
            .await
            .map_err(|e| map_octocrab_error("Failed to list team repositories", e))
    }

    #[instrument(skip(self))]
    async fn update_team_repository(
        &self,
        org: &str,
        team_slug: &str,
        repo: &str,
        permission: RepositoryPermission,
    ) -> Result<(), Error> {
        if self.dry_run {
            info!(
                org = org,
                team = team_slug,
                repo = repo,
                permission = permission.as_api_str(),
                "dry run: would grant team repository permission"
            );
            return Ok(());
        }

        let path = format!("/orgs/{}/teams/{}/repos/{}/{}", org, team_slug, org, repo);
        let body = serde_json::json!({ "permission": permission.as_api_str() });
        self.put_no_content(&path, &body)
            .await
            .map_err(|e| map_octocrab_error("Failed to update team repository permission", e))
    }

    #[instrument(skip(self))]
    async fn remove_team_repository(
        &self,
        org: &str,
        team_slug: &str,
        repo: &str,
    ) -> Result<(), Error> {
        if self.dry_run {
            info!(
                org = org,
                team = team_slug,
                repo = repo,
                "dry run: would remove team repository permission"
            );
            return Ok(());
        }

        let path = format!("/orgs/{}/teams/{}/repos/{}/{}", org, team_slug, org, repo);
        self.delete_no_content(&path)
            .await
            .map_err(|e| map_octocrab_error("Failed to remove team repository permission", e))
    }
}
