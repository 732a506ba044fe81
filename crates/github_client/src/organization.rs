//! [`OrganizationClient`] implementation for [`GitHubClient`].

use async_trait::async_trait;
use tracing::{info, instrument};

use crate::{
    map_octocrab_error, Error, GitHubClient, Invitation, Membership, MembershipState,
    OrgRole, Organization, OrganizationClient, OrganizationUpdatePayload, User,
};

#[async_trait]
impl OrganizationClient for GitHubClient {
    #[instrument(skip(self))]
    async fn get_organization(&self, org: &str) -> Result<Organization, Error> {
        let path = format!("/orgs/{}", org);
        self.client
            .get(path, None::<&()>)
            .await
            .map_err(|e| map_octocrab_error("Failed to get organization", e))
    }

    #[instrument(skip(self, payload))]
    async fn edit_organization(
        &self,
        org: &str,
        payload: &OrganizationUpdatePayload,
    ) -> Result<Organization, Error> {
        if self.dry_run {
            info!(org = org, ?payload, "dry run: would edit organization");
            return self.get_organization(org).await;
        }

        let path = format!("/orgs/{}", org);
        self.client
            .patch(path, Some(payload))
            .await
            .map_err(|e| map_octocrab_error("Failed to edit organization", e))
    }

    #[instrument(skip(self))]
    async fn list_organization_members(
        &self,
        org: &str,
        role: OrgRole,
    ) -> Result<Vec<User>, Error> {
        let path = format!("/orgs/{}/members", org);
        self.get_all_pages(&path, &[("role", role.as_str())])
            .await
            .map_err(|e| map_octocrab_error("Failed to list organization members", e))
    }

    #[instrument(skip(self))]
    async fn update_organization_membership(
        &self,
        org: &str,
        user: &str,
        role: OrgRole,
    ) -> Result<Membership, Error> {
        if self.dry_run {
            info!(
                org = org,
                user = user,
                role = role.as_str(),
                "dry run: would update organization membership"
            );
            return Ok(Membership {
                state: MembershipState::Active,
                role: role.as_str().to_string(),
            });
        }

        let path = format!("/orgs/{}/memberships/{}", org, user);
        let body = serde_json::json!({ "role": role.as_str() });
        self.client
            .put(path, Some(&body))
            .await
            .map_err(|e| map_octocrab_error("Failed to update organization membership", e))
    }

    #[instrument(skip(self))]
    async fn remove_organization_membership(&self, org: &str, user: &str) -> Result<(), Error> {
        if self.dry_run {
            info!(org = org, user = user, "dry run: would remove organization membership");
            return Ok(());
        }

        let path = format!("/orgs/{}/memberships/{}", org, user);
        self.delete_no_content(&path)
            .await
            .map_err(|e| map_octocrab_error("Failed to remove organization membership", e))
    }

    #[instrument(skip(self))]
    async fn list_organization_invitations(&self, org: &str) -> Result<Vec<Invitation>, Error> {
        let path = format!("/orgs/{}/invitations", org);
        self.get_all_pages(&path, &[])
            .await
            .map_err(|e| map_octocrab_error("Failed to list organization invitations", e))
    }

    #[instrument(skip(self))]
    async fn authenticated_user(&self) -> Result<User, Error> {
        self.client
            .get("/user", None::<&()>)
            .await
            .map_err(|e| map_octocrab_error("Failed to get the authenticated user", e))
    }
}
