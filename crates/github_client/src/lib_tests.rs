//! Unit tests for the github_client crate.

use super::*; // Import items from lib.rs
use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ORG: &str = "test-org";

fn create_client(mock_server: &MockServer) -> GitHubClient {
    let octocrab = create_token_client("ghp_test_token", Some(&mock_server.uri()))
        .expect("Failed to build test client");
    GitHubClient::new(octocrab)
}

fn not_found() -> ResponseTemplate {
    ResponseTemplate::new(404).set_body_json(json!({
        "message": "Not Found",
        "documentation_url": "https://docs.github.com/rest"
    }))
}

fn team_json(id: u64, name: &str) -> serde_json::Value {
    json!({
        "id": id,
        "slug": name.to_lowercase(),
        "name": name,
        "description": null,
        "privacy": "closed",
        "parent": null
    })
}

#[tokio::test]
async fn test_list_teams_follows_pagination() {
    let mock_server = MockServer::start().await;

    let first_page: Vec<serde_json::Value> = (1..=100)
        .map(|i| team_json(i, &format!("team-{i}")))
        .collect();
    Mock::given(method("GET"))
        .and(path(format!("/orgs/{ORG}/teams")))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(first_page)))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/orgs/{ORG}/teams")))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([team_json(101, "last")])))
        .mount(&mock_server)
        .await;

    let client = create_client(&mock_server);
    let teams = client.list_teams(ORG).await.expect("list_teams failed");

    assert_eq!(teams.len(), 101);
    assert_eq!(teams[100].name, "last");
    assert_eq!(teams[0].privacy, Some(TeamPrivacy::Closed));
}

#[tokio::test]
async fn test_list_organization_members_passes_role() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/orgs/{ORG}/members")))
        .and(query_param("role", "admin"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1, "login": "Octocat" }
        ])))
        .mount(&mock_server)
        .await;

    let client = create_client(&mock_server);
    let admins = client
        .list_organization_members(ORG, OrgRole::Admin)
        .await
        .expect("list_organization_members failed");

    assert_eq!(admins.len(), 1);
    assert_eq!(admins[0].login, "Octocat");
}

#[tokio::test]
async fn test_remove_organization_membership_maps_404_to_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path(format!("/orgs/{ORG}/memberships/ghost")))
        .respond_with(not_found())
        .mount(&mock_server)
        .await;

    let client = create_client(&mock_server);
    let result = client.remove_organization_membership(ORG, "ghost").await;

    assert!(matches!(result, Err(Error::NotFound)), "got {result:?}");
}

#[tokio::test]
async fn test_update_organization_membership_returns_pending_state() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path(format!("/orgs/{ORG}/memberships/newbie")))
        .and(body_json(json!({ "role": "member" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "state": "pending",
            "role": "member"
        })))
        .mount(&mock_server)
        .await;

    let client = create_client(&mock_server);
    let membership = client
        .update_organization_membership(ORG, "newbie", OrgRole::Member)
        .await
        .expect("update_organization_membership failed");

    assert_eq!(membership.state, MembershipState::Pending);
}

#[tokio::test]
async fn test_update_team_repository_sends_rest_permission_name() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path(format!("/orgs/{ORG}/teams/devs/repos/{ORG}/widget")))
        .and(body_json(json!({ "permission": "push" })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_client(&mock_server);
    let result = client
        .update_team_repository(ORG, "devs", "widget", RepositoryPermission::Write)
        .await;

    assert!(result.is_ok(), "got {result:?}");
}

#[tokio::test]
async fn test_update_repository_invitation_sends_invitation_permission_name() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path(format!("/repos/{ORG}/widget/invitations/42")))
        .and(body_json(json!({ "permissions": "write" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 42,
            "invitee": { "id": 7, "login": "guest" },
            "permissions": "write"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_client(&mock_server);
    let result = client
        .update_repository_invitation(ORG, "widget", 42, RepositoryPermission::Write)
        .await;

    assert!(result.is_ok(), "got {result:?}");
}

#[tokio::test]
async fn test_get_repository_reads_fork_parent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/repos/{ORG}/kubernetes")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 99,
            "name": "kubernetes",
            "full_name": "test-org/kubernetes",
            "private": false,
            "archived": false,
            "fork": true,
            "parent": { "name": "kubernetes", "full_name": "kubernetes/kubernetes" },
            "default_branch": "master"
        })))
        .mount(&mock_server)
        .await;

    let client = create_client(&mock_server);
    let repo = client
        .get_repository(ORG, "kubernetes")
        .await
        .expect("get_repository failed");

    assert!(repo.fork);
    assert_eq!(repo.parent_full_name(), Some("kubernetes/kubernetes"));
    assert_eq!(repo.default_branch.as_deref(), Some("master"));
}

#[tokio::test]
async fn test_create_fork_accepts_202() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/repos/upstream/tool/forks"))
        .and(body_json(json!({
            "organization": ORG,
            "name": "tool",
            "default_branch_only": true
        })))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({
            "id": 5,
            "name": "tool-1",
            "full_name": "test-org/tool-1",
            "fork": true
        })))
        .mount(&mock_server)
        .await;

    let client = create_client(&mock_server);
    let fork = client
        .create_fork(
            "upstream",
            "tool",
            &ForkCreatePayload {
                organization: ORG.to_string(),
                name: Some("tool".to_string()),
                default_branch_only: Some(true),
            },
        )
        .await
        .expect("create_fork failed");

    assert_eq!(fork.name, "tool-1");
}

#[tokio::test]
async fn test_list_direct_collaborators_uses_graphql() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "repository": {
                    "collaborators": {
                        "edges": [
                            { "permission": "MAINTAIN", "node": { "login": "keeper" } }
                        ],
                        "pageInfo": { "hasNextPage": false, "endCursor": null }
                    }
                }
            }
        })))
        .mount(&mock_server)
        .await;

    let client = create_client(&mock_server);
    let collaborators = client
        .list_direct_collaborators(ORG, "widget")
        .await
        .expect("list_direct_collaborators failed");

    assert_eq!(
        collaborators,
        vec![Collaborator {
            login: "keeper".to_string(),
            permission: RepositoryPermission::Maintain
        }]
    );
}

#[tokio::test]
async fn test_dry_run_mutations_do_not_reach_github() {
    // No mocks mounted: any request would come back as a 404.
    let mock_server = MockServer::start().await;
    let client = create_client(&mock_server).with_dry_run(true);
    assert!(client.is_dry_run());

    let team = client
        .create_team(
            ORG,
            &TeamCreatePayload {
                name: "Platform Team".to_string(),
                ..Default::default()
            },
        )
        .await
        .expect("dry run create_team failed");
    assert_eq!(team.slug, "platform-team");

    client
        .remove_organization_membership(ORG, "someone")
        .await
        .expect("dry run removal failed");
    client
        .update_team_repository(ORG, "devs", "widget", RepositoryPermission::Admin)
        .await
        .expect("dry run grant failed");

    // Teams created in dry run are readable without hitting the API.
    let members = client
        .list_team_members(ORG, &team.slug, TeamRole::Member)
        .await
        .expect("dry run listing failed");
    assert!(members.is_empty());

    let received = mock_server.received_requests().await.unwrap_or_default();
    assert!(received.is_empty(), "dry run sent {} requests", received.len());
}

#[tokio::test]
async fn test_dry_run_fork_is_visible_to_get_repository() {
    let mock_server = MockServer::start().await;
    let client = create_client(&mock_server).with_dry_run(true);

    client
        .create_fork(
            "upstream",
            "tool",
            &ForkCreatePayload {
                organization: ORG.to_string(),
                name: Some("my-tool".to_string()),
                default_branch_only: None,
            },
        )
        .await
        .expect("dry run create_fork failed");

    let fork = client
        .get_repository(ORG, "my-tool")
        .await
        .expect("shadowed fork should be readable");
    assert_eq!(fork.parent_full_name(), Some("upstream/tool"));
}

#[tokio::test]
async fn test_create_app_client_rejects_malformed_key() {
    let result = create_app_client(42, "not a pem key").await;

    assert!(matches!(result, Err(Error::AuthError(_))));
}
