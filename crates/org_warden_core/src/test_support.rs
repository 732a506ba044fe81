//! In-memory GitHub used by the reconciler tests.
//!
//! `FakeGitHub` implements every client trait against a mutable state and records each
//! mutating call as a short string such as `"remove_org_member acme alice"`. Mutations
//! change the state the way GitHub would, so a second run against the same fake shows
//! whether reconciliation converged.

use async_trait::async_trait;
use github_client::models::{RepositoryParent, RepositoryPermissions, TeamParent};
use github_client::{
    Collaborator, CollaboratorClient, Error, ForkCreatePayload, Invitation, Membership,
    MembershipState, OrgRole, Organization, OrganizationClient, OrganizationUpdatePayload,
    Repository, RepositoryClient, RepositoryCreatePayload, RepositoryInvitation,
    RepositoryPermission, RepositoryUpdatePayload, Team, TeamClient, TeamCreatePayload,
    TeamRepository, TeamRepositoryClient, TeamRole, TeamUpdatePayload, User,
};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
pub struct FakeState {
    pub organization: Organization,
    pub me: String,
    pub org_admins: Vec<String>,
    pub org_members: Vec<String>,
    pub org_invitations: Vec<String>,

    pub teams: Vec<Team>,
    /// Keyed by team slug.
    pub team_members: HashMap<String, Vec<(String, TeamRole)>>,
    pub team_invitations: HashMap<String, Vec<String>>,
    pub team_repos: HashMap<String, BTreeMap<String, RepositoryPermission>>,

    pub repositories: Vec<Repository>,
    /// Keyed by lowercased repository name.
    pub collaborators: HashMap<String, Vec<Collaborator>>,
    pub repo_invitations: HashMap<String, Vec<RepositoryInvitation>>,

    /// Name GitHub picks for the next forks, keyed by requested name.
    pub fork_renames: HashMap<String, String>,
    /// Number of `get_repository` lookups a new fork answers with 404.
    pub fork_delay_polls: u32,
    pub pending_forks: HashMap<String, u32>,

    /// Mutating calls, in order.
    pub calls: Vec<String>,
    /// Calls (as recorded) that fail with an API error.
    pub failures: HashSet<String>,
    /// Calls (as recorded) that fail with a 404.
    pub not_found: HashSet<String>,
    next_id: u64,
}

#[derive(Debug, Default)]
pub struct FakeGitHub {
    state: Mutex<FakeState>,
}

impl FakeGitHub {
    pub fn new(org: &str) -> Self {
        let fake = Self::default();
        {
            let mut state = fake.state();
            state.organization.login = org.to_string();
            state.me = "warden-bot".to_string();
            state.next_id = 1000;
        }
        fake
    }

    pub fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    pub fn fail_on(&self, call: &str) {
        self.state().failures.insert(call.to_string());
    }

    pub fn not_found_on(&self, call: &str) {
        self.state().not_found.insert(call.to_string());
    }

    pub fn with_org_members(self, admins: &[&str], members: &[&str]) -> Self {
        {
            let mut state = self.state();
            state.org_admins = admins.iter().map(|s| s.to_string()).collect();
            state.org_members = members.iter().map(|s| s.to_string()).collect();
        }
        self
    }

    pub fn add_team(&self, id: u64, name: &str, parent: Option<u64>) -> Team {
        let mut state = self.state();
        let parent = parent.and_then(|pid| {
            state.teams.iter().find(|t| t.id == pid).map(|p| TeamParent {
                id: p.id,
                slug: p.slug.clone(),
                name: p.name.clone(),
            })
        });
        let team = Team {
            id,
            slug: slug_of(name),
            name: name.to_string(),
            description: Some(String::new()),
            privacy: Some(github_client::TeamPrivacy::Closed),
            parent,
        };
        state.teams.push(team.clone());
        team
    }

    pub fn add_repo(&self, repo: Repository) {
        self.state().repositories.push(repo);
    }

    pub fn team(&self, slug: &str) -> Option<Team> {
        self.state().teams.iter().find(|t| t.slug == slug).cloned()
    }

    pub fn repo(&self, name: &str) -> Option<Repository> {
        self.state()
            .repositories
            .iter()
            .find(|r| r.name.eq_ignore_ascii_case(name))
            .cloned()
    }
}

pub fn repo(name: &str) -> Repository {
    Repository {
        id: 0,
        name: name.to_string(),
        full_name: format!("acme/{}", name),
        has_issues: true,
        has_projects: true,
        has_wiki: true,
        ..Default::default()
    }
}

pub fn fork_of(name: &str, upstream: &str) -> Repository {
    let parent_name = upstream.rsplit('/').next().unwrap_or(upstream).to_string();
    Repository {
        fork: true,
        parent: Some(RepositoryParent {
            name: parent_name,
            full_name: upstream.to_string(),
        }),
        ..repo(name)
    }
}

fn slug_of(name: &str) -> String {
    name.to_lowercase().replace(' ', "-")
}

impl FakeState {
    fn record(&mut self, call: String) -> Result<(), Error> {
        self.calls.push(call.clone());
        if self.not_found.contains(&call) {
            return Err(Error::NotFound);
        }
        if self.failures.contains(&call) {
            return Err(Error::ApiError(format!("injected failure: {}", call)));
        }
        Ok(())
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn team_index(&self, slug: &str) -> Result<usize, Error> {
        self.teams
            .iter()
            .position(|t| t.slug == slug)
            .ok_or(Error::NotFound)
    }

    fn repo_index(&self, name: &str) -> Result<usize, Error> {
        self.repositories
            .iter()
            .position(|r| r.name.eq_ignore_ascii_case(name))
            .ok_or(Error::NotFound)
    }
}

fn users(logins: &[String]) -> Vec<User> {
    logins
        .iter()
        .enumerate()
        .map(|(i, login)| User {
            id: i as u64 + 1,
            login: login.clone(),
        })
        .collect()
}

fn invitations(logins: &[String]) -> Vec<Invitation> {
    logins
        .iter()
        .enumerate()
        .map(|(i, login)| Invitation {
            id: i as u64 + 1,
            login: Some(login.clone()),
            email: None,
        })
        .collect()
}

fn remove_login(list: &mut Vec<String>, user: &str) -> bool {
    let before = list.len();
    list.retain(|l| !l.eq_ignore_ascii_case(user));
    before != list.len()
}

#[async_trait]
impl OrganizationClient for FakeGitHub {
    async fn get_organization(&self, _org: &str) -> Result<Organization, Error> {
        Ok(self.state().organization.clone())
    }

    async fn edit_organization(
        &self,
        org: &str,
        payload: &OrganizationUpdatePayload,
    ) -> Result<Organization, Error> {
        let mut state = self.state();
        state.record(format!("edit_org {}", org))?;
        let live = &mut state.organization;
        macro_rules! set {
            ($($field:ident),*) => {
                $(if let Some(value) = &payload.$field { live.$field = Some(value.clone()); })*
            };
        }
        set!(
            billing_email,
            company,
            email,
            name,
            description,
            location,
            has_organization_projects,
            has_repository_projects,
            default_repository_permission,
            members_can_create_repositories
        );
        Ok(live.clone())
    }

    async fn list_organization_members(
        &self,
        _org: &str,
        role: OrgRole,
    ) -> Result<Vec<User>, Error> {
        let state = self.state();
        Ok(match role {
            OrgRole::Admin => users(&state.org_admins),
            OrgRole::Member => users(&state.org_members),
        })
    }

    async fn update_organization_membership(
        &self,
        org: &str,
        user: &str,
        role: OrgRole,
    ) -> Result<Membership, Error> {
        let mut state = self.state();
        state.record(format!("set_org_member {} {} {}", org, user, role.as_str()))?;
        let was_admin = remove_login(&mut state.org_admins, user);
        let was_member = remove_login(&mut state.org_members, user) || was_admin;
        if !was_member {
            state.org_invitations.push(user.to_string());
            return Ok(Membership {
                state: MembershipState::Pending,
                role: role.as_str().to_string(),
            });
        }
        match role {
            OrgRole::Admin => state.org_admins.push(user.to_string()),
            OrgRole::Member => state.org_members.push(user.to_string()),
        }
        Ok(Membership {
            state: MembershipState::Active,
            role: role.as_str().to_string(),
        })
    }

    async fn remove_organization_membership(&self, org: &str, user: &str) -> Result<(), Error> {
        let mut state = self.state();
        state.record(format!("remove_org_member {} {}", org, user))?;
        remove_login(&mut state.org_admins, user);
        remove_login(&mut state.org_members, user);
        remove_login(&mut state.org_invitations, user);
        Ok(())
    }

    async fn list_organization_invitations(&self, _org: &str) -> Result<Vec<Invitation>, Error> {
        Ok(invitations(&self.state().org_invitations))
    }

    async fn authenticated_user(&self) -> Result<User, Error> {
        Ok(User {
            id: 1,
            login: self.state().me.clone(),
        })
    }
}

#[async_trait]
impl TeamClient for FakeGitHub {
    async fn list_teams(&self, _org: &str) -> Result<Vec<Team>, Error> {
        Ok(self.state().teams.clone())
    }

    async fn create_team(&self, org: &str, payload: &TeamCreatePayload) -> Result<Team, Error> {
        let mut state = self.state();
        state.record(format!("create_team {} {}", org, payload.name))?;
        let id = state.next_id();
        let team = Team {
            id,
            slug: slug_of(&payload.name),
            name: payload.name.clone(),
            description: payload.description.clone(),
            privacy: Some(payload.privacy.unwrap_or(github_client::TeamPrivacy::Secret)),
            parent: None,
        };
        state.teams.push(team.clone());
        Ok(team)
    }

    async fn edit_team(
        &self,
        org: &str,
        team_slug: &str,
        payload: &TeamUpdatePayload,
    ) -> Result<Team, Error> {
        let mut state = self.state();
        state.record(format!("edit_team {} {}", org, team_slug))?;
        let index = state.team_index(team_slug)?;
        let parent = match payload.parent_team_id {
            Some(Some(pid)) => Some(
                state
                    .teams
                    .iter()
                    .find(|t| t.id == pid)
                    .map(|p| TeamParent {
                        id: p.id,
                        slug: p.slug.clone(),
                        name: p.name.clone(),
                    })
                    .ok_or(Error::NotFound)?,
            ),
            Some(None) => None,
            None => state.teams[index].parent.clone(),
        };
        let team = &mut state.teams[index];
        if let Some(name) = &payload.name {
            team.name = name.clone();
            team.slug = slug_of(name);
        }
        if let Some(description) = &payload.description {
            team.description = Some(description.clone());
        }
        if let Some(privacy) = payload.privacy {
            team.privacy = Some(privacy);
        }
        team.parent = parent;
        let team = team.clone();
        if team.slug != team_slug {
            if let Some(members) = state.team_members.remove(team_slug) {
                state.team_members.insert(team.slug.clone(), members);
            }
            if let Some(repos) = state.team_repos.remove(team_slug) {
                state.team_repos.insert(team.slug.clone(), repos);
            }
        }
        Ok(team)
    }

    async fn delete_team(&self, org: &str, team_slug: &str) -> Result<(), Error> {
        let mut state = self.state();
        state.record(format!("delete_team {} {}", org, team_slug))?;
        let index = state.team_index(team_slug)?;
        state.teams.remove(index);
        Ok(())
    }

    async fn list_team_members(
        &self,
        _org: &str,
        team_slug: &str,
        role: TeamRole,
    ) -> Result<Vec<User>, Error> {
        let state = self.state();
        state.team_index(team_slug)?;
        let logins: Vec<String> = state
            .team_members
            .get(team_slug)
            .map(|members| {
                members
                    .iter()
                    .filter(|(_, r)| *r == role)
                    .map(|(login, _)| login.clone())
                    .collect()
            })
            .unwrap_or_default();
        Ok(users(&logins))
    }

    async fn update_team_membership(
        &self,
        org: &str,
        team_slug: &str,
        user: &str,
        role: TeamRole,
    ) -> Result<Membership, Error> {
        let mut state = self.state();
        state.record(format!(
            "set_team_member {} {} {} {}",
            org,
            team_slug,
            user,
            role.as_str()
        ))?;
        let members = state.team_members.entry(team_slug.to_string()).or_default();
        members.retain(|(login, _)| !login.eq_ignore_ascii_case(user));
        members.push((user.to_string(), role));
        Ok(Membership {
            state: MembershipState::Active,
            role: role.as_str().to_string(),
        })
    }

    async fn remove_team_membership(
        &self,
        org: &str,
        team_slug: &str,
        user: &str,
    ) -> Result<(), Error> {
        let mut state = self.state();
        state.record(format!("remove_team_member {} {} {}", org, team_slug, user))?;
        if let Some(members) = state.team_members.get_mut(team_slug) {
            members.retain(|(login, _)| !login.eq_ignore_ascii_case(user));
        }
        if let Some(invitees) = state.team_invitations.get_mut(team_slug) {
            remove_login(invitees, user);
        }
        Ok(())
    }

    async fn list_team_invitations(
        &self,
        _org: &str,
        team_slug: &str,
    ) -> Result<Vec<Invitation>, Error> {
        let state = self.state();
        Ok(state
            .team_invitations
            .get(team_slug)
            .map(|logins| invitations(logins))
            .unwrap_or_default())
    }
}

#[async_trait]
impl TeamRepositoryClient for FakeGitHub {
    async fn list_team_repositories(
        &self,
        _org: &str,
        team_slug: &str,
    ) -> Result<Vec<TeamRepository>, Error> {
        let state = self.state();
        Ok(state
            .team_repos
            .get(team_slug)
            .map(|repos| {
                repos
                    .iter()
                    .map(|(name, permission)| TeamRepository {
                        name: name.clone(),
                        permissions: permissions_for(*permission),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn update_team_repository(
        &self,
        org: &str,
        team_slug: &str,
        repo: &str,
        permission: RepositoryPermission,
    ) -> Result<(), Error> {
        let mut state = self.state();
        state.record(format!(
            "set_team_repo {} {} {} {}",
            org, team_slug, repo, permission
        ))?;
        state
            .team_repos
            .entry(team_slug.to_string())
            .or_default()
            .insert(repo.to_string(), permission);
        Ok(())
    }

    async fn remove_team_repository(
        &self,
        org: &str,
        team_slug: &str,
        repo: &str,
    ) -> Result<(), Error> {
        let mut state = self.state();
        state.record(format!("remove_team_repo {} {} {}", org, team_slug, repo))?;
        if let Some(repos) = state.team_repos.get_mut(team_slug) {
            repos.remove(repo);
        }
        Ok(())
    }
}

/// The REST permission flags GitHub reports for a grant: every lower level is set too.
fn permissions_for(permission: RepositoryPermission) -> RepositoryPermissions {
    RepositoryPermissions {
        admin: permission >= RepositoryPermission::Admin,
        maintain: permission >= RepositoryPermission::Maintain,
        push: permission >= RepositoryPermission::Write,
        triage: permission >= RepositoryPermission::Triage,
        pull: true,
    }
}

#[async_trait]
impl RepositoryClient for FakeGitHub {
    async fn get_repository(&self, _owner: &str, repo: &str) -> Result<Repository, Error> {
        let mut state = self.state();
        let key = repo.to_lowercase();
        if let Some(remaining) = state.pending_forks.get_mut(&key) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(Error::NotFound);
            }
        }
        let index = state.repo_index(repo)?;
        Ok(state.repositories[index].clone())
    }

    async fn list_org_repositories(&self, _org: &str) -> Result<Vec<Repository>, Error> {
        // The list endpoint does not carry fork parents.
        Ok(self
            .state()
            .repositories
            .iter()
            .map(|r| Repository {
                parent: None,
                ..r.clone()
            })
            .collect())
    }

    async fn create_org_repository(
        &self,
        org: &str,
        payload: &RepositoryCreatePayload,
    ) -> Result<Repository, Error> {
        let mut state = self.state();
        state.record(format!("create_repo {} {}", org, payload.name))?;
        let id = state.next_id();
        let repository = Repository {
            id,
            name: payload.name.clone(),
            full_name: format!("{}/{}", org, payload.name),
            description: payload.description.clone(),
            homepage: payload.homepage.clone(),
            private: payload.private.unwrap_or(false),
            has_issues: payload.has_issues.unwrap_or(true),
            has_projects: payload.has_projects.unwrap_or(true),
            has_wiki: payload.has_wiki.unwrap_or(true),
            allow_squash_merge: payload.allow_squash_merge,
            allow_merge_commit: payload.allow_merge_commit,
            allow_rebase_merge: payload.allow_rebase_merge,
            squash_merge_commit_title: payload.squash_merge_commit_title.clone(),
            squash_merge_commit_message: payload.squash_merge_commit_message.clone(),
            ..Default::default()
        };
        state.repositories.push(repository.clone());
        Ok(repository)
    }

    async fn update_repository(
        &self,
        owner: &str,
        repo: &str,
        payload: &RepositoryUpdatePayload,
    ) -> Result<Repository, Error> {
        let mut state = self.state();
        state.record(format!("update_repo {} {}", owner, repo))?;
        let index = state.repo_index(repo)?;
        let live = &mut state.repositories[index];
        if let Some(name) = &payload.name {
            live.name = name.clone();
            live.full_name = format!("{}/{}", owner, name);
        }
        macro_rules! set {
            ($($field:ident),*) => { $(if let Some(value) = &payload.$field { live.$field = value.clone(); })* };
        }
        macro_rules! set_opt {
            ($($field:ident),*) => { $(if let Some(value) = &payload.$field { live.$field = Some(value.clone()); })* };
        }
        set!(private, has_issues, has_projects, has_wiki, archived);
        set_opt!(
            description,
            homepage,
            allow_squash_merge,
            allow_merge_commit,
            allow_rebase_merge,
            squash_merge_commit_title,
            squash_merge_commit_message,
            default_branch
        );
        Ok(live.clone())
    }

    async fn create_fork(
        &self,
        owner: &str,
        repo: &str,
        payload: &ForkCreatePayload,
    ) -> Result<Repository, Error> {
        let mut state = self.state();
        let requested = payload.name.clone().unwrap_or_else(|| repo.to_string());
        state.record(format!("create_fork {}/{} {}", owner, repo, requested))?;
        let name = state
            .fork_renames
            .get(&requested)
            .cloned()
            .unwrap_or(requested);
        let id = state.next_id();
        let fork = Repository {
            id,
            ..fork_of(&name, &format!("{}/{}", owner, repo))
        };
        let delay = state.fork_delay_polls;
        state.pending_forks.insert(name.to_lowercase(), delay);
        state.repositories.push(fork.clone());
        Ok(Repository {
            parent: None,
            ..fork
        })
    }
}

#[async_trait]
impl CollaboratorClient for FakeGitHub {
    async fn list_direct_collaborators(
        &self,
        _owner: &str,
        repo: &str,
    ) -> Result<Vec<Collaborator>, Error> {
        let state = self.state();
        state.repo_index(repo)?;
        Ok(state
            .collaborators
            .get(&repo.to_lowercase())
            .cloned()
            .unwrap_or_default())
    }

    async fn add_collaborator(
        &self,
        owner: &str,
        repo: &str,
        user: &str,
        permission: RepositoryPermission,
    ) -> Result<(), Error> {
        let mut state = self.state();
        state.record(format!(
            "add_collaborator {}/{} {} {}",
            owner, repo, user, permission
        ))?;
        let key = repo.to_lowercase();
        if let Some(existing) = state
            .collaborators
            .get_mut(&key)
            .and_then(|list| list.iter_mut().find(|c| c.login.eq_ignore_ascii_case(user)))
        {
            existing.permission = permission;
            return Ok(());
        }
        let id = state.next_id();
        state
            .repo_invitations
            .entry(key)
            .or_default()
            .push(RepositoryInvitation {
                id,
                invitee: Some(User {
                    id,
                    login: user.to_string(),
                }),
                permissions: permission.as_invitation_str().to_string(),
            });
        Ok(())
    }

    async fn remove_collaborator(&self, owner: &str, repo: &str, user: &str) -> Result<(), Error> {
        let mut state = self.state();
        state.record(format!("remove_collaborator {}/{} {}", owner, repo, user))?;
        if let Some(list) = state.collaborators.get_mut(&repo.to_lowercase()) {
            list.retain(|c| !c.login.eq_ignore_ascii_case(user));
        }
        Ok(())
    }

    async fn list_repository_invitations(
        &self,
        _owner: &str,
        repo: &str,
    ) -> Result<Vec<RepositoryInvitation>, Error> {
        Ok(self
            .state()
            .repo_invitations
            .get(&repo.to_lowercase())
            .cloned()
            .unwrap_or_default())
    }

    async fn update_repository_invitation(
        &self,
        owner: &str,
        repo: &str,
        invitation_id: u64,
        permission: RepositoryPermission,
    ) -> Result<(), Error> {
        let mut state = self.state();
        state.record(format!(
            "update_invitation {}/{} {} {}",
            owner, repo, invitation_id, permission
        ))?;
        let invitation = state
            .repo_invitations
            .get_mut(&repo.to_lowercase())
            .and_then(|list| list.iter_mut().find(|i| i.id == invitation_id))
            .ok_or(Error::NotFound)?;
        invitation.permissions = permission.as_invitation_str().to_string();
        Ok(())
    }

    async fn delete_repository_invitation(
        &self,
        owner: &str,
        repo: &str,
        invitation_id: u64,
    ) -> Result<(), Error> {
        let mut state = self.state();
        state.record(format!(
            "delete_invitation {}/{} {}",
            owner, repo, invitation_id
        ))?;
        if let Some(list) = state.repo_invitations.get_mut(&repo.to_lowercase()) {
            list.retain(|i| i.id != invitation_id);
        }
        Ok(())
    }
}
