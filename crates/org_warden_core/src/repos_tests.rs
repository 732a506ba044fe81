use super::*;
use crate::test_support::{fork_of, repo, FakeGitHub};
use config_manager::RepoCreateOptions;
use tracing_test::traced_test;

fn declared(entries: &[(&str, RepoConfig)]) -> BTreeMap<String, RepoConfig> {
    entries
        .iter()
        .map(|(name, config)| (name.to_string(), config.clone()))
        .collect()
}

fn options() -> ReconcileOptions {
    ReconcileOptions {
        fix_repos: true,
        ..Default::default()
    }
}

#[test]
fn test_find_live_repo_by_alias() {
    let live = vec![repo("Old-Name"), repo("other")];

    let found = find_live_repo(&live, ["new-name", "old-name"]).expect("no conflict");

    assert_eq!(found.map(|r| r.name.as_str()), Some("Old-Name"));
}

#[test]
fn test_find_live_repo_folds_case_like_logins() {
    let live = vec![repo("Ärger-Docs")];

    let found = find_live_repo(&live, ["ärger-docs"]).expect("no conflict");

    assert_eq!(found.map(|r| r.name.as_str()), Some("Ärger-Docs"));
}

#[test]
fn test_find_live_repo_conflict() {
    let live = vec![repo("current"), repo("legacy")];

    let result = find_live_repo(&live, ["current", "legacy"]);

    assert!(matches!(result, Err(ReconcileError::Conflict(_))));
}

#[test]
fn test_patch_only_contains_differences() {
    let mut live = repo("site");
    live.description = None;
    live.allow_squash_merge = Some(true);
    let want = RepoConfig {
        description: Some(String::new()),
        has_wiki: Some(true),
        allow_squash_merge: Some(false),
        ..Default::default()
    };

    let patch = repo_patch(Some("site"), &want, &live);

    assert_eq!(
        patch,
        RepositoryUpdatePayload {
            allow_squash_merge: Some(false),
            ..Default::default()
        }
    );
}

#[test]
fn test_sanitize_rejects_unarchive_archive_and_publish() {
    let mut patch = RepositoryUpdatePayload {
        archived: Some(false),
        private: Some(false),
        has_wiki: Some(false),
        ..Default::default()
    };

    let rejected = sanitize_patch("site", &mut patch, &options());

    assert_eq!(rejected.len(), 2);
    assert!(rejected[0]
        .to_string()
        .contains("asked to unarchive an archived repo, unsupported by GH API"));
    assert_eq!(
        patch,
        RepositoryUpdatePayload {
            has_wiki: Some(false),
            ..Default::default()
        }
    );

    let mut archive = RepositoryUpdatePayload {
        archived: Some(true),
        ..Default::default()
    };
    assert_eq!(sanitize_patch("site", &mut archive, &options()).len(), 1);
    assert!(archive.is_empty());

    let allowed = ReconcileOptions {
        allow_repo_archival: true,
        allow_repo_publish: true,
        ..options()
    };
    let mut both = RepositoryUpdatePayload {
        archived: Some(true),
        private: Some(false),
        ..Default::default()
    };
    assert!(sanitize_patch("site", &mut both, &allowed).is_empty());
    assert_eq!(both.archived, Some(true));
    assert_eq!(both.private, Some(false));
}

#[tokio::test]
async fn test_creates_missing_repo_with_create_options() {
    let fake = FakeGitHub::new("acme");
    let repos = declared(&[(
        "site",
        RepoConfig {
            description: Some("Website".to_string()),
            private: Some(true),
            on_create: Some(RepoCreateOptions {
                auto_init: Some(true),
                ..Default::default()
            }),
            ..Default::default()
        },
    )]);

    configure_repos(&fake, "acme", &repos, &ForkNames::new(), &options())
        .await
        .expect("creates");

    assert_eq!(fake.calls(), vec!["create_repo acme site"]);
    let created = fake.repo("site").expect("created");
    assert!(created.private);
    assert_eq!(created.description.as_deref(), Some("Website"));

    fake.clear_calls();
    configure_repos(&fake, "acme", &repos, &ForkNames::new(), &options())
        .await
        .expect("second run");
    assert!(fake.calls().is_empty(), "unexpected calls: {:?}", fake.calls());
}

#[tokio::test]
async fn test_renames_from_previous_name_and_converges() {
    let fake = FakeGitHub::new("acme");
    fake.add_repo(repo("legacy"));
    let repos = declared(&[(
        "current",
        RepoConfig {
            previously: vec!["Legacy".to_string()],
            has_wiki: Some(false),
            ..Default::default()
        },
    )]);

    configure_repos(&fake, "acme", &repos, &ForkNames::new(), &options())
        .await
        .expect("renames");

    assert_eq!(fake.calls(), vec!["update_repo acme legacy"]);
    let renamed = fake.repo("current").expect("renamed");
    assert!(!renamed.has_wiki);

    fake.clear_calls();
    configure_repos(&fake, "acme", &repos, &ForkNames::new(), &options())
        .await
        .expect("second run");
    assert!(fake.calls().is_empty());
}

#[tokio::test]
async fn test_archived_nonexistent_repo_is_rejected() {
    let fake = FakeGitHub::new("acme");
    let repos = declared(&[(
        "gone",
        RepoConfig {
            archived: Some(true),
            ..Default::default()
        },
    )]);

    let err = configure_repos(&fake, "acme", &repos, &ForkNames::new(), &options())
        .await
        .expect_err("cannot create archived");

    assert!(err.to_string().contains("nonexistent repo configured as archived"));
    assert!(fake.calls().is_empty());
}

#[tokio::test]
async fn test_unarchive_is_rejected_without_api_call() {
    let fake = FakeGitHub::new("acme");
    fake.add_repo(Repository {
        archived: true,
        ..repo("old")
    });
    let repos = declared(&[(
        "old",
        RepoConfig {
            archived: Some(false),
            ..Default::default()
        },
    )]);

    let err = configure_repos(&fake, "acme", &repos, &ForkNames::new(), &options())
        .await
        .expect_err("unarchive is unsupported");

    assert!(err
        .to_string()
        .contains("asked to unarchive an archived repo, unsupported by GH API"));
    assert!(fake.calls().is_empty());
}

#[tokio::test]
#[traced_test]
async fn test_archived_repo_update_failure_is_reported() {
    let fake = FakeGitHub::new("acme");
    fake.add_repo(Repository {
        archived: true,
        ..repo("old")
    });
    fake.fail_on("update_repo acme old");
    let repos = declared(&[(
        "old",
        RepoConfig {
            has_wiki: Some(false),
            ..Default::default()
        },
    )]);

    let err = configure_repos(&fake, "acme", &repos, &ForkNames::new(), &options())
        .await
        .expect_err("GitHub refuses");

    assert!(matches!(err, ReconcileError::GitHub { .. }));
    assert!(logs_contain("Updating an archived repository"));
}

#[tokio::test]
async fn test_archived_as_declared_is_left_alone() {
    let fake = FakeGitHub::new("acme");
    fake.add_repo(Repository {
        archived: true,
        ..repo("old")
    });
    let repos = declared(&[(
        "old",
        RepoConfig {
            archived: Some(true),
            has_wiki: Some(false),
            ..Default::default()
        },
    )]);

    configure_repos(&fake, "acme", &repos, &ForkNames::new(), &options())
        .await
        .expect("nothing to do");

    assert!(fake.calls().is_empty());
}

#[tokio::test]
async fn test_publish_rejected_but_other_changes_applied() {
    let fake = FakeGitHub::new("acme");
    fake.add_repo(Repository {
        private: true,
        ..repo("secret")
    });
    let repos = declared(&[(
        "secret",
        RepoConfig {
            private: Some(false),
            has_issues: Some(false),
            ..Default::default()
        },
    )]);

    let err = configure_repos(&fake, "acme", &repos, &ForkNames::new(), &options())
        .await
        .expect_err("publishing is not allowed");

    assert!(matches!(err, ReconcileError::Rejected { .. }));
    assert_eq!(fake.calls(), vec!["update_repo acme secret"]);
    let live = fake.repo("secret").expect("exists");
    assert!(live.private);
    assert!(!live.has_issues);
}

#[tokio::test]
async fn test_forks_use_mapped_name_and_are_not_renamed() {
    let fake = FakeGitHub::new("acme");
    fake.add_repo(fork_of("tool-1", "upstream/tool"));
    let repos = declared(&[
        (
            "tool",
            RepoConfig {
                fork_from: Some("upstream/tool".to_string()),
                description: Some("Fork".to_string()),
                ..Default::default()
            },
        ),
        (
            "pending",
            RepoConfig {
                fork_from: Some("upstream/pending".to_string()),
                ..Default::default()
            },
        ),
    ]);
    let fork_names: ForkNames = [("tool".to_string(), "tool-1".to_string())]
        .into_iter()
        .collect();

    configure_repos(&fake, "acme", &repos, &fork_names, &options())
        .await
        .expect("updates fork");

    assert_eq!(fake.calls(), vec!["update_repo acme tool-1"]);
    let fork = fake.repo("tool-1").expect("not renamed");
    assert_eq!(fork.description.as_deref(), Some("Fork"));
}

#[tokio::test]
async fn test_one_failure_does_not_block_other_repos() {
    let fake = FakeGitHub::new("acme");
    fake.fail_on("create_repo acme a");
    let repos = declared(&[("a", RepoConfig::default()), ("b", RepoConfig::default())]);

    let err = configure_repos(&fake, "acme", &repos, &ForkNames::new(), &options())
        .await
        .expect_err("a fails");

    assert_eq!(err.count(), 1);
    assert_eq!(fake.calls(), vec!["create_repo acme a", "create_repo acme b"]);
}
