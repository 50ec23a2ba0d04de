// tests/cli.rs
use std::fs;

use assert_cmd::Command;
use gitprowl::{
    finding::{ChangeAction, CommitInfo, FindingFactory},
    models::{Account, AccountKind, Repository},
    session::Session,
    signatures::{MatchPart, Signature, SignatureMatch},
    source_control::ProviderKind,
};
use predicates::{prelude::PredicateBooleanExt, str::contains};
use tempfile::TempDir;

const GITHUB_ENV: &str = "GITPROWL_GITHUB_ACCESS_TOKEN";
const GITLAB_ENV: &str = "GITPROWL_GITLAB_ACCESS_TOKEN";

fn gitprowl() -> Command {
    let mut cmd = Command::cargo_bin("gitprowl").unwrap();
    cmd.env_remove(GITHUB_ENV).env_remove(GITLAB_ENV).env("NO_COLOR", "1");
    cmd
}

#[test]
fn scan_rejects_two_tokens() {
    gitprowl()
        .args(["scan", "acme", "--github-access-token", "a", "--gitlab-access-token", "b"])
        .assert()
        .failure()
        .stderr(contains("Both a GitHub and a GitLab access token are set"));
}

#[test]
fn scan_requires_a_token() {
    gitprowl()
        .args(["scan", "acme"])
        .assert()
        .failure()
        .stderr(contains("No access token set"));
}

#[test]
fn scan_requires_logins() {
    gitprowl()
        .env(GITHUB_ENV, "a")
        .args(["scan"])
        .assert()
        .failure()
        .stderr(contains("No users or organizations to scan"));
}

#[test]
fn scan_rejects_unknown_mode() {
    gitprowl()
        .args(["scan", "acme", "--github-access-token", "a", "--mode", "9"])
        .assert()
        .failure()
        .stderr(contains("--mode"));
}

#[test]
fn scan_refuses_to_overwrite_session_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("session.json");
    fs::write(&path, "{}").unwrap();
    gitprowl()
        .env(GITHUB_ENV, "a")
        .args(["scan", "acme", "--save", path.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(contains("refusing to overwrite"));
    assert_eq!(fs::read_to_string(&path).unwrap(), "{}");
}

#[test]
fn finished_session_is_summarized_without_credentials() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("session.json");
    let session = Session::new();
    session.add_target(Account::new(1, "acme", AccountKind::Organization));
    session.finish();
    session.save_to_file(&path).unwrap();

    gitprowl()
        .args(["scan", "--load", path.to_str().unwrap()])
        .assert()
        .success()
        .stdout(contains("Scan Summary:").and(contains("finished")));
}

#[test]
fn session_with_findings_exits_200() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("session.json");

    let repository = Repository {
        id: 1,
        owner: "acme".into(),
        name: "api".into(),
        full_name: "acme/api".into(),
        clone_url: "https://github.com/acme/api.git".into(),
        url: "https://github.com/acme/api".into(),
        default_branch: "main".into(),
        description: None,
        homepage: None,
    };
    let commit = CommitInfo {
        hash: "0123456789abcdef0123456789abcdef01234567".into(),
        message: "add key".into(),
        author: "Jo <jo@example.com>".into(),
    };
    let signature = Signature::simple(MatchPart::Filename, "id_rsa", "Private SSH key", None);
    let finding = FindingFactory::public(ProviderKind::GitHub).create(
        &repository,
        &commit,
        "id_rsa",
        ChangeAction::Insert,
        SignatureMatch { path: Some(&signature), content: None },
    );

    let session = Session::new();
    session.add_repository(repository);
    session.add_finding(finding);
    session.finish();
    session.save_to_file(&path).unwrap();

    gitprowl()
        .args(["scan", "--load", path.to_str().unwrap()])
        .assert()
        .code(200)
        .stdout(contains("Findings"));
}

#[test]
fn signatures_list_as_json() {
    gitprowl()
        .args(["signatures", "list", "--format", "json"])
        .assert()
        .success()
        .stdout(
            contains("\"path_signatures\"")
                .and(contains("\"content_signatures\""))
                .and(contains("Private SSH key")),
        );
}

#[test]
fn signatures_list_pretty_uses_custom_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("signatures.json");
    fs::write(
        &path,
        r#"{"path_signatures": [{"part": "filename", "kind": "simple", "match": "vault.txt", "description": "Vault dump"}]}"#,
    )
    .unwrap();

    gitprowl()
        .args(["signatures", "list", "--signatures", path.to_str().unwrap()])
        .assert()
        .success()
        .stdout(
            contains("Vault dump")
                .and(contains("vault.txt"))
                .and(contains("Private SSH key").not()),
        );
}
