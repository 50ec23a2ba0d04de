use std::time::{Duration, Instant};

use anyhow::Result;
use gitprowl::{
    gitlab::GitLabClient,
    models::AccountKind,
    source_control::SourceControl,
};
use serde_json::{json, Value};
use url::Url;
use wiremock::{
    matchers::{header, method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

fn project_json(id: i64, namespace: &str, name: &str, forked: bool) -> Value {
    json!({
        "id": id,
        "name": name,
        "name_with_namespace": format!("{namespace} / {name}"),
        "path_with_namespace": format!("{namespace}/{name}"),
        "http_url_to_repo": format!("https://gitlab.example.com/{namespace}/{name}.git"),
        "web_url": format!("https://gitlab.example.com/{namespace}/{name}"),
        "default_branch": "main",
        "namespace": {"full_path": namespace},
        "owner": {"username": namespace},
        "forked_from_project": if forked { json!({"id": 1}) } else { Value::Null },
    })
}

fn api_url(server: &MockServer) -> Url {
    Url::parse(&format!("{}/api/v4/", server.uri())).unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn group_resolves_before_user() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v4/groups/acme"))
        .and(header("private-token", "glpat-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 42,
            "name": "Acme",
            "full_path": "acme",
            "web_url": "https://gitlab.example.com/groups/acme",
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v4/groups/42/projects"))
        .and(query_param("page", "1"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("X-Next-Page", "2")
                .set_body_json(json!([
                    project_json(1, "acme", "api", false),
                    project_json(2, "acme", "forked", true),
                ])),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v4/groups/42/projects"))
        .and(query_param("page", "2"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("X-Next-Page", "")
                .set_body_json(json!([project_json(3, "acme", "web", false)])),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v4/groups/42/members/all"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 5, "username": "jo", "name": "Jo"},
            {"id": 6, "username": "sam", "name": "Sam"},
        ])))
        .mount(&server)
        .await;

    let api_url = api_url(&server);
    let (account, repos, members) = tokio::task::spawn_blocking(move || -> Result<_> {
        let client = GitLabClient::new(api_url, "glpat-123".into(), false)?;
        let account = client.resolve_account("acme")?;
        let repos = client.list_repositories(&account)?;
        let members = client.list_members(&account)?;
        Ok((account, repos, members))
    })
    .await??;

    assert_eq!(account.id, 42);
    assert_eq!(account.kind, AccountKind::Organization);
    assert_eq!(account.login, "acme");

    let names: Vec<&str> = repos.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["api", "web"]);
    assert_eq!(repos[0].owner, "acme");
    assert_eq!(repos[0].clone_url, "https://gitlab.example.com/acme/api.git");

    let logins: Vec<&str> = members.iter().map(|m| m.login.as_str()).collect();
    assert_eq!(logins, vec!["jo", "sam"]);
    assert!(members.iter().all(|m| m.kind == AccountKind::User));
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn falls_back_to_user_lookup() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v4/groups/jo"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "404"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v4/users"))
        .and(query_param("username", "jo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 5, "username": "jo", "name": "Jo", "bio": ""},
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v4/users/5/projects"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([project_json(9, "jo", "notes", false)])),
        )
        .mount(&server)
        .await;

    let api_url = api_url(&server);
    let (account, repos, creds) = tokio::task::spawn_blocking(move || -> Result<_> {
        let client = GitLabClient::new(api_url, "glpat-123".into(), false)?;
        let account = client.resolve_account("jo")?;
        let repos = client.list_repositories(&account)?;
        Ok((account, repos, client.clone_credentials()))
    })
    .await??;

    assert_eq!(account.kind, AccountKind::User);
    assert_eq!(account.bio, None);
    assert_eq!(repos.len(), 1);
    assert_eq!(repos[0].owner, "jo");
    let creds = creds.unwrap();
    assert_eq!(creds.username, "oauth2");
    assert_eq!(creds.token, "glpat-123");
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_group_and_user_is_an_error() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v4/groups/ghost"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v4/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let api_url = api_url(&server);
    let message = tokio::task::spawn_blocking(move || -> Result<_> {
        let client = GitLabClient::new(api_url, "glpat-123".into(), false)?;
        Ok(client.resolve_account("ghost").unwrap_err().to_string())
    })
    .await??;
    assert_eq!(message, "No GitLab user or organization ghost was found");
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn low_quota_pauses_the_caller() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v4/groups/acme"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("RateLimit-Remaining", "60")
                .set_body_json(json!({"id": 42, "name": "Acme", "full_path": "acme"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v4/groups/plenty"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("RateLimit-Remaining", "1000")
                .set_body_json(json!({"id": 43, "name": "Plenty", "full_path": "plenty"})),
        )
        .mount(&server)
        .await;

    let api_url = api_url(&server);
    let (throttled, unthrottled) = tokio::task::spawn_blocking(move || -> Result<_> {
        let client = GitLabClient::new(api_url, "glpat-123".into(), false)?;
        let started = Instant::now();
        client.resolve_account("acme")?;
        let throttled = started.elapsed();
        let started = Instant::now();
        client.resolve_account("plenty")?;
        Ok((throttled, started.elapsed()))
    })
    .await??;

    assert!(throttled >= Duration::from_millis(950), "paused for {throttled:?}");
    assert!(unthrottled < Duration::from_millis(950), "paused for {unthrottled:?}");
    Ok(())
}
