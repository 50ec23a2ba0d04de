use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use reqwest::{blocking::Client, header::HeaderMap, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use tracing::{debug, trace};
use url::Url;

use crate::{
    github::USER_AGENT,
    models::{Account, AccountKind, Repository},
    rate_limit,
    source_control::{api_base, CloneCredentials, ProviderKind, SourceControl},
};

pub const DEFAULT_API_URL: &str = "https://gitlab.com/api/v4/";
const PER_PAGE: &str = "100";
const NEXT_PAGE_HEADER: &str = "X-Next-Page";

#[derive(Debug, Deserialize)]
struct GitLabUser {
    id: i64,
    username: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    avatar_url: Option<String>,
    #[serde(default)]
    web_url: Option<String>,
    #[serde(default)]
    organization: Option<String>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    public_email: Option<String>,
    #[serde(default)]
    bio: Option<String>,
}

impl From<GitLabUser> for Account {
    fn from(u: GitLabUser) -> Self {
        Account {
            id: u.id,
            login: u.username,
            kind: AccountKind::User,
            name: u.name,
            avatar_url: u.avatar_url,
            url: u.web_url,
            company: u.organization.filter(|s| !s.is_empty()),
            blog: None,
            location: u.location.filter(|s| !s.is_empty()),
            email: u.public_email.filter(|s| !s.is_empty()),
            bio: u.bio.filter(|s| !s.is_empty()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GitLabGroup {
    id: i64,
    name: String,
    full_path: String,
    #[serde(default)]
    full_name: Option<String>,
    #[serde(default)]
    avatar_url: Option<String>,
    #[serde(default)]
    web_url: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

impl From<GitLabGroup> for Account {
    fn from(g: GitLabGroup) -> Self {
        Account {
            id: g.id,
            login: g.full_path,
            kind: AccountKind::Organization,
            name: Some(g.name),
            avatar_url: g.avatar_url,
            url: g.web_url,
            company: g.full_name,
            blog: None,
            location: None,
            email: None,
            bio: g.description.filter(|s| !s.is_empty()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GitLabNamespace {
    full_path: String,
}

#[derive(Debug, Deserialize)]
struct GitLabOwner {
    username: String,
}

#[derive(Debug, Deserialize)]
struct GitLabProject {
    id: i64,
    name: String,
    #[serde(default)]
    name_with_namespace: Option<String>,
    path_with_namespace: String,
    http_url_to_repo: String,
    web_url: String,
    #[serde(default)]
    default_branch: Option<String>,
    #[serde(default)]
    description: Option<String>,
    namespace: GitLabNamespace,
    #[serde(default)]
    owner: Option<GitLabOwner>,
    #[serde(default)]
    forked_from_project: Option<serde_json::Value>,
}

impl GitLabProject {
    fn is_fork(&self) -> bool {
        matches!(&self.forked_from_project, Some(v) if !v.is_null())
    }

    fn into_repository(self, kind: AccountKind) -> Repository {
        let owner = match (kind, self.owner) {
            (AccountKind::User, Some(owner)) => owner.username,
            _ => self.namespace.full_path,
        };
        Repository {
            id: self.id,
            owner,
            name: self.name,
            full_name: self.name_with_namespace.unwrap_or(self.path_with_namespace),
            clone_url: self.http_url_to_repo,
            url: self.web_url.clone(),
            default_branch: self.default_branch.unwrap_or_default(),
            description: self.description.filter(|s| !s.is_empty()),
            homepage: Some(self.web_url),
        }
    }
}

/// GitLab REST API (v4) provider. Every response's quota headers feed
/// [`rate_limit::throttle`].
pub struct GitLabClient {
    client: Client,
    api_url: Url,
    web_url: String,
    token: String,
}

impl GitLabClient {
    pub fn new(api_url: Url, token: String, ignore_certs: bool) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(USER_AGENT)
            .danger_accept_invalid_certs(ignore_certs)
            .build()
            .context("Failed to build HTTP client")?;
        let api_url = api_base(api_url);
        let web_url = match api_url.host_str() {
            Some(host) => match api_url.port() {
                Some(port) => format!("{}://{host}:{port}", api_url.scheme()),
                None => format!("{}://{host}", api_url.scheme()),
            },
            None => ProviderKind::GitLab.public_web_url().to_string(),
        };
        Ok(Self { client, api_url, web_url, token })
    }

    /// Issue a GET. `Ok(None)` means the resource does not exist.
    fn get<T: DeserializeOwned>(&self, url: Url) -> Result<Option<(T, HeaderMap)>> {
        trace!("GET {url}");
        let resp = self
            .client
            .get(url.clone())
            .header("PRIVATE-TOKEN", &self.token)
            .send()
            .with_context(|| format!("Failed to reach {url}"))?;
        let headers = resp.headers().clone();
        rate_limit::throttle(&headers);
        match resp.status() {
            StatusCode::OK => {}
            StatusCode::NOT_FOUND => return Ok(None),
            status => bail!("GitLab API request to {url} failed (status {status})"),
        }
        let body = resp.json().with_context(|| format!("Failed to decode response from {url}"))?;
        Ok(Some((body, headers)))
    }

    fn get_paged<T: DeserializeOwned>(&self, endpoint: &str) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut page = String::from("1");
        loop {
            let mut url = self.api_url.join(endpoint)?;
            url.query_pairs_mut().append_pair("per_page", PER_PAGE).append_pair("page", &page);
            let (batch, headers): (Vec<T>, _) =
                self.get(url.clone())?.ok_or_else(|| anyhow!("{url} was not found"))?;
            items.extend(batch);
            match headers.get(NEXT_PAGE_HEADER).and_then(|v| v.to_str().ok()).map(str::trim) {
                Some(next) if !next.is_empty() => page = next.to_string(),
                _ => break,
            }
        }
        Ok(items)
    }

    fn find_group(&self, login: &str) -> Result<Option<GitLabGroup>> {
        let mut url = self.api_url.join("groups/")?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("GitLab API URL cannot be a base"))?
            .pop_if_empty()
            .push(login);
        Ok(self.get(url)?.map(|(group, _)| group))
    }

    fn find_user(&self, login: &str) -> Result<Option<GitLabUser>> {
        let mut url = self.api_url.join("users")?;
        url.query_pairs_mut().append_pair("username", login);
        let users: Vec<GitLabUser> = self.get(url)?.map(|(users, _)| users).unwrap_or_default();
        Ok(users.into_iter().next())
    }
}

impl SourceControl for GitLabClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::GitLab
    }

    fn web_url(&self) -> &str {
        &self.web_url
    }

    fn resolve_account(&self, login: &str) -> Result<Account> {
        if let Some(group) = self.find_group(login)? {
            debug!("Resolved GitLab group {login} to ID {}", group.id);
            return Ok(group.into());
        }
        match self.find_user(login)? {
            Some(user) => Ok(user.into()),
            None => bail!("No GitLab user or organization {login} was found"),
        }
    }

    fn list_repositories(&self, account: &Account) -> Result<Vec<Repository>> {
        let endpoint = match account.kind {
            AccountKind::User => format!("users/{}/projects", account.id),
            AccountKind::Organization => format!("groups/{}/projects", account.id),
        };
        let projects: Vec<GitLabProject> = self.get_paged(&endpoint)?;
        let total = projects.len();
        let repos: Vec<Repository> = projects
            .into_iter()
            .filter(|p| !p.is_fork())
            .map(|p| p.into_repository(account.kind))
            .collect();
        debug!("{}: {} projects, {} after excluding forks", account.login, total, repos.len());
        Ok(repos)
    }

    fn list_members(&self, account: &Account) -> Result<Vec<Account>> {
        let members: Vec<GitLabUser> =
            self.get_paged(&format!("groups/{}/members/all", account.id))?;
        Ok(members.into_iter().map(Account::from).collect())
    }

    fn clone_credentials(&self) -> Option<CloneCredentials> {
        Some(CloneCredentials { username: "oauth2".to_string(), token: self.token.clone() })
    }
}
