use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use reqwest::{blocking::Client, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use tracing::{debug, trace};
use url::Url;

use crate::{
    models::{Account, AccountKind, Repository},
    source_control::{api_base, CloneCredentials, ProviderKind, SourceControl},
};

pub const DEFAULT_API_URL: &str = "https://api.github.com/";
pub const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));
const PER_PAGE: usize = 100;

#[derive(Debug, Deserialize)]
struct GitHubAccount {
    id: i64,
    login: String,
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    avatar_url: Option<String>,
    #[serde(default)]
    html_url: Option<String>,
    #[serde(default)]
    company: Option<String>,
    #[serde(default)]
    blog: Option<String>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    bio: Option<String>,
}

impl From<GitHubAccount> for Account {
    fn from(a: GitHubAccount) -> Self {
        let kind = match a.kind.as_deref() {
            Some("Organization") => AccountKind::Organization,
            _ => AccountKind::User,
        };
        Account {
            id: a.id,
            login: a.login,
            kind,
            name: a.name,
            avatar_url: a.avatar_url,
            url: a.html_url,
            company: a.company,
            blog: a.blog.filter(|b| !b.is_empty()),
            location: a.location,
            email: a.email,
            bio: a.bio,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GitHubOwner {
    login: String,
}

#[derive(Debug, Deserialize)]
struct GitHubRepository {
    id: i64,
    name: String,
    full_name: String,
    owner: GitHubOwner,
    clone_url: String,
    html_url: String,
    #[serde(default)]
    default_branch: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    homepage: Option<String>,
    #[serde(default)]
    fork: bool,
}

impl From<GitHubRepository> for Repository {
    fn from(r: GitHubRepository) -> Self {
        Repository {
            id: r.id,
            owner: r.owner.login,
            name: r.name,
            full_name: r.full_name,
            clone_url: r.clone_url,
            url: r.html_url,
            default_branch: r.default_branch.unwrap_or_default(),
            description: r.description,
            homepage: r.homepage,
        }
    }
}

/// GitHub and GitHub Enterprise REST API provider.
pub struct GitHubClient {
    client: Client,
    api_url: Url,
    web_url: String,
    token: String,
    clone_username: Option<String>,
}

impl GitHubClient {
    pub fn new(
        api_url: Url,
        token: String,
        clone_username: Option<String>,
        ignore_certs: bool,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(USER_AGENT)
            .danger_accept_invalid_certs(ignore_certs)
            .build()
            .context("Failed to build HTTP client")?;
        let api_url = api_base(api_url);
        let web_url = web_url_for(&api_url);
        Ok(Self { client, api_url, web_url, token, clone_username })
    }

    fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        trace!("GET {url}");
        let resp = self
            .client
            .get(url.clone())
            .header("Accept", "application/vnd.github+json")
            .bearer_auth(&self.token)
            .send()
            .with_context(|| format!("Failed to reach {url}"))?;
        match resp.status() {
            StatusCode::OK => {}
            StatusCode::NOT_FOUND => return Err(anyhow!("{url} was not found")),
            status => return Err(anyhow!("GitHub API request to {url} failed (status {status})")),
        }
        resp.json().with_context(|| format!("Failed to decode response from {url}"))
    }

    fn get_paged<T: DeserializeOwned>(&self, endpoint: &str, kind: Option<&str>) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut page = 1u32;
        loop {
            let mut url = self.api_url.join(endpoint)?;
            {
                let mut query = url.query_pairs_mut();
                if let Some(kind) = kind {
                    query.append_pair("type", kind);
                }
                query.append_pair("per_page", &PER_PAGE.to_string());
                query.append_pair("page", &page.to_string());
            }
            let batch: Vec<T> = self.get(url)?;
            let len = batch.len();
            items.extend(batch);
            if len < PER_PAGE {
                break;
            }
            page += 1;
        }
        Ok(items)
    }
}

/// Web host for links, derived from the API base.
fn web_url_for(api_url: &Url) -> String {
    match api_url.host_str() {
        None | Some("api.github.com") => ProviderKind::GitHub.public_web_url().to_string(),
        Some(host) => match api_url.port() {
            Some(port) => format!("{}://{host}:{port}", api_url.scheme()),
            None => format!("{}://{host}", api_url.scheme()),
        },
    }
}

impl SourceControl for GitHubClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::GitHub
    }

    fn web_url(&self) -> &str {
        &self.web_url
    }

    fn resolve_account(&self, login: &str) -> Result<Account> {
        let url = self.api_url.join(&format!("users/{login}"))?;
        let account: GitHubAccount = self.get(url)?;
        Ok(account.into())
    }

    fn list_repositories(&self, account: &Account) -> Result<Vec<Repository>> {
        let repos: Vec<GitHubRepository> = match account.kind {
            AccountKind::User => {
                self.get_paged(&format!("users/{}/repos", account.login), Some("owner"))?
            }
            AccountKind::Organization => {
                self.get_paged(&format!("orgs/{}/repos", account.login), Some("sources"))?
            }
        };
        let total = repos.len();
        let repos: Vec<Repository> =
            repos.into_iter().filter(|r| !r.fork).map(Repository::from).collect();
        debug!("{}: {} repositories, {} after excluding forks", account.login, total, repos.len());
        Ok(repos)
    }

    fn list_members(&self, account: &Account) -> Result<Vec<Account>> {
        let members: Vec<GitHubAccount> =
            self.get_paged(&format!("orgs/{}/members", account.login), None)?;
        Ok(members.into_iter().map(Account::from).collect())
    }

    fn clone_credentials(&self) -> Option<CloneCredentials> {
        Some(CloneCredentials {
            username: self.clone_username.clone().unwrap_or_else(|| "x-access-token".to_string()),
            token: self.token.clone(),
        })
    }
}
