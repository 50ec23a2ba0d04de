use anyhow::Result;
use serde::{Deserialize, Serialize};
use strum::Display;

use crate::models::{Account, Repository};

/// Hosting provider flavor. Decides API shape, clone credentials, and web URL layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum ProviderKind {
    #[strum(serialize = "GitHub")]
    GitHub,
    #[strum(serialize = "GitLab")]
    GitLab,
}

impl ProviderKind {
    pub fn public_web_url(self) -> &'static str {
        match self {
            ProviderKind::GitHub => "https://github.com",
            ProviderKind::GitLab => "https://gitlab.com",
        }
    }
}

/// Username/token pair handed to `git` when cloning private repositories.
#[derive(Clone, PartialEq, Eq)]
pub struct CloneCredentials {
    pub username: String,
    pub token: String,
}

impl std::fmt::Debug for CloneCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloneCredentials")
            .field("username", &self.username)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// What the scanner needs from a hosting provider. Pagination and throttling stay inside
/// the implementation; callers only see complete results.
pub trait SourceControl: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// Base URL for repository, file, and commit links.
    fn web_url(&self) -> &str {
        self.kind().public_web_url()
    }

    /// Look up a user or organization by login.
    fn resolve_account(&self, login: &str) -> Result<Account>;

    /// Every non-fork repository owned by `account`.
    fn list_repositories(&self, account: &Account) -> Result<Vec<Repository>>;

    /// Members of an organization account.
    fn list_members(&self, account: &Account) -> Result<Vec<Account>>;

    fn clone_credentials(&self) -> Option<CloneCredentials> {
        None
    }
}

/// Normalize an API base so relative endpoints join beneath it rather than replacing its
/// last path segment.
pub fn api_base(mut url: url::Url) -> url::Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
