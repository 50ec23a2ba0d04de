use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Result;
use thiserror::Error;
use url::Url;

use crate::{
    cli::commands::scan::ScanArgs,
    git_binary::CloneStorage,
    github::GitHubClient,
    gitlab::GitLabClient,
    session::{SessionSnapshot, Status},
    signatures::MatchMode,
    source_control::{ProviderKind, SourceControl},
};

/// Conditions that stop a run before any phase starts.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Both a GitHub and a GitLab access token are set; only one may be used per run")]
    ConflictingCredentials,

    #[error(
        "No access token set. Use --github-access-token (GITPROWL_GITHUB_ACCESS_TOKEN) or \
         --gitlab-access-token (GITPROWL_GITLAB_ACCESS_TOKEN)"
    )]
    MissingCredentials,

    #[error("Session file {0} already exists; refusing to overwrite it")]
    OutputExists(PathBuf),

    #[error("Session file {0} does not exist")]
    SessionNotFound(PathBuf),

    #[error("Session file {path} could not be read: {reason}")]
    CorruptSession { path: PathBuf, reason: String },

    #[error("No users or organizations to scan")]
    NoTargets,
}

/// The provider chosen for the run and how to reach it.
#[derive(Clone)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    pub token: String,
    pub api_url: Url,
    pub clone_username: Option<String>,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("kind", &self.kind)
            .field("token", &"<redacted>")
            .field("api_url", &self.api_url.as_str())
            .field("clone_username", &self.clone_username)
            .finish()
    }
}

impl ProviderConfig {
    pub fn build_client(&self, ignore_certs: bool) -> Result<Box<dyn SourceControl>> {
        Ok(match self.kind {
            ProviderKind::GitHub => Box::new(GitHubClient::new(
                self.api_url.clone(),
                self.token.clone(),
                self.clone_username.clone(),
                ignore_certs,
            )?),
            ProviderKind::GitLab => Box::new(GitLabClient::new(
                self.api_url.clone(),
                self.token.clone(),
                ignore_certs,
            )?),
        })
    }
}

/// Validated settings for one `scan` run.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub logins: Vec<String>,
    pub commit_depth: u32,
    /// Worker bound, already resolved from `--threads 0`.
    pub threads: usize,
    pub expand_orgs: bool,
    pub mode: MatchMode,
    pub storage: CloneStorage,
    /// `None` only when a finished session was loaded.
    pub provider: Option<ProviderConfig>,
    pub signatures_path: Option<PathBuf>,
    pub save_path: Option<PathBuf>,
    pub loaded_session: Option<SessionSnapshot>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            logins: Vec::new(),
            commit_depth: 500,
            threads: num_cpus::get(),
            expand_orgs: true,
            mode: MatchMode::default(),
            storage: CloneStorage::default(),
            provider: None,
            signatures_path: None,
            save_path: None,
            loaded_session: None,
        }
    }
}

impl ScanConfig {
    pub fn from_args(args: &ScanArgs) -> Result<Self, ConfigError> {
        let loaded_session = match &args.load {
            Some(path) => Some(load_snapshot(path)?),
            None => None,
        };
        let finished = loaded_session
            .as_ref()
            .map(|snapshot| snapshot.stats.status == Status::Finished)
            .unwrap_or(false);

        let provider = select_provider(args)?;
        if provider.is_none() && !finished {
            return Err(ConfigError::MissingCredentials);
        }
        if args.logins.is_empty() && loaded_session.is_none() {
            return Err(ConfigError::NoTargets);
        }
        if let Some(path) = &args.save {
            if path.exists() {
                return Err(ConfigError::OutputExists(path.clone()));
            }
        }

        let threads = if args.threads == 0 { num_cpus::get() } else { args.threads };
        let storage =
            if args.bare_clone { CloneStorage::ObjectsOnly } else { CloneStorage::Checkout };

        Ok(Self {
            logins: args.logins.clone(),
            commit_depth: args.commit_depth,
            threads,
            expand_orgs: !args.no_expand_orgs,
            mode: args.mode,
            storage,
            provider,
            signatures_path: args.signatures.clone(),
            save_path: args.save.clone(),
            loaded_session,
        })
    }
}

fn non_empty(token: &Option<String>) -> Option<String> {
    token.as_deref().map(str::trim).filter(|t| !t.is_empty()).map(str::to_string)
}

fn select_provider(args: &ScanArgs) -> Result<Option<ProviderConfig>, ConfigError> {
    let provider = &args.provider;
    match (non_empty(&provider.github_access_token), non_empty(&provider.gitlab_access_token)) {
        (Some(_), Some(_)) => Err(ConfigError::ConflictingCredentials),
        (Some(token), None) => Ok(Some(ProviderConfig {
            kind: ProviderKind::GitHub,
            token,
            api_url: provider.github_api_url.clone(),
            clone_username: provider.github_enterprise_user.clone(),
        })),
        (None, Some(token)) => Ok(Some(ProviderConfig {
            kind: ProviderKind::GitLab,
            token,
            api_url: provider.gitlab_api_url.clone(),
            clone_username: None,
        })),
        (None, None) => Ok(None),
    }
}

fn load_snapshot(path: &Path) -> Result<SessionSnapshot, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::SessionNotFound(path.to_owned()));
    }
    let corrupt = |reason: String| ConfigError::CorruptSession { path: path.to_owned(), reason };
    let data = fs::read_to_string(path).map_err(|e| corrupt(e.to_string()))?;
    serde_json::from_str(&data).map_err(|e| corrupt(e.to_string()))
}
