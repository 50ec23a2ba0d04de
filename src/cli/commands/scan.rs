use std::path::PathBuf;

use clap::{Args, ValueHint};
use url::Url;

use crate::{github, gitlab, signatures::MatchMode};

/// `gitprowl scan` command and flags
#[derive(Args, Debug, Clone)]
pub struct ScanArgs {
    /// Users or organizations to scan
    #[arg(value_name = "LOGIN")]
    pub logins: Vec<String>,

    /// Number of commits to clone and analyze per repository
    #[arg(long, default_value_t = 500)]
    pub commit_depth: u32,

    /// Number of worker threads (0 uses the number of logical CPUs)
    #[arg(long, default_value_t = 0)]
    pub threads: usize,

    /// Do not add the members of an organization to the targets
    #[arg(long)]
    pub no_expand_orgs: bool,

    /// Matching mode: 1 = file paths, 2 = paths then content, 3 = content only
    #[arg(long, value_enum, default_value_t = MatchMode::PathOnly)]
    pub mode: MatchMode,

    /// Clone bare repositories. Objects still go to a temporary directory, but no working
    /// tree is checked out
    #[arg(long, alias = "in-mem-clone")]
    pub bare_clone: bool,

    #[command(flatten)]
    pub provider: ProviderArgs,

    /// JSON signature file to use instead of the built-in signatures
    #[arg(long, value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub signatures: Option<PathBuf>,

    /// Save the finished session to this file
    #[arg(long, value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub save: Option<PathBuf>,

    /// Load a session from this file instead of starting a new one
    #[arg(long, value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub load: Option<PathBuf>,
}

/// Provider credentials and endpoints
#[derive(Args, Debug, Clone)]
#[command(next_help_heading = "Provider Options")]
pub struct ProviderArgs {
    /// GitHub personal access token
    #[arg(long, env = "GITPROWL_GITHUB_ACCESS_TOKEN", hide_env_values = true)]
    pub github_access_token: Option<String>,

    /// GitLab personal access token
    #[arg(long, env = "GITPROWL_GITLAB_ACCESS_TOKEN", hide_env_values = true)]
    pub gitlab_access_token: Option<String>,

    /// Use the specified URL for GitHub API access (GitHub Enterprise)
    #[arg(long, default_value = github::DEFAULT_API_URL, value_hint = ValueHint::Url)]
    pub github_api_url: Url,

    /// Use the specified URL for GitLab API access (self-managed GitLab)
    #[arg(long, default_value = gitlab::DEFAULT_API_URL, value_hint = ValueHint::Url)]
    pub gitlab_api_url: Url,

    /// Username paired with the GitHub token when cloning
    #[arg(long, value_name = "USER")]
    pub github_enterprise_user: Option<String>,
}
