use std::{
    path::Path,
    process::{Command, ExitStatus, Output, Stdio},
};

use tempfile::TempDir;
use tracing::{debug, debug_span};

use crate::source_control::CloneCredentials;

const USERNAME_ENV: &str = "GITPROWL_CLONE_USERNAME";
const TOKEN_ENV: &str = "GITPROWL_CLONE_TOKEN";

const CREDENTIAL_HELPER: &str = r#"credential.helper=!_gpcreds() {
    if [ -n "$GITPROWL_CLONE_TOKEN" ]; then
        echo username="${GITPROWL_CLONE_USERNAME:-x-access-token}";
        echo password="$GITPROWL_CLONE_TOKEN";
    fi
}; _gpcreds"#;

/// Represents errors that can occur when interacting with the `git` CLI.
#[derive(Debug, thiserror::Error)]
pub enum GitError {
    #[error("git execution failed: {0}")]
    IOError(#[from] std::io::Error),

    #[error(
        "git execution failed (status: {status}){summary}",
        status = format_exit_status(.status),
        summary = format_git_error_summary(.stdout.as_slice(), .stderr.as_slice())
    )]
    GitError { stdout: Vec<u8>, stderr: Vec<u8>, status: ExitStatus },
}

impl GitError {
    fn stderr_mentions(&self, needle: &str) -> bool {
        match self {
            GitError::GitError { stderr, .. } => {
                String::from_utf8_lossy(stderr).to_lowercase().contains(needle)
            }
            GitError::IOError(_) => false,
        }
    }
}

fn format_exit_status(status: &ExitStatus) -> String {
    status.code().map(|code| code.to_string()).unwrap_or_else(|| status.to_string())
}

fn format_git_error_summary(stdout: &[u8], stderr: &[u8]) -> String {
    let mut messages = Vec::new();
    if let Some(line) = summarize_output(stderr) {
        messages.push(line);
    }
    if let Some(line) = summarize_output(stdout) {
        messages.push(line);
    }
    if messages.is_empty() {
        String::new()
    } else {
        format!(": {}", messages.join(" | "))
    }
}

fn summarize_output(output: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(output);
    text.lines().map(str::trim).find(|line| !line.is_empty()).map(|line| line.to_owned())
}

/// Failure to produce a usable clone.
#[derive(Debug, thiserror::Error)]
pub enum CloneError {
    /// The remote has no commits. Expected for freshly created repositories.
    #[error("repository is empty")]
    EmptyRepository,

    #[error(transparent)]
    Git(#[from] GitError),

    #[error("failed to create clone directory: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to open clone: {0}")]
    Open(#[from] git2::Error),
}

impl CloneError {
    pub fn is_empty_repository(&self) -> bool {
        matches!(self, CloneError::EmptyRepository)
    }
}

/// Where a clone's objects live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CloneStorage {
    /// Standard clone with a working tree
    #[default]
    Checkout,
    /// Object store only, no working tree is written
    ObjectsOnly,
}

impl CloneStorage {
    pub fn arg(&self) -> Option<&str> {
        match self {
            Self::ObjectsOnly => Some("--bare"),
            Self::Checkout => None,
        }
    }
}

/// Everything needed to clone one repository.
#[derive(Debug, Clone)]
pub struct CloneOptions<'a> {
    pub url: &'a str,
    pub branch: &'a str,
    pub depth: u32,
    pub storage: CloneStorage,
}

/// A clone living in a temporary directory that is removed on [`ClonedRepository::close`]
/// or drop.
pub struct ClonedRepository {
    pub repo: git2::Repository,
    dir: TempDir,
}

impl ClonedRepository {
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Release the repository handle and delete the clone from disk.
    pub fn close(self) -> std::io::Result<()> {
        let ClonedRepository { repo, dir } = self;
        drop(repo);
        dir.close()
    }
}

/// A helper struct for running `git` commands.
///
/// Credentials are handed to `git` through a credential helper that reads them from the child
/// process environment, so they never appear on a command line.
pub struct Git {
    credentials: Option<CloneCredentials>,
    ignore_certs: bool,
}

impl Git {
    /// * `ignore_certs`: If `true`, disables SSL certificate verification for `git` operations.
    pub fn new(credentials: Option<CloneCredentials>, ignore_certs: bool) -> Self {
        let credentials = credentials.filter(|c| !c.token.is_empty());
        Self { credentials, ignore_certs }
    }

    /// Create a basic `git` `Command` with environment variables set to
    /// limit config usage and (optionally) ignore certs.
    fn git(&self) -> Command {
        let mut cmd = Command::new("git");
        cmd.env("GIT_CONFIG_GLOBAL", "/dev/null");
        cmd.env("GIT_CONFIG_NOSYSTEM", "1");
        cmd.env("GIT_CONFIG_SYSTEM", "/dev/null");
        cmd.env("GIT_TERMINAL_PROMPT", "0");
        if self.ignore_certs {
            cmd.env("GIT_SSL_NO_VERIFY", "1");
        }
        if let Some(creds) = &self.credentials {
            cmd.env(USERNAME_ENV, &creds.username);
            cmd.env(TOKEN_ENV, &creds.token);
            cmd.arg("-c");
            cmd.arg("credential.helper=");
            cmd.arg("-c");
            cmd.arg(CREDENTIAL_HELPER);
        }
        cmd.stdin(Stdio::null());
        cmd
    }

    /// Helper to run the constructed `git` command and capture its output.
    ///
    /// Returns an error if the command fails or exits with a non-zero status.
    fn run_cmd(&self, mut cmd: Command) -> Result<(), GitError> {
        let output: Output = cmd.output()?;
        if !output.status.success() {
            return Err(GitError::GitError {
                stdout: output.stdout,
                stderr: output.stderr,
                status: output.status,
            });
        }
        Ok(())
    }

    /// Shallow, single-branch, tag-free clone into a fresh temporary directory.
    pub fn clone_repository(
        &self,
        options: &CloneOptions<'_>,
    ) -> Result<ClonedRepository, CloneError> {
        // Empty repositories report no default branch.
        if options.branch.is_empty() {
            return Err(CloneError::EmptyRepository);
        }
        let dir = tempfile::Builder::new().prefix("gitprowl").tempdir()?;
        let _span = debug_span!("git_clone", "{} {}", options.url, dir.path().display()).entered();

        let mut cmd = self.git();
        cmd.arg("clone");
        if let Some(arg) = options.storage.arg() {
            cmd.arg(arg);
        }
        cmd.arg("--quiet");
        cmd.arg("--depth");
        cmd.arg(options.depth.max(1).to_string());
        cmd.arg("--single-branch");
        cmd.arg("--branch");
        cmd.arg(options.branch);
        cmd.arg("--no-tags");
        cmd.arg(options.url);
        cmd.arg(dir.path());
        // Debug output of the command would include the credential environment.
        debug!("Cloning {} (branch {}, depth {})", options.url, options.branch, options.depth);
        if let Err(e) = self.run_cmd(cmd) {
            let missing_branch =
                format!("remote branch {} not found", options.branch.to_lowercase());
            if e.stderr_mentions("empty repository") || e.stderr_mentions(&missing_branch) {
                return Err(CloneError::EmptyRepository);
            }
            return Err(e.into());
        }

        let repo = git2::Repository::open(dir.path())?;
        if repo.is_empty()? {
            return Err(CloneError::EmptyRepository);
        }
        Ok(ClonedRepository { repo, dir })
    }
}

impl Default for Git {
    /// Equivalent to `Git::new(None, false)`
    fn default() -> Self {
        Self::new(None, false)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use git2::{Repository, Signature};
    use tempfile::TempDir;

    use super::*;

    fn commit_file(repo: &Repository, name: &str, contents: &str) {
        let workdir = repo.workdir().unwrap().to_owned();
        fs::write(workdir.join(name), contents).unwrap();
        let mut index = repo.index().unwrap();
        index.add_path(Path::new(name)).unwrap();
        index.write().unwrap();
        let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
        let sig = Signature::now("Test", "test@example.com").unwrap();
        let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();
        repo.commit(Some("HEAD"), &sig, &sig, "commit", &tree, &parents).unwrap();
    }

    fn file_url(path: &Path) -> String {
        format!("file://{}", path.display())
    }

    #[test]
    fn credentials_use_env_helper() {
        let git = Git::new(
            Some(CloneCredentials { username: "oauth2".into(), token: "s3cret".into() }),
            false,
        );
        let cmd = git.git();
        let args: Vec<_> = cmd.get_args().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(args.len(), 4);
        assert!(args.iter().all(|a| !a.contains("s3cret")));
        assert!(cmd
            .get_envs()
            .any(|(k, v)| k == TOKEN_ENV && v.map(|v| v == "s3cret").unwrap_or(false)));

        let anonymous = Git::new(
            Some(CloneCredentials { username: "oauth2".into(), token: String::new() }),
            false,
        );
        assert_eq!(anonymous.git().get_args().count(), 0);
    }

    #[test]
    fn storage_arg() {
        assert_eq!(CloneStorage::ObjectsOnly.arg(), Some("--bare"));
        assert_eq!(CloneStorage::Checkout.arg(), None);
    }

    #[test]
    fn clones_local_repository() {
        let origin = TempDir::new().unwrap();
        let repo = Repository::init(origin.path()).unwrap();
        commit_file(&repo, "a.txt", "one");
        commit_file(&repo, "b.txt", "two");
        let branch = repo.head().unwrap().shorthand().unwrap().to_string();

        let url = file_url(origin.path());
        for storage in [CloneStorage::Checkout, CloneStorage::ObjectsOnly] {
            let clone = Git::default()
                .clone_repository(&CloneOptions { url: &url, branch: &branch, depth: 1, storage })
                .unwrap();
            assert!(clone.repo.is_shallow());
            let path = clone.path().to_owned();
            clone.close().unwrap();
            assert!(!path.exists());
        }
    }

    #[test]
    fn empty_repository_is_distinguished() {
        let origin = TempDir::new().unwrap();
        Repository::init(origin.path()).unwrap();
        let url = file_url(origin.path());
        let err = Git::default()
            .clone_repository(&CloneOptions {
                url: &url,
                branch: "main",
                depth: 10,
                storage: CloneStorage::Checkout,
            })
            .err()
            .unwrap();
        assert!(err.is_empty_repository(), "{err}");

        let err = Git::default()
            .clone_repository(&CloneOptions {
                url: &url,
                branch: "",
                depth: 10,
                storage: CloneStorage::Checkout,
            })
            .err()
            .unwrap();
        assert!(err.is_empty_repository());
    }

    #[test]
    fn missing_remote_is_an_error() {
        let dir = TempDir::new().unwrap();
        let url = file_url(&dir.path().join("does-not-exist"));
        let err = Git::default()
            .clone_repository(&CloneOptions {
                url: &url,
                branch: "main",
                depth: 1,
                storage: CloneStorage::Checkout,
            })
            .err()
            .unwrap();
        assert!(matches!(err, CloneError::Git(GitError::GitError { .. })));
    }
}
