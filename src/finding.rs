use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use strum::Display;

use crate::{
    models::Repository,
    signatures::{Signature, SignatureMatch},
    source_control::ProviderKind,
};

/// How a file was touched by a commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum ChangeAction {
    Insert,
    Modify,
    Delete,
    Unknown,
}

/// The commit a finding was observed in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
    pub hash: String,
    pub message: String,
    pub author: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub id: String,
    pub file_path: String,
    pub action: ChangeAction,
    pub path_signature_description: Option<String>,
    pub path_signature_comment: Option<String>,
    pub content_signature_description: Option<String>,
    pub content_signature_comment: Option<String>,
    pub repository_owner: String,
    pub repository_name: String,
    pub clone_url: String,
    pub commit_hash: String,
    pub commit_message: String,
    pub commit_author: String,
    pub repository_url: String,
    pub file_url: String,
    pub commit_url: String,
}

impl Finding {
    /// The most specific description available, preferring the content tier.
    pub fn description(&self) -> &str {
        self.content_signature_description
            .as_deref()
            .or(self.path_signature_description.as_deref())
            .unwrap_or_default()
    }

    pub fn comment(&self) -> Option<&str> {
        self.content_signature_comment.as_deref().or(self.path_signature_comment.as_deref())
    }
}

/// Content-addressed identity of a finding.
pub fn finding_id(
    file_path: &str,
    action: ChangeAction,
    owner: &str,
    repository: &str,
    commit: &CommitInfo,
) -> String {
    let mut hasher = Sha1::new();
    hasher.update(file_path.as_bytes());
    hasher.update(action.to_string().as_bytes());
    hasher.update(owner.as_bytes());
    hasher.update(repository.as_bytes());
    hasher.update(commit.hash.as_bytes());
    hasher.update(commit.message.as_bytes());
    hasher.update(commit.author.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Fold newlines, trim, and cut `s` to at most `max_len` characters, marking a cut with `...`.
pub fn truncate_message(s: &str, max_len: usize) -> String {
    let folded = s.replace('\n', " ");
    let folded = folded.trim();
    if folded.chars().count() <= max_len {
        return folded.to_string();
    }
    let cut: String = folded.chars().take(max_len).collect();
    format!("{cut}...")
}

/// Builds [`Finding`]s with web URLs for one hosting provider.
#[derive(Debug, Clone)]
pub struct FindingFactory {
    provider: ProviderKind,
    web_base: String,
}

impl FindingFactory {
    pub fn new(provider: ProviderKind, web_base: &str) -> Self {
        Self { provider, web_base: web_base.trim_end_matches('/').to_string() }
    }

    /// A factory pointed at the public instance of `provider`.
    pub fn public(provider: ProviderKind) -> Self {
        Self::new(provider, provider.public_web_url())
    }

    fn repository_url(&self, owner: &str, name: &str) -> String {
        match self.provider {
            ProviderKind::GitHub => format!("{}/{owner}/{name}", self.web_base),
            ProviderKind::GitLab => format!(
                "{}/{}/{}",
                self.web_base,
                owner.replace(' ', "-"),
                name.replace(' ', "-")
            ),
        }
    }

    pub fn create(
        &self,
        repository: &Repository,
        commit: &CommitInfo,
        file_path: &str,
        action: ChangeAction,
        matched: SignatureMatch<'_>,
    ) -> Finding {
        let message = commit.message.trim().to_string();
        let commit = CommitInfo { message, ..commit.clone() };
        let repository_url = self.repository_url(&repository.owner, &repository.name);
        let (file_url, commit_url) = match self.provider {
            ProviderKind::GitHub => (
                format!("{repository_url}/blob/{}/{file_path}", commit.hash),
                format!("{repository_url}/commit/{}", commit.hash),
            ),
            ProviderKind::GitLab => (
                format!("{repository_url}/-/blob/{}/{file_path}", commit.hash),
                format!("{repository_url}/-/commit/{}", commit.hash),
            ),
        };
        let describe = |sig: Option<&Signature>| {
            (sig.map(|s| s.description.clone()), sig.and_then(|s| s.comment.clone()))
        };
        let (path_signature_description, path_signature_comment) = describe(matched.path);
        let (content_signature_description, content_signature_comment) = describe(matched.content);

        Finding {
            id: finding_id(file_path, action, &repository.owner, &repository.name, &commit),
            file_path: file_path.to_string(),
            action,
            path_signature_description,
            path_signature_comment,
            content_signature_description,
            content_signature_comment,
            repository_owner: repository.owner.clone(),
            repository_name: repository.name.clone(),
            clone_url: repository.clone_url.clone(),
            commit_hash: commit.hash,
            commit_message: commit.message,
            commit_author: commit.author,
            repository_url,
            file_url,
            commit_url,
        }
    }
}
