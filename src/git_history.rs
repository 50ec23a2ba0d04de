use std::path::Path;

use git2::{Commit, Delta, DiffDelta, Oid, Repository, Sort};
use tracing::debug;

use crate::finding::{ChangeAction, CommitInfo};

/// One file touched by a commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub action: ChangeAction,
    pub path: String,
    /// Blob holding the file's content: the pre-image for deletions, the post-image otherwise.
    pub blob_id: Oid,
}

/// Commits reachable from HEAD along first parents, newest first.
pub fn history(repo: &Repository) -> Result<Vec<Commit<'_>>, git2::Error> {
    let mut revwalk = repo.revwalk()?;
    revwalk.push_head()?;
    revwalk.simplify_first_parent()?;
    revwalk.set_sorting(Sort::TOPOLOGICAL)?;
    revwalk.map(|oid| oid.and_then(|oid| repo.find_commit(oid))).collect()
}

pub fn commit_info(commit: &Commit<'_>) -> CommitInfo {
    let author = commit.author();
    CommitInfo {
        hash: commit.id().to_string(),
        message: commit.message().unwrap_or_default().trim().to_string(),
        author: format!(
            "{} <{}>",
            author.name().unwrap_or_default(),
            author.email().unwrap_or_default()
        ),
    }
}

fn action_for(status: Delta) -> ChangeAction {
    match status {
        Delta::Added => ChangeAction::Insert,
        Delta::Modified => ChangeAction::Modify,
        Delta::Deleted => ChangeAction::Delete,
        _ => ChangeAction::Unknown,
    }
}

fn path_string(path: Option<&Path>) -> String {
    path.map(|p| p.to_string_lossy().into_owned()).unwrap_or_default()
}

fn change_for(delta: &DiffDelta<'_>) -> Change {
    let action = action_for(delta.status());
    let file = if action == ChangeAction::Delete { delta.old_file() } else { delta.new_file() };
    Change { action, path: path_string(file.path()), blob_id: file.id() }
}

/// Parent lines stored in the commit object itself, ignoring shallow grafts, which make boundary
/// commits look parentless.
fn recorded_parent_count(repo: &Repository, commit: &Commit<'_>) -> Result<usize, git2::Error> {
    let odb = repo.odb()?;
    let object = odb.read(commit.id())?;
    let count = object
        .data()
        .split(|b| *b == b'\n')
        .take_while(|line| !line.is_empty())
        .filter(|line| line.starts_with(b"parent "))
        .count();
    Ok(count)
}

/// Files changed by `commit` relative to its first parent. A root commit is compared with the
/// empty tree. A commit on a shallow clone's boundary yields no changes.
pub fn diff(repo: &Repository, commit: &Commit<'_>) -> Result<Vec<Change>, git2::Error> {
    let tree = commit.tree()?;
    let parent_tree = if recorded_parent_count(repo, commit)? == 0 {
        None
    } else if commit.parent_count() == 0 {
        debug!("Skipping diff of {}: shallow boundary", commit.id());
        return Ok(Vec::new());
    } else {
        match commit.parent(0).and_then(|parent| parent.tree()) {
            Ok(tree) => Some(tree),
            Err(e) => {
                debug!("Skipping diff of {}: parent unavailable: {}", commit.id(), e.message());
                return Ok(Vec::new());
            }
        }
    };
    let diff = repo.diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), None)?;
    Ok(diff.deltas().map(|delta| change_for(&delta)).collect())
}

pub fn blob_content(repo: &Repository, id: Oid) -> Result<Vec<u8>, git2::Error> {
    Ok(repo.find_blob(id)?.content().to_vec())
}
