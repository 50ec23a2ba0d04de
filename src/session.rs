use std::{
    fs,
    path::Path,
    sync::{Mutex, MutexGuard, PoisonError},
};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;

use crate::{
    finding::Finding,
    models::{Account, Repository},
};

pub const SESSION_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Lifecycle phase of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Status {
    #[default]
    Initializing,
    Gathering,
    Analyzing,
    Finished,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub status: Status,
    pub progress: f64,
    pub targets: u64,
    pub repositories: u64,
    pub commits: u64,
    pub files: u64,
    pub findings: u64,
}

impl Default for Stats {
    fn default() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            status: Status::Initializing,
            progress: 0.0,
            targets: 0,
            repositories: 0,
            commits: 0,
            files: 0,
            findings: 0,
        }
    }
}

/// Percentage of `current` out of `total`, saturating at 100.
pub fn progress_percent(current: u64, total: u64) -> f64 {
    if current >= total {
        100.0
    } else {
        100.0 * current as f64 / total as f64
    }
}

impl Stats {
    pub fn update_progress(&mut self, current: u64, total: u64) {
        self.progress = progress_percent(current, total);
    }

    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at.unwrap_or_else(Utc::now) - self.started_at
    }
}

#[derive(Debug, Default)]
struct Lists {
    targets: Vec<Account>,
    repositories: Vec<Repository>,
    findings: Vec<Finding>,
}

/// Serializable copy of everything a session has gathered. Contains no credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub version: String,
    pub stats: Stats,
    pub targets: Vec<Account>,
    pub repositories: Vec<Repository>,
    pub findings: Vec<Finding>,
}

/// Shared state for one run.
///
/// The target/repository/finding lists and the statistics are guarded by separate locks so
/// counter updates never wait on list insertion.
#[derive(Debug, Default)]
pub struct Session {
    lists: Mutex<Lists>,
    stats: Mutex<Stats>,
}

/// Every critical section leaves the guarded data consistent, so a poisoned lock is still usable.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert unless an account with the same ID is present. Returns whether it was added.
    pub fn add_target(&self, account: Account) -> bool {
        let mut lists = lock(&self.lists);
        if lists.targets.iter().any(|t| t.id == account.id) {
            return false;
        }
        lists.targets.push(account);
        true
    }

    /// Insert unless a repository with the same ID is present. Returns whether it was added.
    pub fn add_repository(&self, repository: Repository) -> bool {
        let mut lists = lock(&self.lists);
        if lists.repositories.iter().any(|r| r.id == repository.id) {
            return false;
        }
        lists.repositories.push(repository);
        true
    }

    /// Append a finding and bump the findings counter.
    pub fn add_finding(&self, finding: Finding) {
        lock(&self.lists).findings.push(finding);
        lock(&self.stats).findings += 1;
    }

    pub fn targets(&self) -> Vec<Account> {
        lock(&self.lists).targets.clone()
    }

    pub fn repositories(&self) -> Vec<Repository> {
        lock(&self.lists).repositories.clone()
    }

    pub fn findings(&self) -> Vec<Finding> {
        lock(&self.lists).findings.clone()
    }

    pub fn stats(&self) -> Stats {
        lock(&self.stats).clone()
    }

    pub fn set_status(&self, status: Status) {
        lock(&self.stats).status = status;
    }

    pub fn increment_targets(&self) {
        lock(&self.stats).targets += 1;
    }

    pub fn increment_commits(&self) {
        lock(&self.stats).commits += 1;
    }

    pub fn increment_files(&self) {
        lock(&self.stats).files += 1;
    }

    /// Count one more repository as processed and recompute progress against `total`.
    pub fn finish_repository(&self, total: u64) {
        let mut stats = lock(&self.stats);
        stats.repositories += 1;
        let done = stats.repositories;
        stats.update_progress(done, total);
    }

    /// Mark the run finished and stamp its end time.
    pub fn finish(&self) {
        let mut stats = lock(&self.stats);
        stats.status = Status::Finished;
        stats.finished_at = Some(Utc::now());
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let stats = self.stats();
        let lists = lock(&self.lists);
        SessionSnapshot {
            version: SESSION_VERSION.to_string(),
            stats,
            targets: lists.targets.clone(),
            repositories: lists.repositories.clone(),
            findings: lists.findings.clone(),
        }
    }

    pub fn from_snapshot(snapshot: SessionSnapshot) -> Self {
        Self {
            lists: Mutex::new(Lists {
                targets: snapshot.targets,
                repositories: snapshot.repositories,
                findings: snapshot.findings,
            }),
            stats: Mutex::new(snapshot.stats),
        }
    }

    /// Write the session as JSON. Refuses to overwrite an existing file.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.snapshot())
            .context("Failed to serialize session")?;
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .with_context(|| format!("Failed to create session file {}", path.display()))?;
        std::io::Write::write_all(&mut file, json.as_bytes())
            .with_context(|| format!("Failed to write session file {}", path.display()))?;
        Ok(())
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("Failed to read session file {}", path.display()))?;
        let snapshot: SessionSnapshot = serde_json::from_str(&data)
            .with_context(|| format!("Failed to parse session file {}", path.display()))?;
        Ok(Self::from_snapshot(snapshot))
    }
}
