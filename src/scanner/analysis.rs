use anyhow::Result;
use indicatif::ProgressBar;
use tracing::{debug, debug_span, error, info, trace, warn};

use crate::{
    finding::{Finding, FindingFactory},
    git_binary::{CloneOptions, CloneStorage, ClonedRepository, Git},
    git_history::{self, blob_content},
    models::Repository,
    reporter::FindingReporter,
    scanner::pool::WorkerPool,
    session::Session,
    signatures::{MatchCandidate, MatchMode, SignatureSet},
};

#[derive(Debug, Clone, Copy)]
pub struct AnalysisOptions {
    pub mode: MatchMode,
    pub commit_depth: u32,
    pub storage: CloneStorage,
}

/// Clones each collected repository, walks its history, and records findings.
pub struct Analyzer<'a> {
    session: &'a Session,
    signatures: &'a SignatureSet,
    git: &'a Git,
    factory: FindingFactory,
    reporter: Option<&'a FindingReporter>,
    options: AnalysisOptions,
}

impl<'a> Analyzer<'a> {
    pub fn new(
        session: &'a Session,
        signatures: &'a SignatureSet,
        git: &'a Git,
        factory: FindingFactory,
        options: AnalysisOptions,
    ) -> Self {
        Self { session, signatures, git, factory, reporter: None, options }
    }

    /// Print each finding as it is recorded.
    pub fn with_reporter(mut self, reporter: &'a FindingReporter) -> Self {
        self.reporter = Some(reporter);
        self
    }

    pub fn analyze_repositories(&self, pool: &WorkerPool, progress: &ProgressBar) -> Result<()> {
        let repositories = self.session.repositories();
        let total = repositories.len() as u64;
        info!("Analyzing {total} repositories in mode {}...", self.options.mode);
        progress.set_length(total);

        pool.run(repositories, |repository: Repository| {
            self.analyze_repository(&repository, total, progress);
            progress.inc(1);
        })?;

        progress.finish_and_clear();
        Ok(())
    }

    /// Analyze one repository. Every outcome counts it as processed.
    pub fn analyze_repository(&self, repository: &Repository, total: u64, progress: &ProgressBar) {
        let _span = debug_span!("analyze", repo = %repository.full_name).entered();
        let options = CloneOptions {
            url: &repository.clone_url,
            branch: &repository.default_branch,
            depth: self.options.commit_depth,
            storage: self.options.storage,
        };
        match self.git.clone_repository(&options) {
            Ok(clone) => {
                self.scan_clone(&clone, repository, progress);
                let path = clone.path().to_owned();
                if let Err(e) = clone.close() {
                    progress.suspend(|| {
                        warn!(
                            "Failed to delete clone of {} at {}: {e}",
                            repository.full_name,
                            path.display()
                        )
                    });
                }
            }
            Err(e) if e.is_empty_repository() => {
                debug!("{} is empty; skipping", repository.full_name);
            }
            Err(e) => {
                progress.suspend(|| error!("Failed to clone {}: {e}", repository.full_name));
            }
        }
        self.session.finish_repository(total);
    }

    fn scan_clone(
        &self,
        clone: &ClonedRepository,
        repository: &Repository,
        progress: &ProgressBar,
    ) {
        let commits = match git_history::history(&clone.repo) {
            Ok(commits) => commits,
            Err(e) => {
                progress.suspend(|| {
                    error!("Failed to read history of {}: {}", repository.full_name, e.message())
                });
                return;
            }
        };
        debug!("{} commits to analyze", commits.len());

        for commit in &commits {
            let info = git_history::commit_info(commit);
            let changes = match git_history::diff(&clone.repo, commit) {
                Ok(changes) => changes,
                Err(e) => {
                    progress.suspend(|| {
                        error!(
                            "Failed to diff commit {} of {}: {}",
                            info.hash,
                            repository.full_name,
                            e.message()
                        )
                    });
                    self.session.increment_commits();
                    continue;
                }
            };

            for change in changes {
                let candidate = MatchCandidate::new(&change.path);
                if candidate.is_skippable() {
                    trace!("Skipping {}", change.path);
                } else {
                    let matches = self.signatures.evaluate(self.options.mode, &candidate, || {
                        Ok(blob_content(&clone.repo, change.blob_id)?)
                    });
                    for matched in matches {
                        let finding = self.factory.create(
                            repository,
                            &info,
                            &change.path,
                            change.action,
                            matched,
                        );
                        self.record(finding, progress);
                    }
                }
                self.session.increment_files();
            }
            self.session.increment_commits();
        }
    }

    fn record(&self, finding: Finding, progress: &ProgressBar) {
        debug!("Finding {} in {} ({})", finding.id, finding.file_path, finding.description());
        if let Some(reporter) = self.reporter {
            progress.suspend(|| reporter.print_finding(&finding));
        }
        self.session.add_finding(finding);
    }
}
