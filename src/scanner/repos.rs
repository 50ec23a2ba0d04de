use indicatif::ProgressBar;
use tracing::{debug, error, info};

use crate::{
    models::Account,
    scanner::pool::WorkerPool,
    session::Session,
    source_control::SourceControl,
};

/// List every target's repositories in parallel and add them to the session.
pub fn gather_repositories(
    session: &Session,
    client: &dyn SourceControl,
    pool: &WorkerPool,
    progress: &ProgressBar,
) -> anyhow::Result<()> {
    let targets = session.targets();
    info!("Gathering repositories from {} targets...", targets.len());
    progress.set_length(targets.len() as u64);

    pool.run(targets, |target: Account| {
        match client.list_repositories(&target) {
            Ok(repos) => {
                let mut added = 0;
                for repo in repos {
                    if session.add_repository(repo) {
                        added += 1;
                    }
                }
                progress.suspend(|| {
                    debug!("Retrieved {added} repositories from {}", target.login)
                });
            }
            Err(e) => progress.suspend(|| {
                error!("Failed to retrieve repositories from {}: {e:#}", target.login)
            }),
        }
        session.increment_targets();
        progress.inc(1);
    })?;

    progress.finish_and_clear();
    info!("Gathered {} repositories", session.repositories().len());
    Ok(())
}
