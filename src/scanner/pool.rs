use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
};

use anyhow::{Context, Result};
use crossbeam_channel::bounded;
use tracing::{debug, trace};

/// Shared flag checked by workers between jobs. Once set it stays set.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Number of workers for `jobs` items: at most `threads`, at most `jobs - 1` when there is
/// more than one job, never fewer than one.
pub fn worker_count(threads: usize, jobs: usize) -> usize {
    let cap = if jobs > 1 { jobs - 1 } else { 1 };
    threads.max(1).min(cap)
}

/// Fixed-size pool of named threads draining one closeable queue.
pub struct WorkerPool {
    name: &'static str,
    threads: usize,
    cancel: CancellationToken,
}

impl WorkerPool {
    pub fn new(name: &'static str, threads: usize, cancel: CancellationToken) -> Self {
        Self { name, threads, cancel }
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Run `work` once per job and return when every worker has exited.
    ///
    /// The queue is closed after the last job is enqueued; workers stop when it is drained or
    /// when the pool is cancelled.
    pub fn run<T, F>(&self, jobs: Vec<T>, work: F) -> Result<()>
    where
        T: Send,
        F: Fn(T) + Sync,
    {
        if jobs.is_empty() {
            return Ok(());
        }
        let num_workers = worker_count(self.threads, jobs.len());
        debug!("Starting {num_workers} {} workers for {} jobs", self.name, jobs.len());

        thread::scope(|scope| {
            let (send_job, recv_job) = bounded::<T>(num_workers * 2);
            for idx in 0..num_workers {
                let recv_job = recv_job.clone();
                let work = &work;
                let cancel = &self.cancel;
                thread::Builder::new()
                    .name(format!("{}-{idx}", self.name))
                    .spawn_scoped(scope, move || {
                        for job in recv_job.iter() {
                            if cancel.is_cancelled() {
                                trace!("Worker cancelled; dropping remaining jobs");
                                break;
                            }
                            work(job);
                        }
                    })
                    .with_context(|| format!("Failed to spawn {} worker thread", self.name))?;
            }
            drop(recv_job);

            for job in jobs {
                if self.cancel.is_cancelled() || send_job.send(job).is_err() {
                    break;
                }
            }
            drop(send_job);
            Ok(())
        })
    }
}
