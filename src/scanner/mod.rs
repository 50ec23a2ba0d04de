//! Public façade for the scanner subsystem.
pub use analysis::{AnalysisOptions, Analyzer};
pub use pool::{worker_count, CancellationToken, WorkerPool};
pub use repos::gather_repositories;
pub use runner::{run_phases, run_scan};
pub use summary::print_scan_summary;
pub use targets::gather_targets;

mod analysis;
mod pool;
mod repos;
mod runner;
mod summary;
mod targets;
