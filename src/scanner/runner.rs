use std::time::Duration;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use crate::{
    cli::global::GlobalArgs,
    config::{ConfigError, ScanConfig},
    finding::FindingFactory,
    git_binary::Git,
    reporter::FindingReporter,
    scanner::{
        analysis::{AnalysisOptions, Analyzer},
        pool::{CancellationToken, WorkerPool},
        repos::gather_repositories,
        summary::print_scan_summary,
        targets::gather_targets,
    },
    session::{Session, Status},
    signatures::{loader::SignatureLoader, SignatureSet},
    source_control::SourceControl,
};

fn collection_progress(global_args: &GlobalArgs) -> ProgressBar {
    if global_args.use_progress() {
        let style = ProgressStyle::with_template("{spinner} {msg} {pos}/{len} [{elapsed_precise}]")
            .expect("progress bar style template should compile");
        let pb = ProgressBar::new_spinner()
            .with_style(style)
            .with_message("Gathering repositories...");
        pb.enable_steady_tick(Duration::from_millis(500));
        pb
    } else {
        ProgressBar::hidden()
    }
}

fn analysis_progress(global_args: &GlobalArgs) -> ProgressBar {
    if global_args.use_progress() {
        let style = ProgressStyle::with_template(
            "{msg} {bar} {percent:>3}% {pos}/{len} [{elapsed_precise}]",
        )
        .expect("progress bar style template should compile");
        let pb = ProgressBar::new(0).with_style(style).with_message("Analyzing repositories");
        pb.enable_steady_tick(Duration::from_millis(500));
        pb
    } else {
        ProgressBar::hidden()
    }
}

/// Run a complete `scan`: gather, analyze, save, and summarize.
///
/// A loaded session that already finished is summarized without contacting the provider.
pub fn run_scan(
    config: &ScanConfig,
    global_args: &GlobalArgs,
    cancel: &CancellationToken,
) -> Result<Session> {
    let session = match &config.loaded_session {
        Some(snapshot) => {
            info!("Loaded session with {} findings", snapshot.findings.len());
            Session::from_snapshot(snapshot.clone())
        }
        None => Session::new(),
    };

    if session.stats().status == Status::Finished {
        info!("Loaded session is finished; skipping scan");
    } else {
        let provider = config.provider.as_ref().ok_or(ConfigError::MissingCredentials)?;
        let signatures =
            SignatureLoader::new().signature_file(config.signatures_path.as_ref()).load()?;
        let client = provider.build_client(global_args.ignore_certs)?;
        info!("Using {} API at {}", provider.kind, provider.api_url);
        run_phases(&session, client.as_ref(), &signatures, config, global_args, cancel)?;

        if let Some(path) = &config.save_path {
            session
                .save_to_file(path)
                .with_context(|| format!("Failed to save session to {}", path.display()))?;
            info!("Saved session to {}", path.display());
        }
    }

    print_scan_summary(&session, global_args);
    Ok(session)
}

/// Drive the gathering and analysis phases against `client`, moving the session through
/// each status and finishing it.
pub fn run_phases(
    session: &Session,
    client: &dyn SourceControl,
    signatures: &SignatureSet,
    config: &ScanConfig,
    global_args: &GlobalArgs,
    cancel: &CancellationToken,
) -> Result<()> {
    session.set_status(Status::Gathering);
    gather_targets(session, client, &config.logins, config.expand_orgs);

    let collectors = WorkerPool::new("collector", config.threads, cancel.clone());
    gather_repositories(session, client, &collectors, &collection_progress(global_args))?;

    if cancel.is_cancelled() {
        warn!("Scan interrupted; skipping analysis");
    } else {
        session.set_status(Status::Analyzing);
        let git = Git::new(client.clone_credentials(), global_args.ignore_certs);
        let factory = FindingFactory::new(client.kind(), client.web_url());
        let reporter = FindingReporter::new(global_args.use_color(std::io::stdout()));
        let options = AnalysisOptions {
            mode: config.mode,
            commit_depth: config.commit_depth,
            storage: config.storage,
        };
        let analyzer =
            Analyzer::new(session, signatures, &git, factory, options).with_reporter(&reporter);
        let analyzers = WorkerPool::new("analyzer", config.threads, cancel.clone());
        analyzer.analyze_repositories(&analyzers, &analysis_progress(global_args))?;
        if cancel.is_cancelled() {
            warn!("Scan interrupted; results are partial");
        }
    }

    session.finish();
    Ok(())
}
