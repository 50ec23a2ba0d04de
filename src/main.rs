use std::io::{self, Write};

use anyhow::{Context, Result};
use gitprowl::{
    cli::{
        commands::signatures::{
            SignaturesCommand, SignaturesListArgs, SignaturesListOutputFormat,
        },
        global::Command,
        CommandLineArgs, GlobalArgs,
    },
    config::ScanConfig,
    scanner::{run_scan, CancellationToken},
    session::Session,
    signatures::loader::{SignatureFile, SignatureLoader},
};
use tracing::{info, warn};
use tracing_core::metadata::LevelFilter;
use tracing_subscriber::{
    self, fmt, prelude::__tracing_subscriber_SubscriberExt, registry, util::SubscriberInitExt,
};

fn main() -> Result<()> {
    color_backtrace::install();
    let args = CommandLineArgs::parse_args();
    setup_logging(&args.global_args);

    match args.command {
        Command::Scan(scan_args) => {
            let config = ScanConfig::from_args(&scan_args)?;
            info!(
                "Launching with {} worker threads. Use --threads to override.",
                config.threads
            );
            let cancel = CancellationToken::new();
            let handler_token = cancel.clone();
            ctrlc::set_handler(move || {
                warn!("Interrupt received; finishing in-flight work");
                handler_token.cancel();
            })
            .context("Failed to install interrupt handler")?;

            let session = run_scan(&config, &args.global_args, &cancel)?;
            std::process::exit(determine_exit_code(&session));
        }
        Command::Signatures(signature_args) => match signature_args.command {
            SignaturesCommand::List(list_args) => run_signatures_list(&list_args),
        },
    }
}

fn setup_logging(global_args: &GlobalArgs) {
    let level = LevelFilter::from_level(global_args.log_level());
    let all_targets = !global_args.quiet && global_args.verbose > 2;
    let filter = if all_targets {
        tracing_subscriber::filter::Targets::new().with_default(LevelFilter::TRACE)
    } else {
        tracing_subscriber::filter::Targets::new()
            .with_default(LevelFilter::ERROR)
            .with_target("gitprowl", level)
    };
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_ansi(false)
        .without_time();
    registry().with(fmt_layer).with(filter).init();
}

/// 200 when the session holds findings, 0 otherwise.
fn determine_exit_code(session: &Session) -> i32 {
    if session.stats().findings > 0 {
        200
    } else {
        0
    }
}

fn run_signatures_list(args: &SignaturesListArgs) -> Result<()> {
    let set = SignatureLoader::new().signature_file(args.signatures.as_ref()).load()?;
    let mut writer = io::stdout().lock();
    match args.format {
        SignaturesListOutputFormat::Json => {
            serde_json::to_writer_pretty(&mut writer, &SignatureFile::from(&set))?;
            writeln!(writer)?;
        }
        SignaturesListOutputFormat::Pretty => {
            let rows: Vec<_> = set
                .path_signatures()
                .iter()
                .map(|sig| ("path", sig))
                .chain(set.content_signatures().iter().map(|sig| ("content", sig)))
                .collect();
            let desc_width =
                rows.iter().map(|(_, sig)| sig.description.len()).max().unwrap_or(0).max(11);
            writeln!(
                writer,
                "\n{:7} │ {:9} │ {:7} │ {:desc_width$} │ Match",
                "Tier", "Part", "Kind", "Description"
            )?;
            writeln!(
                writer,
                "{0:─<7} ┼ {0:─<9} ┼ {0:─<7} ┼ {0:─<desc_width$} ┼ {0:─<20}",
                ""
            )?;
            for (tier, sig) in rows {
                writeln!(
                    writer,
                    "{:7} │ {:9} │ {:7} │ {:desc_width$} │ {}",
                    tier,
                    sig.part.to_string(),
                    sig.matcher.kind().to_string(),
                    sig.description,
                    sig.matcher.as_str()
                )?;
            }
        }
    }
    Ok(())
}
