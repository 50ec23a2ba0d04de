use std::io::{self, Write};

use indicatif::{HumanCount, HumanDuration};

use crate::{cli::global::GlobalArgs, session::Session};

macro_rules! safe_println {
    ($($arg:tt)*) => {
        if let Err(e) = writeln!(io::stdout(), $($arg)*) {
            if e.kind() == io::ErrorKind::BrokenPipe {
                // Silently exit: the consumer went away
                std::process::exit(0);
            } else {
                panic!("stdout error: {}", e);
            }
        }
    };
}

pub fn print_scan_summary(session: &Session, global_args: &GlobalArgs) {
    if global_args.quiet {
        return;
    }
    let stats = session.stats();
    let elapsed = stats.elapsed().to_std().unwrap_or_default();

    safe_println!("\n==========================================");
    safe_println!("Scan Summary:");
    safe_println!("==========================================");
    safe_println!(" |Status.................: {}", stats.status);
    safe_println!(" |Targets................: {}", HumanCount(stats.targets));
    safe_println!(" |Repositories...........: {}", HumanCount(stats.repositories));
    safe_println!(" |Commits................: {}", HumanCount(stats.commits));
    safe_println!(" |Files..................: {}", HumanCount(stats.files));
    safe_println!(" |Findings...............: {}", HumanCount(stats.findings));
    safe_println!(" |Started................: {}", stats.started_at.to_rfc3339());
    safe_println!(" |Elapsed................: {}", HumanDuration(elapsed));
}
