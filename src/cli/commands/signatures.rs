use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum, ValueHint};
use strum::Display;

/// `gitprowl signatures` command and subcommands
#[derive(Args, Debug)]
pub struct SignaturesArgs {
    #[command(subcommand)]
    pub command: SignaturesCommand,
}

#[derive(Subcommand, Debug)]
pub enum SignaturesCommand {
    /// List the active path and content signatures
    List(SignaturesListArgs),
}

#[derive(Args, Debug)]
pub struct SignaturesListArgs {
    /// JSON signature file to list instead of the built-in signatures
    #[arg(long, value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub signatures: Option<PathBuf>,

    /// Output format
    #[arg(long, short, default_value_t = SignaturesListOutputFormat::Pretty)]
    pub format: SignaturesListOutputFormat,
}

#[derive(Copy, Clone, Debug, Display, PartialEq, Eq, ValueEnum)]
#[strum(serialize_all = "kebab-case")]
pub enum SignaturesListOutputFormat {
    /// A human-readable table
    Pretty,
    /// The signature file layout, as JSON
    Json,
}
