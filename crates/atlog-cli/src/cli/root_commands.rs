use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::cli::subcommands::RulesCommands;

/// Top-level command tree.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Unpack and categorize diagnostic bundles.
    Extract(ExtractArgs),
    /// List embedded configuration records and check them against their schemas.
    Records(RecordsArgs),
    /// Reconstruct transaction flows from a bundle's journals.
    Flows(FlowsArgs),
    /// Compare the UI paths of two transactions.
    Diff(DiffArgs),
    /// Rule document tools.
    Rules {
        #[command(subcommand)]
        action: RulesCommands,
    },
}

#[derive(Clone, Debug, Args)]
pub struct ExtractArgs {
    /// ZIP archives to process.
    #[arg(required = true)]
    pub archives: Vec<PathBuf>,

    /// Keep scratch directories under DIR instead of removing them.
    #[arg(long, value_name = "DIR")]
    pub keep: Option<PathBuf>,

    /// Only pick out registry files; everything else is unidentified.
    #[arg(long)]
    pub registry_only: bool,
}

#[derive(Clone, Debug, Args)]
pub struct RecordsArgs {
    /// ZIP archive to scan.
    pub archive: PathBuf,
}

#[derive(Clone, Debug, Args)]
pub struct FlowsArgs {
    /// ZIP archive to analyze.
    pub archive: PathBuf,

    /// Rule document (defaults to `rules.path` from configuration).
    #[arg(long, value_name = "FILE")]
    pub rules: Option<PathBuf>,
}

#[derive(Clone, Debug, Args)]
pub struct DiffArgs {
    /// ZIP archive to analyze.
    pub archive: PathBuf,

    /// Transaction id of the left flow.
    #[arg(long)]
    pub left: String,

    /// Transaction id of the right flow.
    #[arg(long)]
    pub right: String,

    /// Rule document (defaults to `rules.path` from configuration).
    #[arg(long, value_name = "FILE")]
    pub rules: Option<PathBuf>,
}
